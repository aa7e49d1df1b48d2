//! URL slugs: derivation from display names and per-language uniqueness.

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Used when a name has no ASCII alphanumerics at all.
pub const FALLBACK_SLUG: &str = "product";

/// Letters with no canonical decomposition into ASCII.
fn fold_letter(c: char, out: &mut String) {
    match c {
        'ß' => out.push_str("ss"),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'ø' => out.push('o'),
        'đ' | 'ð' => out.push('d'),
        'ł' => out.push('l'),
        'þ' => out.push_str("th"),
        'ı' => out.push('i'),
        _ => out.push(c),
    }
}

/// ASCII transliteration: NFKD, drop combining marks, fold the rest.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().nfkd().filter(|c| !is_combining_mark(*c)) {
        fold_letter(c, &mut out);
    }
    // Compatibility forms can decompose to capitals (`№` -> `No`).
    out.to_lowercase()
}

/// Transliterate to lowercase ASCII, collapse every run of non-alphanumerics
/// to one `-`, trim dashes.
pub fn slugify(text: &str) -> String {
    let lower = transliterate(text);
    let slug = NON_SLUG_RUN.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

pub fn slug_taken(conn: &Connection, slug: &str, language: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM urls WHERE slug = ?1 AND language = ?2",
            params![slug, language],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// `base` if free in `language`, else the first free `base-2`, `base-3`, ...
///
/// Sees uncommitted rows of the caller's transaction, so slugs handed out
/// earlier in the same clone are respected.
pub fn unique_slug(conn: &Connection, base: &str, language: &str) -> rusqlite::Result<String> {
    if !slug_taken(conn, base, language)? {
        return Ok(base.to_string());
    }
    let mut n: u64 = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !slug_taken(conn, &candidate, language)? {
            return Ok(candidate);
        }
        n += 1;
    }
}
