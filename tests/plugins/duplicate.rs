use rusqlite::Connection;
use shopkeep::core::db;
use shopkeep::core::error::{CloneError, ShopkeepError};
use shopkeep::core::broker::DbBroker;
use shopkeep::plugins::catalog::{
    self, AttributeValue, PRODUCT_MORPH, ProductDraft, ProductGraph, ProductStatus, VARIANT_MORPH,
};
use shopkeep::plugins::duplicate::{
    DUPLICATE_FAILED_TITLE, DUPLICATED_TITLE, DuplicationOptions, duplicate_product, edit_route,
    run_duplication,
};
use shopkeep::plugins::notify::{self, NotificationLevel};
use std::collections::BTreeSet;
use std::time::Duration;
use tempfile::tempdir;

fn catalog_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::create_catalog_tables(&conn).unwrap();
    conn
}

fn shirt_draft() -> ProductDraft {
    serde_json::from_value(serde_json::json!({
        "product_type": "apparel",
        "brand": "Acme",
        "status": "published",
        "attributes": {
            "name": {"type": "text", "value": "Shirt"},
            "color": {"type": "dropdown", "value": "red"},
            "size": {"type": "text", "value": "M"}
        },
        "variants": [
            {"sku": "SHIRT-S", "stock": 3, "prices": [{"currency": "EUR", "price": 1999}]},
            {"sku": "SHIRT-M", "stock": 5, "prices": [{"currency": "EUR", "price": 2099}]}
        ],
        "media": [
            {"name": "front", "file_name": "shirt-front.jpg", "mime_type": "image/jpeg", "order_column": 1}
        ],
        "urls": [
            {"language": "en", "default": true},
            {"language": "fr"}
        ]
    }))
    .unwrap()
}

fn seed_shirt(conn: &Connection) -> ProductGraph {
    catalog::import_product(conn, &shirt_draft()).unwrap()
}

fn options(name: &str) -> DuplicationOptions {
    DuplicationOptions {
        new_name: name.to_string(),
        new_status: ProductStatus::Draft,
        include_variants: true,
        include_prices: true,
        include_media: true,
        include_urls: true,
        copy_attributes: true,
        selected_attribute_keys: ["name", "color", "size"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

fn table_counts(conn: &Connection) -> Vec<i64> {
    ["products", "product_variants", "prices", "media", "urls"]
        .iter()
        .map(|t| count(conn, t))
        .collect()
}

#[test]
fn test_full_clone_copies_every_selected_component() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);

    let clone = duplicate_product(&conn, &source.product, &options("Shirt v2")).unwrap();
    let graph = catalog::load_graph(&conn, &clone.id).unwrap().unwrap();

    assert_ne!(clone.id, source.product.id);
    assert_eq!(clone.status, ProductStatus::Draft);
    assert_eq!(clone.brand.as_deref(), Some("Acme"));
    assert_eq!(clone.product_type.as_deref(), Some("apparel"));
    assert_eq!(clone.name().as_deref(), Some("Shirt v2"));
    assert_eq!(graph.product.attribute_data.len(), 3);
    assert_eq!(graph.variants.len(), 2);
    assert_eq!(graph.media.len(), 1);
    assert_eq!(graph.urls.len(), 2);

    let reloaded = catalog::load_graph(&conn, &source.product.id).unwrap().unwrap();
    assert_eq!(reloaded.product, source.product);
    assert_eq!(reloaded.variants.len(), 2);
    assert_eq!(reloaded.urls.len(), 2);
}

#[test]
fn test_variant_and_price_identities_are_fresh() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let source_variant_ids: BTreeSet<String> =
        source.variants.iter().map(|v| v.variant.id.clone()).collect();
    let source_price_ids: BTreeSet<String> = source
        .variants
        .iter()
        .flat_map(|v| v.prices.iter().map(|p| p.id.clone()))
        .collect();

    let clone = duplicate_product(&conn, &source.product, &options("Shirt v2")).unwrap();
    let graph = catalog::load_graph(&conn, &clone.id).unwrap().unwrap();

    assert_eq!(graph.variants.len(), 2);
    let mut skus: Vec<_> = graph
        .variants
        .iter()
        .map(|v| v.variant.sku.clone().unwrap())
        .collect();
    skus.sort();
    assert_eq!(skus, vec!["SHIRT-M", "SHIRT-S"]);

    for v in &graph.variants {
        assert_eq!(v.variant.product_id, clone.id);
        assert!(!source_variant_ids.contains(&v.variant.id));
        assert_eq!(v.prices.len(), 1);
        let price = &v.prices[0];
        assert!(!source_price_ids.contains(&price.id));
        assert_eq!(price.priceable_type, VARIANT_MORPH);
        assert_eq!(price.priceable_id, v.variant.id);
    }
    assert_eq!(count(&conn, "prices"), 4);

    for v in &source.variants {
        let prices = catalog::prices_for(&conn, VARIANT_MORPH, &v.variant.id).unwrap();
        assert_eq!(prices, v.prices);
    }
}

#[test]
fn test_prices_require_variants() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("No Variants");
    opts.include_variants = false;
    opts.include_prices = true;

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    let graph = catalog::load_graph(&conn, &clone.id).unwrap().unwrap();
    assert!(graph.variants.is_empty());
    assert_eq!(count(&conn, "product_variants"), 2);
    assert_eq!(count(&conn, "prices"), 2);
}

#[test]
fn test_variants_without_prices() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("Bare Variants");
    opts.include_prices = false;

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    let graph = catalog::load_graph(&conn, &clone.id).unwrap().unwrap();
    assert_eq!(graph.variants.len(), 2);
    assert!(graph.variants.iter().all(|v| v.prices.is_empty()));
    assert_eq!(count(&conn, "prices"), 2);
}

#[test]
fn test_media_references_share_the_asset() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);

    let clone = duplicate_product(&conn, &source.product, &options("Shirt v2")).unwrap();
    let media = catalog::media_for(&conn, PRODUCT_MORPH, &clone.id).unwrap();
    assert_eq!(media.len(), 1);
    let original = &source.media[0];
    assert_ne!(media[0].id, original.id);
    assert_eq!(media[0].model_id, clone.id);
    assert_eq!(media[0].file_name, original.file_name);
    assert_eq!(media[0].disk, original.disk);
    assert_eq!(media[0].order_column, Some(1));
}

#[test]
fn test_copy_attributes_off_keeps_only_new_name() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("Plain");
    opts.copy_attributes = false;

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    let stored = catalog::get_product(&conn, &clone.id).unwrap().unwrap();
    assert_eq!(stored.attribute_data.len(), 1);
    assert_eq!(
        stored.attribute_data["name"],
        AttributeValue::Text("Plain".to_string())
    );
}

#[test]
fn test_selected_subset_is_copied_with_new_name() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("B");
    opts.selected_attribute_keys = ["color".to_string()].into_iter().collect();

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    let stored = catalog::get_product(&conn, &clone.id).unwrap().unwrap();
    assert_eq!(stored.attribute_data.len(), 2);
    assert_eq!(stored.attribute_data["name"], AttributeValue::Text("B".to_string()));
    assert_eq!(
        stored.attribute_data["color"],
        AttributeValue::Dropdown("red".to_string())
    );

    let source_after = catalog::get_product(&conn, &source.product.id).unwrap().unwrap();
    assert_eq!(source_after.name().as_deref(), Some("Shirt"));
}

#[test]
fn test_empty_selection_copies_only_name() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("Only Name");
    opts.selected_attribute_keys.clear();

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    assert_eq!(
        clone.attribute_data.keys().collect::<Vec<_>>(),
        vec!["name"]
    );
}

#[test]
fn test_cloned_urls_get_distinct_slugs() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let source_en = source
        .urls
        .iter()
        .find(|u| u.language == "en")
        .unwrap()
        .slug
        .clone();
    assert_eq!(source_en, "shirt");

    let first = duplicate_product(&conn, &source.product, &options("Shirt Copy")).unwrap();
    let second = duplicate_product(&conn, &source.product, &options("Shirt Copy")).unwrap();

    let slug_of = |id: &str, language: &str| {
        catalog::urls_for(&conn, PRODUCT_MORPH, id)
            .unwrap()
            .into_iter()
            .find(|u| u.language == language)
            .unwrap()
    };
    let first_en = slug_of(&first.id, "en");
    let second_en = slug_of(&second.id, "en");
    assert_eq!(first_en.slug, "shirt-copy");
    assert_eq!(second_en.slug, "shirt-copy-2");
    assert_ne!(first_en.slug, source_en);
    assert!(first_en.is_default);
    assert_eq!(slug_of(&second.id, "fr").slug, "shirt-copy-2");
}

#[test]
fn test_same_name_clone_avoids_source_slug() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);

    let clone = duplicate_product(&conn, &source.product, &options("Shirt")).unwrap();
    let urls = catalog::urls_for(&conn, PRODUCT_MORPH, &clone.id).unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.slug == "shirt-2"));
}

#[test]
fn test_urls_not_copied_unless_requested() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let mut opts = options("No Urls");
    opts.include_urls = false;
    opts.include_media = false;

    let clone = duplicate_product(&conn, &source.product, &opts).unwrap();
    assert!(catalog::urls_for(&conn, PRODUCT_MORPH, &clone.id).unwrap().is_empty());
    assert!(catalog::media_for(&conn, PRODUCT_MORPH, &clone.id).unwrap().is_empty());
    assert_eq!(count(&conn, "urls"), 2);
}

#[test]
fn test_failure_on_last_url_rolls_back_everything() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    conn.execute_batch(
        "CREATE TRIGGER fail_second_url BEFORE INSERT ON urls
         WHEN NEW.language = 'fr'
         BEGIN SELECT RAISE(ABORT, 'injected url failure'); END;",
    )
    .unwrap();
    let before = table_counts(&conn);

    let err = duplicate_product(&conn, &source.product, &options("Doomed")).unwrap_err();
    assert!(matches!(err, CloneError::Persistence(_)), "{err}");
    assert!(err.to_string().contains("injected url failure"));
    assert_eq!(table_counts(&conn), before);
    assert_eq!(catalog::list_products(&conn).unwrap().len(), 1);
}

#[test]
fn test_failure_on_media_rolls_back_variants_and_prices() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    conn.execute_batch(
        "CREATE TRIGGER fail_media BEFORE INSERT ON media
         BEGIN SELECT RAISE(ABORT, 'injected media failure'); END;",
    )
    .unwrap();
    let before = table_counts(&conn);

    assert!(duplicate_product(&conn, &source.product, &options("Doomed")).is_err());
    assert_eq!(table_counts(&conn), before);
}

#[test]
fn test_invalid_options_write_nothing() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    let before = table_counts(&conn);

    let err = duplicate_product(&conn, &source.product, &options("   ")).unwrap_err();
    assert!(matches!(err, CloneError::InvalidOptions(_)));
    let err = duplicate_product(&conn, &source.product, &options(&"x".repeat(256))).unwrap_err();
    assert!(matches!(err, CloneError::InvalidOptions(_)));
    assert_eq!(table_counts(&conn), before);
}

#[test]
fn test_source_without_children_clones_cleanly() {
    let conn = catalog_db();
    let draft: ProductDraft = serde_json::from_value(serde_json::json!({
        "attributes": {"name": {"type": "text", "value": "Gift Card"}}
    }))
    .unwrap();
    let source = catalog::import_product(&conn, &draft).unwrap();

    let clone = duplicate_product(&conn, &source.product, &options("Gift Card 2")).unwrap();
    let graph = catalog::load_graph(&conn, &clone.id).unwrap().unwrap();
    assert!(graph.variants.is_empty());
    assert!(graph.media.is_empty());
    assert!(graph.urls.is_empty());
}

#[test]
fn test_translated_name_keeps_locales() {
    let conn = catalog_db();
    let draft: ProductDraft = serde_json::from_value(serde_json::json!({
        "attributes": {
            "name": {"type": "translated_text", "value": {"en": "Hat", "fr": "Chapeau"}}
        }
    }))
    .unwrap();
    let source = catalog::import_product(&conn, &draft).unwrap();

    let clone = duplicate_product(&conn, &source.product, &options("Cap")).unwrap();
    match &clone.attribute_data["name"] {
        AttributeValue::TranslatedText(locales) => {
            assert_eq!(locales.len(), 2);
            assert_eq!(locales["fr"], "Cap");
        }
        other => panic!("unexpected name kind: {:?}", other),
    }
}

#[test]
fn test_deleted_source_is_not_found() {
    let conn = catalog_db();
    let source = seed_shirt(&conn);
    conn.execute("DELETE FROM products WHERE id = ?1", [&source.product.id])
        .unwrap();

    let err = duplicate_product(&conn, &source.product, &options("Ghost")).unwrap_err();
    assert!(matches!(err, CloneError::SourceNotFound(_)));
    assert_eq!(count(&conn, "products"), 0);
}

#[test]
fn test_run_duplication_records_success_notification() {
    let tmp = tempdir().unwrap();
    let (store, _) = shopkeep::initialize(tmp.path(), true).unwrap();
    let body = serde_json::to_string(&serde_json::json!({
        "attributes": {"name": {"type": "text", "value": "Mug"}},
        "urls": [{"language": "en", "default": true}]
    }))
    .unwrap();
    let source = catalog::add_product_from_json(&store, &body).unwrap();

    let outcome = run_duplication(&store, &source.product.id, &options("Mug Deluxe")).unwrap();
    assert!(outcome.notification_error.is_none());
    let clone = outcome.product;

    let notes = notify::recent(&store.root, 10).unwrap();
    assert_eq!(notes[0].level, NotificationLevel::Success);
    assert_eq!(notes[0].title, DUPLICATED_TITLE);
    assert_eq!(notes[0].subject_id.as_deref(), Some(clone.id.as_str()));
    assert_eq!(notes[0].redirect.as_deref(), Some(edit_route(&clone.id).as_str()));

    let shown = catalog::show_product(&store, &clone.id).unwrap();
    assert_eq!(shown.urls[0].slug, "mug-deluxe");

    let events = DbBroker::new(&store.root).read_events().unwrap();
    let last = events.last().unwrap();
    assert!(events.iter().any(|e| e.op == "product.duplicate" && e.status == "success"));
    assert_eq!(last.op, "product.show");
}

#[test]
fn test_run_duplication_records_failure_notification() {
    let tmp = tempdir().unwrap();
    let (store, _) = shopkeep::initialize(tmp.path(), true).unwrap();

    let err = run_duplication(&store, "missing-id", &options("Nothing")).unwrap_err();
    assert!(matches!(
        err,
        ShopkeepError::Clone(CloneError::SourceNotFound(_))
    ));

    let notes = notify::recent(&store.root, 10).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Danger);
    assert_eq!(notes[0].title, DUPLICATE_FAILED_TITLE);
    assert!(notes[0].body.as_deref().unwrap().contains("missing-id"));
    assert!(notes[0].redirect.is_none());

    let events = DbBroker::new(&store.root).read_events().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.op, "product.duplicate");
    assert_eq!(last.status, "error");
    assert_eq!(last.intent_ref.as_deref(), Some("missing-id"));
}

#[test]
fn test_committed_clone_is_ok_when_ledger_is_unwritable() {
    let tmp = tempdir().unwrap();
    let (store, _) = shopkeep::initialize(tmp.path(), true).unwrap();
    let body = r#"{"attributes": {"name": {"type": "text", "value": "Mug"}}}"#;
    let source = catalog::add_product_from_json(&store, body).unwrap();
    // A directory where the ledger file should be makes every append fail.
    std::fs::create_dir_all(notify::notifications_path(&store.root)).unwrap();

    let outcome = run_duplication(&store, &source.product.id, &options("Mug 2")).unwrap();
    assert!(outcome.notification_error.is_some());
    assert_eq!(outcome.product.name().as_deref(), Some("Mug 2"));
    assert_eq!(catalog::list_all_products(&store).unwrap().len(), 2);

    let err = run_duplication(&store, "missing-id", &options("Nothing")).unwrap_err();
    assert!(matches!(
        err,
        ShopkeepError::Clone(CloneError::SourceNotFound(_))
    ));
}

#[test]
fn test_clone_waits_for_a_concurrent_writer() {
    let tmp = tempdir().unwrap();
    let (store, _) = shopkeep::initialize(tmp.path(), false).unwrap();
    let db_path = store.db_path().to_string_lossy().to_string();

    let conn = db::db_connect(&db_path).unwrap();
    let source = seed_shirt(&conn);

    let writer = db::db_connect(&db_path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();
    writer
        .execute(
            "INSERT INTO urls(id, element_type, element_id, language, slug, is_default)
             VALUES('w1', 'product', 'other', 'en', 'shirt-copy', 0)",
            [],
        )
        .unwrap();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        writer.execute_batch("COMMIT;").unwrap();
    });

    let clone = duplicate_product(&conn, &source.product, &options("Shirt Copy")).unwrap();
    handle.join().unwrap();

    let urls = catalog::urls_for(&conn, PRODUCT_MORPH, &clone.id).unwrap();
    let en = urls.iter().find(|u| u.language == "en").unwrap();
    assert_eq!(en.slug, "shirt-copy-2");
}
