//! Store abstraction for shopkeep's on-disk state.
//!
//! A store is the `.shopkeep/` directory of a project: the TOML config at its
//! root and the SQLite database plus event ledgers under `data/`.

use crate::core::config::ShopkeepConfig;
use crate::core::error::ShopkeepError;
use crate::core::schemas;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the workspace directory created by `shopkeep init`.
pub const STORE_DIR: &str = ".shopkeep";

/// Store handle representing a shopkeep workspace.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the data directory (`<project>/.shopkeep/data`)
    pub root: PathBuf,
    /// Configuration loaded from `<project>/.shopkeep/shopkeep.toml`
    pub config: ShopkeepConfig,
}

impl Store {
    /// Open the store under `project_dir`, creating the data directory if needed.
    pub fn open(project_dir: &Path) -> Result<Self, ShopkeepError> {
        let store_dir = project_dir.join(STORE_DIR);
        let root = store_dir.join("data");
        fs::create_dir_all(&root)?;
        let config = ShopkeepConfig::load(&store_dir)?;
        Ok(Self { root, config })
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(schemas::SHOP_DB_NAME)
    }
}

/// Walk up from `start_dir` until a directory holding `.shopkeep/` is found.
pub fn find_project_root(start_dir: &Path) -> Result<PathBuf, ShopkeepError> {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        if dir.join(STORE_DIR).is_dir() {
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }
    Err(ShopkeepError::PathError(format!(
        "no {} directory found above {} (run `shopkeep init`)",
        STORE_DIR,
        start_dir.display()
    )))
}
