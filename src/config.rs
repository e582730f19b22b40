use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the store file
pub const DB_ENV: &str = "CORE_INVENTORY_DB";

pub const DEFAULT_DB_NAME: &str = "core_inventory.db";

pub const DEFAULT_BOXLESS_NAME: &str = "nullboxes.csv";

pub const DEFAULT_REJECTED_NAME: &str = "no_api.csv";

/// Where the store lives: `--db` (clap already folds in `CORE_INVENTORY_DB`),
/// else the per-user data directory.
pub fn resolve_db_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    let path = match custom {
        Some(path) => path,
        None => {
            let proj_dirs = ProjectDirs::from("", "", "core-inventory")
                .context("Could not determine data directory")?;
            proj_dirs.data_dir().join(DEFAULT_DB_NAME)
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    Ok(path)
}

/// Side file path for `clean`: the given one, or `default_name` beside `output`
pub fn side_file_path(output: &Path, custom: Option<PathBuf>, default_name: &str) -> PathBuf {
    custom.unwrap_or_else(|| {
        output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(default_name)
    })
}
