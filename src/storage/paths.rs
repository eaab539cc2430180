//! Application paths for config and data.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Data directory.
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the billcrawl application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "billcrawl", "billcrawl") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/billcrawl"),
                data: home.join(".local/share/billcrawl"),
            }
        }
    }

    /// Paths rooted under a single directory.
    #[must_use]
    pub fn with_root(root: &Path) -> Self {
        Self {
            config: root.join("config"),
            data: root.join("data"),
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the record store database.
    #[must_use]
    pub fn records_db_file(&self) -> PathBuf {
        self.data.join("records.sqlite")
    }

    /// Default export path for flattened bill details.
    #[must_use]
    pub fn export_file(&self) -> PathBuf {
        self.data.join("bill_details.csv")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
