//! Configuration for twig
//!
//! Stored in <config_dir>/twig/config.toml

use crate::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "twig";
const CONFIG_FILE: &str = "config.toml";

/// twig configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Todo ID prefix (e.g., "td", "home")
    pub id_prefix: String,

    /// Directory holding the JSON entries (defaults to <data_dir>/twig)
    pub data_dir: Option<PathBuf>,

    /// Status filter used by `list` when none is given
    pub default_filter: String,

    /// Storage keys
    #[serde(default)]
    pub storage: StorageConfig,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_prefix: "td".to_string(),
            data_dir: None,
            default_filter: "all".to_string(),
            storage: StorageConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Names of the two persisted entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub todos_key: String,
    pub order_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            todos_key: "todos".to_string(),
            order_key: "todoOrder".to_string(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for timestamps
    pub date_format: String,

    /// Show subtasks under collapsed parents too
    pub show_subtasks: bool,

    /// Maximum task length before truncation
    pub max_task_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            show_subtasks: true,
            max_task_length: 80,
        }
    }
}

impl Config {
    /// Load config from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("failed to serialize: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config location, <config_dir>/twig/config.toml
    pub fn default_path() -> crate::Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| crate::Error::Other("Cannot determine config directory".into()))
    }

    /// Directory the file storage lives in
    pub fn data_dir(&self) -> crate::Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| crate::Error::Other("Cannot determine data directory".into()))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            id_prefix: self.id_prefix.clone(),
            todos_key: self.storage.todos_key.clone(),
            order_key: self.storage.order_key.clone(),
        }
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# twig configuration

# Todo ID prefix (e.g., "td", "home")
id_prefix = "td"

# Directory holding todos.json and todoOrder.json
# (defaults to the platform data directory, e.g. ~/.local/share/twig)
# data_dir = "/path/to/twig"

# Status filter for `twig list` (all, pending, completed)
default_filter = "all"

[storage]
# Entry holding the todo records
todos_key = "todos"

# Entry holding the manual order
order_key = "todoOrder"

[display]
# Use colors in output
colors = true

# Date format for timestamps (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Show subtasks under collapsed parents too
show_subtasks = true

# Maximum task length before truncation
max_task_length = 80
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("none.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_commented_default_parses_to_default() {
        let config: Config = toml::from_str(&Config::default_with_comments()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "id_prefix = \"home\"\n[display]\ncolors = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.id_prefix, "home");
        assert!(!config.display.colors);
        assert_eq!(config.display.max_task_length, 80);
        assert_eq!(config.storage.order_key, "todoOrder");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "id_prefix = [").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_save_roundtrip_and_data_dir_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub/config.toml");
        let config = Config {
            data_dir: Some(temp.path().join("data")),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.data_dir().unwrap(), temp.path().join("data"));
        assert_eq!(loaded.store_options().todos_key, "todos");
    }
}
