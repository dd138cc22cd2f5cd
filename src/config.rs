//! @dose
//! purpose: Configuration file parsing for apistub.toml. Holds the layout threshold,
//!     package metadata overrides and the cross-language id table.
//!
//! when-editing:
//!     - !Config is loaded once per command and converted into RenderOptions for pass two
//!     - !Every section is optional; a missing file means all defaults
//!     - Package values override what the snapshot says, field by field
//!
//! invariants:
//!     - Config::load returns the default config if the file doesn't exist
//!     - A file that exists but does not parse is an error, never silently ignored
//!
//! gotchas:
//!     - Without --config the file is looked up next to the snapshot, not in the cwd
//!     - cross_language_ids keys are identity ids, including `:async` suffixes

use crate::error::Result;
use crate::formatter::RenderOptions;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name
pub const CONFIG_FILE: &str = "apistub.toml";

/// Main configuration structure matching apistub.toml
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,

    pub package: PackageConfig,

    /// Identity id -> cross-language id
    pub cross_language_ids: HashMap<String, String>,
}

/// Layout configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Parameter lists with more argument units than this are split over several lines
    pub multi_line_threshold: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            multi_line_threshold: 2,
        }
    }
}

/// Overrides for the package header of the review file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PackageConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub cross_language_package_id: Option<String>,
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load the explicit config if given, else apistub.toml next to the snapshot.
    pub fn discover(snapshot: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => snapshot
                .parent()
                .map(|dir| dir.join(CONFIG_FILE))
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
        };
        Self::load(&path)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            multi_line_threshold: self.render.multi_line_threshold,
            cross_language_ids: self.cross_language_ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiStubError;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.multi_line_threshold, 2);
        assert!(config.package.name.is_none());
        assert!(config.cross_language_ids.is_empty());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.render.multi_line_threshold, 2);
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
[render]
multi_line_threshold = 4

[package]
name = "azure-widgets"
cross_language_package_id = "Azure.Widgets"

[cross_language_ids]
"azure.widgets.WidgetClient" = "Azure.Widgets.WidgetClient"
"azure.widgets.aio.WidgetClient.get:async" = "Azure.Widgets.WidgetClient.GetAsync"
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE), config_content).unwrap();

        let config = Config::discover(&temp_dir.path().join("snapshot.json"), None).unwrap();
        assert_eq!(config.render.multi_line_threshold, 4);
        assert_eq!(config.package.name.as_deref(), Some("azure-widgets"));
        assert_eq!(config.package.version, None);
        assert_eq!(
            config.package.cross_language_package_id.as_deref(),
            Some("Azure.Widgets")
        );

        let options = config.render_options();
        assert_eq!(options.multi_line_threshold, 4);
        assert_eq!(
            options
                .cross_language_ids
                .get("azure.widgets.aio.WidgetClient.get:async")
                .map(String::as_str),
            Some("Azure.Widgets.WidgetClient.GetAsync")
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        let custom = temp_dir.path().join("custom.toml");
        fs::write(&custom, "[render]\nmulti_line_threshold = 0\n").unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[render]\nmulti_line_threshold = 9\n",
        )
        .unwrap();

        let config =
            Config::discover(&temp_dir.path().join("snapshot.json"), Some(&custom)).unwrap();
        assert_eq!(config.render.multi_line_threshold, 0);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "[render]\nmulti_line_threshold = \"two\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ApiStubError::Config(_)));
    }
}
