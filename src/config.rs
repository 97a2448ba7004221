//! Configuration management for tagfile
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (tagfile.toml)
//! - Environment variables (TAGFILE__*)
//!
//! ## Example config file (tagfile.toml):
//! ```toml
//! [parser]
//! max_depth = 64
//!
//! [writer]
//! indent = "spaces"
//! indent_width = 2
//!
//! [codegen]
//! runtime_crate = "tagfile"
//! derives = ["Debug", "Clone", "PartialEq"]
//! emit_docs = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::codegen::RenderProfile;
use crate::format::{ParserConfig, WriterConfig};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagfileConfig {
    /// Document parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Document writer settings
    #[serde(default)]
    pub writer: WriterConfig,

    /// Code generation settings
    #[serde(default)]
    pub codegen: RenderProfile,
}

impl TagfileConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding an explicit file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["tagfile.toml", ".tagfile.toml", "config/tagfile.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "tagfile", "tagfile") {
            let xdg_config = config_dir.config_dir().join("tagfile.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (TAGFILE__*)
        builder = builder.add_source(
            Environment::with_prefix("TAGFILE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::IndentStyle;

    #[test]
    fn test_default_config() {
        let config = TagfileConfig::default();
        assert_eq!(config.parser.max_depth, 256);
        assert_eq!(config.writer.indent, IndentStyle::Tabs);
        assert_eq!(config.codegen.runtime_crate, "tagfile");
    }

    #[test]
    fn test_serialize_config() {
        let config = TagfileConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[parser]"));
        assert!(toml_str.contains("[writer]"));
        assert!(toml_str.contains("[codegen]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[writer]\nindent = \"spaces\"\nindent_width = 2\n\n[codegen]\nemit_docs = false\n",
        )
        .unwrap();

        let config = TagfileConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.writer, WriterConfig::spaces(2));
        assert!(!config.codegen.emit_docs);
        assert_eq!(config.parser, ParserConfig::default());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = TagfileConfig::default();
        config.parser.max_depth = 12;
        config.save(&path).unwrap();

        let loaded = TagfileConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.parser.max_depth, 12);
    }
}
