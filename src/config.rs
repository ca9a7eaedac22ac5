//! Configuration for tilenol
//!
//! Loads configuration from TOML file at `~/.config/tilenol/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::wm::keyboard::{MOD4, SHIFT};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub frame: FrameConfig,
    pub groups: GroupsConfig,
    pub keys: Vec<KeyBindingConfig>,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default_with_keys());
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;
        let config = Self::parse(&content)?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Defaults plus a starter set of key bindings, written on first run
    pub fn default_with_keys() -> Self {
        Self {
            keys: vec![
                KeyBindingConfig {
                    modifiers: MOD4,
                    keycode: 36, // Return
                    command: "xterm".into(),
                },
                KeyBindingConfig {
                    modifiers: MOD4 | SHIFT,
                    keycode: 24, // q
                    command: "pkill -x tilenol".into(),
                },
            ],
            ..Self::default()
        }
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tilenol");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default_with_keys())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tilenol=info".into(),
        }
    }
}

/// Frame decoration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub border_width: u32,
    /// 0xRRGGBB
    pub active_border: u32,
    pub inactive_border: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            active_border: 0x4c4c99,
            inactive_border: 0x808080,
        }
    }
}

/// Groups configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    pub names: Vec<String>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            names: (1..=9).map(|i| i.to_string()).collect(),
        }
    }
}

/// One key binding: modifier mask, keycode and the shell command to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindingConfig {
    pub modifiers: u16,
    pub keycode: u8,
    pub command: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.frame.border_width, 2);
        assert_eq!(config.groups.names.len(), 9);
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::parse(
            r#"
            [frame]
            border_width = 4

            [[keys]]
            modifiers = 64
            keycode = 36
            command = "alacritty"
            "#,
        )
        .unwrap();
        assert_eq!(config.frame.border_width, 4);
        assert_eq!(config.frame.active_border, 0x4c4c99);
        assert_eq!(config.logging.filter, "tilenol=info");
        assert_eq!(config.keys[0].command, "alacritty");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(Config::parse("[frame]\nborder_width = \"wide\"").is_err());
    }

    #[test]
    fn test_default_config_serializes_and_parses_back() {
        let text = toml::to_string_pretty(&Config::default_with_keys()).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::default_with_keys());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("tilenol-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default_with_keys());
        assert!(path.exists());
        assert_eq!(Config::load_from(&path).unwrap(), config);

        let _ = fs::remove_dir_all(&dir);
    }
}
