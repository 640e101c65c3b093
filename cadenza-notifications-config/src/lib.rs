use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the XDG config home.
pub const ID: &str = "cadenza-shell";
pub const FILE_NAME: &str = "notifications.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Track notifications but never show popups.
    pub do_not_disturb: bool,
    /// How long a fresh notification stays in the popup stack, in milliseconds.
    pub popup_timeout_ms: u64,
    /// Whether critical notifications leave the popup stack on their own.
    pub expire_critical: bool,
    /// Hide every popup while the notification center is open.
    pub suppress_popups_while_center_open: bool,
    /// Maximum number of resolved notifications kept for the center.
    pub max_history: usize,
    /// Memory budget for resolved notifications, in bytes.
    pub max_history_memory: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            do_not_disturb: false,
            popup_timeout_ms: 10_000,
            expire_critical: false,
            suppress_popups_while_center_open: true,
            max_history: 100,
            max_history_memory: 50 * 1024 * 1024,
        }
    }
}

impl NotificationsConfig {
    /// `$XDG_CONFIG_HOME/cadenza-shell/notifications.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(ID).join(FILE_NAME))
    }

    /// Read a config file. A missing file is not an error and yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, logging and falling back to defaults
    /// on any error.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            tracing::warn!("no config directory, using default notification settings");
            return Self::default();
        };

        Self::load_from(&path).unwrap_or_else(|err| {
            tracing::error!("{err}");
            Self::default()
        })
    }

    pub fn popup_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.popup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = NotificationsConfig::default();

        assert!(!config.do_not_disturb);
        assert_eq!(config.popup_timeout_ms, 10_000);
        assert_eq!(config.popup_timeout(), std::time::Duration::from_secs(10));
        assert!(!config.expire_critical);
        assert!(config.suppress_popups_while_center_open);
        assert_eq!(config.max_history, 100);
        assert_eq!(config.max_history_memory, 50 * 1024 * 1024);
    }

    #[test]
    fn test_config_serialization() {
        let json = serde_json::to_string(&NotificationsConfig::default()).unwrap();

        assert!(json.contains("popup_timeout_ms"));
        assert!(json.contains("suppress_popups_while_center_open"));
        assert!(json.contains("max_history_memory"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NotificationsConfig = toml::from_str(
            r#"
            do_not_disturb = true
            popup_timeout_ms = 3000
            "#,
        )
        .unwrap();

        assert!(config.do_not_disturb);
        assert_eq!(config.popup_timeout_ms, 3000);
        assert_eq!(config.max_history, 100);
        assert!(config.suppress_popups_while_center_open);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NotificationsConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, NotificationsConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "expire_critical = true\nmax_history = 5").unwrap();

        let config = NotificationsConfig::load_from(&path).unwrap();
        assert!(config.expire_critical);
        assert_eq!(config.max_history, 5);
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "max_history = \"lots\"").unwrap();

        let err = NotificationsConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(FILE_NAME));
    }
}
