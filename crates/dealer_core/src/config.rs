//! File-based configuration for the dealership back office.
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - `write_config` never overwrites an existing file unless forced.

use crate::pricing::default_vat_rate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "dealer.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Encode(toml::ser::Error),
    /// Target exists and `force` was not set.
    AlreadyExists(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot access `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "cannot encode config: {err}"),
            Self::AlreadyExists(path) => write!(
                f,
                "config already exists at {} (use --force to overwrite)",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::AlreadyExists(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".dealer").join("dealer.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Falls back to the build's default level when unset.
    pub level: Option<String>,
    /// File logging is off when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub warranty_window_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            warranty_window_days: crate::service::dashboard_service::DEFAULT_WARRANTY_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicingConfig {
    pub default_vat_rate: Decimal,
    pub payment_terms_days: u32,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            default_vat_rate: default_vat_rate(),
            payment_terms_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DealerConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
    pub invoicing: InvoicingConfig,
}

impl DealerConfig {
    /// Anchors relative paths at `base`, usually the config file's directory.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.database.path.is_relative() {
            self.database.path = base.join(&self.database.path);
        }
        if let Some(dir) = self.logging.dir.as_mut().filter(|dir| dir.is_relative()) {
            *dir = base.join(&*dir);
        }
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Reads the config at `path` or `dealer.toml`; defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<DealerConfig, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(DealerConfig::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

pub fn write_config(path: &Path, config: &DealerConfig, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Encode)?;
    std::fs::write(path, contents).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{load_config, write_config, ConfigError, DealerConfig};
    use rust_decimal::Decimal;
    use std::path::{Path, PathBuf};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, DealerConfig::default());
        assert_eq!(config.invoicing.payment_terms_days, 30);
        assert_eq!(config.dashboard.warranty_window_days, 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealer.toml");
        std::fs::write(
            &path,
            "[invoicing]\ndefault_vat_rate = \"5.5\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.invoicing.default_vat_rate, Decimal::new(55, 1));
        assert_eq!(config.invoicing.payment_terms_days, 30);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.database, Default::default());
    }

    #[test]
    fn write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealer.toml");
        let mut config = DealerConfig::default();
        write_config(&path, &config, false).unwrap();

        config.dashboard.warranty_window_days = 60;
        let error = write_config(&path, &config, false).unwrap_err();
        assert!(matches!(error, ConfigError::AlreadyExists(_)));

        write_config(&path, &config, true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealer.toml");
        std::fs::write(&path, "[database\npath = 1").unwrap();
        let error = load_config(Some(&path)).unwrap_err();
        assert!(error.to_string().contains("dealer.toml"));
    }

    #[test]
    fn resolve_paths_only_touches_relative_entries() {
        let mut config = DealerConfig::default();
        config.logging.dir = Some(PathBuf::from("/var/log/dealer"));
        let resolved = config.resolve_paths(Path::new("/srv/garage"));
        assert_eq!(
            resolved.database.path,
            PathBuf::from("/srv/garage/.dealer/dealer.db")
        );
        assert_eq!(resolved.logging.dir, Some(PathBuf::from("/var/log/dealer")));
    }
}
