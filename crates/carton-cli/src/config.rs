//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use carton_domain::AuthorityCatalog;
use carton_gatekeeper::ValidationConfig;
use carton_ingest::{AttributionConfig, IngestConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration, read from `carton.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Authority catalog file (JSON)
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// Snapshot file holding the graph and provenance
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,

    /// Validation rules
    #[serde(default)]
    pub gatekeeper: ValidationConfig,

    /// Pipeline settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Leaf attribution keywords and caps
    #[serde(default)]
    pub attribution: AttributionConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl Config {
    /// Load configuration from file, or the defaults when it does not exist.
    ///
    /// Relative catalog and snapshot paths are taken relative to the
    /// directory holding the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.ingest.validate().map_err(CliError::Config)?;
        config.attribution.validate().map_err(CliError::Config)?;
        if let Some(base) = path.parent() {
            config.catalog = resolve(base, &config.catalog);
            config.snapshot = resolve(base, &config.snapshot);
        }
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Read the authority catalog this configuration points at.
    pub fn load_catalog(&self) -> Result<AuthorityCatalog> {
        if !self.catalog.exists() {
            return Err(CliError::Config(format!(
                "Catalog file {} not found",
                self.catalog.display()
            )));
        }
        let contents = fs::read_to_string(&self.catalog)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            snapshot: default_snapshot(),
            gatekeeper: ValidationConfig::default(),
            ingest: IngestConfig::default(),
            attribution: AttributionConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Text,
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn default_catalog() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("carton-snapshot.json")
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog, PathBuf::from("catalog.json"));
        assert!(config.gatekeeper.validate_catalog_references);
        assert!(config.settings.color);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("carton.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carton.toml");

        let mut config = Config::default();
        config.ingest.max_batch_size = 50;
        config.gatekeeper.block_on_warnings = true;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.ingest.max_batch_size, 50);
        assert!(loaded.gatekeeper.block_on_warnings);
        assert_eq!(loaded.catalog, dir.path().join("catalog.json"));
        assert_eq!(loaded.snapshot, dir.path().join("carton-snapshot.json"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carton.toml");
        fs::write(&path, "snapshot = \"/var/lib/carton/graph.json\"\n\n[ingest]\nmax_concurrent_jurisdictions = 2\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.snapshot, PathBuf::from("/var/lib/carton/graph.json"));
        assert_eq!(config.ingest.max_concurrent_jurisdictions, 2);
        assert_eq!(config.ingest.max_batch_size, IngestConfig::default().max_batch_size);
    }

    #[test]
    fn test_invalid_ingest_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carton.toml");
        fs::write(&path, "[ingest]\nmax_batch_size = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(CliError::Config(_))));

        fs::write(&path, "[attribution.family_keywords]\nXYZ = [\"audit\"]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            catalog: dir.path().join("absent.json"),
            ..Config::default()
        };
        assert!(matches!(config.load_catalog(), Err(CliError::Config(_))));
    }
}
