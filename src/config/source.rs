//! Configuration sources.
//!
//! A source owns the current configuration behind an `ArcSwap` so readers
//! always get a consistent snapshot and the cloud override can replace it
//! atomically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{load_config, save_config, ConfigError};
use crate::config::schema::NodeConfig;
use crate::config::validation::validate_config;

/// Where the node reads (and occasionally writes back) its configuration.
pub trait ConfigSource: Send + Sync {
    /// Reload configuration from the backing store, validate it and make it current.
    fn load(&self) -> Result<Arc<NodeConfig>, ConfigError>;

    /// Replace the current configuration and persist it.
    fn store(&self, config: NodeConfig) -> Result<(), ConfigError>;

    /// Current snapshot.
    fn current(&self) -> Arc<NodeConfig>;
}

/// TOML file backed configuration.
pub struct FileConfigSource {
    path: PathBuf,
    current: ArcSwap<NodeConfig>,
}

impl FileConfigSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            current: ArcSwap::from_pointee(NodeConfig::default()),
        }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<Arc<NodeConfig>, ConfigError> {
        let config = Arc::new(load_config(&self.path)?);
        self.current.store(config.clone());
        tracing::debug!(path = ?self.path, "Configuration loaded");
        Ok(config)
    }

    fn store(&self, config: NodeConfig) -> Result<(), ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        save_config(&self.path, &config)?;
        self.current.store(Arc::new(config));
        Ok(())
    }

    fn current(&self) -> Arc<NodeConfig> {
        self.current.load_full()
    }
}

/// In-memory configuration, for embedding and tests.
pub struct StaticConfigSource {
    current: ArcSwap<NodeConfig>,
}

impl StaticConfigSource {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<Arc<NodeConfig>, ConfigError> {
        let config = self.current.load_full();
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn store(&self, config: NodeConfig) -> Result<(), ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        self.current.store(Arc::new(config));
        Ok(())
    }

    fn current(&self) -> Arc<NodeConfig> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.toml");
        std::fs::write(&path, "default_enabled = false").unwrap();

        let source = FileConfigSource::new(&path);
        let loaded = source.load().unwrap();
        assert_eq!(loaded.default_enabled, Some(false));

        let mut updated = (*loaded).clone();
        updated.default_enabled = Some(true);
        source.store(updated).unwrap();

        assert_eq!(source.current().default_enabled, Some(true));
        assert_eq!(load_config(&path).unwrap().default_enabled, Some(true));
    }

    #[test]
    fn test_static_source_rejects_invalid() {
        let source = StaticConfigSource::new(NodeConfig {
            tcp_server_port: 0,
            ..Default::default()
        });
        assert!(source.load().is_err());
        assert!(source.store(NodeConfig::default()).is_ok());
        assert!(source.load().is_ok());
    }
}
