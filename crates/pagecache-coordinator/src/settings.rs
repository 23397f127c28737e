//! Coordinator settings loaded from file and environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use pagecache_store::{FileStorage, MemoryStorage, SessionStorage, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of environment overrides, e.g. `PAGECACHE__TTL_SECONDS=60`.
pub const ENV_PREFIX: &str = "PAGECACHE";

/// Error al cargar o validar la configuracion.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to open snapshot storage: {0}")]
    Storage(#[from] StorageError),
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Medio donde se persisten los snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    /// Proceso local, se pierde al reiniciar.
    #[default]
    Memory,
    /// Un archivo por key bajo `snapshot.path`.
    File,
    /// Sin persistencia; toda lectura es un miss.
    Disabled,
}

/// Configuracion del snapshot store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub backend: SnapshotBackend,
    /// Directorio para el backend `file`.
    pub path: Option<PathBuf>,
    /// Cuota en bytes para el backend `memory`.
    pub quota_bytes: Option<usize>,
}

/// Configuracion del coordinador.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// TTL en segundos (default: 300 = 5 minutos)
    pub ttl_seconds: u64,
    /// Maximo numero de entries en memoria (default: 1000)
    pub max_capacity: u64,
    /// Cargas simultaneas durante un preload (default: 3)
    pub preload_concurrency: usize,
    /// Namespace de las keys de storage (default: "pagecache")
    pub namespace: String,
    pub snapshot: SnapshotSettings,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_capacity: 1_000,
            preload_concurrency: 3,
            namespace: pagecache_store::DEFAULT_NAMESPACE.to_string(),
            snapshot: SnapshotSettings::default(),
        }
    }
}

impl CoordinatorSettings {
    /// Loads defaults, then the optional file, then `PAGECACHE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserializes and validates an already built [`Config`].
    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ttl_seconds == 0 {
            return Err(SettingsError::invalid("ttl_seconds", "must be greater than zero"));
        }
        if self.preload_concurrency == 0 {
            return Err(SettingsError::invalid(
                "preload_concurrency",
                "must be at least 1",
            ));
        }
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(SettingsError::invalid(
                "namespace",
                "must be non-empty and must not contain ':'",
            ));
        }
        if self.snapshot.backend == SnapshotBackend::File && self.snapshot.path.is_none() {
            return Err(SettingsError::invalid(
                "snapshot.path",
                "required when snapshot.backend is 'file'",
            ));
        }
        Ok(())
    }

    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Opens the configured storage medium.
    pub fn open_storage(&self) -> Result<Arc<dyn SessionStorage>, SettingsError> {
        let storage: Arc<dyn SessionStorage> = match self.snapshot.backend {
            SnapshotBackend::Memory => match self.snapshot.quota_bytes {
                Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
                None => Arc::new(MemoryStorage::new()),
            },
            SnapshotBackend::File => {
                let path = self
                    .snapshot
                    .path
                    .as_ref()
                    .ok_or_else(|| SettingsError::invalid("snapshot.path", "missing"))?;
                Arc::new(FileStorage::open(path)?)
            },
            SnapshotBackend::Disabled => Arc::new(MemoryStorage::disabled()),
        };
        Ok(storage)
    }
}
