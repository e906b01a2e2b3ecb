use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MAX_THREADS_PER_BLOCK: usize = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Host,
    Cuda,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub backend: Backend,
    pub device_ordinal: usize,
    pub max_threads_per_block: usize,
    pub memory_limit_bytes: Option<usize>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Host,
            device_ordinal: 0,
            max_threads_per_block: DEFAULT_MAX_THREADS_PER_BLOCK,
            memory_limit_bytes: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDeviceConfig {
    backend: Option<Backend>,
    device_ordinal: Option<usize>,
    max_threads_per_block: Option<usize>,
    memory_limit_bytes: Option<usize>,
}

impl DeviceConfig {
    pub fn builder() -> DeviceConfigBuilder {
        DeviceConfigBuilder::new()
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let partial: PartialDeviceConfig =
            toml::from_str(content).map_err(|e| ConfigError::Toml {
                path: origin.to_string(),
                source: e,
            })?;

        let mut builder = DeviceConfigBuilder::new();
        if let Some(backend) = partial.backend {
            builder = builder.backend(backend);
        }
        if let Some(ordinal) = partial.device_ordinal {
            builder = builder.device_ordinal(ordinal);
        }
        if let Some(threads) = partial.max_threads_per_block {
            builder = builder.max_threads_per_block(threads);
        }
        if let Some(limit) = partial.memory_limit_bytes {
            builder = builder.memory_limit_bytes(limit);
        }
        builder.build()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }
}

#[derive(Default)]
pub struct DeviceConfigBuilder {
    backend: Option<Backend>,
    device_ordinal: Option<usize>,
    max_threads_per_block: Option<usize>,
    memory_limit_bytes: Option<usize>,
}

impl DeviceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn device_ordinal(mut self, ordinal: usize) -> Self {
        self.device_ordinal = Some(ordinal);
        self
    }
    pub fn max_threads_per_block(mut self, threads: usize) -> Self {
        self.max_threads_per_block = Some(threads);
        self
    }
    pub fn memory_limit_bytes(mut self, limit: usize) -> Self {
        self.memory_limit_bytes = Some(limit);
        self
    }

    pub fn build(self) -> Result<DeviceConfig, ConfigError> {
        let max_threads_per_block = self
            .max_threads_per_block
            .unwrap_or(DEFAULT_MAX_THREADS_PER_BLOCK);
        if max_threads_per_block == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_threads_per_block",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(DeviceConfig {
            backend: self.backend.unwrap_or_default(),
            device_ordinal: self.device_ordinal.unwrap_or(0),
            max_threads_per_block,
            memory_limit_bytes: self.memory_limit_bytes,
        })
    }
}
