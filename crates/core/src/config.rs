//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Service configuration for the storage engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Time-to-live for staged upload chunks, in seconds.
    #[serde(default = "default_temp_chunk_ttl_secs")]
    pub temp_chunk_ttl_secs: u64,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Verify the caller-declared file size against the staged chunk sum at
    /// merge time. The default trusts the declared size, matching the
    /// documented contract; enabling this is the stricter validation mode.
    #[serde(default)]
    pub verify_declared_size: bool,
    /// File extensions rejected at upload validation.
    #[serde(default = "default_denied_extensions")]
    pub denied_extensions: Vec<String>,
}

impl ServiceConfig {
    /// Get the staged-chunk TTL as a Duration.
    pub fn temp_chunk_ttl(&self) -> Duration {
        let secs = i64::try_from(self.temp_chunk_ttl_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.temp_chunk_ttl_secs == 0 {
            return Err("temp_chunk_ttl_secs must be positive".to_string());
        }
        if self.max_file_size == 0 {
            return Err("max_file_size must be positive".to_string());
        }
        for ext in &self.denied_extensions {
            if !ext.starts_with('.') {
                return Err(format!("denied extension must start with '.': {ext}"));
            }
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            temp_chunk_ttl_secs: default_temp_chunk_ttl_secs(),
            max_file_size: default_max_file_size(),
            verify_declared_size: false,
            denied_extensions: default_denied_extensions(),
        }
    }
}

fn default_temp_chunk_ttl_secs() -> u64 {
    crate::DEFAULT_TEMP_CHUNK_TTL_SECS
}

fn default_max_file_size() -> u64 {
    crate::DEFAULT_MAX_FILE_SIZE
}

fn default_denied_extensions() -> Vec<String> {
    [".exe", ".bat", ".cmd", ".scr", ".pif", ".com"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Blob storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for stored parts.
        path: PathBuf,
        /// Maximum size of a single stored object; larger payloads are
        /// subdivided into multiple parts.
        #[serde(default = "default_max_part_size")]
        max_part_size: u64,
    },
}

fn default_max_part_size() -> u64 {
    crate::DEFAULT_MAX_PART_SIZE
}

impl StorageConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { max_part_size, .. } => {
                if *max_part_size == 0 {
                    return Err("max_part_size must be positive".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.temp_chunk_ttl_secs, 86_400);
        assert_eq!(config.temp_chunk_ttl(), Duration::hours(24));
        assert!(!config.verify_declared_size);
        assert!(config.denied_extensions.contains(&".exe".to_string()));
        config.validate().unwrap();
    }

    #[test]
    fn test_service_config_rejects_bad_extension() {
        let config = ServiceConfig {
            denied_extensions: vec!["exe".to_string()],
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_config_deserialize_with_defaults() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"type": "filesystem", "path": "/tmp/depot"}"#).unwrap();
        let StorageConfig::Filesystem { max_part_size, .. } = config;
        assert_eq!(max_part_size, crate::DEFAULT_MAX_PART_SIZE);
    }

    #[test]
    fn test_storage_config_rejects_zero_part_size() {
        let config = StorageConfig::Filesystem {
            path: PathBuf::from("/tmp/depot"),
            max_part_size: 0,
        };
        assert!(config.validate().is_err());
    }
}
