//! Configuration for the intake service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FormatTag;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "GOAL_INTAKE_CONFIG";

/// Main intake service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload validation limits
    pub intake: IntakeLimits,
    /// Record and blob storage locations
    pub storage: StorageConfig,
    /// Processing configuration
    pub processing: ProcessingConfig,
    /// Failed-record retention
    pub retention: RetentionConfig,
}

impl IntakeConfig {
    /// Load from the file named by `GOAL_INTAKE_CONFIG`, or use defaults
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Read a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML; missing sections and fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.intake.max_file_size == 0 {
            return Err(Error::Config("intake.max_file_size must be positive".to_string()));
        }
        if self.intake.allowed_formats.is_empty() {
            return Err(Error::Config("intake.allowed_formats must not be empty".to_string()));
        }
        if self.processing.queue_capacity == 0 {
            return Err(Error::Config("processing.queue_capacity must be positive".to_string()));
        }
        if self.processing.parallel_jobs == Some(0) {
            return Err(Error::Config("processing.parallel_jobs must be positive".to_string()));
        }
        if self.retention.sweep_interval_secs == 0 {
            return Err(Error::Config("retention.sweep_interval_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Limits checked at intake, before any record exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeLimits {
    /// Maximum accepted file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Accepted format tags
    pub allowed_formats: Vec<FormatTag>,
}

impl IntakeLimits {
    pub fn allows(&self, tag: FormatTag) -> bool {
        self.allowed_formats.contains(&tag)
    }
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allowed_formats: FormatTag::ALL.to_vec(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding ingestion records
    pub database_path: PathBuf,
    /// Directory holding uploaded bytes
    pub blob_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use absolute path to avoid depending on the working directory
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
            .join("goal-intake");

        Self {
            database_path: base.join("intake.db"),
            blob_dir: base.join("uploads"),
        }
    }
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files parsed concurrently (default: CPU count, max 8)
    pub parallel_jobs: Option<usize>,
    /// Pending jobs the queue buffers before submit waits
    pub queue_capacity: usize,
}

impl ProcessingConfig {
    /// Concurrency after applying the CPU-count default
    pub fn effective_parallel_jobs(&self) -> usize {
        self.parallel_jobs
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: None, // Auto-detect from CPU count
            queue_capacity: 1000,
        }
    }
}

/// Retention configuration for failed records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Age after which failed records are removed (default: 24h)
    pub failed_max_age_hours: u64,
    /// Time between sweeps in seconds (default: 1h)
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.failed_max_age_hours.min(i64::MAX as u64) as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            failed_max_age_hours: 24,
            sweep_interval_secs: 3600,
        }
    }
}
