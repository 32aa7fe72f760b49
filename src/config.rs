use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "VISAO";

/// Categories forwarded to clients by default: people, vehicles, street furniture,
/// pets and cups.
const DEFAULT_ALLOWED_CATEGORIES: [u32; 11] = [0, 1, 2, 3, 5, 7, 9, 11, 13, 15, 41];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub server: ServerConfig,
    pub admission: AdmissionConfig,
    pub cache: CacheConfig,
    pub detection: DetectionConfig,
    pub routes: RoutesConfig,
    pub max_in_flight_frames: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    /// Number of leading payload characters fed to the fingerprint. `None`
    /// hashes the whole payload.
    pub fingerprint_prefix_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub allowed_categories: Vec<u32>,
    pub max_dimension: u32,
    /// Defaults to the number of available cores.
    pub worker_count: Option<usize>,
    pub slow_frame_threshold_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub table_path: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            admission: AdmissionConfig::default(),
            cache: CacheConfig::default(),
            detection: DetectionConfig::default(),
            routes: RoutesConfig::default(),
            max_in_flight_frames: 32,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            fingerprint_prefix_chars: Some(1000),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            allowed_categories: DEFAULT_ALLOWED_CATEGORIES.to_vec(),
            max_dimension: 640,
            worker_count: None,
            slow_frame_threshold_ms: 500,
        }
    }
}

impl AdmissionConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl DetectionConfig {
    pub fn slow_frame_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_frame_threshold_ms)
    }

    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count
            .filter(|count| *count > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}

impl Configuration {
    /// Layers an optional TOML file and `VISAO__SECTION__KEY` environment
    /// variables over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("visao").required(false));
        }
        let configuration = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Configuration>()?;
        Ok(configuration)
    }
}
