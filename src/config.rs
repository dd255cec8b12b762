//! Runtime configuration.
//!
//! Read from `zeta-collapse.json` in the working directory (or the path in
//! `ZETA_COLLAPSE_CONFIG`). Every field has a default, so a missing file or a
//! partial one is fine.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

pub const CONFIG_ENV: &str = "ZETA_COLLAPSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "zeta-collapse.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub simulation: SimulationConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "Riemann Collapse 3D".to_owned(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Use this step every frame instead of the measured frame time.
    pub fixed_dt: Option<f32>,
    /// Upper bound on a measured frame delta (stalls, window drags).
    pub max_frame_dt: f32,
    /// Seed for particle scattering; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            fixed_dt: None,
            max_frame_dt: 0.1,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Step to feed the simulation for a frame that really took `measured` seconds.
    pub fn frame_dt(&self, measured: f32) -> f32 {
        match self.fixed_dt {
            Some(dt) => dt,
            None => measured.clamp(0.0, self.max_frame_dt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl AppConfig {
    /// Load from the env-selected or default path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if path.exists() {
            let config = Self::from_file(&path)?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                reason: "window width and height must be at least 1".to_owned(),
            });
        }
        if !(self.simulation.max_frame_dt > 0.0) {
            return Err(ConfigError::Invalid {
                reason: "simulation.max_frame_dt must be positive".to_owned(),
            });
        }
        if let Some(dt) = self.simulation.fixed_dt {
            if !(dt > 0.0) {
                return Err(ConfigError::Invalid {
                    reason: "simulation.fixed_dt must be positive".to_owned(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.web.addr.port(), 3000);
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_json(
            r#"{ "simulation": { "fixed_dt": 0.016, "seed": 9 }, "web": { "addr": "0.0.0.0:8080" } }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.fixed_dt, Some(0.016));
        assert_eq!(config.simulation.seed, Some(9));
        assert_eq!(config.simulation.max_frame_dt, 0.1);
        assert_eq!(config.web.addr.port(), 8080);
        assert_eq!(config.window.width, 1200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_json(r#"{ "window": { "width": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = AppConfig::from_json(r#"{ "simulation": { "fixed_dt": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = AppConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn test_frame_dt() {
        let mut sim = SimulationConfig::default();
        assert_eq!(sim.frame_dt(0.02), 0.02);
        assert_eq!(sim.frame_dt(3.0), 0.1);
        assert_eq!(sim.frame_dt(-1.0), 0.0);
        sim.fixed_dt = Some(0.016);
        assert_eq!(sim.frame_dt(3.0), 0.016);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
