//! Error types for configuration loading and fight runs

use thiserror::Error;

/// Input problems caught at a simulator's entry point, before any tick runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("Missing rangedWeapon (damage, delay) or arrow (damage)")]
    MissingRangedGear,

    #[error("Ranged weapon + arrow damage must be at least 1")]
    RangedDamageTooLow,

    #[error("fight duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
}

/// Failures while reading a configuration file or string.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
