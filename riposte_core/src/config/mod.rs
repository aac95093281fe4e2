//! Configuration loading from TOML (and JSON) files

mod augments;
mod constants;
mod waves;

pub use augments::{default_augments, parse_augment_table, AugmentTable};
pub use constants::{
    BalanceConstants, DefenseConstants, PlayerConstants, PostureConstants, ProgressionConstants,
    SkillConstants, SkillCost, StatisticalConstants, TimingConstants,
};
pub use waves::{default_waves, parse_wave_table, MonsterTemplate, WaveDef, WaveTable};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Load a JSON string and deserialize it
pub fn parse_json<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = serde_json::from_str(content)?;
    Ok(config)
}

/// Load a config file, picking the format from its extension (`.json` or TOML)
pub fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&fs::read_to_string(path)?),
        _ => load_toml(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_file_picks_format_by_extension() {
        let dir = std::env::temp_dir().join(format!("riposte_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("timing.toml");
        fs::write(&toml_path, "perfect_window = 9.0\n").unwrap();
        let timing: TimingConstants = load_file(&toml_path).unwrap();
        assert!((timing.perfect_window - 9.0).abs() < f64::EPSILON);

        let json_path = dir.join("timing.json");
        fs::write(&json_path, r#"{"perfect_window": 4.0}"#).unwrap();
        let timing: TimingConstants = load_file(&json_path).unwrap();
        assert!((timing.perfect_window - 4.0).abs() < f64::EPSILON);

        assert!(matches!(
            load_file::<TimingConstants>(&dir.join("missing.toml")),
            Err(ConfigError::IoError(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
