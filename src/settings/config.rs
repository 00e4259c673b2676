use crate::types::Exercise;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Startup configuration read from `config.toml`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Exercise selected when the breathing window first opens
	pub default_exercise: Exercise,
	pub start_muted: bool,
	pub chime: ChimeConfig,
}

/// Phase-change chime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeConfig {
	pub frequency_hz: f32,
	pub duration_ms: u32,
	/// 0.0 - 1.0
	pub volume: f32,
}

impl Default for ChimeConfig {
	fn default() -> Self {
		Self {
			frequency_hz: 528.0,
			duration_ms: 900,
			volume: 0.4,
		}
	}
}

impl AppConfig {
	pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
		let mut config: AppConfig = toml::from_str(raw)?;
		config.chime.volume = config.chime.volume.clamp(0.0, 1.0);
		Ok(config)
	}

	pub fn load_from(path: &Path) -> anyhow::Result<Self> {
		if !path.exists() {
			log::debug!("No config at {}, using defaults", path.display());
			return Ok(Self::default());
		}
		let raw =
			fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
		Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))
	}

	/// Config from the platform config directory, defaults on any failure
	pub fn load() -> Self {
		let Some(dirs) = super::project_dirs() else {
			log::warn!("No home directory, using default config");
			return Self::default();
		};
		let path = dirs.config_dir().join("config.toml");
		match Self::load_from(&path) {
			Ok(config) => {
				log::info!("Loaded config: {:?}", config);
				config
			}
			Err(e) => {
				log::warn!("Invalid config, using defaults: {:#}", e);
				Self::default()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_file_is_all_defaults() {
		assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let config = AppConfig::from_toml(
			r#"
default_exercise = "four-seven-eight"
start_muted = true

[chime]
volume = 3.0
"#,
		)
		.unwrap();
		assert_eq!(config.default_exercise, Exercise::FourSevenEight);
		assert!(config.start_muted);
		assert_eq!(config.chime.volume, 1.0);
		assert_eq!(config.chime.frequency_hz, ChimeConfig::default().frequency_hz);
	}

	#[test]
	fn unknown_exercise_is_rejected() {
		assert!(AppConfig::from_toml(r#"default_exercise = "yoga""#).is_err());
	}

	#[test]
	fn missing_file_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
		assert_eq!(config, AppConfig::default());
	}
}
