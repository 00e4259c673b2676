//! Durable key-value settings.
//!
//! Values are JSON documents stored under fixed string keys, the same shape a
//! browser's local storage would hold. Reads and writes never fail from the
//! caller's point of view: errors are logged and the in-memory value wins.

pub mod config;

use anyhow::Context;
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub use config::AppConfig;

/// Storage key of the custom exercise's duration map
pub const CUSTOM_DURATIONS_KEY: &str = "breathing.custom-durations";

pub fn project_dirs() -> Option<ProjectDirs> {
	ProjectDirs::from("", "", "breathdesk")
}

/// Key-value port the breathing session persists through
pub trait SettingsStore {
	fn load(&self, key: &str) -> anyhow::Result<Option<Value>>;
	fn save(&mut self, key: &str, value: Value) -> anyhow::Result<()>;
}

/// Read `key`, falling back to `default` when absent, unreadable or malformed
pub fn get_or<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str, default: T) -> T {
	let value = match store.load(key) {
		Ok(Some(value)) => value,
		Ok(None) => return default,
		Err(e) => {
			log::warn!("Failed to read setting '{}': {:#}", key, e);
			return default;
		}
	};
	match serde_json::from_value(value) {
		Ok(parsed) => parsed,
		Err(e) => {
			log::warn!("Ignoring malformed setting '{}': {}", key, e);
			default
		}
	}
}

/// Write `value` under `key`. Failures are logged and otherwise ignored.
pub fn set<T: Serialize>(store: &mut dyn SettingsStore, key: &str, value: &T) {
	let result = serde_json::to_value(value)
		.context("serializing setting")
		.and_then(|json| store.save(key, json));
	if let Err(e) = result {
		log::warn!("Failed to persist setting '{}': {:#}", key, e);
	}
}

/// Settings kept only for the lifetime of the process
#[derive(Default)]
pub struct MemoryStore {
	values: HashMap<String, Value>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SettingsStore for MemoryStore {
	fn load(&self, key: &str) -> anyhow::Result<Option<Value>> {
		Ok(self.values.get(key).cloned())
	}

	fn save(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
		self.values.insert(key.to_owned(), value);
		Ok(())
	}
}

/// One JSON object on disk, rewritten on every save
pub struct JsonFileStore {
	path: PathBuf,
	values: Map<String, Value>,
}

impl JsonFileStore {
	/// Open the store at `path`. A missing file starts empty.
	pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
		let path = path.into();
		let values = if path.exists() {
			let raw = fs::read_to_string(&path)
				.with_context(|| format!("reading {}", path.display()))?;
			serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
		} else {
			Map::new()
		};
		log::info!("Settings store at {} ({} keys)", path.display(), values.len());
		Ok(Self { path, values })
	}

	/// Store in the platform data directory
	pub fn open_default() -> anyhow::Result<Self> {
		let dirs = project_dirs().context("no home directory for settings")?;
		Self::open(dirs.data_dir().join("settings.json"))
	}

	fn flush(&self) -> anyhow::Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)
				.with_context(|| format!("creating {}", parent.display()))?;
		}
		let raw = serde_json::to_string_pretty(&self.values)?;
		fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
	}
}

impl SettingsStore for JsonFileStore {
	fn load(&self, key: &str) -> anyhow::Result<Option<Value>> {
		Ok(self.values.get(key).cloned())
	}

	fn save(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
		self.values.insert(key.to_owned(), value);
		self.flush()
	}
}

/// Durable store if the data directory is usable, memory otherwise
pub fn open_store() -> Box<dyn SettingsStore> {
	match JsonFileStore::open_default() {
		Ok(store) => Box::new(store),
		Err(e) => {
			log::warn!("Settings will not persist this session: {:#}", e);
			Box::new(MemoryStore::new())
		}
	}
}
