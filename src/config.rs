// SPDX-License-Identifier: GPL-3.0-only

//! Persisted user preferences
//!
//! Two options survive restarts: the preferred camera and the mirror flag.
//! Values are stored as JSON text under fixed keys, the same encoding a
//! browser's local storage would hold, and read back leniently.

use crate::constants::preferences::{
    DEFAULT_IS_MIRRORED, DEFAULT_PREFERRED_CAMERA, IS_MIRRORED_KEY, PREFERRED_CAMERA_KEY,
};
use crate::errors::{AppError, AppResult};
use cosmic::cosmic_config::{self, ConfigGet, ConfigSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Key/value storage for preferences
pub trait PreferenceStore: Send + Sync {
    /// Raw stored text for `key`, if any
    fn read(&self, key: &str) -> Option<String>;

    /// Store raw text under `key`
    fn write(&self, key: &str, value: &str) -> AppResult<()>;
}

/// Shared handle to whichever store is in use
pub type SharedStore = Arc<dyn PreferenceStore>;

impl PreferenceStore for cosmic_config::Config {
    fn read(&self, key: &str) -> Option<String> {
        match self.get::<String>(key) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(key, %err, "Preference not readable, using default");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.set(key, value.to_string())
            .map_err(|e| AppError::Config(format!("{}: {}", key, e)))
    }
}

/// In-memory store, used when the config directory is unavailable
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| AppError::Config("preference store poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the application's config store, falling back to memory
pub fn open_store(app_id: &str) -> SharedStore {
    match cosmic_config::Config::new(app_id, Preferences::VERSION) {
        Ok(handler) => Arc::new(handler),
        Err(err) => {
            warn!(%err, "Failed to open config directory, preferences will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

/// The two persisted options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Device identifier of the chosen camera; empty means default-facing camera
    pub preferred_camera: String,
    /// Show the horizontally flipped view
    pub is_mirrored: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_camera: DEFAULT_PREFERRED_CAMERA.to_string(),
            is_mirrored: DEFAULT_IS_MIRRORED,
        }
    }
}

impl Preferences {
    /// Storage schema version
    pub const VERSION: u64 = 1;

    /// Read both options, applying defaults for missing or foreign values
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let preferred_camera = store
            .read(PREFERRED_CAMERA_KEY)
            .map(|raw| coerce_string(&raw))
            .unwrap_or_else(|| DEFAULT_PREFERRED_CAMERA.to_string());

        let is_mirrored = store
            .read(IS_MIRRORED_KEY)
            .and_then(|raw| coerce_bool(&raw))
            .unwrap_or(DEFAULT_IS_MIRRORED);

        debug!(preferred_camera = %preferred_camera, is_mirrored, "Loaded preferences");
        Self {
            preferred_camera,
            is_mirrored,
        }
    }

    /// Persist the preferred camera identifier
    pub fn set_preferred_camera(
        &mut self,
        store: &dyn PreferenceStore,
        device_id: &str,
    ) -> AppResult<()> {
        self.preferred_camera = device_id.to_string();
        store.write(PREFERRED_CAMERA_KEY, &serde_json::to_string(device_id)?)
    }

    /// Persist the mirror flag
    pub fn set_mirrored(&mut self, store: &dyn PreferenceStore, mirrored: bool) -> AppResult<()> {
        self.is_mirrored = mirrored;
        store.write(IS_MIRRORED_KEY, &serde_json::to_string(&mirrored)?)
    }
}

/// Accept a JSON string, or the raw text if it is not JSON
fn coerce_string(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Null) => String::new(),
        Ok(other) => other.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Accept a JSON boolean, a JSON string holding one, or bare true/false
fn coerce_bool(raw: &str) -> Option<bool> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Bool(b)) => Some(b),
        Ok(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Ok(_) => None,
        Err(_) => raw.trim().parse().ok(),
    }
}
