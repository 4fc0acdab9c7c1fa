//! Durable flags
//!
//! The draw keeps all of its state in memory. The only thing that survives
//! a reload is whether first-run setup has been completed, stored in
//! LocalStorage on the web.

use std::collections::HashMap;

/// LocalStorage key marking that setup has run
pub const SETUP_FLAG_KEY: &str = "hasSetupBefore";

/// Boolean key/value store
pub trait FlagStore {
    fn get(&self, key: &str) -> bool;
    fn set(&mut self, key: &str, value: bool);
}

/// True until setup has been saved once
pub fn needs_setup(store: &impl FlagStore) -> bool {
    !store.get(SETUP_FLAG_KEY)
}

pub fn mark_setup_complete(store: &mut impl FlagStore) {
    store.set(SETUP_FLAG_KEY, true);
    log::info!("Setup marked complete");
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    flags: HashMap<String, bool>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }
}

/// LocalStorage-backed store (WASM only). Missing storage reads as unset.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageFlagStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageFlagStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl FlagStore for LocalStorageFlagStore {
    fn get(&self, key: &str) -> bool {
        Self::storage()
            .and_then(|s| s.get_item(key).ok().flatten())
            .is_some_and(|v| v == "true")
    }

    fn set(&mut self, key: &str, value: bool) {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, flag {} not saved", key);
            return;
        };
        let result = if value {
            storage.set_item(key, "true")
        } else {
            storage.remove_item(key)
        };
        if let Err(e) = result {
            log::warn!("Failed to write flag {}: {:?}", key, e);
        }
    }
}
