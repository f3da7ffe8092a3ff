//! Typed access to the sync config slot.

use tracing::warn;

use crate::error::StoreError;
use crate::store::{KeyValueStore, SYNC_SLOT};
use crate::types::SyncConfig;

/// Read the stored sync config. Never fails: unreadable or malformed state
/// yields the empty config.
pub fn get_config(store: &dyn KeyValueStore) -> SyncConfig {
    let raw = match store.get(SYNC_SLOT) {
        Ok(Some(raw)) => raw,
        Ok(None) => return SyncConfig::default(),
        Err(e) => {
            warn!(error = %e, "sync config unreadable, treating as unset");
            return SyncConfig::default();
        }
    };
    SyncConfig::from_stored(&raw).unwrap_or_else(|| {
        warn!("sync config is malformed, treating as unset");
        SyncConfig::default()
    })
}

/// Persist a sync config, trimming both fields.
pub fn set_config(store: &dyn KeyValueStore, url: &str, key: &str) -> Result<SyncConfig, StoreError> {
    let config = SyncConfig::new(url, key);
    let text = serde_json::to_string(&config).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    store.set(SYNC_SLOT, &text)?;
    Ok(config)
}
