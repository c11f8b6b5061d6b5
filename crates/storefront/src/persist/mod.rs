//! Durable client-side storage for the cart and the customer session.
//!
//! Each piece of state lives in a named slot holding one JSON document.
//! Reads and writes are best-effort: a missing, unreadable or corrupt slot
//! loads as the caller's initial value, and a failed write is logged and
//! dropped. Nothing here ever fails the caller.

mod backends;

pub use backends::{FileStorage, MemoryStorage, UnavailableStorage};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Slot names used by the storefront.
pub mod keys {
    /// Cart ledger slot.
    pub const CART: &str = "__cart__";
    /// Customer session slot.
    pub const SESSION: &str = "__azx__";
}

/// Errors a storage backend can report.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is not available in this context.
    #[error("storage unavailable")]
    Unavailable,

    /// Slot name cannot be used by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Reading or writing the slot failed.
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// A key/value store of JSON strings.
///
/// Implementations are synchronous: a write completes before the dispatch that
/// triggered it returns.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read a slot. `Ok(None)` when the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Load a slot, falling back to `initial` when it is absent or unusable.
pub fn load<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &str, initial: T) -> T {
    let raw = match backend.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "Storage slot empty, using initial value");
            return initial;
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read storage slot, using initial value");
            return initial;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Corrupt storage slot, using initial value");
            initial
        }
    }
}

/// Serialize `value` into a slot. Failures are logged, never returned.
pub fn save<T: Serialize>(backend: &dyn StorageBackend, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "Failed to serialize state for storage");
            return;
        }
    };

    if let Err(e) = backend.write(key, &raw) {
        warn!(key, error = %e, "Failed to persist state");
    }
}
