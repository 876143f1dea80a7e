//! Storage

use std::{cell::RefCell, fmt, fs, io, path::PathBuf, rc::Rc};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cart::CartLineItem, products::ProductSnapshot, tenants::TenantId};

/// Namespace key under which cart lines are persisted.
pub const STORAGE_KEY: &str = "handcart.lines.v1";

/// Errors from storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Durable facts for one cart line.
///
/// Deliberately a separate type from [`CartLineItem`]: it carries no derived
/// monetary fields, so stale prices can never be read back. Pricing is
/// re-derived from the product snapshot and the current tier list on every
/// rehydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLine {
    /// Tenant owning the line.
    pub tenant: TenantId,

    /// Product snapshot captured at add time.
    pub product: ProductSnapshot,

    /// Units in the line.
    pub quantity: u32,

    /// When the line was first added.
    pub added_at: Timestamp,

    /// When the line was last mutated.
    pub updated_at: Timestamp,
}

impl From<&CartLineItem> for StoredLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            tenant: line.tenant().clone(),
            product: line.product().clone(),
            quantity: line.quantity(),
            added_at: line.added_at(),
            updated_at: line.updated_at(),
        }
    }
}

/// A durable key-value store holding the serialized cart payload under
/// [`STORAGE_KEY`].
pub trait CartStorage: fmt::Debug {
    /// Returns the stored payload, or `None` when nothing has been written.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Stores `payload`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot be written.
    fn save(&mut self, payload: &str) -> Result<(), StorageError>;
}

/// In-process key-value backend.
///
/// Clones share the same underlying map, so a payload written through one
/// handle is visible through the others — which is how tests model a cart
/// surviving a "restart".
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<FxHashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(STORAGE_KEY).cloned())
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(STORAGE_KEY.to_string(), payload.to_string());
        Ok(())
    }
}

/// File-backed key-value backend.
///
/// The payload lives in a single JSON file named after [`STORAGE_KEY`] inside
/// the given directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates a backend storing the payload under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(format!("{STORAGE_KEY}.json")),
        }
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        fs::write(&self.path, payload)?;
        Ok(())
    }
}
