//! API handlers.

pub mod file;
pub mod folder;
pub mod metadata;
pub mod tag;

pub use file::*;
pub use folder::*;
pub use metadata::*;
pub use tag::*;

use std::sync::Arc;

use crate::file::{BlobStore, BucketService};
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Application state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Metadata database.
    pub db: SharedDatabase,
    /// Blob storage.
    pub storage: BlobStore,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, storage: BlobStore) -> Self {
        Self { db, storage }
    }

    /// Service over this state's database and blob store.
    pub fn service(&self) -> BucketService<'_> {
        BucketService::new(&self.db, &self.storage)
    }
}
