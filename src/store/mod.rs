pub mod db;

use std::sync::Arc;

pub use db::Database;

use crate::document::Document;
use crate::error::StoreError;

/// Async facade over [`Database`].
///
/// rusqlite is blocking, so every call hops onto the blocking thread
/// pool; the handlers never hold the connection lock across an await.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn get(&self) -> Result<Document, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.get_state()).await?
    }

    pub async fn set(&self, doc: Document) -> Result<(), StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.set_state(&doc)).await?
    }
}
