use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::filter::Filter;

use super::manager::{DatabaseError, DatabaseManager};
use super::memory::MemoryStore;
use super::models::{Book, BookChanges, NewBook, NewUser, User};
use super::postgres::{PgBookStore, PgUserStore};

/// Persists user identities
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A duplicate email fails with `DatabaseError::Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}

/// Persists book records
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: NewBook) -> Result<Book, DatabaseError>;

    /// Rows matching the filter's predicates, ignoring its page window
    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError>;

    /// Rows matching the filter, ordered and windowed
    async fn select(&self, filter: &Filter) -> Result<Vec<Book>, DatabaseError>;

    async fn find(&self, id: Uuid) -> Result<Option<Book>, DatabaseError>;

    /// Apply `changes` in a single write. `None` when the id does not exist.
    async fn update(&self, id: Uuid, changes: BookChanges) -> Result<Option<Book>, DatabaseError>;

    /// Hard delete. `false` when the id does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// The stores the services run against, plus what is needed to probe them
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    manager: Option<DatabaseManager>,
}

impl Storage {
    /// Process-local storage; contents vanish with the process
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            books: store,
            manager: None,
        }
    }

    pub fn postgres(manager: DatabaseManager) -> Self {
        let pool = manager.pool().clone();
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            books: Arc::new(PgBookStore::new(pool)),
            manager: Some(manager),
        }
    }

    /// Open the configured backend, bootstrapping the Postgres schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::memory()),
            StorageBackend::Postgres => {
                let manager = DatabaseManager::connect(config).await?;
                manager.bootstrap_schema().await?;
                Ok(Self::postgres(manager))
            }
        }
    }

    pub fn backend(&self) -> StorageBackend {
        if self.manager.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.manager {
            Some(manager) => manager.health_check().await,
            None => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Some(manager) = &self.manager {
            manager.close().await;
        }
    }
}
