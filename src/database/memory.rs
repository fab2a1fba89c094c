use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filter::Filter;

use super::manager::DatabaseError;
use super::models::{Book, BookChanges, NewBook, NewUser, User};
use super::store::{BookStore, UserStore};

/// In-process store backing both users and books.
///
/// Evaluates the same `Filter` predicates as the Postgres store, so list
/// queries behave identically. Used for tests and `STORAGE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    books: RwLock<HashMap<Uuid, Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::Conflict(format!("email '{}' already registered", user.email)));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: NewBook) -> Result<Book, DatabaseError> {
        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            category: book.category,
            price: book.price,
            rating: book.rating,
            published_date: book.published_date,
            user_id: book.user_id,
            created_at: now,
            updated_at: now,
        };
        self.books.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let books = self.books.read().await;
        Ok(filter.count_matching(books.values()) as i64)
    }

    async fn select(&self, filter: &Filter) -> Result<Vec<Book>, DatabaseError> {
        let books = self.books.read().await;
        Ok(filter.apply(books.values()))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Book>, DatabaseError> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: BookChanges) -> Result<Option<Book>, DatabaseError> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(book);
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.books.write().await.remove(&id).is_some())
    }
}
