pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Book, BookChanges, NewBook, NewUser, User};
pub use store::{BookStore, Storage, UserStore};
