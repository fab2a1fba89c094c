pub mod book;
pub mod user;

pub use book::{Book, BookChanges, NewBook};
pub use user::{NewUser, User};
