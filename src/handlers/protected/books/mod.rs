// handlers/protected/books - catalog endpoints, mounted behind jwt_auth_middleware

pub mod collection;
pub mod record;

pub use collection::{books_get, books_post};
pub use record::{book_delete, book_get, book_put};
