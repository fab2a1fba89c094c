//! Request and response bodies shared by the HTTP handlers and the client.

pub mod auth;
pub mod books;

pub use auth::{AuthResponse, Credentials};
pub use books::{BookPage, CreateBookRequest, ListBooksQuery, NumericInput, Pagination, UpdateBookRequest};
