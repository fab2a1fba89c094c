// handlers/protected - endpoints that require a valid bearer token

pub mod books;
