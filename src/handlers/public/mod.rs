// handlers/public - endpoints that do not require a bearer token

pub mod auth;
