use std::sync::Arc;

use thiserror::Error;

use crate::auth::{JwtError, PasswordError, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::Storage;
use crate::services::{AuthService, CatalogService};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Everything a request handler needs, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AuthService>,
    pub catalog: Arc<CatalogService>,
    pub storage: Storage,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Storage) -> Result<Self, StateError> {
        let tokens = Arc::new(TokenService::from_config(&config.security)?);
        let hasher = PasswordHasher::new(config.security.bcrypt_cost)?;

        let auth = AuthService::new(storage.users.clone(), tokens.clone(), hasher);
        let catalog = CatalogService::new(storage.books.clone(), &config.api, &config.filter);

        Ok(Self {
            config: Arc::new(config),
            tokens,
            auth: Arc::new(auth),
            catalog: Arc::new(catalog),
            storage,
        })
    }
}
