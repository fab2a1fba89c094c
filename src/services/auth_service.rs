use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{AuthResponse, Credentials};
use crate::auth::{PasswordHasher, TokenService};
use crate::database::{DatabaseError, NewUser, User, UserStore};

use super::error::{FieldErrors, ServiceError};

/// Signup and login against the credential store
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, hasher: PasswordHasher) -> Self {
        Self { users, tokens, hasher }
    }

    /// Register a new user and issue a token for them
    pub async fn signup(&self, credentials: Credentials) -> Result<AuthResponse, ServiceError> {
        let (email, password) = require_credentials(credentials)?;

        let password_hash = self.hasher.hash(&password)?;
        // The unique constraint decides; a racing duplicate lands here as well
        let user = match self.users.insert(NewUser { email, password_hash }).await {
            Ok(user) => user,
            Err(DatabaseError::Conflict(_)) => {
                return Err(ServiceError::Conflict("Email already in use".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!("Registered user {}", user.id);
        self.respond(user)
    }

    /// Check a password and issue a token. Unknown email and wrong password fail the same way.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse, ServiceError> {
        let (email, password) = require_credentials(credentials)?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.verify_dummy(&password);
            warn!("Rejected login for unregistered email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(&password, &user.password_hash)? {
            warn!("Rejected login for user {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        self.respond(user)
    }

    fn respond(&self, user: User) -> Result<AuthResponse, ServiceError> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthResponse {
            id: user.id,
            email: user.email,
            token,
        })
    }
}

fn require_credentials(credentials: Credentials) -> Result<(String, String), ServiceError> {
    let mut errors = FieldErrors::new();
    let email = credentials.email.filter(|e| !e.is_empty());
    let password = credentials.password.filter(|p| !p.is_empty());
    if email.is_none() {
        errors.add("email", "This field is required");
    }
    if password.is_none() {
        errors.add("password", "This field is required");
    }
    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(errors.into_error("Email and password are required")),
    }
}
