use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AuthResponse;

use super::error::ClientError;

/// Who the client is acting as. Passed explicitly to every catalog call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub(crate) fn bearer(&self) -> Result<&str, ClientError> {
        self.token.as_deref().filter(|t| !t.is_empty()).ok_or(ClientError::NotAuthenticated)
    }
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            token: Some(auth.token),
            user_id: Some(auth.id),
            email: Some(auth.email),
        }
    }
}
