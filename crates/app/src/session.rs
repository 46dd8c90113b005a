//! Shopper identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use storefront::ids::UserId;

/// Credentials of a signed-in shopper.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub access_token: String,
}

impl Session {
    pub fn new(user_id: impl Into<UserId>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Who is using the storefront right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Guest,
    Authenticated(Session),
}

impl Identity {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Guest => None,
            Self::Authenticated(session) => Some(session),
        }
    }
}
