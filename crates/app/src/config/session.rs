//! Session Config

use clap::Args;

use crate::session::Session;

/// Credentials of a signed-in shopper. Both must be set to sign in.
#[derive(Debug, Args)]
pub struct SessionConfig {
    /// Signed-in user identifier
    #[arg(long, env = "STOREFRONT_USER_ID")]
    pub user_id: Option<String>,

    /// Bearer token of the signed-in user
    #[arg(long, env = "STOREFRONT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

impl SessionConfig {
    /// The configured session, when both credentials are present.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        match (&self.user_id, &self.access_token) {
            (Some(user_id), Some(token)) if !user_id.is_empty() && !token.is_empty() => {
                Some(Session::new(user_id.as_str(), token.as_str()))
            }
            _ => None,
        }
    }
}
