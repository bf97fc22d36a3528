use std::sync::Arc;

use crate::domain::{MetadataStore, User};
use crate::error::ServiceError;
use crate::random::{RandomSource, IDENTIFIER_LEN};

const BEARER_PREFIX: &str = "Bearer ";

/// Token generation attempts before giving up on collisions.
pub(crate) const MAX_ATTEMPTS: usize = 3;

/// Maps access tokens to users and manages sessions.
pub struct SessionAuthenticator<S> {
    store: Arc<S>,
    random: Arc<dyn RandomSource>,
}

impl<S> Clone for SessionAuthenticator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            random: Arc::clone(&self.random),
        }
    }
}

impl<S: MetadataStore> SessionAuthenticator<S> {
    pub fn new(store: Arc<S>, random: Arc<dyn RandomSource>) -> Self {
        Self { store, random }
    }

    /// Resolves a raw `auth-token` value, with or without the `Bearer ` prefix.
    pub fn resolve(&self, raw_token: &str) -> Result<User, ServiceError> {
        let token = strip_bearer(raw_token);
        if token.is_empty() {
            return Err(ServiceError::Unauthorized);
        }
        self.store
            .find_user_by_session_token(token)
            .map_err(ServiceError::store)?
            .ok_or(ServiceError::Unauthorized)
    }

    /// Opens a new session for the user and returns its access token.
    pub fn create_session(&self, user_id: i64) -> Result<String, ServiceError> {
        for _ in 0..MAX_ATTEMPTS {
            let token = self.random.alphanumeric(IDENTIFIER_LEN);
            if self
                .store
                .save_session(&token, user_id)
                .map_err(ServiceError::store)?
            {
                return Ok(token);
            }
            tracing::warn!("access token collision for user {user_id}, retrying");
        }
        Err(ServiceError::Exhausted("access token"))
    }

    /// Closes the session. Unknown tokens are ignored.
    pub fn destroy_session(&self, raw_token: &str) -> Result<(), ServiceError> {
        let removed = self
            .store
            .delete_session(strip_bearer(raw_token))
            .map_err(ServiceError::store)?;
        if removed == 0 {
            tracing::debug!("logout with unknown token");
        }
        Ok(())
    }
}

fn strip_bearer(raw_token: &str) -> &str {
    raw_token.strip_prefix(BEARER_PREFIX).unwrap_or(raw_token)
}
