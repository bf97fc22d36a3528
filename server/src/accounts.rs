use std::sync::Arc;

use crate::auth::SessionAuthenticator;
use crate::domain::MetadataStore;
use crate::error::ServiceError;
use crate::password::PasswordHasher;

/// Registration, login and logout.
pub struct UserAccountService<S> {
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: SessionAuthenticator<S>,
}

impl<S: MetadataStore> UserAccountService<S> {
    pub fn new(
        store: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: SessionAuthenticator<S>,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
        }
    }

    /// Creates a user. No session is opened.
    pub fn register(&self, login: &str, password: &str) -> Result<(), ServiceError> {
        if self
            .store
            .find_user_by_login(login)
            .map_err(ServiceError::store)?
            .is_some()
        {
            return Err(ServiceError::UserAlreadyExists(login.to_owned()));
        }

        let hash = self
            .hasher
            .hash(password)
            .map_err(|e| ServiceError::Hasher(e.to_string()))?;

        // a concurrent registration may have taken the login since the lookup
        match self
            .store
            .add_user(login, &hash)
            .map_err(ServiceError::store)?
        {
            Some(id) => {
                tracing::info!("user: {login} registered with id {id}");
                Ok(())
            }
            None => Err(ServiceError::UserAlreadyExists(login.to_owned())),
        }
    }

    /// Verifies the password and returns a fresh access token.
    pub fn login(&self, login: &str, password: &str) -> Result<String, ServiceError> {
        let user = self
            .store
            .find_user_by_login(login)
            .map_err(ServiceError::store)?
            .ok_or_else(|| ServiceError::UserNotFound(login.to_owned()))?;

        let verified = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(|e| ServiceError::Hasher(e.to_string()))?;
        if !verified {
            return Err(ServiceError::PasswordMismatch);
        }

        let token = self.sessions.create_session(user.id)?;
        tracing::info!("user: {login} logged in");
        Ok(token)
    }

    pub fn logout(&self, raw_token: &str) -> Result<(), ServiceError> {
        self.sessions.destroy_session(raw_token)
    }
}
