//! Authentication flows in front of the identity provider.
//!
//! Input is checked here before the provider sees it. Sign-up also writes the
//! user's profile record, keyed by the id the provider assigned.
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::errors::{AuthError, DomainError, DomainResult};
use crate::domain::models::user::{Credentials, Identity, UserProfile};
use crate::storage::traits::{IdentityProvider, ProfileStore};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

#[derive(Clone)]
pub struct AuthService {
    identity_provider: Arc<dyn IdentityProvider>,
    profile_store: Arc<dyn ProfileStore>,
}

impl AuthService {
    pub fn new(identity_provider: Arc<dyn IdentityProvider>, profile_store: Arc<dyn ProfileStore>) -> Self {
        Self {
            identity_provider,
            profile_store,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Identity> {
        let credentials = Self::credentials(email, password)?;
        Ok(self.identity_provider.sign_in(&credentials).await?)
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> DomainResult<(Identity, UserProfile)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName.into());
        }
        let credentials = Self::credentials(email, password)?;
        if !EMAIL_PATTERN.is_match(&credentials.email) {
            return Err(AuthError::InvalidEmail(credentials.email).into());
        }

        let identity = self.identity_provider.sign_up(&credentials).await?;
        let profile = UserProfile {
            id: identity.user_id.clone(),
            name: name.to_string(),
            email: identity.email.clone(),
            created_at: Utc::now(),
        };
        self.profile_store.store_profile(&profile).await.map_err(|e| {
            error!("Failed to store profile for user {}: {:#}", identity.user_id, e);
            DomainError::Store(e)
        })?;

        info!("Created profile for user {}", identity.user_id);
        Ok((identity, profile))
    }

    pub async fn sign_out(&self, session_token: &str) -> DomainResult<()> {
        Ok(self.identity_provider.sign_out(session_token).await?)
    }

    /// Resolve a session token, failing with `NotAuthenticated` when it is unknown
    pub async fn current_identity(&self, session_token: &str) -> DomainResult<Identity> {
        self.identity_provider
            .current_identity(session_token)
            .await
            .ok_or(DomainError::NotAuthenticated)
    }

    pub async fn get_profile(&self, user_id: &str) -> DomainResult<Option<UserProfile>> {
        Ok(self.profile_store.get_profile(user_id).await?)
    }

    fn credentials(email: &str, password: &str) -> Result<Credentials, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}
