//! In-memory identity provider used for development and tests.
//!
//! Accounts and sessions live only as long as the process. Passwords are
//! never written to disk.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::AuthError;
use crate::domain::models::user::{Credentials, Identity};
use crate::storage::traits::IdentityProvider;

struct Account {
    user_id: String,
    email: String,
    password: String,
}

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    /// Keyed by lowercased email
    accounts: RwLock<HashMap<String, Account>>,
    /// Session token -> identity
    sessions: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    async fn open_session(&self, account: &Account) -> Identity {
        let identity = Identity {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
            session_token: Uuid::new_v4().simple().to_string(),
        };
        self.sessions
            .write()
            .await
            .insert(identity.session_token.clone(), identity.clone());
        identity
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let key = credentials.email.trim().to_lowercase();
        let accounts = self.accounts.read().await;
        let account = match accounts.get(&key) {
            Some(account) if account.password == credentials.password => account,
            _ => {
                warn!("Rejected sign-in for {}", key);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let identity = self.open_session(account).await;
        info!("User {} signed in", identity.user_id);
        Ok(identity)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let email = credentials.email.trim().to_string();
        let key = email.to_lowercase();

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyRegistered(email));
        }

        let account = Account {
            user_id: Uuid::new_v4().to_string(),
            email,
            password: credentials.password.clone(),
        };
        let identity = self.open_session(&account).await;
        accounts.insert(key, account);

        info!("Registered user {}", identity.user_id);
        Ok(identity)
    }

    async fn sign_out(&self, session_token: &str) -> Result<(), AuthError> {
        match self.sessions.write().await.remove(session_token) {
            Some(identity) => {
                info!("User {} signed out", identity.user_id);
                Ok(())
            }
            None => Err(AuthError::InvalidSession),
        }
    }

    async fn current_identity(&self, session_token: &str) -> Option<Identity> {
        self.sessions.read().await.get(session_token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = InMemoryIdentityProvider::new();
        let registered = provider
            .sign_up(&credentials("ada@example.com", "secret"))
            .await
            .unwrap();

        let signed_in = provider
            .sign_in(&credentials("ADA@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(signed_in.user_id, registered.user_id);
        assert_ne!(signed_in.session_token, registered.session_token);
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_password() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_up(&credentials("ada@example.com", "secret")).await.unwrap();

        let result = provider.sign_in(&credentials("ada@example.com", "nope")).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);

        let result = provider.sign_in(&credentials("bob@example.com", "secret")).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_up(&credentials("ada@example.com", "a")).await.unwrap();

        let result = provider.sign_up(&credentials("Ada@Example.com", "b")).await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn test_sign_out_closes_session() {
        let provider = InMemoryIdentityProvider::new();
        let identity = provider.sign_up(&credentials("ada@example.com", "a")).await.unwrap();

        assert_eq!(
            provider.current_identity(&identity.session_token).await,
            Some(identity.clone())
        );

        provider.sign_out(&identity.session_token).await.unwrap();
        assert_eq!(provider.current_identity(&identity.session_token).await, None);
        assert_eq!(
            provider.sign_out(&identity.session_token).await.unwrap_err(),
            AuthError::InvalidSession
        );
    }
}
