#![allow(dead_code)]

pub mod keys;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use backoffice_api::auth::{password, TokenSigner, TokenVerifier};
use backoffice_api::database::{AuthAccount, AuthStore, DbError, Principal, ProfileRef};

pub fn access_signer(minutes: u64) -> TokenSigner {
    TokenSigner::from_config(keys::ACCESS_PRIVATE_B64, minutes).unwrap()
}

pub fn access_verifier() -> TokenVerifier {
    TokenVerifier::from_config(keys::ACCESS_PUBLIC_B64).unwrap()
}

pub fn refresh_signer(minutes: u64) -> TokenSigner {
    TokenSigner::from_config(keys::REFRESH_PRIVATE_B64, minutes).unwrap()
}

pub fn refresh_verifier() -> TokenVerifier {
    TokenVerifier::from_config(keys::REFRESH_PUBLIC_B64).unwrap()
}

/// Account fixture: enabled user with a set password and a live session
/// token identifier.
pub fn account(email: &str, plain_password: &str) -> AuthAccount {
    AuthAccount {
        principal: Principal {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            enabled: true,
            profile: ProfileRef { id: Uuid::new_v4(), name: "admin".to_string() },
        },
        auth_enabled: true,
        token_id: Some(Uuid::new_v4()),
        password_hash: Some(password::hash_password(plain_password).unwrap()),
    }
}

/// In-memory [`AuthStore`] standing in for Postgres in middleware and
/// service tests. Accounts are indexed by email; session lookups scan.
#[derive(Clone, Default)]
pub struct InMemoryAuthStore {
    accounts: Arc<Mutex<HashMap<String, AuthAccount>>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: AuthAccount) -> Self {
        let store = Self::new();
        store.insert(account);
        store
    }

    pub fn insert(&self, account: AuthAccount) {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.insert(account.principal.email.clone(), account);
    }

    /// Simulate a password reset or administrative revocation by replacing
    /// (or clearing) the stored session token identifier.
    pub fn rotate_token(&self, email: &str, new_token_id: Option<Uuid>) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(email) {
            account.token_id = new_token_id;
        }
    }

    pub fn set_enabled(&self, email: &str, enabled: bool) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(email) {
            account.auth_enabled = enabled;
        }
    }
}

#[async_trait]
impl AuthStore for InMemoryAuthStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<AuthAccount>, DbError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(login).cloned())
    }

    async fn find_by_session_token(&self, token_id: Uuid) -> Result<Option<AuthAccount>, DbError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.token_id == Some(token_id)).cloned())
    }
}
