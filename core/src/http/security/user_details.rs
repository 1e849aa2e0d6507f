//! Loading principals from a credential store.
//!
//! # Spring Security Equivalent
//! `UserDetailsService` and `UserDetailsManager`
//!
//! # Example
//! ```rust,ignore
//! use beveiligd_security_core::http::security::user_details::{UserDetailsError, UserDetailsService};
//! use async_trait::async_trait;
//!
//! struct LdapUserDetailsService { /* ... */ }
//!
//! #[async_trait]
//! impl UserDetailsService for LdapUserDetailsService {
//!     async fn load_user_by_username(
//!         &self,
//!         username: &str,
//!     ) -> Result<Option<Principal>, UserDetailsError> {
//!         // look the principal up...
//!         Ok(None)
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tokio::sync::RwLock;

use crate::http::security::user::Principal;

/// Errors raised by a credential store.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum UserDetailsError {
    #[display("user '{username}' not found")]
    NotFound { username: String },
    #[display("user '{username}' already exists")]
    AlreadyExists { username: String },
    /// The store holds data that cannot form a principal.
    #[display("invalid data for user '{username}': {reason}")]
    InvalidData { username: String, reason: String },
    /// The store could not be reached or the query failed.
    #[display("credential store error: {reason}")]
    Storage { reason: String },
}

impl UserDetailsError {
    pub fn storage(reason: impl ToString) -> Self {
        UserDetailsError::Storage {
            reason: reason.to_string(),
        }
    }
}

/// Looks principals up by username.
///
/// `Ok(None)` means the user does not exist; `Err` means the store itself
/// failed and nothing can be said about the user.
#[async_trait]
pub trait UserDetailsService: Send + Sync {
    async fn load_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Principal>, UserDetailsError>;

    async fn user_exists(&self, username: &str) -> Result<bool, UserDetailsError> {
        Ok(self.load_user_by_username(username).await?.is_some())
    }
}

/// A store that can also be written to.
#[async_trait]
pub trait UserDetailsManager: UserDetailsService {
    async fn create_user(&self, principal: &Principal) -> Result<(), UserDetailsError>;

    /// Replaces password, enabled flag and roles of an existing user.
    async fn update_user(&self, principal: &Principal) -> Result<(), UserDetailsError>;

    async fn delete_user(&self, username: &str) -> Result<(), UserDetailsError>;
}

/// In-memory principal store, for tests and development.
///
/// # Spring Security Equivalent
/// `InMemoryUserDetailsManager`
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::{InMemoryUserDetailsService, Principal, RoleSet};
///
/// let users = InMemoryUserDetailsService::with_users(vec![
///     Principal::new("joe", "{noop}theboss").roles(RoleSet::parse(&["manager"]).unwrap()),
/// ]);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryUserDetailsService {
    users: Arc<RwLock<HashMap<String, Principal>>>,
}

impl InMemoryUserDetailsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; a later principal replaces an earlier one with the same name.
    pub fn with_users(users: impl IntoIterator<Item = Principal>) -> Self {
        let users = users
            .into_iter()
            .map(|p| (p.get_username().to_string(), p))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn add_user(&self, principal: Principal) {
        let mut users = self.users.write().await;
        users.insert(principal.get_username().to_string(), principal);
    }
}

#[async_trait]
impl UserDetailsService for InMemoryUserDetailsService {
    async fn load_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Principal>, UserDetailsError> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }
}

#[async_trait]
impl UserDetailsManager for InMemoryUserDetailsService {
    async fn create_user(&self, principal: &Principal) -> Result<(), UserDetailsError> {
        let mut users = self.users.write().await;
        let username = principal.get_username().to_string();
        if users.contains_key(&username) {
            return Err(UserDetailsError::AlreadyExists { username });
        }
        users.insert(username, principal.clone());
        Ok(())
    }

    async fn update_user(&self, principal: &Principal) -> Result<(), UserDetailsError> {
        let mut users = self.users.write().await;
        match users.get_mut(principal.get_username()) {
            Some(existing) => {
                *existing = principal.clone();
                Ok(())
            }
            None => Err(UserDetailsError::NotFound {
                username: principal.get_username().to_string(),
            }),
        }
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserDetailsError> {
        let mut users = self.users.write().await;
        users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| UserDetailsError::NotFound {
                username: username.to_string(),
            })
    }
}
