//! Username/password authentication against a principal store.
//!
//! # Spring Security Equivalent
//! `ProviderManager` with a `DaoAuthenticationProvider`

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use log::{error, info, warn};

use crate::http::error::AuthFailure;
use crate::http::security::account::AccountLockManager;
#[cfg(feature = "argon2")]
use crate::http::security::crypto::DelegatingPasswordEncoder;
#[cfg(not(feature = "argon2"))]
use crate::http::security::crypto::NoOpPasswordEncoder;
use crate::http::security::crypto::PasswordEncoder;
use crate::http::security::session::CredentialAuthenticator;
use crate::http::security::user::Principal;
use crate::http::security::user_details::UserDetailsService;

/// Raw password behind the hash checked when a username is unknown.
const USER_NOT_FOUND_PASSWORD: &str = "userNotFoundPassword";

/// Checks credentials against a [`UserDetailsService`].
///
/// Order of checks: account lock, lookup, password, enabled flag. The password
/// is verified before the enabled flag so that a disabled account is only
/// reported to someone who knows its password. An unknown username still costs
/// one password check, against a hash encoded once per encoder.
///
/// # Example
/// ```ignore
/// let manager = AuthenticationManager::new(users)
///     .password_encoder(DelegatingPasswordEncoder::new())
///     .lock_manager(AccountLockManager::with_defaults());
///
/// let principal = manager.authenticate("joe", "theboss").await?;
/// ```
#[derive(Clone)]
pub struct AuthenticationManager {
    users: Arc<dyn UserDetailsService>,
    password_encoder: Arc<dyn PasswordEncoder>,
    lock_manager: Option<AccountLockManager>,
    user_not_found_password: Arc<OnceLock<Option<String>>>,
}

impl AuthenticationManager {
    /// Uses the delegating encoder when the `argon2` feature is on.
    pub fn new<U: UserDetailsService + 'static>(users: U) -> Self {
        Self::from_arc(Arc::new(users))
    }

    pub fn from_arc(users: Arc<dyn UserDetailsService>) -> Self {
        #[cfg(feature = "argon2")]
        let password_encoder: Arc<dyn PasswordEncoder> = Arc::new(DelegatingPasswordEncoder::new());
        #[cfg(not(feature = "argon2"))]
        let password_encoder: Arc<dyn PasswordEncoder> = Arc::new(NoOpPasswordEncoder);

        AuthenticationManager {
            users,
            password_encoder,
            lock_manager: None,
            user_not_found_password: Arc::new(OnceLock::new()),
        }
    }

    pub fn password_encoder<E: PasswordEncoder + 'static>(mut self, encoder: E) -> Self {
        self.password_encoder = Arc::new(encoder);
        self.user_not_found_password = Arc::new(OnceLock::new());
        self
    }

    /// Enables temporary lockout after repeated failures.
    pub fn lock_manager(mut self, lock_manager: AccountLockManager) -> Self {
        self.lock_manager = Some(lock_manager);
        self
    }

    pub fn get_lock_manager(&self) -> Option<&AccountLockManager> {
        self.lock_manager.as_ref()
    }

    /// Spends the same work on an unknown username as on a known one.
    fn check_against_dummy(&self, password: &str) {
        let encoded = self.user_not_found_password.get_or_init(|| {
            self.password_encoder
                .encode(USER_NOT_FOUND_PASSWORD)
                .map_err(|e| error!("Could not encode dummy password: {}", e))
                .ok()
        });
        if let Some(encoded) = encoded {
            let _ = self.password_encoder.matches(password, encoded);
        }
    }

    async fn record_failure(&self, username: &str) {
        if let Some(locks) = &self.lock_manager {
            if locks.record_failure(username).await.is_locked() {
                warn!("Account '{}' locked after repeated login failures", username);
            }
        }
    }
}

#[async_trait]
impl CredentialAuthenticator for AuthenticationManager {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthFailure> {
        if let Some(locks) = &self.lock_manager {
            if locks.is_locked(username).await {
                warn!("Login refused for '{}': account locked", username);
                return Err(AuthFailure::Locked);
            }
        }

        let principal = match self.users.load_user_by_username(username).await {
            Ok(principal) => principal,
            Err(e) => {
                error!("Login for '{}' failed: {}", username, e);
                return Err(AuthFailure::StoreUnavailable);
            }
        };

        let principal = match principal {
            Some(p) if self.password_encoder.matches(password, p.get_password()) => p,
            found => {
                if found.is_none() {
                    self.check_against_dummy(password);
                }
                warn!("Login failed for '{}': bad credentials", username);
                self.record_failure(username).await;
                return Err(AuthFailure::BadCredentials);
            }
        };

        if !principal.is_enabled() {
            warn!("Login refused for '{}': account disabled", username);
            return Err(AuthFailure::Disabled);
        }

        if let Some(locks) = &self.lock_manager {
            locks.record_success(username).await;
        }
        info!("User '{}' logged in", username);
        Ok(principal.erase_credentials())
    }
}
