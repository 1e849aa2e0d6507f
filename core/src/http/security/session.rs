//! Session-based Authentication.
//!
//! # Spring Security Equivalent
//! `HttpSessionSecurityContextRepository` and `HttpSessionRequestCache`.
//!
//! After login the principal's username and roles live in the session (never
//! the password). The middleware rebuilds a [`Principal`] from them on every
//! request.
//!
//! # Example
//! ```rust,ignore
//! use actix_session::{storage::CookieSessionStore, SessionMiddleware};
//!
//! let config = SessionConfig::new()
//!     .fixation_strategy(SessionFixationStrategy::MigrateSession);
//!
//! App::new()
//!     .wrap(SecurityTransform::new(
//!         SessionAuthenticator::new(config.clone()),
//!         RequestMatcherAuthorizer::new(policy.clone()).session_config(config),
//!     ))
//!     .wrap(SessionMiddleware::new(CookieSessionStore::default(), key.clone()))
//! ```

use actix_session::{Session, SessionExt, SessionInsertError};
use actix_web::dev::ServiceRequest;
use async_trait::async_trait;
use derive_more::{Display, Error};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::http::error::AuthFailure;
use crate::http::security::config::Authenticator;
use crate::http::security::role::RoleSet;
use crate::http::security::user::Principal;

// =============================================================================
// Session Fixation Strategy
// =============================================================================

/// What happens to the session when a principal logs in.
///
/// # Spring Security Equivalent
/// `SessionFixationProtectionStrategy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionFixationStrategy {
    /// New session id, attributes kept.
    #[default]
    MigrateSession,
    /// New session id, attributes dropped.
    NewSession,
    /// Keep the session id. Only for tests.
    None,
}

// =============================================================================
// Session Principal Data
// =============================================================================

/// Principal data stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub username: String,
    pub roles: RoleSet,
}

impl From<&Principal> for SessionPrincipal {
    fn from(principal: &Principal) -> Self {
        SessionPrincipal {
            username: principal.get_username().to_string(),
            roles: principal.get_roles().clone(),
        }
    }
}

impl From<SessionPrincipal> for Principal {
    fn from(stored: SessionPrincipal) -> Self {
        Principal::new(stored.username, String::new()).roles(stored.roles)
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Session keys and fixation strategy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    principal_key: String,
    saved_request_key: String,
    fixation_strategy: SessionFixationStrategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            principal_key: "security_principal".to_string(),
            saved_request_key: "security_saved_request".to_string(),
            fixation_strategy: SessionFixationStrategy::MigrateSession,
        }
    }

    pub fn principal_key(mut self, key: &str) -> Self {
        self.principal_key = key.to_string();
        self
    }

    pub fn saved_request_key(mut self, key: &str) -> Self {
        self.saved_request_key = key.to_string();
        self
    }

    /// # Spring Equivalent
    /// `sessionManagement().sessionFixation().migrateSession()`
    pub fn fixation_strategy(mut self, strategy: SessionFixationStrategy) -> Self {
        self.fixation_strategy = strategy;
        self
    }

    pub fn get_principal_key(&self) -> &str {
        &self.principal_key
    }

    pub fn get_saved_request_key(&self) -> &str {
        &self.saved_request_key
    }

    pub fn get_fixation_strategy(&self) -> SessionFixationStrategy {
        self.fixation_strategy
    }
}

// =============================================================================
// Session Error
// =============================================================================

/// Writing to the session failed.
#[derive(Debug, Display, Error)]
#[display("session insert error: {source}")]
pub struct SessionError {
    source: SessionInsertError,
}

impl From<SessionInsertError> for SessionError {
    fn from(source: SessionInsertError) -> Self {
        SessionError { source }
    }
}

// =============================================================================
// Session Authenticator
// =============================================================================

/// Reads the principal from the actix session.
///
/// Requires `SessionMiddleware` to wrap the security middleware.
#[derive(Debug, Clone, Default)]
pub struct SessionAuthenticator {
    config: SessionConfig,
}

impl SessionAuthenticator {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stores the principal in the session after applying fixation protection.
    ///
    /// # Spring Equivalent
    /// `SecurityContextRepository.saveContext` after
    /// `SessionAuthenticationStrategy.onAuthentication`
    pub fn login(
        session: &Session,
        principal: &Principal,
        config: &SessionConfig,
    ) -> Result<(), SessionError> {
        match config.fixation_strategy {
            SessionFixationStrategy::MigrateSession => session.renew(),
            SessionFixationStrategy::NewSession => {
                session.clear();
                session.renew();
            }
            SessionFixationStrategy::None => {}
        }

        session.insert(&config.principal_key, SessionPrincipal::from(principal))?;
        Ok(())
    }

    /// Removes the principal and any saved request.
    pub fn logout(session: &Session, config: &SessionConfig) {
        session.remove(&config.principal_key);
        session.remove(&config.saved_request_key);
        session.renew();
    }

    pub fn get_session_principal(session: &Session, config: &SessionConfig) -> Option<Principal> {
        match session.get::<SessionPrincipal>(&config.principal_key) {
            Ok(stored) => stored.map(Principal::from),
            Err(e) => {
                debug!("Discarding unreadable session principal: {}", e);
                None
            }
        }
    }

    /// Remembers where an anonymous user was headed.
    ///
    /// Targets that are not local paths are ignored.
    ///
    /// # Spring Equivalent
    /// `HttpSessionRequestCache.saveRequest`
    pub fn save_request(
        session: &Session,
        target: &str,
        config: &SessionConfig,
    ) -> Result<(), SessionError> {
        if !is_local_path(target) {
            debug!("Not saving non-local request target {}", target);
            return Ok(());
        }
        session.insert(&config.saved_request_key, target)?;
        Ok(())
    }

    /// Takes the saved request target out of the session.
    pub fn take_saved_request(session: &Session, config: &SessionConfig) -> Option<String> {
        let saved = session
            .remove_as::<String>(&config.saved_request_key)
            .and_then(Result::ok);
        saved.filter(|target| is_local_path(target))
    }
}

impl Authenticator for SessionAuthenticator {
    fn get_principal(&self, req: &ServiceRequest) -> Option<Principal> {
        Self::get_session_principal(&req.get_session(), &self.config)
    }
}

/// `/path`, but not `//host` or `/\host`, which browsers treat as absolute.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

// =============================================================================
// Credential Authenticator Trait
// =============================================================================

/// Validates username/password credentials.
///
/// # Spring Equivalent
/// `AuthenticationManager.authenticate` for a
/// `UsernamePasswordAuthenticationToken`
#[async_trait]
pub trait CredentialAuthenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn joe() -> Principal {
        Principal::new("joe", "{noop}theboss").roles(RoleSet::parse(&["manager"]).unwrap())
    }

    #[test]
    fn test_session_principal_drops_password() {
        let stored = SessionPrincipal::from(&joe());
        let json = serde_json::to_string(&stored).unwrap();
        assert!(!json.contains("theboss"));

        let restored: Principal = serde_json::from_str::<SessionPrincipal>(&json)
            .unwrap()
            .into();
        assert_eq!(restored.get_username(), "joe");
        assert_eq!(restored.get_password(), "");
        assert!(restored.has_role("manager"));
    }

    #[test]
    fn test_session_config() {
        let config = SessionConfig::new()
            .principal_key("p")
            .saved_request_key("saved")
            .fixation_strategy(SessionFixationStrategy::NewSession);

        assert_eq!(config.get_principal_key(), "p");
        assert_eq!(config.get_saved_request_key(), "saved");
        assert_eq!(
            config.get_fixation_strategy(),
            SessionFixationStrategy::NewSession
        );
        assert_eq!(
            SessionFixationStrategy::default(),
            SessionFixationStrategy::MigrateSession
        );
    }

    #[test]
    fn test_local_path() {
        assert!(is_local_path("/offertes/1?x=2"));
        assert!(!is_local_path("//evil.example/"));
        assert!(!is_local_path("/\\evil.example/"));
        assert!(!is_local_path("https://evil.example/"));
        assert!(!is_local_path(""));
    }

    #[actix_web::test]
    async fn test_login_and_logout() {
        let config = SessionConfig::new();
        let session = TestRequest::default().to_http_request().get_session();

        SessionAuthenticator::login(&session, &joe(), &config).unwrap();
        let principal = SessionAuthenticator::get_session_principal(&session, &config).unwrap();
        assert_eq!(principal.get_username(), "joe");

        SessionAuthenticator::logout(&session, &config);
        assert!(SessionAuthenticator::get_session_principal(&session, &config).is_none());
    }

    #[actix_web::test]
    async fn test_saved_request_taken_once() {
        let config = SessionConfig::new();
        let session = TestRequest::default().to_http_request().get_session();

        SessionAuthenticator::save_request(&session, "/offertes/1", &config).unwrap();
        assert_eq!(
            SessionAuthenticator::take_saved_request(&session, &config).as_deref(),
            Some("/offertes/1")
        );
        assert_eq!(SessionAuthenticator::take_saved_request(&session, &config), None);
    }

    #[actix_web::test]
    async fn test_non_local_target_not_saved() {
        let config = SessionConfig::new();
        let session = TestRequest::default().to_http_request().get_session();

        SessionAuthenticator::save_request(&session, "//evil.example/", &config).unwrap();
        assert_eq!(SessionAuthenticator::take_saved_request(&session, &config), None);
    }
}
