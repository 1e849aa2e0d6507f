//! Security module providing authentication and authorization.
//!
//! # Spring Equivalent
//! `org.springframework.security` package
//!
//! # Module Structure
//!
//! - `policy` - Bypass set, ordered policy table, evaluator
//! - `ant_matcher` - Ant-style URL pattern matching
//! - `role` - Roles and role sets
//! - `user` - Principal model
//! - `config` - Core traits (Authenticator, Authorizer)
//! - `authorizer` - Policy-driven authorization (RequestMatcherAuthorizer)
//! - `middleware` - Security middleware (SecurityTransform)
//! - `extractor` - Actix Web extractors (AuthenticatedPrincipal, OptionalPrincipal)
//! - `session` - Session-based authentication and saved requests
//! - `form_login` - Login and logout endpoints
//! - `manager` - Username/password authentication (AuthenticationManager)
//! - `user_details` - Principal stores
//! - `database` - SQL principal store
//! - `crypto` - Password encoding (Argon2, NoOp, Delegating)
//! - `account` - Account locking on failed attempts
//! - `csrf` - CSRF token protection (CsrfProtection)
//!
//! # Feature Flags
//! - `argon2`: Enables `Argon2PasswordEncoder` and `DelegatingPasswordEncoder`
//! - `database`: Enables `DatabaseUserDetailsService` (SQLite through sqlx)

// Re-exports for convenience
pub use account::{AccountLockManager, LockConfig, LockStatus};
pub use ant_matcher::AntMatcher;
pub use authorizer::RequestMatcherAuthorizer;
pub use config::{Authenticator, Authorizer};
pub use crypto::{EncodeError, NoOpPasswordEncoder, PasswordEncoder};
#[cfg(feature = "argon2")]
pub use crypto::{Argon2PasswordEncoder, DelegatingPasswordEncoder};
pub use csrf::{CsrfConfig, CsrfError, CsrfProtection, CsrfToken, SessionCsrfTokenRepository};
#[cfg(feature = "database")]
pub use database::DatabaseUserDetailsService;
pub use extractor::{AuthenticatedPrincipal, OptionalPrincipal, SecurityExt};
pub use form_login::{FormLoginConfig, FormLoginHandler, FormLoginService, LoginForm};
pub use manager::AuthenticationManager;
pub use middleware::SecurityTransform;
pub use policy::{
    AccessKind, AccessRule, BypassSet, Decision, PolicyConfig, PolicyEvaluator, PolicyTable,
    PolicyTableBuilder, Requirement, RuleConfig,
};
pub use role::{Role, RoleSet};
pub use session::{
    CredentialAuthenticator, SessionAuthenticator, SessionConfig, SessionError,
    SessionFixationStrategy, SessionPrincipal,
};
pub use user::Principal;
pub use user_details::{
    InMemoryUserDetailsService, UserDetailsError, UserDetailsManager, UserDetailsService,
};

// Internal modules (private implementation details)
mod config;
mod extractor;
mod role;
mod user;

// Public modules
pub mod account;
pub mod ant_matcher;
pub mod authorizer;
pub mod crypto;
pub mod csrf;
#[cfg(feature = "database")]
pub mod database;
pub mod form_login;
pub mod manager;
pub mod middleware;
pub mod policy;
pub mod session;
pub mod user_details;
