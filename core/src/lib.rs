//! # beveiligd security core
//!
//! Request authorization for actix-web applications: ordered ant-style URL
//! rules evaluated against a principal's role set, static asset bypass,
//! session-backed form login and logout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use beveiligd_security_core::http::security::{
//!     BypassSet, PolicyEvaluator, PolicyTable, RequestMatcherAuthorizer, SecurityTransform,
//!     SessionAuthenticator,
//! };
//!
//! let policy = PolicyEvaluator::new(
//!     BypassSet::new(&["/images/**", "/css/**", "/js/**"])?,
//!     PolicyTable::builder()
//!         .has_role("/offertes/**", "manager")
//!         .permit_all(&["/", "/login"])
//!         .any_request_authenticated()
//!         .build()?,
//! );
//!
//! App::new()
//!     .wrap(SecurityTransform::new(
//!         SessionAuthenticator::default(),
//!         RequestMatcherAuthorizer::new(policy),
//!     ))
//!     .wrap(SessionMiddleware::new(CookieSessionStore::default(), key))
//! ```
//!
//! ## Modules
//!
//! - [`http::security`] - Policy evaluation, authentication, middleware
//! - [`http::error`] - Error types

pub mod http;
