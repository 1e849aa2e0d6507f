//! Access policy and security wiring for the staff application.

use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use beveiligd_security_core::http::error::ConfigError;
use beveiligd_security_core::http::security::{
    AuthenticationManager, BypassSet, CsrfConfig, FormLoginConfig, FormLoginService, PolicyEvaluator,
    PolicyTable, RequestMatcherAuthorizer, SecurityTransform, SessionAuthenticator,
    SessionConfig,
};
use log::info;

use crate::settings::AppSettings;

/// Static asset directories, served without any policy check.
pub const STATIC_PATTERNS: [&str; 3] = ["/images/**", "/css/**", "/js/**"];

pub const SESSION_COOKIE: &str = "beveiligd";

pub const MANAGER: &str = "manager";
pub const MAGAZIJNIER: &str = "magazijnier";
pub const HELPDESKMEDEWERKER: &str = "helpdeskmedewerker";

pub type StaffSecurity = SecurityTransform<SessionAuthenticator, RequestMatcherAuthorizer>;
pub type StaffLoginService = FormLoginService<AuthenticationManager>;

/// The built-in staff policy.
///
/// | pattern          | access                               |
/// |------------------|--------------------------------------|
/// | `/offertes/**`   | manager                              |
/// | `/werknemers/**` | magazijnier or helpdeskmedewerker    |
/// | `/`, `/login`    | everyone                             |
/// | `/**`            | any authenticated principal          |
pub fn staff_policy() -> Result<PolicyEvaluator, ConfigError> {
    let bypass = BypassSet::new(&STATIC_PATTERNS)?;
    let table = PolicyTable::builder()
        .has_role("/offertes/**", MANAGER)
        .has_any_role("/werknemers/**", &[MAGAZIJNIER, HELPDESKMEDEWERKER])
        .permit_all(&["/", "/login"])
        .any_request_authenticated()
        .build()?;

    Ok(PolicyEvaluator::new(bypass, table))
}

/// The `policy` settings section if there is one, else [`staff_policy`].
pub fn policy_from(settings: &AppSettings) -> Result<PolicyEvaluator, ConfigError> {
    match &settings.policy {
        Some(config) => {
            info!("Using access policy from configuration");
            config.build()
        }
        None => staff_policy(),
    }
}

/// Security middleware. Must be wrapped by a `SessionMiddleware`.
pub fn security_transform(
    policy: Arc<PolicyEvaluator>,
    login: &FormLoginConfig,
    session_config: &SessionConfig,
) -> StaffSecurity {
    SecurityTransform::new(
        SessionAuthenticator::new(session_config.clone()),
        RequestMatcherAuthorizer::new(policy)
            .login_url(login.get_login_page())
            .logout_url(login.get_logout_url())
            .session_config(session_config.clone()),
    )
}

/// CSRF protection for everything but static assets. The middleware built
/// from it goes between [`security_transform`] and [`session_middleware`].
pub fn csrf_config() -> Result<CsrfConfig, ConfigError> {
    STATIC_PATTERNS
        .iter()
        .try_fold(CsrfConfig::new(), |config, pattern| config.ignore_path(pattern))
}

/// Cookie-backed sessions. Must wrap [`security_transform`].
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_secure(secure)
        .build()
}

pub fn login_service(
    manager: AuthenticationManager,
    login: FormLoginConfig,
    session_config: SessionConfig,
) -> StaffLoginService {
    FormLoginService::new(manager, login, session_config)
}
