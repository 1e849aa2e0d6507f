//! Form-based Login Authentication.
//!
//! # Spring Security Equivalent
//! `formLogin()` and `logout()` configuration.
//!
//! # Example
//! ```rust,ignore
//! let service = FormLoginService::new(
//!     authentication_manager,
//!     FormLoginConfig::new(),
//!     SessionConfig::new(),
//! );
//!
//! async fn login(
//!     session: Session,
//!     form: Form<LoginForm>,
//!     service: Data<FormLoginService<AuthenticationManager>>,
//! ) -> impl Responder {
//!     service.attempt_authentication_with_form(&session, &form).await
//! }
//! ```

use actix_session::Session;
use actix_web::http::header::LOCATION;
use actix_web::HttpResponse;
use log::{error, info};
use serde::Deserialize;

use crate::http::error::AuthFailure;
use crate::http::security::session::{
    CredentialAuthenticator, SessionAuthenticator, SessionConfig,
};
use crate::http::security::user::Principal;

// =============================================================================
// Form Login Configuration
// =============================================================================

/// Form login configuration.
///
/// # Spring Security Equivalent
/// `FormLoginConfigurer` and `LogoutConfigurer`
#[derive(Debug, Clone)]
pub struct FormLoginConfig {
    /// Login page (GET)
    login_page: String,
    /// Login form target (POST)
    login_processing_url: String,
    /// Used when no request was saved
    default_success_url: String,
    /// Ignore the saved request
    always_use_default_success_url: bool,
    failure_url: String,
    /// Logout target (POST)
    logout_url: String,
    logout_success_url: String,
}

impl Default for FormLoginConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLoginConfig {
    pub fn new() -> Self {
        Self {
            login_page: "/login".to_string(),
            login_processing_url: "/login".to_string(),
            default_success_url: "/".to_string(),
            always_use_default_success_url: false,
            failure_url: "/login?error".to_string(),
            logout_url: "/logout".to_string(),
            logout_success_url: "/".to_string(),
        }
    }

    /// # Spring Equivalent
    /// `formLogin().loginPage("/login")`
    pub fn login_page(mut self, url: &str) -> Self {
        self.login_page = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().loginProcessingUrl("/login")`
    pub fn login_processing_url(mut self, url: &str) -> Self {
        self.login_processing_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/")`
    pub fn default_success_url(mut self, url: &str) -> Self {
        self.default_success_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/", true)`
    pub fn always_use_default_success_url(mut self, always: bool) -> Self {
        self.always_use_default_success_url = always;
        self
    }

    /// # Spring Equivalent
    /// `formLogin().failureUrl("/login?error")`
    pub fn failure_url(mut self, url: &str) -> Self {
        self.failure_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `logout().logoutUrl("/logout")`
    pub fn logout_url(mut self, url: &str) -> Self {
        self.logout_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `logout().logoutSuccessUrl("/")`
    pub fn logout_success_url(mut self, url: &str) -> Self {
        self.logout_success_url = url.to_string();
        self
    }

    pub fn get_login_page(&self) -> &str {
        &self.login_page
    }

    pub fn get_login_processing_url(&self) -> &str {
        &self.login_processing_url
    }

    pub fn get_default_success_url(&self) -> &str {
        &self.default_success_url
    }

    pub fn is_always_use_default_success_url(&self) -> bool {
        self.always_use_default_success_url
    }

    pub fn get_failure_url(&self) -> &str {
        &self.failure_url
    }

    pub fn get_logout_url(&self) -> &str {
        &self.logout_url
    }

    pub fn get_logout_success_url(&self) -> &str {
        &self.logout_success_url
    }
}

// =============================================================================
// Login Form Data
// =============================================================================

/// Fields posted by the login page.
///
/// A missing field reads as empty, which fails authentication like any
/// other bad credential.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[PROTECTED]")
            .finish()
    }
}

// =============================================================================
// Form Login Handler
// =============================================================================

/// Turns login and logout outcomes into redirects.
///
/// # Spring Security Equivalent
/// `SavedRequestAwareAuthenticationSuccessHandler`,
/// `SimpleUrlAuthenticationFailureHandler` and
/// `SimpleUrlLogoutSuccessHandler`
#[derive(Debug, Clone)]
pub struct FormLoginHandler {
    config: FormLoginConfig,
    session_config: SessionConfig,
}

impl FormLoginHandler {
    pub fn new(config: FormLoginConfig, session_config: SessionConfig) -> Self {
        Self {
            config,
            session_config,
        }
    }

    /// Stores the principal in the session and redirects to the saved
    /// request, or to the default success URL.
    pub fn on_authentication_success(&self, session: &Session, principal: &Principal) -> HttpResponse {
        // read before login, a fresh session drops it
        let saved = SessionAuthenticator::take_saved_request(session, &self.session_config);

        if let Err(e) = SessionAuthenticator::login(session, principal, &self.session_config) {
            error!("Could not store '{}' in the session: {}", principal.get_username(), e);
            return self.on_authentication_failure();
        }

        let redirect_url = match saved {
            Some(url) if !self.config.always_use_default_success_url => url,
            _ => self.config.default_success_url.clone(),
        };
        redirect(redirect_url)
    }

    pub fn on_authentication_failure(&self) -> HttpResponse {
        redirect(self.config.failure_url.clone())
    }

    /// Removes the principal from the session and redirects to the logout
    /// success URL.
    pub fn on_logout(&self, session: &Session) -> HttpResponse {
        if let Some(principal) = SessionAuthenticator::get_session_principal(session, &self.session_config) {
            info!("User '{}' logged out", principal.get_username());
        }
        SessionAuthenticator::logout(session, &self.session_config);
        redirect(self.on_logout_success().to_string())
    }

    /// Where a completed logout sends the browser.
    pub fn on_logout_success(&self) -> &str {
        &self.config.logout_success_url
    }

    pub fn config(&self) -> &FormLoginConfig {
        &self.config
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location))
        .finish()
}

// =============================================================================
// Form Login Service
// =============================================================================

/// Credential check plus session handling for the login and logout endpoints.
#[derive(Clone)]
pub struct FormLoginService<A>
where
    A: CredentialAuthenticator,
{
    authenticator: A,
    handler: FormLoginHandler,
}

impl<A> FormLoginService<A>
where
    A: CredentialAuthenticator,
{
    pub fn new(authenticator: A, config: FormLoginConfig, session_config: SessionConfig) -> Self {
        Self {
            authenticator,
            handler: FormLoginHandler::new(config, session_config),
        }
    }

    /// Authenticates and answers with a redirect to the success or failure URL.
    pub async fn attempt_authentication(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> HttpResponse {
        match self.authenticate(username, password).await {
            Ok(principal) => self.handler.on_authentication_success(session, &principal),
            Err(_) => self.handler.on_authentication_failure(),
        }
    }

    pub async fn attempt_authentication_with_form(
        &self,
        session: &Session,
        form: &LoginForm,
    ) -> HttpResponse {
        self.attempt_authentication(session, &form.username, &form.password)
            .await
    }

    /// The raw authentication outcome, without touching the session.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthFailure> {
        self.authenticator.authenticate(username, password).await
    }

    pub fn logout(&self, session: &Session) -> HttpResponse {
        self.handler.on_logout(session)
    }

    pub fn on_logout_success(&self) -> &str {
        self.handler.on_logout_success()
    }

    pub fn handler(&self) -> &FormLoginHandler {
        &self.handler
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }
}
