//! CSRF (Cross-Site Request Forgery) Protection.
//!
//! # Spring Security Equivalent
//! `CsrfFilter` with an `HttpSessionCsrfTokenRepository`.
//!
//! A random token is kept in the session. State-changing requests must echo it
//! back in the `X-CSRF-TOKEN` header, the `_csrf` query parameter or the `_csrf`
//! field of a urlencoded form body.
//!
//! # Example
//! ```rust,ignore
//! App::new()
//!     .wrap(security_transform)
//!     .wrap(CsrfProtection::new(CsrfConfig::new().ignore_path("/css/**")?))
//!     .wrap(session_middleware)
//!
//! async fn login_page(csrf: CsrfToken) -> impl Responder {
//!     format!(r#"<input type="hidden" name="{}" value="{}">"#,
//!         csrf.parameter_name(), csrf.value())
//! }
//! ```

use std::collections::HashMap;
use std::future::{ready, Ready};
use std::rc::Rc;

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{Method, StatusCode};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use derive_more::{Display, Error};
use futures_util::future::LocalBoxFuture;
use log::{error, warn};
use rand::Rng;

use crate::http::error::ConfigError;
use crate::http::security::ant_matcher::AntMatcher;

pub const DEFAULT_HEADER_NAME: &str = "X-CSRF-TOKEN";
pub const DEFAULT_PARAMETER_NAME: &str = "_csrf";
pub const DEFAULT_SESSION_KEY: &str = "CSRF_TOKEN";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// =============================================================================
// CSRF Token
// =============================================================================

/// The token of the current session.
///
/// Handlers take it as an extractor to render the hidden form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    token: String,
    header_name: String,
    parameter_name: String,
}

impl CsrfToken {
    pub fn new(token: String) -> Self {
        Self::with_names(token, DEFAULT_HEADER_NAME, DEFAULT_PARAMETER_NAME)
    }

    pub fn with_names(token: String, header_name: &str, parameter_name: &str) -> Self {
        Self {
            token,
            header_name: header_name.to_string(),
            parameter_name: parameter_name.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.token
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }
}

impl FromRequest for CsrfToken {
    type Error = CsrfError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CsrfToken>()
                .cloned()
                .ok_or(CsrfError::NotConfigured),
        )
    }
}

// =============================================================================
// Session Token Repository
// =============================================================================

/// Keeps the token in the session.
///
/// # Spring Security Equivalent
/// `HttpSessionCsrfTokenRepository`
#[derive(Debug, Clone)]
pub struct SessionCsrfTokenRepository {
    session_key: String,
    header_name: String,
    parameter_name: String,
}

impl Default for SessionCsrfTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCsrfTokenRepository {
    pub fn new() -> Self {
        Self {
            session_key: DEFAULT_SESSION_KEY.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            parameter_name: DEFAULT_PARAMETER_NAME.to_string(),
        }
    }

    pub fn session_key(mut self, key: &str) -> Self {
        self.session_key = key.to_string();
        self
    }

    /// 32 random bytes, hex encoded.
    pub fn generate_token(&self) -> CsrfToken {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        self.token(hex::encode(&bytes))
    }

    pub fn save_token(&self, req: &ServiceRequest, token: &CsrfToken) -> Result<(), CsrfError> {
        req.get_session()
            .insert(&self.session_key, token.value())
            .map_err(|e| CsrfError::Storage {
                reason: e.to_string(),
            })
    }

    pub fn load_token(&self, req: &ServiceRequest) -> Option<CsrfToken> {
        req.get_session()
            .get::<String>(&self.session_key)
            .ok()
            .flatten()
            .map(|token| self.token(token))
    }

    fn token(&self, value: String) -> CsrfToken {
        CsrfToken::with_names(value, &self.header_name, &self.parameter_name)
    }
}

// =============================================================================
// CSRF Configuration
// =============================================================================

/// # Spring Security Equivalent
/// `CsrfConfigurer`
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    repository: SessionCsrfTokenRepository,
    protected_methods: Vec<Method>,
    ignored_paths: Vec<AntMatcher>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfConfig {
    /// Protects POST, PUT, DELETE and PATCH.
    pub fn new() -> Self {
        Self {
            repository: SessionCsrfTokenRepository::new(),
            protected_methods: vec![Method::POST, Method::PUT, Method::DELETE, Method::PATCH],
            ignored_paths: Vec::new(),
        }
    }

    pub fn repository(mut self, repository: SessionCsrfTokenRepository) -> Self {
        self.repository = repository;
        self
    }

    pub fn protected_methods(mut self, methods: Vec<Method>) -> Self {
        self.protected_methods = methods;
        self
    }

    /// Requests matching the ant pattern get no token and no check.
    pub fn ignore_path(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.ignored_paths.push(AntMatcher::parse(pattern)?);
        Ok(self)
    }

    fn is_path_ignored(&self, path: &str) -> bool {
        self.ignored_paths.iter().any(|matcher| matcher.matches(path))
    }

    fn requires_protection(&self, method: &Method) -> bool {
        self.protected_methods.contains(method)
    }
}

// =============================================================================
// CSRF Protection Middleware
// =============================================================================

/// CSRF protection middleware.
///
/// Loads or creates the session token and exposes it as a [`CsrfToken`]
/// request extension. Protected methods without a matching token are answered
/// with `403 Forbidden` before any inner service runs.
///
/// Needs a `SessionMiddleware` registered after it.
#[derive(Debug, Clone)]
pub struct CsrfProtection {
    config: Rc<CsrfConfig>,
}

impl CsrfProtection {
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl Default for CsrfProtection {
    fn default() -> Self {
        Self::new(CsrfConfig::new())
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfProtection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddleware {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct CsrfMiddleware<S> {
    service: Rc<S>,
    config: Rc<CsrfConfig>,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if config.is_path_ignored(req.path()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let token = match config.repository.load_token(&req) {
                Some(token) => token,
                None => {
                    let token = config.repository.generate_token();
                    if let Err(e) = config.repository.save_token(&req, &token) {
                        error!("{}", e);
                    }
                    token
                }
            };
            req.extensions_mut().insert(token.clone());

            if config.requires_protection(req.method()) {
                let outcome = match submitted_token(&mut req, &token).await {
                    Some(submitted) if constant_time_eq(&submitted, token.value()) => Ok(()),
                    Some(_) => Err(CsrfError::Mismatch),
                    None => Err(CsrfError::Missing),
                };
                if let Err(e) = outcome {
                    warn!("{} {} rejected: {}", req.method(), req.path(), e);
                    let response = HttpResponse::Forbidden()
                        .body(e.to_string())
                        .map_into_right_body();
                    return Ok(req.into_response(response));
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Header first, then the query string, then a urlencoded form body.
///
/// A consumed body is put back for the handler.
async fn submitted_token(req: &mut ServiceRequest, token: &CsrfToken) -> Option<String> {
    if let Some(value) = req.headers().get(token.header_name()) {
        if let Ok(value) = value.to_str() {
            return Some(value.to_string());
        }
    }

    if let Some(value) = form_value(req.query_string(), token.parameter_name()) {
        return Some(value);
    }

    if req.content_type() != FORM_CONTENT_TYPE {
        return None;
    }
    let body = match req.extract::<web::Bytes>().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Could not read form body: {}", e);
            return None;
        }
    };
    let value = std::str::from_utf8(&body)
        .ok()
        .and_then(|form| form_value(form, token.parameter_name()));

    let (_, mut payload) = actix_http::h1::Payload::create(true);
    payload.unread_data(body);
    req.set_payload(payload.into());

    value
}

fn form_value(encoded: &str, name: &str) -> Option<String> {
    web::Query::<HashMap<String, String>>::from_query(encoded)
        .ok()
        .and_then(|query| query.into_inner().remove(name))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// =============================================================================
// CSRF Error
// =============================================================================

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum CsrfError {
    #[display("CSRF token missing")]
    Missing,
    #[display("CSRF token mismatch")]
    Mismatch,
    #[display("CSRF storage error: {reason}")]
    Storage { reason: String },
    #[display("CSRF protection is not configured")]
    NotConfigured,
}

impl ResponseError for CsrfError {
    fn status_code(&self) -> StatusCode {
        match self {
            CsrfError::Missing | CsrfError::Mismatch => StatusCode::FORBIDDEN,
            CsrfError::Storage { .. } | CsrfError::NotConfigured => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: &[u8]) -> String {
        let mut result = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_session::storage::CookieSessionStore;
    use actix_session::SessionMiddleware;
    use actix_web::cookie::Key;
    use actix_web::{test, App};

    async fn echo_token(token: CsrfToken) -> HttpResponse {
        HttpResponse::Ok().body(token.value().to_string())
    }

    async fn accept() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn echo_form(form: web::Form<HashMap<String, String>>) -> HttpResponse {
        HttpResponse::Ok().body(form.get("name").cloned().unwrap_or_default())
    }

    #[std::prelude::v1::test]
    fn test_csrf_config_default() {
        let config = CsrfConfig::default();
        assert!(config.requires_protection(&Method::POST));
        assert!(config.requires_protection(&Method::DELETE));
        assert!(!config.requires_protection(&Method::GET));
    }

    #[std::prelude::v1::test]
    fn test_csrf_config_ignore_path() {
        let config = CsrfConfig::new().ignore_path("/css/**").unwrap();

        assert!(config.is_path_ignored("/css/site.css"));
        assert!(!config.is_path_ignored("/login"));
        assert!(CsrfConfig::new().ignore_path("css").is_err());
    }

    #[std::prelude::v1::test]
    fn test_generated_tokens() {
        let repo = SessionCsrfTokenRepository::new();
        let a = repo.generate_token();
        let b = repo.generate_token();

        assert_eq!(a.value().len(), 64);
        assert_ne!(a, b);
        assert_eq!(a.header_name(), "X-CSRF-TOKEN");
        assert_eq!(a.parameter_name(), "_csrf");
    }

    #[std::prelude::v1::test]
    fn test_form_value() {
        assert_eq!(
            form_value("username=joe&_csrf=abc", "_csrf"),
            Some("abc".to_string())
        );
        assert_eq!(form_value("username=joe", "_csrf"), None);
    }

    #[std::prelude::v1::test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }

    #[std::prelude::v1::test]
    fn test_hex_encode() {
        assert_eq!(hex::encode(&[0x00]), "00");
        assert_eq!(hex::encode(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
    }

    #[actix_web::test]
    async fn test_post_requires_session_token() {
        let app = test::init_service(
            App::new()
                .route("/token", web::get().to(echo_token))
                .route("/submit", web::post().to(echo_form))
                .wrap(CsrfProtection::default())
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate())),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/token").to_request()).await;
        let cookie = resp.response().cookies().next().unwrap().into_owned();
        let token = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

        // no token
        let req = test::TestRequest::post()
            .uri("/submit")
            .cookie(cookie.clone())
            .set_form([("name", "joe")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // wrong token
        let req = test::TestRequest::post()
            .uri("/submit")
            .cookie(cookie.clone())
            .insert_header((DEFAULT_HEADER_NAME, "0".repeat(64)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // header
        let req = test::TestRequest::post()
            .uri("/submit")
            .cookie(cookie.clone())
            .insert_header((DEFAULT_HEADER_NAME, token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // form field, body still readable by the handler
        let req = test::TestRequest::post()
            .uri("/submit")
            .cookie(cookie)
            .set_form([("name", "joe"), ("_csrf", token.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "joe");
    }

    #[actix_web::test]
    async fn test_token_from_another_session_rejected() {
        let app = test::init_service(
            App::new()
                .route("/token", web::get().to(echo_token))
                .route("/submit", web::post().to(accept))
                .wrap(CsrfProtection::default())
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate())),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/token").to_request()).await;
        let token = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

        // fresh session, so a fresh token
        let req = test::TestRequest::post()
            .uri("/submit")
            .set_form([("_csrf", token.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_ignored_path_has_no_token() {
        let app = test::init_service(
            App::new()
                .route("/css/site.css", web::get().to(echo_token))
                .route("/css/site.css", web::post().to(accept))
                .wrap(CsrfProtection::new(
                    CsrfConfig::new().ignore_path("/css/**").unwrap(),
                ))
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate())),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/css/site.css").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.response().cookies().next().is_none());

        let resp =
            test::call_service(&app, test::TestRequest::post().uri("/css/site.css").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
