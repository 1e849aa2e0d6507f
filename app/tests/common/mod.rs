//! Common test utilities and configuration.
//!
//! This module provides shared test infrastructure including:
//! - Test principals in an in-memory store
//! - Test app builder
//! - Login, CSRF and cookie helpers

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{test, web, App};

use beveiligd_app::handlers;
use beveiligd_app::security::{
    csrf_config, login_service, security_transform, session_middleware, staff_policy,
    SESSION_COOKIE,
};
use beveiligd_security_core::http::security::{
    AccountLockManager, AuthenticationManager, CsrfProtection, FormLoginConfig,
    InMemoryUserDetailsService, LockConfig, PolicyEvaluator, Principal, RoleSet, SessionConfig,
};

// =============================================================================
// Test Configuration
// =============================================================================

/// Failed logins before a test account is locked.
pub const MAX_ATTEMPTS: u32 = 3;

/// Creates the test principal store.
///
/// Users:
/// - joe/theboss: manager
/// - averell/hungry: helpdeskmedewerker, magazijnier
/// - william/dynamite: magazijnier
/// - jack/dalton: magazijnier, disabled
pub fn test_users() -> InMemoryUserDetailsService {
    InMemoryUserDetailsService::with_users(vec![
        Principal::new("joe", "{noop}theboss").roles(roles(&["manager"])),
        Principal::new("averell", "{noop}hungry")
            .roles(roles(&["helpdeskmedewerker", "magazijnier"])),
        Principal::new("william", "{noop}dynamite").roles(roles(&["magazijnier"])),
        Principal::new("jack", "{noop}dalton")
            .roles(roles(&["magazijnier"]))
            .enabled(false),
    ])
}

fn roles(labels: &[&str]) -> RoleSet {
    RoleSet::parse(labels).unwrap()
}

// =============================================================================
// Test App Builder
// =============================================================================

/// Creates a fully configured test application with the staff policy.
pub async fn create_test_app() -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    create_test_app_with(staff_policy().unwrap(), FormLoginConfig::new()).await
}

/// Creates a test application with its own policy and login URLs.
pub async fn create_test_app_with(
    policy: PolicyEvaluator,
    login: FormLoginConfig,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let manager = AuthenticationManager::new(test_users()).lock_manager(AccountLockManager::new(
        LockConfig::new().max_attempts(MAX_ATTEMPTS),
    ));
    let session_config = SessionConfig::new();
    let policy = Arc::new(policy);
    let service = web::Data::new(login_service(manager, login.clone(), session_config.clone()));

    test::init_service(
        App::new()
            .app_data(service)
            .configure(handlers::configure(login.clone()))
            .wrap(security_transform(policy, &login, &session_config))
            .wrap(CsrfProtection::new(csrf_config().unwrap()))
            .wrap(session_middleware(Key::generate(), false)),
    )
    .await
}

// =============================================================================
// Helpers
// =============================================================================

/// The `Location` header of a redirect.
pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The session cookie set by a response, if any.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.into_owned())
}

/// The hidden `_csrf` value of a rendered form.
pub fn csrf_token_in(body: &str) -> Option<String> {
    let marker = "name=\"_csrf\" value=\"";
    let start = body.find(marker)? + marker.len();
    let end = body[start..].find('"')?;
    Some(body[start..start + end].to_string())
}

/// Fetches `page` within the session of `cookie` (a new one when `None`) and
/// returns the session cookie with the CSRF token its form carries.
pub async fn csrf_from<S, B>(
    app: &S,
    page: &str,
    cookie: Option<Cookie<'static>>,
) -> (Cookie<'static>, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::get().uri(page);
    if let Some(cookie) = &cookie {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(app, req.to_request()).await;
    // an unchanged session sets no cookie
    let cookie = session_cookie(&resp).or(cookie).expect("no session cookie");
    let body = test::read_body(resp).await;
    let token = csrf_token_in(&String::from_utf8_lossy(&body)).expect("no csrf field");
    (cookie, token)
}

/// CSRF token from the login page.
pub async fn csrf<S, B>(app: &S, cookie: Option<Cookie<'static>>) -> (Cookie<'static>, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    csrf_from(app, "/login", cookie).await
}

/// POST of the login form carrying `cookie` and its CSRF `token`.
pub fn login_request(
    username: &str,
    password: &str,
    cookie: &Cookie<'static>,
    token: &str,
) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/login")
        .cookie(cookie.clone())
        .set_form([("username", username), ("password", password), ("_csrf", token)])
}

/// Logs in and returns the session cookie together with the redirect target.
pub async fn login<S, B>(app: &S, username: &str, password: &str) -> (Option<Cookie<'static>>, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (cookie, token) = csrf(app, None).await;
    let req = login_request(username, password, &cookie, &token).to_request();
    let resp = test::call_service(app, req).await;
    (session_cookie(&resp), location(&resp))
}

/// POST of the logout form within the session of `cookie`.
pub async fn logout_request<S, B>(app: &S, cookie: Option<Cookie<'static>>) -> actix_http::Request
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (cookie, token) = csrf(app, cookie).await;
    test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie)
        .set_form([("_csrf", token.as_str())])
        .to_request()
}

/// GET `uri` carrying `cookie`.
pub fn get_with(uri: &str, cookie: &Cookie<'static>) -> actix_http::Request {
    test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request()
}
