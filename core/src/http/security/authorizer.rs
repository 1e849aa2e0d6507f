//! Policy-driven authorization.
//!
//! # Spring Security Equivalent
//! `RequestMatcherDelegatingAuthorizationManager` together with the
//! `LoginUrlAuthenticationEntryPoint` and `AccessDeniedHandlerImpl`

use std::sync::Arc;

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{http, Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use log::{debug, warn};

use crate::http::security::config::Authorizer;
use crate::http::security::policy::{Decision, PolicyEvaluator};
use crate::http::security::session::{SessionAuthenticator, SessionConfig};
use crate::http::security::user::Principal;

/// Renders [`PolicyEvaluator`] decisions as HTTP responses.
///
/// | decision       | response                                     |
/// |----------------|----------------------------------------------|
/// | `Bypass`       | forwarded                                    |
/// | `Allow`        | forwarded                                    |
/// | `Deny`         | `403 Forbidden`                              |
/// | `RequireLogin` | `302 Found` to the login URL, request saved  |
///
/// A `POST` to the logout URL is always forwarded.
///
/// # Example
/// ```ignore
/// let authorizer = RequestMatcherAuthorizer::new(policy)
///     .login_url("/login")
///     .session_config(SessionConfig::new());
/// ```
#[derive(Clone)]
pub struct RequestMatcherAuthorizer {
    policy: Arc<PolicyEvaluator>,
    login_url: String,
    logout_url: Option<String>,
    session_config: SessionConfig,
}

impl RequestMatcherAuthorizer {
    pub fn new(policy: impl Into<Arc<PolicyEvaluator>>) -> Self {
        RequestMatcherAuthorizer {
            policy: policy.into(),
            login_url: "/login".to_string(),
            logout_url: None,
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the login URL anonymous users are redirected to (default: "/login").
    pub fn login_url(mut self, url: &str) -> Self {
        self.login_url = url.to_string();
        self
    }

    /// Forwards `POST` requests to `url` regardless of the policy.
    ///
    /// # Spring Equivalent
    /// `LogoutFilter` running ahead of authorization
    pub fn logout_url(mut self, url: &str) -> Self {
        self.logout_url = Some(url.to_string());
        self
    }

    /// Sets where the saved request is kept in the session.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn policy(&self) -> &PolicyEvaluator {
        &self.policy
    }

    fn is_logout(&self, req: &ServiceRequest) -> bool {
        req.method() == http::Method::POST
            && self.logout_url.as_deref().is_some_and(|url| url == req.path())
    }

    fn save_request(&self, req: &ServiceRequest) {
        // only navigations can be replayed after login
        if req.method() != http::Method::GET {
            return;
        }
        let target = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path().to_string(), |pq| pq.as_str().to_string());
        let session = req.get_session();
        if let Err(e) = SessionAuthenticator::save_request(&session, &target, &self.session_config) {
            warn!("Could not save request {}: {}", target, e);
        }
    }
}

impl<B: 'static> Authorizer<B> for RequestMatcherAuthorizer {
    fn bypasses(&self, req: &ServiceRequest) -> bool {
        self.policy.is_bypassed(req.path())
    }

    fn process(
        &self,
        req: ServiceRequest,
        principal: Option<&Principal>,
        next: impl FnOnce(ServiceRequest) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>
            + 'static,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
        let decision = if self.is_logout(&req) {
            Decision::Allow
        } else {
            self.policy
                .evaluate(req.path(), principal.map(Principal::get_roles))
        };

        match decision {
            Decision::Bypass | Decision::Allow => Box::pin(async move {
                let res = next(req).await?;
                Ok(res.map_into_left_body())
            }),
            Decision::Deny => {
                debug!(
                    "Access to {} denied for '{}'",
                    req.path(),
                    principal.map_or("", Principal::get_username)
                );
                Box::pin(async move {
                    Ok(req.into_response(HttpResponse::Forbidden().finish().map_into_right_body()))
                })
            }
            Decision::RequireLogin => {
                self.save_request(&req);
                let redirect_url = self.login_url.clone();
                Box::pin(async move {
                    Ok(req.into_response(
                        HttpResponse::Found()
                            .append_header((http::header::LOCATION, redirect_url))
                            .finish()
                            .map_into_right_body(),
                    ))
                })
            }
        }
    }
}
