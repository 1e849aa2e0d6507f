//! Public routes (no authentication required) and the login/logout endpoints.
//!
//! The login and logout endpoints are registered on the URLs of the
//! [`FormLoginConfig`](beveiligd_security_core::http::security::FormLoginConfig),
//! see [`super::configure`].

use std::collections::HashMap;

use actix_session::Session;
use actix_web::{get, web, Responder};
use beveiligd_security_core::http::security::{CsrfToken, LoginForm, OptionalPrincipal};
use log::warn;

use super::{escape, html};
use crate::security::StaffLoginService;

fn csrf_field(csrf: &CsrfToken) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        escape(csrf.parameter_name()),
        escape(csrf.value())
    )
}

/// Welcome page, greets the principal when there is one.
#[get("/")]
pub async fn welcome(
    principal: OptionalPrincipal,
    csrf: CsrfToken,
    service: web::Data<StaffLoginService>,
) -> impl Responder {
    let login = service.handler().config();
    let greeting = match principal.as_ref() {
        Some(p) => format!(
            "<p>Aangemeld als {}.</p>\
             <form method=\"post\" action=\"{}\">{}<button>Afmelden</button></form>",
            escape(p.get_username()),
            escape(login.get_logout_url()),
            csrf_field(&csrf)
        ),
        None => format!(
            "<p><a href=\"{}\">Aanmelden</a></p>",
            escape(login.get_login_page())
        ),
    };
    html(format!("<h1>Welkom</h1>{}", greeting))
}

/// Login page. `?error` is set by a failed login attempt.
pub async fn login_page(
    query: web::Query<HashMap<String, String>>,
    csrf: CsrfToken,
    service: web::Data<StaffLoginService>,
) -> impl Responder {
    let error = if query.contains_key("error") {
        "<p class=\"error\">Ongeldige gebruikersnaam of wachtwoord.</p>"
    } else {
        ""
    };
    html(format!(
        "<h1>Aanmelden</h1>{}\
         <form method=\"post\" action=\"{}\">{}\
         <input name=\"username\" placeholder=\"Gebruikersnaam\">\
         <input name=\"password\" type=\"password\" placeholder=\"Wachtwoord\">\
         <button>Aanmelden</button>\
         </form>",
        error,
        escape(service.handler().config().get_login_processing_url()),
        csrf_field(&csrf)
    ))
}

/// An unreadable form counts as a failed login.
pub async fn login(
    session: Session,
    form: Result<web::Form<LoginForm>, actix_web::Error>,
    service: web::Data<StaffLoginService>,
) -> impl Responder {
    match form {
        Ok(form) => {
            service
                .attempt_authentication_with_form(&session, &form)
                .await
        }
        Err(e) => {
            warn!("Unreadable login form: {}", e);
            service.handler().on_authentication_failure()
        }
    }
}

pub async fn logout(session: Session, service: web::Data<StaffLoginService>) -> impl Responder {
    service.logout(&session)
}
