//! Routes for any authenticated principal (the catch-all rule).

use actix_web::{get, Responder};
use beveiligd_security_core::http::security::AuthenticatedPrincipal;

use super::{escape, html};

/// Own profile: username and roles.
#[get("/profiel")]
pub async fn profile(principal: AuthenticatedPrincipal) -> impl Responder {
    let roles = principal
        .get_roles()
        .iter()
        .map(|role| format!("<li>{}</li>", escape(role.as_str())))
        .collect::<String>();
    html(format!(
        "<h1>Profiel van {}</h1><ul>{}</ul>",
        escape(principal.get_username()),
        roles
    ))
}
