//! Employees, for warehouse and helpdesk staff.

use actix_web::{get, web, HttpRequest, Responder};
use beveiligd_security_core::http::security::{AuthenticatedPrincipal, SecurityExt};

use super::{escape, html};
use crate::security::HELPDESKMEDEWERKER;

#[get("/werknemers")]
pub async fn list(req: HttpRequest, principal: AuthenticatedPrincipal) -> impl Responder {
    // helpdesk staff see contact details as well
    let contact = if req.has_role(HELPDESKMEDEWERKER) {
        "<p>Contactgegevens zichtbaar.</p>"
    } else {
        ""
    };
    html(format!(
        "<h1>Werknemers</h1><p>Opgevraagd door {}</p>{}",
        escape(principal.get_username()),
        contact
    ))
}

#[get("/werknemers/{id}")]
pub async fn detail(id: web::Path<String>) -> impl Responder {
    html(format!("<h1>Werknemer {}</h1>", escape(&id)))
}
