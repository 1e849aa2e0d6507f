//! Quotes, managers only.

use actix_web::{get, web, Responder};
use beveiligd_security_core::http::security::AuthenticatedPrincipal;

use super::{escape, html};

#[get("/offertes")]
pub async fn list(principal: AuthenticatedPrincipal) -> impl Responder {
    html(format!(
        "<h1>Offertes</h1><p>Beheerder: {}</p>",
        escape(principal.get_username())
    ))
}

#[get("/offertes/{id}")]
pub async fn detail(id: web::Path<String>, principal: AuthenticatedPrincipal) -> impl Responder {
    html(format!(
        "<h1>Offerte {}</h1><p>Geopend door {}</p>",
        escape(&id),
        escape(principal.get_username())
    ))
}
