//! Route handlers organized by access level.
//!
//! Access is decided by the security middleware before a handler runs; the
//! handlers only read the principal it attached.

use actix_web::web;
use beveiligd_security_core::http::security::FormLoginConfig;

pub mod assets;
pub mod home;
pub mod offertes;
pub mod public;
pub mod werknemers;

/// Registers every route of the staff application.
///
/// The login page, login processing and logout routes follow `login`.
pub fn configure(login: FormLoginConfig) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route(login.get_login_page(), web::get().to(public::login_page))
            .route(login.get_login_processing_url(), web::post().to(public::login))
            .route(login.get_logout_url(), web::post().to(public::logout))
            .service(public::welcome)
            .service(home::profile)
            .service(offertes::list)
            .service(offertes::detail)
            .service(werknemers::list)
            .service(werknemers::detail)
            .service(assets::stylesheet)
            .service(assets::script)
            .service(assets::image);
    }
}

pub(crate) fn html(body: String) -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Minimal HTML escaping for user-supplied text.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
