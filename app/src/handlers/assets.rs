//! Static assets. Never seen by the security middleware.

use actix_web::{get, HttpResponse, Responder};

#[get("/css/{name:.*}")]
pub async fn stylesheet() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/css")
        .body("body { font-family: sans-serif; }\n")
}

#[get("/js/{name:.*}")]
pub async fn script() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/javascript")
        .body("")
}

#[get("/images/{name:.*}")]
pub async fn image() -> impl Responder {
    HttpResponse::NotFound().finish()
}
