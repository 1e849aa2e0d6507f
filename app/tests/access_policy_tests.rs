//! Access policy tests.
//!
//! Each protected area is requested anonymously and by principals with and
//! without the required role.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;

use common::{create_test_app, get_with, location, login, session_cookie};

// =============================================================================
// Anonymous Requests
// =============================================================================

#[actix_web::test]
async fn test_anonymous_welcome_page() {
    let app = create_test_app().await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Aanmelden"));
}

#[actix_web::test]
async fn test_anonymous_login_page() {
    let app = create_test_app().await;

    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_anonymous_redirected_to_login() {
    let app = create_test_app().await;

    for uri in ["/offertes/1", "/werknemers", "/profiel", "/onbekend"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), "/login", "{}", uri);
    }
}

#[actix_web::test]
async fn test_static_assets_bypass_security() {
    let app = create_test_app().await;

    let req = test::TestRequest::get().uri("/css/site.css").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    // no session is started for an asset
    assert!(session_cookie(&resp).is_none());

    let req = test::TestRequest::get().uri("/js/app.js").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // a missing image is a plain 404, not a login redirect
    let req = test::TestRequest::get().uri("/images/ontbreekt.png").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Offertes (manager)
// =============================================================================

#[actix_web::test]
async fn test_offertes_with_manager() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "joe", "theboss").await;
    let cookie = cookie.unwrap();

    let resp = test::call_service(&app, get_with("/offertes", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get_with("/offertes/42", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Offerte 42"));
}

#[actix_web::test]
async fn test_offertes_with_magazijnier_forbidden() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "william", "dynamite").await;

    let resp = test::call_service(&app, get_with("/offertes/42", &cookie.unwrap())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Werknemers (magazijnier or helpdeskmedewerker)
// =============================================================================

#[actix_web::test]
async fn test_werknemers_with_magazijnier() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "william", "dynamite").await;

    let resp = test::call_service(&app, get_with("/werknemers/7", &cookie.unwrap())).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_werknemers_with_helpdesk_shows_contact() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "averell", "hungry").await;

    let resp = test::call_service(&app, get_with("/werknemers", &cookie.unwrap())).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Contactgegevens"));
}

#[actix_web::test]
async fn test_werknemers_with_manager_forbidden() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "joe", "theboss").await;

    let resp = test::call_service(&app, get_with("/werknemers", &cookie.unwrap())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Catch-all (any authenticated principal)
// =============================================================================

#[actix_web::test]
async fn test_profile_for_any_principal() {
    let app = create_test_app().await;

    for (username, password) in [("joe", "theboss"), ("william", "dynamite")] {
        let (cookie, _) = login(&app, username, password).await;
        let resp = test::call_service(&app, get_with("/profiel", &cookie.unwrap())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains(username));
    }
}

#[actix_web::test]
async fn test_unknown_route_after_login_is_not_found() {
    let app = create_test_app().await;
    let (cookie, _) = login(&app, "joe", "theboss").await;

    let resp = test::call_service(&app, get_with("/onbekend", &cookie.unwrap())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
