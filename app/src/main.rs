//! beveiligd staff application.
//!
//! Run with: `cargo run --bin beveiligd`
//!
//! Settings come from `beveiligd.yaml` and `BEVEILIGD_*` environment
//! variables, see `beveiligd_app::settings`. Principals are read from the
//! `users` and `authorities` tables of the configured SQLite database.

use std::io;
use std::sync::Arc;

use actix_web::cookie::Key;
use actix_web::{web, App, HttpServer};
use beveiligd_app::handlers;
use beveiligd_app::security::{
    csrf_config, login_service, policy_from, security_transform, session_middleware,
};
use beveiligd_app::settings::AppSettings;
use beveiligd_security_core::http::security::{
    AccountLockManager, AuthenticationManager, CsrfProtection, DatabaseUserDetailsService,
    FormLoginConfig, SessionConfig,
};
use log::{info, warn};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{}: {}", context, e))
}

fn session_key(settings: &AppSettings) -> io::Result<Key> {
    match &settings.session_key {
        Some(key) => {
            Key::try_from(key.as_bytes()).map_err(|e| startup_error("invalid session_key", e))
        }
        None => {
            warn!("No session_key configured, sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = AppSettings::load().map_err(|e| startup_error("invalid settings", e))?;
    let policy = Arc::new(policy_from(&settings).map_err(|e| startup_error("invalid policy", e))?);
    let key = session_key(&settings)?;
    let csrf = csrf_config().map_err(|e| startup_error("invalid csrf configuration", e))?;

    let users = DatabaseUserDetailsService::connect(&settings.database_url)
        .await
        .map_err(|e| startup_error("credential store unavailable", e))?;
    users
        .create_schema()
        .await
        .map_err(|e| startup_error("could not create schema", e))?;

    let manager = AuthenticationManager::new(users)
        .lock_manager(AccountLockManager::new(settings.lockout.into()));

    let login = FormLoginConfig::new();
    let session_config = SessionConfig::new();
    let service = web::Data::new(login_service(
        manager,
        login.clone(),
        session_config.clone(),
    ));

    info!(
        "beveiligd listening on http://{} ({} access rules, {} bypass patterns)",
        settings.bind,
        policy.table().len(),
        policy.bypass().len()
    );

    let secure = settings.secure_cookies;
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(handlers::configure(login.clone()))
            .wrap(security_transform(policy.clone(), &login, &session_config))
            .wrap(CsrfProtection::new(csrf.clone()))
            .wrap(session_middleware(key.clone(), secure))
    })
    .bind(&settings.bind)?
    .run()
    .await
}
