//! HTTP server assembly: session middleware, route mounting, and run loop.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::{web, App, HttpServer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{classes, users};
use crate::middleware::RequestTrace;
use crate::outbound::persistence::{MemoryClassRepository, MemoryUserRepository};

/// Build the session middleware used by the API scope.
pub fn session_middleware(
    key: Key,
    cookie_secure: bool,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// Run the server until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let user_repo = Arc::new(MemoryUserRepository::new());
    let class_repo = Arc::new(MemoryClassRepository::new());
    let state = HttpState::new(class_repo, user_repo);

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays reachable.
    let server_health_state = health_state.clone();

    let ServerConfig {
        bind_addr,
        key,
        cookie_secure,
    } = config;

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .wrap(session_middleware(key.clone(), cookie_secure))
            .app_data(web::Data::new(state.clone()))
            .service(users::register)
            .service(users::login)
            .service(users::logout)
            .service(users::prune_class_refs)
            .service(classes::list_classes)
            .service(classes::create_class)
            .service(classes::update_class)
            .service(classes::delete_class)
            .service(classes::enroll)
            .service(classes::withdraw);

        let mut app = App::new()
            .app_data(server_health_state.clone())
            .wrap(RequestTrace)
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        {
            app = app.service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", crate::doc::ApiDoc::openapi()),
            );
        }

        app
    })
    .bind(bind_addr)?;

    health_state.mark_ready();
    server.run().await
}
