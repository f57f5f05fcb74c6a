pub mod auth;
mod contact;
pub mod error;
mod projects;
pub mod rate_limit;
mod upload;
mod validation;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// API routes only, without static file serving
pub fn create_router(state: Arc<AppState>) -> Router {
    // Session routes
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session));

    // Reads are public; mutating handlers take an AdminSession
    let project_routes = Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/categories", get(projects::list_categories))
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        );

    let upload_routes = Router::new()
        .route("/upload", post(upload::upload_image))
        .layer(DefaultBodyLimit::max(
            state.images.max_bytes() + upload::MULTIPART_OVERHEAD,
        ));

    let contact_routes = Router::new()
        .route("/contact", post(contact::submit_contact))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_contact,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest(
            "/api",
            project_routes.merge(upload_routes).merge(contact_routes),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: API, uploaded images, and the public site as fallback
pub fn create_app(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.images.dir());
    let site = ServeDir::new(&state.config.server.public_dir);
    let upload_prefix = state.images.url_prefix().to_string();

    create_router(state)
        .nest_service(&upload_prefix, uploads)
        .fallback_service(site)
        .layer(CompressionLayer::new())
}

async fn health_check() -> &'static str {
    "OK"
}
