//! # sv-api
//!
//! The HTTP routing layer for snipvault. Every route lives under `/api/v1`
//! except the liveness check at `/health`.

pub mod envelope;
pub mod extract;
pub mod handlers;
pub mod middleware;

use actix_web::{error, web, HttpRequest};
use sv_core::AppError;

use crate::handlers::AppState;

/// Upper bound on JSON request bodies.
pub const JSON_LIMIT: usize = 16 * 1024;

fn response_options(req: &HttpRequest) -> envelope::ResponseOptions {
    req.app_data::<web::Data<AppState>>()
        .map(|state| state.responses)
        .unwrap_or_default()
}

/// Malformed bodies get the same envelope as any other validation failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req: &HttpRequest| {
            tracing::debug!(path = req.path(), error = %err, "rejected request body");
            let message = match &err {
                error::JsonPayloadError::Overflow { .. } | error::JsonPayloadError::OverflowKnownLength { .. } => {
                    "Request body is too large".to_string()
                }
                other => format!("Invalid request body: {other}"),
            };
            response_options(req).reject(AppError::ValidationError(message)).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req: &HttpRequest| {
        tracing::debug!(path = req.path(), error = %err, "rejected query string");
        response_options(req)
            .reject(AppError::ValidationError(format!("Invalid query string: {err}")))
            .into()
    })
}

/// Mounts the health check and the versioned API.
///
/// Literal snippet paths are registered before `/{id}` so they are never
/// captured as an id. Unmatched paths get a 404 envelope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .default_service(web::to(handlers::not_found))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(handlers::register))
                        .route("/login", web::post().to(handlers::login))
                        .route("/refresh", web::post().to(handlers::refresh))
                        .route("/logout", web::post().to(handlers::logout))
                        .route("/profile", web::get().to(handlers::profile)),
                )
                .service(
                    web::scope("/snippets")
                        .route("/public", web::get().to(handlers::list_public))
                        .route("/public/{id}", web::get().to(handlers::get_public))
                        .route("/create", web::post().to(handlers::create_snippet))
                        .route("/favorites", web::get().to(handlers::list_favorites))
                        .route("/stats", web::get().to(handlers::snippet_stats))
                        .route("/tags", web::get().to(handlers::all_tags))
                        .route("/tags/stats", web::get().to(handlers::tag_stats))
                        .route("/{id}/favorite", web::post().to(handlers::toggle_favorite))
                        .route("/{id}/fork", web::post().to(handlers::fork_snippet))
                        .route("", web::get().to(handlers::list_mine))
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(handlers::get_snippet))
                                .route(web::put().to(handlers::update_snippet))
                                .route(web::delete().to(handlers::delete_snippet)),
                        ),
                ),
        );
}
