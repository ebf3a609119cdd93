//! Caller identity for protected routes.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use sv_core::AppError;
use uuid::Uuid;

use crate::envelope::{ApiError, ResponseOptions};
use crate::handlers::AppState;

/// The authenticated user id, resolved through the `IdentityProvider`.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Uuid);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let Some(state) = state else {
                return Err(ResponseOptions::default()
                    .reject(AppError::Internal("application state is not configured".to_string())));
            };
            let Some(token) = token else {
                tracing::debug!("request without bearer token");
                return Err(state.responses.reject(AppError::Unauthorized("Unauthorized Access!".to_string())));
            };
            state
                .identity
                .authenticate(&token)
                .await
                .map(Caller)
                .map_err(|e| state.responses.reject(e))
        })
    }
}
