//! # Response envelope
//!
//! Every response, success or failure, is `{statusCode, success, message, data}`.
//! Debug detail on failures is controlled by [`ResponseOptions`], never by
//! ambient process state.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use sv_core::AppError;

#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub kind: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code,
            success: status_code < 400,
            message: message.into(),
            data: Some(data),
            debug: None,
        }
    }
}

/// Builds a JSON response carrying `data` in the envelope.
pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::new(status.as_u16(), message, data))
}

/// A failure envelope that did not come from an `AppError`.
pub fn fail(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::<()> {
        status_code: status.as_u16(),
        success: false,
        message: message.to_string(),
        data: None,
        debug: None,
    })
}

/// Serializer configuration, decided once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseOptions {
    /// Attach error kind and detail to failures (non-production only)
    pub expose_debug: bool,
}

impl ResponseOptions {
    pub fn reject(&self, error: AppError) -> ApiError {
        ApiError { error, expose_debug: self.expose_debug }
    }
}

/// An `AppError` bound to the response options it will be rendered with.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    expose_debug: bool,
}

impl ApiError {
    pub fn error(&self) -> &AppError {
        &self.error
    }

    fn envelope(&self) -> Envelope<()> {
        let status_code = self.error.status_code();
        // Internal details only leave the process in debug mode.
        let message = match (&self.error, self.expose_debug) {
            (AppError::Internal(_), false) => "Internal server error!".to_string(),
            _ => self.error.to_string(),
        };
        Envelope {
            status_code,
            success: false,
            message,
            data: None,
            debug: self.expose_debug.then(|| DebugInfo {
                kind: self.error.kind(),
                detail: format!("{:?}", self.error),
            }),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}
