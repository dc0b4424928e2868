use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use crate::forms::FieldErrors;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A form failed validation. `context` is the page payload the form is
    /// rendered with; the errors are added to it under `errors`.
    #[error("Invalid form submission")]
    Validation { errors: FieldErrors, context: Value },

    #[error("Login required")]
    Unauthenticated { next: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(errors: FieldErrors, context: Value) -> Self {
        AppError::Validation { errors, context }
    }
}

/// Location of the login page, remembering where to return afterwards.
pub fn login_url(next: &str) -> String {
    let mut url = String::from("/login/?next=");
    for byte in next.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                url.push(byte as char)
            }
            _ => url.push_str(&format!("%{byte:02X}")),
        }
    }
    url
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            AppError::Validation { errors, context } => {
                let body = match context {
                    Value::Object(mut map) => {
                        map.insert("errors".to_string(), json!(errors));
                        Value::Object(map)
                    }
                    _ => json!({ "errors": errors }),
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            AppError::Unauthenticated { next } => Redirect::to(&login_url(&next)).into_response(),
            AppError::Store(e) => {
                error!(error = %e, "Store failure");
                internal_error()
            }
            AppError::Internal(e) => {
                error!(error = %e, "Internal failure");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
