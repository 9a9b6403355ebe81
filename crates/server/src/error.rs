use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use librarian_core::CatalogError;
use librarian_core::lookup::LookupError;
use serde_json::json;

/// Everything a handler can fail with. Catalog errors keep their own kind; the rest are
/// request or upstream problems of the server itself.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("{message}")]
    BadRequest { message: String, context: String },
    #[error("{message}")]
    Unavailable { message: String, context: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            context: context.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            context: context.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, context) = match &self {
            Self::Catalog(error) => {
                let status =
                    StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (status, Json(error)).into_response();
            }
            Self::Lookup(LookupError::InvalidIsbn(_)) => (StatusCode::BAD_REQUEST, "volumes.lookup"),
            Self::Lookup(error) => {
                tracing::error!(
                    error.cause_chain = ?error,
                    error.message = %error,
                    "ISBN lookup failed"
                );
                (StatusCode::BAD_GATEWAY, "volumes.lookup")
            }
            Self::BadRequest { context, .. } => (StatusCode::BAD_REQUEST, context.as_str()),
            Self::Unavailable { context, .. } => (StatusCode::SERVICE_UNAVAILABLE, context.as_str()),
        };
        let body = json!({
            "context": context,
            "message": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
