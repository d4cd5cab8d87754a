//! Centralized error responder.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::EcommerceError;

const INTERNAL_MESSAGE: &str = "Something went very wrong!";

/// Cause of a 5xx, carried on the response and never written to the body by default.
#[derive(Clone, Debug)]
pub(crate) struct ErrorDetail(pub String);

/// Response layer for development: copies the [`ErrorDetail`] of a 5xx into its body.
pub(crate) async fn expose_error_detail(response: Response) -> Response {
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    let status = response.status();
    (status, Json(json!({ "status": "error", "message": INTERNAL_MESSAGE, "error": detail }))).into_response()
}

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            return (status, Json(json!({ "status": "fail", "message": self.to_string() }))).into_response();
        }
        tracing::error!(error = %self, "Request failed");
        let mut response = (status, Json(json!({ "status": "error", "message": INTERNAL_MESSAGE }))).into_response();
        response.extensions_mut().insert(ErrorDetail(self.to_string()));
        response
    }
}
