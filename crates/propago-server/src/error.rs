use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Rejected before any computation starts.
    #[error("{0}")]
    InvalidInput(String),

    /// Body missing, malformed, or not matching the request schema.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),

    #[error("{0}")]
    Nn(#[from] propago_nn::Error),

    #[error("{0}")]
    Graph(#[from] propago_graph::Error),

    #[error("worker task failed: {0}")]
    Join(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Nn(_) | ApiError::Graph(_) | ApiError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Nn(propago_nn::Error::UnknownModel("bogus".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Graph(propago_graph::Error::Empty("features")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_passed_through() {
        let err = ApiError::Nn(propago_nn::Error::UnknownModel("bogus".into()));
        assert_eq!(err.to_string(), "Unknown model type: bogus");
    }
}
