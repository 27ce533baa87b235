use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{api_response::ErrorResponse, data_access::task_repository::RepositoryError};

/// Every way a request can fail once it reaches the web layer. Converted into
/// the `{"success": false, "error": ...}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Task not found")]
    NotFound,
    #[error("Endpoint not found")]
    EndpointNotFound,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::EndpointNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Validation(message) => ApiError::BadRequest(message),
            other @ RepositoryError::NothingToUpdate => ApiError::BadRequest(other.to_string()),
            RepositoryError::NotFound => ApiError::NotFound,
            RepositoryError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
