use crate::ApiResponse;
use agentmatrix_core::MatrixError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

const LOAD_FAILURE: &str = "could not load comparison data";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Data error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Matrix(MatrixError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Matrix(MatrixError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Matrix(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, LOAD_FAILURE.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
