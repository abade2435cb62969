//! API error type
//!
//! Every failure leaves the HTTP boundary as `{"success": false, "message": ...}`.
//! Caller errors are 400, infrastructure errors are 500. Invalid credentials
//! are not an error here; the login handler answers them with a 200.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::meeting::TokenError;
use crate::pages::PageStateError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// Public message only; the cause is logged where it happened
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        ApiError::BadRequest("Malformed request body".to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingParameter => ApiError::BadRequest(err.to_string()),
            TokenError::SigningKeyUnavailable => {
                ApiError::Internal("Meeting signing is not configured")
            }
            TokenError::Encoding(_) => ApiError::Internal("Failed to sign meeting token"),
        }
    }
}

impl From<PageStateError> for ApiError {
    fn from(err: PageStateError) -> Self {
        match err {
            PageStateError::IncompleteInput
            | PageStateError::MissingParameter
            | PageStateError::InvalidPageNumber(_) => ApiError::BadRequest(err.to_string()),
            PageStateError::StoreUnavailable(_) => ApiError::Internal("Page store error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_shape() {
        let (status, body) = body_json(PageStateError::IncompleteInput.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err = PageStateError::StoreUnavailable(StoreError::Unavailable(
            "connection refused to 10.0.0.5".to_string(),
        ));
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Page store error");
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            ApiError::from(TokenError::MissingParameter).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TokenError::SigningKeyUnavailable).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(PageStateError::InvalidPageNumber("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
