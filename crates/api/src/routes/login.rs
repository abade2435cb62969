//! Student login

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthFailure, INVALID_CREDENTIALS_MESSAGE},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub student_code: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Verify a student code/password pair
///
/// Bad credentials answer 200 with `success: false` and a message that is
/// identical for unknown codes and wrong passwords.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let student_code = req.student_code.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    match state.auth.authenticate(&student_code, &password).await {
        Ok(identity) => Ok(Json(LoginResponse {
            success: true,
            student_code: Some(identity.into_inner()),
            message: None,
        })),
        Err(AuthFailure::InvalidCredentials) => Ok(Json(LoginResponse {
            success: false,
            student_code: None,
            message: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
        })),
        Err(AuthFailure::MissingCredentials) => {
            Err(ApiError::BadRequest("Missing data".to_string()))
        }
        Err(AuthFailure::StoreUnavailable(_)) => Err(ApiError::Internal("Server error")),
    }
}
