//! Meeting SDK signature endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ApiResult, meeting::coerce_role, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    /// String or number; numbers are kept verbatim
    pub meeting_number: Option<Value>,
    pub role: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SignatureResponse {
    pub signature: String,
}

fn meeting_number_from(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Issue a signed meeting token
pub async fn zoom_signature(
    State(state): State<AppState>,
    body: Result<Json<SignatureRequest>, JsonRejection>,
) -> ApiResult<Json<SignatureResponse>> {
    let Json(req) = body?;
    let meeting_number = meeting_number_from(req.meeting_number.as_ref());
    let role = coerce_role(req.role.as_ref());

    let token = state.meetings.issue_token(&meeting_number, role)?;

    Ok(Json(SignatureResponse {
        signature: token.token,
    }))
}
