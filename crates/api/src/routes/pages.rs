//! Page state endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ApiResult,
    pages::PageStateView,
    state::AppState,
    store::FormFields,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePageRequest {
    pub student_code: Option<String>,
    pub page: Option<Value>,
    pub form_fields: Option<FormFields>,
    pub annotation: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPageRequest {
    pub student_code: Option<String>,
    pub page: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SavePageResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct LoadPageResponse {
    pub success: bool,
    #[serde(flatten)]
    pub view: PageStateView,
}

/// Upsert the form state of one page
pub async fn save_page(
    State(state): State<AppState>,
    body: Result<Json<SavePageRequest>, JsonRejection>,
) -> ApiResult<Json<SavePageResponse>> {
    let Json(req) = body?;

    state
        .pages
        .save(
            req.student_code.as_deref(),
            req.page.as_ref(),
            req.form_fields.unwrap_or_default(),
            req.annotation,
        )
        .await?;

    Ok(Json(SavePageResponse { success: true }))
}

/// Load the form state of one page, empty if never saved
pub async fn load_page(
    State(state): State<AppState>,
    body: Result<Json<LoadPageRequest>, JsonRejection>,
) -> ApiResult<Json<LoadPageResponse>> {
    let Json(req) = body?;

    let view = state
        .pages
        .load(req.student_code.as_deref(), req.page.as_ref())
        .await?;

    Ok(Json(LoadPageResponse {
        success: true,
        view,
    }))
}
