//! Axum route handler for CV generation.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cvs::validation::{DEFAULT_INDUSTRY, DEFAULT_TEMPLATE};
use crate::errors::AppError;
use crate::generation::service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: String,
    pub form_data: Value,
    pub template: Option<String>,
    pub industry: Option<String>,
}

/// POST /api/v1/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Value>, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if !req.form_data.is_object() {
        return Err(AppError::Validation(
            "form_data must be a JSON object".to_string(),
        ));
    }

    let template = req.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
    let industry = req.industry.as_deref().unwrap_or(DEFAULT_INDUSTRY);

    let generated = service::generate_cv(
        state.store.as_ref(),
        state.generator.as_ref(),
        &req.user_id,
        &req.form_data,
        template,
        industry,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "html": generated.html,
        "tokens_left": generated.tokens_left,
    })))
}
