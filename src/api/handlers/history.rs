use crate::api::error::AppError;
use crate::entities::request_history::FeatureType;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::{Path, State}};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    pub id: String,
    pub feature_type: String,
    pub original_input: String,
    pub ai_response: String,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[utoipa::path(
    get,
    path = "/history/{feature}",
    params(
        ("feature" = String, Path, description = "Feature type: pdf, image, audio or tone")
    ),
    responses(
        (status = 200, description = "Records for one feature, most recent first", body = HistoryResponse),
        (status = 400, description = "Unknown feature type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "history"
)]
pub async fn get_history(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(feature): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let feature_type: FeatureType = feature
        .parse()
        .map_err(|_| AppError::Validation(format!("Unknown feature type: {}", feature)))?;

    let records = state.history.list(&claims.sub, feature_type).await?;

    let history = records
        .into_iter()
        .map(|r| HistoryEntry {
            id: r.id,
            feature_type: r.feature_type.as_str().to_string(),
            original_input: r.original_input,
            ai_response: r.ai_response,
            language: r.language,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(HistoryResponse { history }))
}
