use crate::api::error::AppError;
use crate::entities::request_history::FeatureType;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ToneRequest {
    pub text: Option<String>,
    pub tone: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ToneResponse {
    pub rewritten: String,
}

#[utoipa::path(
    post,
    path = "/tone-changer",
    request_body = ToneRequest,
    responses(
        (status = 200, description = "Text rewritten in the requested tone", body = ToneResponse),
        (status = 400, description = "Missing text or tone"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Inference failure")
    ),
    security(("jwt" = [])),
    tag = "features"
)]
pub async fn tone_changer(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ToneRequest>,
) -> Result<Json<ToneResponse>, AppError> {
    let (text, tone) = match (payload.text, payload.tone) {
        (Some(text), Some(tone)) if !text.trim().is_empty() && !tone.trim().is_empty() => {
            (text, tone)
        }
        _ => return Err(AppError::Validation("Missing text or tone".to_string())),
    };

    let rewritten = state
        .inference
        .rewrite_tone(&text, &tone)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if let Err(e) = state
        .history
        .append(&claims.sub, FeatureType::Tone, text, rewritten.clone(), None)
        .await
    {
        error!("Failed to record tone-changer history: {}", e);
    }

    Ok(Json(ToneResponse { rewritten }))
}
