use crate::api::error::AppError;
use crate::api::handlers::multipart::read_upload;
use crate::entities::request_history::FeatureType;
use crate::utils::auth::Claims;
use crate::utils::pdf;
use axum::{Extension, Json, extract::{Multipart, State}};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Deserialize, ToSchema)]
pub struct FollowupRequest {
    pub summary: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FollowupResponse {
    pub questions: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/pdf-summary",
    request_body(content = Multipart, description = "PDF file upload"),
    responses(
        (status = 200, description = "Document summarized", body = SummaryResponse),
        (status = 400, description = "Missing file or unreadable PDF"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Inference failure")
    ),
    security(("jwt" = [])),
    tag = "features"
)]
pub async fn pdf_summary(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let text =
        pdf::extract_text(&upload.data).map_err(|e| AppError::Validation(e.to_string()))?;

    let summary = state
        .inference
        .summarize(&text)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    // The full extracted text is recorded, not a sample; reduction-ratio
    // analytics depend on the real word count. A failed write degrades to a
    // log line, the summary still goes back to the caller.
    if let Err(e) = state
        .history
        .append(&claims.sub, FeatureType::Pdf, text, summary.clone(), None)
        .await
    {
        error!("Failed to record pdf-summary history: {}", e);
    }

    Ok(Json(SummaryResponse { summary }))
}

#[utoipa::path(
    post,
    path = "/pdf-followups",
    request_body = FollowupRequest,
    responses(
        (status = 200, description = "Up to 5 follow-up questions", body = FollowupResponse),
        (status = 400, description = "Missing summary"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Inference failure")
    ),
    security(("jwt" = [])),
    tag = "features"
)]
pub async fn pdf_followups(
    State(state): State<crate::AppState>,
    Extension(_claims): Extension<Claims>,
    Json(payload): Json<FollowupRequest>,
) -> Result<Json<FollowupResponse>, AppError> {
    let summary = match payload.summary {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(AppError::Validation("summary is required".to_string())),
    };

    let questions = state
        .inference
        .generate_followups(&summary)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(FollowupResponse { questions }))
}
