use crate::api::error::AppError;
use crate::api::handlers::multipart::read_upload;
use crate::entities::request_history::FeatureType;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::{Multipart, State}};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AudioAnalysisResponse {
    pub transcript: String,
    pub mood: String,
}

#[utoipa::path(
    post,
    path = "/audio-analysis",
    request_body(content = Multipart, description = "Audio file upload"),
    responses(
        (status = 200, description = "Transcript and mood", body = AudioAnalysisResponse),
        (status = 400, description = "Missing file"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Inference failure")
    ),
    security(("jwt" = [])),
    tag = "features"
)]
pub async fn audio_analysis(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<Json<AudioAnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let mime_type = infer::get(&upload.data)
        .map(|kind| kind.mime_type())
        .unwrap_or("audio/wav");

    let transcript = state
        .inference
        .transcribe_audio(&upload.data, mime_type)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let mood = state
        .inference
        .analyze_mood(&transcript)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    // The transcript stands in for the audio as the recorded input; the
    // mood text feeds the analytics histogram later.
    if let Err(e) = state
        .history
        .append(
            &claims.sub,
            FeatureType::Audio,
            transcript.clone(),
            mood.clone(),
            None,
        )
        .await
    {
        error!("Failed to record audio-analysis history: {}", e);
    }

    Ok(Json(AudioAnalysisResponse { transcript, mood }))
}
