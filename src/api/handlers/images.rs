use crate::api::error::AppError;
use crate::api::handlers::multipart::read_upload;
use crate::entities::request_history::FeatureType;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::{Multipart, State}};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct CaptionResponse {
    pub caption: String,
}

#[utoipa::path(
    post,
    path = "/image-caption",
    request_body(content = Multipart, description = "Image upload with optional caption_type field"),
    responses(
        (status = 200, description = "Caption generated", body = CaptionResponse),
        (status = 400, description = "Missing file"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Inference failure")
    ),
    security(("jwt" = [])),
    tag = "features"
)]
pub async fn image_caption(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<Json<CaptionResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let style = upload.field("caption_type").unwrap_or("descriptive").to_string();
    let mime_type = infer::get(&upload.data)
        .map(|kind| kind.mime_type())
        .unwrap_or("image/jpeg");

    let caption = state
        .inference
        .caption_image(&upload.data, mime_type, &style)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    // Only the filename identifies the input; raw image bytes stay out of
    // the ledger.
    if let Err(e) = state
        .history
        .append(
            &claims.sub,
            FeatureType::Image,
            upload.filename.clone(),
            caption.clone(),
            None,
        )
        .await
    {
        error!("Failed to record image-caption history: {}", e);
    }

    Ok(Json(CaptionResponse { caption }))
}
