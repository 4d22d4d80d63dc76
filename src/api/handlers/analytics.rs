use crate::api::error::AppError;
use crate::services::analytics::AnalyticsReport;
use crate::utils::auth::Claims;
use axum::{Extension, Json, extract::State};

#[utoipa::path(
    get,
    path = "/analytics",
    responses(
        (status = 200, description = "Reduction series and mood histogram", body = AnalyticsReport),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "analytics"
)]
pub async fn get_analytics(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = state.analytics.compute(&claims.sub).await?;
    Ok(Json(report))
}
