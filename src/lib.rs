pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::analytics::AnalyticsService;
use crate::services::history::HistoryService;
use crate::services::inference::InferenceClient;
use crate::services::mailer::Mailer;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::verify_otp,
        api::handlers::auth::login,
        api::handlers::auth::resend_otp,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        api::handlers::auth::profile,
        api::handlers::auth::delete_account,
        api::handlers::documents::pdf_summary,
        api::handlers::documents::pdf_followups,
        api::handlers::images::image_caption,
        api::handlers::audio::audio_analysis,
        api::handlers::tone::tone_changer,
        api::handlers::history::get_history,
        api::handlers::analytics::get_analytics,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::VerifyOtpRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::EmailRequest,
            api::handlers::auth::ResetPasswordRequest,
            api::handlers::auth::MessageResponse,
            api::handlers::auth::LoginResponse,
            api::handlers::auth::UserSummary,
            api::handlers::documents::SummaryResponse,
            api::handlers::documents::FollowupRequest,
            api::handlers::documents::FollowupResponse,
            api::handlers::images::CaptionResponse,
            api::handlers::audio::AudioAnalysisResponse,
            api::handlers::tone::ToneRequest,
            api::handlers::tone::ToneResponse,
            api::handlers::history::HistoryEntry,
            api::handlers::history::HistoryResponse,
            api::handlers::health::HealthResponse,
            services::analytics::AnalyticsReport,
            services::analytics::ReductionPoint,
            services::analytics::MoodSlice,
        )
    ),
    tags(
        (name = "auth", description = "Account lifecycle and sessions"),
        (name = "features", description = "AI content-processing endpoints"),
        (name = "history", description = "Per-user request history"),
        (name = "analytics", description = "Derived metrics over history"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub inference: Arc<dyn InferenceClient>,
    pub mailer: Arc<dyn Mailer>,
    pub history: HistoryService,
    pub analytics: AnalyticsService,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let authed = from_fn_with_state(state.clone(), api::middleware::auth::auth_middleware);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/verify-otp", post(api::handlers::auth::verify_otp))
        .route("/login", post(api::handlers::auth::login))
        .route("/resend-otp", post(api::handlers::auth::resend_otp))
        .route("/forgot-password", post(api::handlers::auth::forgot_password))
        .route("/reset-password", post(api::handlers::auth::reset_password))
        .route(
            "/profile",
            get(api::handlers::auth::profile).layer(authed.clone()),
        )
        .route(
            "/delete-account",
            delete(api::handlers::auth::delete_account).layer(authed.clone()),
        )
        .route(
            "/pdf-summary",
            post(api::handlers::documents::pdf_summary)
                .layer(axum::extract::DefaultBodyLimit::max(state.config.max_upload_size))
                .layer(authed.clone()),
        )
        .route(
            "/pdf-followups",
            post(api::handlers::documents::pdf_followups).layer(authed.clone()),
        )
        .route(
            "/image-caption",
            post(api::handlers::images::image_caption)
                .layer(axum::extract::DefaultBodyLimit::max(state.config.max_upload_size))
                .layer(authed.clone()),
        )
        .route(
            "/audio-analysis",
            post(api::handlers::audio::audio_analysis)
                .layer(axum::extract::DefaultBodyLimit::max(state.config.max_upload_size))
                .layer(authed.clone()),
        )
        .route(
            "/tone-changer",
            post(api::handlers::tone::tone_changer).layer(authed.clone()),
        )
        .route(
            "/history/:feature",
            get(api::handlers::history::get_history).layer(authed.clone()),
        )
        .route(
            "/analytics",
            get(api::handlers::analytics::get_analytics).layer(authed),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
