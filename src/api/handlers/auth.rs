use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::services::mailer::send_otp_email;
use crate::utils::auth::{Claims, create_jwt};
use crate::utils::otp::{generate_otp, otp_expired};
use crate::utils::password::{hash_password, verify_password};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Uniqueness policy: emails are compared lowercased and trimmed,
/// usernames trimmed but otherwise as given.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Missing or blank fields are a 400. Surrounding whitespace is stripped,
/// so `"alice "` and `"alice"` are the same username (and the same
/// password) everywhere.
fn required(field: Option<String>, name: &str) -> Result<String, AppError> {
    match field.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{} is required", name))),
    }
}

async fn find_by_email(
    db: &sea_orm::DatabaseConnection,
    email: &str,
) -> Result<users::Model, AppError> {
    Users::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Consumes the OTP slot: applies `changes` only if the stored code still
/// equals `code`, so of two concurrent attempts exactly one wins.
async fn consume_otp(
    db: &sea_orm::DatabaseConnection,
    user: &users::Model,
    code: &str,
    extra: impl FnOnce(sea_orm::UpdateMany<users::Entity>) -> sea_orm::UpdateMany<users::Entity>,
) -> Result<(), AppError> {
    if user.otp.as_deref() != Some(code) || otp_expired(user.otp_created_at, Utc::now()) {
        return Err(AppError::InvalidOtp("Invalid or expired OTP".to_string()));
    }

    let update = Users::update_many()
        .col_expr(users::Column::Otp, Expr::value(Option::<String>::None))
        .col_expr(
            users::Column::OtpCreatedAt,
            Expr::value(Option::<chrono::DateTime<Utc>>::None),
        )
        .filter(users::Column::Id.eq(&user.id))
        .filter(users::Column::Otp.eq(code));

    let result = extra(update).exec(db).await?;
    if result.rows_affected == 0 {
        // Lost the race: the code was already consumed or overwritten.
        return Err(AppError::InvalidOtp("Invalid or expired OTP".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, OTP sent", body = MessageResponse),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let username = required(payload.username, "username")?;
    let email = normalize_email(&required(payload.email, "email")?);
    let password = required(payload.password, "password")?;

    if !email.validate_email() {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let otp = generate_otp();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username.clone()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(&password)?),
        is_verified: Set(false),
        otp: Set(Some(otp.clone())),
        otp_created_at: Set(Some(Utc::now())),
        created_at: Set(Some(Utc::now())),
    };

    // Uniqueness rides entirely on the DB constraints: a violation from
    // the insert is a duplicate username or email, whether or not another
    // registration raced this one. The insert commits before delivery is
    // attempted; a mail failure logs but never rolls the account back.
    if let Err(e) = user.insert(&state.db).await {
        return Err(match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("User already exists".to_string())
            }
            _ => e.into(),
        });
    }

    send_otp_email(
        state.mailer.clone(),
        email,
        username,
        "Your OTP Verification Code",
        otp,
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registered successfully. Check email for OTP.".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified (idempotent)", body = MessageResponse),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    State(state): State<crate::AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(payload.email, "email")?;
    let code = required(payload.otp, "otp")?;

    let user = find_by_email(&state.db, &email).await?;

    if user.is_verified {
        return Ok(Json(MessageResponse {
            message: "User already verified".to_string(),
        }));
    }

    consume_otp(&state.db, &user, &code, |update| {
        update.col_expr(users::Column::IsVerified, Expr::value(true))
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully!".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = required(payload.username, "username")?;
    let password = required(payload.password, "password")?;

    // Unknown user and wrong password share one error path.
    let user = Users::find()
        .filter(users::Column::Username.eq(&username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    // Checked only after the credentials hold, so an unverified account is
    // indistinguishable from a wrong password until the caller owns it.
    if !user.is_verified {
        return Err(AppError::Unverified(
            "Email not verified. Please verify your OTP.".to_string(),
        ));
    }

    let token = create_jwt(&user.id, &state.config.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        access_token: token,
        user: UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/resend-otp",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "OTP reissued (no-op when verified)", body = MessageResponse),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    State(state): State<crate::AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(payload.email, "email")?;
    let user = find_by_email(&state.db, &email).await?;

    if user.is_verified {
        return Ok(Json(MessageResponse {
            message: "User already verified".to_string(),
        }));
    }

    let (otp, email, username) = reissue_otp(&state.db, user).await?;

    send_otp_email(
        state.mailer.clone(),
        email,
        username,
        "Your OTP Verification Code",
        otp,
    );

    Ok(Json(MessageResponse {
        message: "OTP resent successfully.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Password-reset OTP sent", body = MessageResponse),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<crate::AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(payload.email, "email")?;
    let user = find_by_email(&state.db, &email).await?;

    // A reset is allowed regardless of verification state: the OTP itself
    // proves control of the mailbox.
    let (otp, email, username) = reissue_otp(&state.db, user).await?;

    send_otp_email(state.mailer.clone(), email, username, "Password Reset OTP", otp);

    Ok(Json(MessageResponse {
        message: "OTP sent to your email".to_string(),
    }))
}

/// Overwrites the single OTP slot (code and timestamp together) and returns
/// (code, email, username) for delivery. Any in-flight code is invalidated.
async fn reissue_otp(
    db: &sea_orm::DatabaseConnection,
    user: users::Model,
) -> Result<(String, String, String), AppError> {
    let otp = generate_otp();
    let email = user.email.clone();
    let username = user.username.clone();

    let mut active: users::ActiveModel = user.into();
    active.otp = Set(Some(otp.clone()));
    active.otp_created_at = Set(Some(Utc::now()));
    active.update(db).await?;

    Ok((otp, email, username))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<crate::AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(payload.email, "email")?;
    let code = required(payload.otp, "otp")?;
    let new_password = required(payload.new_password, "new_password")?;

    let user = find_by_email(&state.db, &email).await?;
    let new_hash = hash_password(&new_password)?;

    consume_otp(&state.db, &user, &code, |update| {
        update.col_expr(users::Column::PasswordHash, Expr::value(new_hash))
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successful! You can now login with your new password.".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile with history record count"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn profile(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = Users::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let records = state.history.count_for_user(&user.id).await?;

    Ok(Json(json!({
        "data": {
            "username": user.username,
            "email": user.email,
            "records": records,
        }
    })))
}

#[utoipa::path(
    delete,
    path = "/delete-account",
    responses(
        (status = 200, description = "Account and history deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account already gone")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn delete_account(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;

    let user = Users::find_by_id(&claims.sub)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // History rows and the user row go in the same transaction; no orphans
    // either way.
    crate::services::history::delete_all_for_user(&txn, &user.id).await?;
    user.delete(&txn).await?;

    txn.commit().await?;

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
