use std::env;

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind (default: "0.0.0.0")
    pub host: String,

    /// Port to listen on (default: 3000)
    pub port: u16,

    /// JWT signing secret (Required in production)
    pub jwt_secret: String,

    /// Gemini API key; inference endpoints return 502 when unset,
    /// except follow-up generation which falls back to a fixed list
    pub gemini_api_key: Option<String>,

    /// Gemini model name (default: "gemini-1.5-pro")
    pub gemini_model: String,

    /// Base URL of the Gemini REST API
    pub gemini_base_url: String,

    /// Timeout applied to every collaborator call, in seconds (default: 60)
    pub upstream_timeout_secs: u64,

    /// Maximum upload body size in bytes (default: 25 MB)
    pub max_upload_size: usize,

    /// SMTP relay host; OTP mail is logged-only when unset
    pub smtp_host: Option<String>,

    /// SMTP credentials
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,

    /// From address on outbound OTP mail
    pub mail_from: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: "secret".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            upstream_timeout_secs: 60,
            max_upload_size: 25 * 1024 * 1024, // 25 MB
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            mail_from: "no-reply@localhost".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production method

            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty()),

            gemini_model: env::var("GEMINI_MODEL").unwrap_or(default.gemini_model),

            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(default.gemini_base_url),

            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.upstream_timeout_secs),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            smtp_host: env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),

            mail_from: env::var("MAIL_FROM").unwrap_or(default.mail_from),
        }
    }

    /// Create config for production (strict security)
    pub fn production() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            ..Self::from_env()
        }
    }
}
