use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Draws a code uniformly from the full zero-padded 6-digit space.
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// A missing issuance timestamp counts as expired, never as "no expiry".
pub fn otp_expired(issued_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match issued_at {
        None => true,
        Some(t) => now - t > Duration::minutes(OTP_TTL_MINUTES),
    }
}
