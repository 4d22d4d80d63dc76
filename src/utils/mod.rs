pub mod auth;
pub mod otp;
pub mod password;
pub mod pdf;
