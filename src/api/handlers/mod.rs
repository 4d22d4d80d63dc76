pub mod analytics;
pub mod audio;
pub mod auth;
pub mod documents;
pub mod health;
pub mod history;
pub mod images;
pub mod multipart;
pub mod tone;
