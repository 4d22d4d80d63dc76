pub mod analytics;
pub mod history;
pub mod inference;
pub mod mailer;
