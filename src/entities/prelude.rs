pub use super::request_history::Entity as RequestHistory;
pub use super::users::Entity as Users;
