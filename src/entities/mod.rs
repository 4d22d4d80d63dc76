pub mod prelude;

pub mod request_history;
pub mod users;
