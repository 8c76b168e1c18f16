pub mod dto;
pub mod session;

pub use dto::User;
pub use session::{Session, SessionStatus};
