mod album;
mod photo;
mod session;
mod user;

pub use album::*;
pub use photo::*;
pub use session::*;
pub use user::*;
