mod dispatch;
mod message;
mod signup;

pub use dispatch::*;
pub use message::*;
pub use signup::*;
