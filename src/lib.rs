pub mod config;
pub mod core;
pub mod logger;
pub mod notify;
mod relay;
pub mod responder;
pub mod texts;

pub use crate::core::{ChatCore, ConnectError, CoreError, LinkState};
pub use crate::notify::Notifier;
