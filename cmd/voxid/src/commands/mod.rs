//! CLI commands module.

mod auth;
mod emotion;
mod util;
mod voiceprint;

pub use auth::{logout, status, LoginCommand};
pub use emotion::EmotionCommand;
pub use voiceprint::{EnrollCommand, HistoryCommand, VerifyCommand};

pub(crate) use util::*;
