//! Data models for permashell
//!
//! Value types used by the session layer: the command submitted for
//! execution and the sentinel token that frames its completion.

pub mod command;
pub mod token;

pub use command::{Command, OutputSink};
pub use token::SentinelToken;
