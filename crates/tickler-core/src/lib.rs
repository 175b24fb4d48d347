pub mod action;
pub mod config;
pub mod directive;
pub mod due;
pub mod engine;
pub mod error;
pub mod github;
pub mod recurrence;
pub mod template;
pub mod types;

pub use error::{Result, TicklerError};
