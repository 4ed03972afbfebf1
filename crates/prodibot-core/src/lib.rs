//! # Prodibot Core
//!
//! Shared foundation for the Prodibot chatbot service: configuration,
//! the error type, and the domain records (knowledge entries, sessions,
//! messages, feedback, quick replies) used by every other crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::ProdibotConfig;
pub use error::{ProdibotError, Result};
