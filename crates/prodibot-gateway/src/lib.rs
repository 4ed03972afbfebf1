//! # Prodibot Gateway
//!
//! HTTP API for the chat widget and content-editor tooling. Thin layer:
//! request parsing, status-code mapping, CORS and request tracing — all
//! chat behavior lives in `prodibot-engine`.

pub mod routes;
pub mod server;

pub use server::{build_router, start, AppState};
