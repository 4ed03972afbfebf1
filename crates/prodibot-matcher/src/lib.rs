//! # Prodibot Matcher
//!
//! The response-matching engine: given a visitor's free-text message and a
//! snapshot of active knowledge entries, pick the single best-matching entry
//! and produce the reply text plus a normalized confidence score.
//!
//! ## How it works
//! ```text
//! "Bagaimana cara pendaftaran?"
//!   ↓ normalize + tokenize
//! {"bagaimana", "cara", "pendaftaran"}
//!   ↓ score every active entry
//!   keyword phrase in input       → +3.0
//!   phrase ↔ token substring      → +1.0 per token
//!   question-token overlap        → +2.0 per shared token
//!   entry priority                → +0.5 × priority
//!   ↓ fold to (best entry, best score), first entry keeps ties
//! score ≥ threshold → entry answer (+ related link)
//! otherwise        → default fallback, confidence 0
//! ```
//!
//! Pure and stateless: the same input and the same snapshot always produce
//! the same outcome. Persistence of the resulting messages is the engine
//! crate's concern.

pub mod matcher;
pub mod text;

pub use matcher::{best_match, score_entry, MatchOutcome, MatcherOptions};
pub use text::{normalize, tokenize};
