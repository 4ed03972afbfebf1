//! # Prodibot Engine
//!
//! Conversation orchestration between the HTTP surface and the pure
//! matcher: validates the incoming message, resolves the visitor session,
//! records the user message, runs the matcher over the active knowledge
//! snapshot, records the bot reply, and returns the outcome.
//!
//! Ordering guarantee: the user message is written before the matcher runs,
//! and the bot message is written before the reply is returned, so a crash
//! mid-request never leaves a bot message without its user message.

use std::sync::Arc;

use prodibot_core::config::ChatConfig;
use prodibot_core::error::{ProdibotError, Result};
use prodibot_core::types::{ChatMessage, Sender};
use prodibot_matcher::{best_match, MatcherOptions};
use prodibot_store::ChatStore;
use serde::Serialize;

/// What the caller gets back for one submitted message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
    pub matched: bool,
    pub confidence: f64,
    /// Row id of the persisted bot message; absent when history is off.
    pub message_id: Option<i64>,
}

/// The chat engine. One instance per process; every call is an
/// independent, synchronous unit of work.
pub struct ChatEngine {
    store: Arc<ChatStore>,
    options: MatcherOptions,
    persist_history: bool,
}

impl ChatEngine {
    /// Build an engine from the chat config. Persistence on/off is decided
    /// here, once, at construction — never re-read inside request handling.
    pub fn new(store: Arc<ChatStore>, config: &ChatConfig) -> Self {
        Self {
            store,
            options: MatcherOptions {
                default_response: config.default_response.clone(),
                score_threshold: config.score_threshold,
                link_label: config.link_label.clone(),
            },
            persist_history: config.persist_history,
        }
    }

    /// Handle one visitor message.
    pub fn send(
        &self,
        session_token: Option<&str>,
        message: &str,
        ip: Option<&str>,
    ) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ProdibotError::EmptyInput);
        }

        let token = match session_token.filter(|t| !t.trim().is_empty()) {
            Some(t) => t.trim().to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let session = self.store.get_or_create_session(&token, ip)?;

        // User message lands before matching starts.
        if self.persist_history {
            self.store
                .append_message(session.id, Sender::User, message, None, 0.0)?;
        }

        let entries = self.store.active_knowledge()?;
        let outcome = best_match(message, &entries, &self.options);
        tracing::debug!(
            session = %token,
            matched = outcome.matched,
            score = outcome.score,
            entry = ?outcome.entry_id,
            "matched message"
        );

        // Bot message lands before the reply leaves the engine.
        let message_id = if self.persist_history {
            Some(self.store.append_message(
                session.id,
                Sender::Bot,
                &outcome.response,
                outcome.entry_id,
                outcome.confidence,
            )?)
        } else {
            None
        };
        self.store.touch_session(session.id)?;

        Ok(ChatReply {
            session_id: token,
            response: outcome.response,
            matched: outcome.matched,
            confidence: outcome.confidence,
            message_id,
        })
    }

    /// A session's messages, oldest first.
    pub fn history(&self, session_token: &str) -> Result<Vec<ChatMessage>> {
        let session = self
            .store
            .find_session(session_token)?
            .ok_or_else(|| ProdibotError::NotFound(format!("session {session_token}")))?;
        self.store.session_messages(session.id)
    }

    /// Record a rating for a bot reply.
    pub fn feedback(&self, message_id: i64, rating: i32, comment: &str) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(ProdibotError::InvalidRating(i64::from(rating)));
        }
        let message = self
            .store
            .get_message(message_id)?
            .ok_or_else(|| ProdibotError::NotFound(format!("message {message_id}")))?;
        if message.sender != Sender::Bot {
            return Err(ProdibotError::NotFound(format!(
                "message {message_id} is not a bot reply"
            )));
        }
        self.store.add_feedback(message_id, rating, comment)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodibot_core::types::Category;

    fn engine_with(persist: bool) -> ChatEngine {
        let store = Arc::new(ChatStore::open_in_memory().unwrap());
        store
            .insert_knowledge(
                Category::Pendaftaran,
                "bagaimana cara mendaftar",
                "pendaftaran, daftar",
                "Pendaftaran dibuka setiap Juni.",
                None,
                0,
            )
            .unwrap();
        let config = ChatConfig {
            persist_history: persist,
            ..ChatConfig::default()
        };
        ChatEngine::new(store, &config)
    }

    #[test]
    fn test_send_matches_and_persists_both_messages() {
        let engine = engine_with(true);
        let reply = engine.send(None, "bagaimana cara pendaftaran", None).unwrap();
        assert!(reply.matched);
        assert!(!reply.session_id.is_empty());
        assert!(reply.message_id.is_some());
        assert_eq!(reply.response, "Pendaftaran dibuka setiap Juni.");

        let history = engine.history(&reply.session_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].body, "bagaimana cara pendaftaran");
        assert_eq!(history[1].sender, Sender::Bot);
        assert!((history[1].confidence - reply.confidence).abs() < 1e-9);
    }

    #[test]
    fn test_empty_message_is_rejected_without_side_effects() {
        let engine = engine_with(true);
        let err = engine.send(Some("tok"), "   ", None).unwrap_err();
        assert!(matches!(err, ProdibotError::EmptyInput));
        // No session was created either.
        assert!(engine.history("tok").is_err());
    }

    #[test]
    fn test_session_token_reused_across_sends() {
        let engine = engine_with(true);
        let first = engine.send(None, "halo", None).unwrap();
        let second = engine
            .send(Some(&first.session_id), "info pendaftaran", None)
            .unwrap();
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(engine.history(&first.session_id).unwrap().len(), 4);
    }

    #[test]
    fn test_unmatched_message_gets_default_reply() {
        let engine = engine_with(true);
        let reply = engine.send(None, "xyz123 tidak jelas", None).unwrap();
        assert!(!reply.matched);
        assert_eq!(reply.confidence, 0.0);
        assert!(reply.response.contains("Kontak"));
    }

    #[test]
    fn test_double_submit_produces_two_replies() {
        let engine = engine_with(true);
        let a = engine.send(Some("dup"), "pendaftaran", None).unwrap();
        let b = engine.send(Some("dup"), "pendaftaran", None).unwrap();
        assert!(a.matched && b.matched);
        assert_eq!(engine.history("dup").unwrap().len(), 4);
    }

    #[test]
    fn test_persist_history_off_still_answers() {
        let engine = engine_with(false);
        let reply = engine.send(Some("tok"), "bagaimana cara pendaftaran", None).unwrap();
        assert!(reply.matched);
        assert!(reply.message_id.is_none());
        // Session row exists but no messages were written.
        assert!(engine.history("tok").unwrap().is_empty());
    }

    #[test]
    fn test_feedback_validation() {
        let engine = engine_with(true);
        let reply = engine.send(None, "pendaftaran", None).unwrap();
        let bot_id = reply.message_id.unwrap();

        engine.feedback(bot_id, 5, "membantu").unwrap();
        assert!(matches!(
            engine.feedback(bot_id, 0, ""),
            Err(ProdibotError::InvalidRating(0))
        ));
        assert!(matches!(
            engine.feedback(9999, 3, ""),
            Err(ProdibotError::NotFound(_))
        ));
        // User messages cannot be rated.
        let history = engine.history(&reply.session_id).unwrap();
        let user_id = history[0].id;
        assert!(engine.feedback(user_id, 3, "").is_err());
    }

    #[test]
    fn test_history_unknown_session() {
        let engine = engine_with(true);
        assert!(matches!(
            engine.history("nope"),
            Err(ProdibotError::NotFound(_))
        ));
    }
}
