//! Domain records shared across Prodibot crates.

use serde::{Deserialize, Serialize};

/// Fixed category tags for knowledge entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pendaftaran,
    Akademik,
    Kurikulum,
    Fasilitas,
    Beasiswa,
    Karir,
    Kontak,
    Umum,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendaftaran => "pendaftaran",
            Self::Akademik => "akademik",
            Self::Kurikulum => "kurikulum",
            Self::Fasilitas => "fasilitas",
            Self::Beasiswa => "beasiswa",
            Self::Karir => "karir",
            Self::Kontak => "kontak",
            Self::Umum => "umum",
        }
    }

    /// Parse a stored category tag. Unknown tags degrade to `Umum` rather
    /// than failing — stored data never aborts a match.
    pub fn parse(s: &str) -> Self {
        match s {
            "pendaftaran" => Self::Pendaftaran,
            "akademik" => Self::Akademik,
            "kurikulum" => Self::Kurikulum,
            "fasilitas" => Self::Fasilitas,
            "beasiswa" => Self::Beasiswa,
            "karir" => Self::Karir,
            "kontak" => Self::Kontak,
            _ => Self::Umum,
        }
    }

    pub const ALL: [Category; 8] = [
        Self::Pendaftaran,
        Self::Akademik,
        Self::Kurikulum,
        Self::Fasilitas,
        Self::Beasiswa,
        Self::Karir,
        Self::Kontak,
        Self::Umum,
    ];
}

/// A knowledge-base entry — one candidate answer for the matcher.
///
/// `keywords` is the parsed form of the comma-separated field content
/// editors maintain: computed once when the entry is loaded, so the matcher
/// never re-parses raw text per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub category: Category,
    pub question: String,
    pub keywords: Vec<String>,
    pub answer: String,
    pub link: Option<String>,
    pub priority: i32,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl KnowledgeEntry {
    /// Split a raw comma-separated keyword field into lower-cased, trimmed,
    /// non-empty phrases.
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Who sent a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "bot" { Self::Bot } else { Self::User }
    }
}

/// One visitor conversation, identified by an opaque token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub token: String,
    pub ip_address: Option<String>,
    pub started_at: String,
    pub last_activity: String,
}

/// One message in a session. Bot messages carry the matched knowledge entry
/// (if any) and the matcher's confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: i64,
    pub sender: Sender,
    pub body: String,
    pub matched_knowledge_id: Option<i64>,
    pub confidence: f64,
    pub created_at: String,
}

/// Visitor rating of a bot reply. Several feedback rows may reference the
/// same message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub message_id: i64,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

/// Canned prompt shown in the chat widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickReply {
    pub id: i64,
    pub label: String,
    pub position: i32,
    pub active: bool,
}
