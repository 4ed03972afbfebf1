//! # Prodibot Store
//!
//! SQLite persistence for the chatbot service: the editor-maintained
//! knowledge base, visitor sessions, append-only chat messages, feedback on
//! bot replies, and the widget's quick replies.
//!
//! One `Mutex<Connection>` per store, WAL mode, schema created with
//! `execute_batch` on open. Timestamps are SQLite `datetime('now')` TEXT.

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use prodibot_core::error::{ProdibotError, Result};
use prodibot_core::types::{
    Category, ChatMessage, ChatSession, Feedback, KnowledgeEntry, QuickReply, Sender,
};

pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| ProdibotError::Database(format!("open {}: {e}", path.display())))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory database, used by tests and `persist_history = false` runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ProdibotError::Database(format!("open :memory:: {e}")))?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS knowledge (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL DEFAULT 'umum',
                question TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '',
                answer TEXT NOT NULL,
                link TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                ip_address TEXT,
                started_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_activity TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                sender TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
                body TEXT NOT NULL,
                matched_knowledge_id INTEGER,
                confidence REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_messages_session
                ON messages(session_id, id);

            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id INTEGER NOT NULL REFERENCES messages(id),
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS quick_replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1
            );",
        )
        .map_err(|e| ProdibotError::Database(format!("migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ProdibotError::Database(format!("lock: {e}")))
    }

    // ── Knowledge base ──────────────────────────────

    /// Insert a knowledge entry. `keywords` is the raw comma-separated form
    /// editors type; it is stored as-is and parsed on load.
    pub fn insert_knowledge(
        &self,
        category: Category,
        question: &str,
        keywords: &str,
        answer: &str,
        link: Option<&str>,
        priority: i32,
    ) -> Result<KnowledgeEntry> {
        let id = {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO knowledge (category, question, keywords, answer, link, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![category.as_str(), question, keywords, answer, link.unwrap_or(""), priority],
            )
            .map_err(|e| ProdibotError::Database(format!("insert knowledge: {e}")))?;
            conn.last_insert_rowid()
        };
        self.get_knowledge(id)
    }

    /// Fetch one entry by id.
    pub fn get_knowledge(&self, id: i64) -> Result<KnowledgeEntry> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, category, question, keywords, answer, link, priority, active,
                    created_at, updated_at
             FROM knowledge WHERE id = ?1",
            params![id],
            row_to_knowledge,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                ProdibotError::NotFound(format!("knowledge entry {id}"))
            }
            e => ProdibotError::Database(format!("get knowledge: {e}")),
        })
    }

    /// All entries, including inactive ones, in matcher order.
    pub fn list_knowledge(&self) -> Result<Vec<KnowledgeEntry>> {
        self.query_knowledge(
            "SELECT id, category, question, keywords, answer, link, priority, active,
                    created_at, updated_at
             FROM knowledge ORDER BY priority DESC, category, id",
        )
    }

    /// The matcher's snapshot: active entries only, priority-descending with
    /// a stable category/id tail. This ordering is what the matcher's
    /// first-wins tie-break operates over.
    pub fn active_knowledge(&self) -> Result<Vec<KnowledgeEntry>> {
        self.query_knowledge(
            "SELECT id, category, question, keywords, answer, link, priority, active,
                    created_at, updated_at
             FROM knowledge WHERE active = 1 ORDER BY priority DESC, category, id",
        )
    }

    fn query_knowledge(&self, sql: &str) -> Result<Vec<KnowledgeEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ProdibotError::Database(format!("prepare: {e}")))?;
        let rows = stmt
            .query_map([], row_to_knowledge)
            .map_err(|e| ProdibotError::Database(format!("query knowledge: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Update an entry's editable fields.
    pub fn update_knowledge(
        &self,
        id: i64,
        category: Category,
        question: &str,
        keywords: &str,
        answer: &str,
        link: Option<&str>,
        priority: i32,
    ) -> Result<KnowledgeEntry> {
        {
            let conn = self.lock()?;
            let changed = conn
                .execute(
                    "UPDATE knowledge
                     SET category=?1, question=?2, keywords=?3, answer=?4, link=?5,
                         priority=?6, updated_at=datetime('now')
                     WHERE id=?7",
                    params![category.as_str(), question, keywords, answer, link.unwrap_or(""), priority, id],
                )
                .map_err(|e| ProdibotError::Database(format!("update knowledge: {e}")))?;
            if changed == 0 {
                return Err(ProdibotError::NotFound(format!("knowledge entry {id}")));
            }
        }
        self.get_knowledge(id)
    }

    /// Flip an entry's active flag (content editors retire entries without
    /// deleting them).
    pub fn set_knowledge_active(&self, id: i64, active: bool) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE knowledge SET active=?1, updated_at=datetime('now') WHERE id=?2",
                params![active as i32, id],
            )
            .map_err(|e| ProdibotError::Database(format!("set active: {e}")))?;
        if changed == 0 {
            return Err(ProdibotError::NotFound(format!("knowledge entry {id}")));
        }
        Ok(())
    }

    pub fn knowledge_count(&self) -> usize {
        let Ok(conn) = self.lock() else { return 0 };
        conn.query_row("SELECT COUNT(*) FROM knowledge", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    // ── Sessions ──────────────────────────────

    /// Load the session for `token`, creating it on first contact.
    pub fn get_or_create_session(&self, token: &str, ip: Option<&str>) -> Result<ChatSession> {
        {
            let conn = self.lock()?;
            conn.execute(
                "INSERT OR IGNORE INTO sessions (token, ip_address) VALUES (?1, ?2)",
                params![token, ip],
            )
            .map_err(|e| ProdibotError::Database(format!("create session: {e}")))?;
        }
        self.find_session(token)?
            .ok_or_else(|| ProdibotError::Database(format!("session {token} vanished")))
    }

    /// Look up a session by token.
    pub fn find_session(&self, token: &str) -> Result<Option<ChatSession>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT id, token, ip_address, started_at, last_activity
                 FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    Ok(ChatSession {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        ip_address: row.get(2)?,
                        started_at: row.get(3)?,
                        last_activity: row.get(4)?,
                    })
                },
            )
            .ok();
        Ok(result)
    }

    /// Bump a session's last-activity timestamp.
    pub fn touch_session(&self, session_id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sessions SET last_activity = datetime('now') WHERE id = ?1",
            params![session_id],
        )
        .map_err(|e| ProdibotError::Database(format!("touch session: {e}")))?;
        Ok(())
    }

    // ── Messages ──────────────────────────────

    /// Append a message to a session. Messages are never updated or
    /// deleted; ordering within a session is by insertion.
    pub fn append_message(
        &self,
        session_id: i64,
        sender: Sender,
        body: &str,
        matched_knowledge_id: Option<i64>,
        confidence: f64,
    ) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (session_id, sender, body, matched_knowledge_id, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, sender.as_str(), body, matched_knowledge_id, confidence],
        )
        .map_err(|e| ProdibotError::Database(format!("append message: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// All messages of a session, oldest first.
    pub fn session_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, session_id, sender, body, matched_knowledge_id, confidence, created_at
                 FROM messages WHERE session_id = ?1 ORDER BY id",
            )
            .map_err(|e| ProdibotError::Database(format!("prepare: {e}")))?;
        let rows = stmt
            .query_map(params![session_id], row_to_message)
            .map_err(|e| ProdibotError::Database(format!("query messages: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get_message(&self, id: i64) -> Result<Option<ChatMessage>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT id, session_id, sender, body, matched_knowledge_id, confidence, created_at
                 FROM messages WHERE id = ?1",
                params![id],
                row_to_message,
            )
            .ok();
        Ok(result)
    }

    // ── Feedback ──────────────────────────────

    /// Record feedback for a message. No per-message uniqueness — repeated
    /// ratings of the same reply all land.
    pub fn add_feedback(&self, message_id: i64, rating: i32, comment: &str) -> Result<Feedback> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO feedback (message_id, rating, comment) VALUES (?1, ?2, ?3)",
            params![message_id, rating, comment],
        )
        .map_err(|e| ProdibotError::Database(format!("add feedback: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, message_id, rating, comment, created_at FROM feedback WHERE id = ?1",
            params![id],
            |row| {
                Ok(Feedback {
                    id: row.get(0)?,
                    message_id: row.get(1)?,
                    rating: row.get(2)?,
                    comment: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .map_err(|e| ProdibotError::Database(format!("get feedback: {e}")))
    }

    // ── Quick replies ──────────────────────────────

    pub fn insert_quick_reply(&self, label: &str, position: i32) -> Result<QuickReply> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO quick_replies (label, position) VALUES (?1, ?2)",
            params![label, position],
        )
        .map_err(|e| ProdibotError::Database(format!("insert quick reply: {e}")))?;
        let id = conn.last_insert_rowid();
        Ok(QuickReply {
            id,
            label: label.to_string(),
            position,
            active: true,
        })
    }

    /// Active quick replies in widget order.
    pub fn active_quick_replies(&self) -> Result<Vec<QuickReply>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, label, position, active FROM quick_replies
                 WHERE active = 1 ORDER BY position, id",
            )
            .map_err(|e| ProdibotError::Database(format!("prepare: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(QuickReply {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    position: row.get(2)?,
                    active: row.get::<_, i32>(3)? != 0,
                })
            })
            .map_err(|e| ProdibotError::Database(format!("query quick replies: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn row_to_knowledge(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeEntry> {
    let category: String = row.get(1)?;
    let keywords_raw: String = row.get(3)?;
    let link: String = row.get(5)?;
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        category: Category::parse(&category),
        question: row.get(2)?,
        keywords: KnowledgeEntry::parse_keywords(&keywords_raw),
        answer: row.get(4)?,
        link: if link.is_empty() { None } else { Some(link) },
        priority: row.get(6)?,
        active: row.get::<_, i32>(7)? != 0,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let sender: String = row.get(2)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sender: Sender::parse(&sender),
        body: row.get(3)?,
        matched_knowledge_id: row.get(4)?,
        confidence: row.get(5)?,
        created_at: row.get(6)?,
    })
}
