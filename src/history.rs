//! Conversation session persistence
//!
//! Sessions are JSON files under the data directory, one per conversation.
//! Each `ask` invoked with a session id appends the question and the cited
//! answer, so students can review past exchanges.

use crate::error::{Error, Result};
use crate::prompt::Citation;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// A stored conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<Message>,
}

/// Listing entry for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
    pub preview: String,
}

/// Generate a fresh session id
pub fn new_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("sess_{}", &hex[..12])
}

fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidPath(format!("Invalid session id: {}", id)))
    }
}

/// Session file store
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn save(&self, session: &Session) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(self.path_for(&session.id), content)?;
        Ok(())
    }

    /// Load an existing session
    pub fn load(&self, id: &str) -> Result<Session> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a session, creating it if it does not exist yet
    pub fn open(&self, id: &str) -> Result<Session> {
        validate_id(id)?;
        match self.load(id) {
            Ok(session) => Ok(session),
            Err(Error::SessionNotFound(_)) => {
                let now = Utc::now().to_rfc3339();
                let session = Session {
                    id: id.to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                    messages: Vec::new(),
                };
                self.save(&session)?;
                Ok(session)
            }
            Err(e) => Err(e),
        }
    }

    /// Append a question/answer exchange to a session
    pub fn record_exchange(
        &self,
        id: &str,
        question: &str,
        answer: &str,
        citations: &[Citation],
    ) -> Result<()> {
        let mut session = self.open(id)?;
        let now = Utc::now().to_rfc3339();

        session.messages.push(Message {
            role: Role::User,
            content: question.to_string(),
            timestamp: now.clone(),
            citations: Vec::new(),
        });
        session.messages.push(Message {
            role: Role::Assistant,
            content: answer.to_string(),
            timestamp: now.clone(),
            citations: citations.to_vec(),
        });
        session.updated_at = now;

        self.save(&session)
    }

    /// List sessions, most recently updated first
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();

        if !self.dir.exists() {
            return Ok(summaries);
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let Ok(session) = serde_json::from_str::<Session>(&content) else {
                continue;
            };

            let preview = session
                .messages
                .iter()
                .find(|m| m.role == Role::User)
                .map(|m| {
                    let mut p: String = m.content.chars().take(50).collect();
                    if m.content.chars().count() > 50 {
                        p.push_str("...");
                    }
                    p
                })
                .unwrap_or_default();

            summaries.push(SessionSummary {
                id: session.id,
                created_at: session.created_at,
                updated_at: session.updated_at,
                message_count: session.messages.len(),
                preview,
            });
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Delete a session
    pub fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("sessions"));
        (dir, store)
    }

    fn citation() -> Citation {
        Citation {
            document_title: "Exam Regulations".to_string(),
            page_number: 12,
            excerpt: "resit exams...".to_string(),
        }
    }

    #[test]
    fn test_open_creates_then_loads() {
        let (_dir, store) = store();

        let created = store.open("sess_abc123").unwrap();
        assert!(created.messages.is_empty());

        let loaded = store.load("sess_abc123").unwrap();
        assert_eq!(loaded.id, "sess_abc123");
        assert_eq!(loaded.created_at, created.created_at);
    }

    #[test]
    fn test_record_exchange_appends_pair_with_citations() {
        let (_dir, store) = store();

        store
            .record_exchange("sess_1", "when are resits?", "In September.", &[citation()])
            .unwrap();

        let session = store.load("sess_1").unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].citations.len(), 1);
        assert_eq!(session.messages[1].citations[0].page_number, 12);
    }

    #[test]
    fn test_list_is_newest_first_with_preview() {
        let (_dir, store) = store();

        store.record_exchange("sess_old", "first question", "a", &[]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.record_exchange("sess_new", "second question", "b", &[]).unwrap();

        let sessions = store.list().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "sess_new");
        assert_eq!(sessions[1].preview, "first question");
    }

    #[test]
    fn test_delete_removes_session() {
        let (_dir, store) = store();

        store.record_exchange("sess_x", "q", "a", &[]).unwrap();
        store.delete("sess_x").unwrap();

        assert!(matches!(
            store.load("sess_x").unwrap_err(),
            Error::SessionNotFound(_)
        ));
        assert!(matches!(
            store.delete("sess_x").unwrap_err(),
            Error::SessionNotFound(_)
        ));
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let (_dir, store) = store();
        assert!(store.open("../escape").is_err());
        assert!(store.open("").is_err());
    }

    #[test]
    fn test_new_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("sess_"));
    }
}
