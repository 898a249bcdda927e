//! Session management commands

use crate::config::Config;
use crate::error::Result;
use crate::history::{Role, Session, SessionStore, SessionSummary};

fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(config.paths.sessions_dir.clone())
}

/// List stored conversation sessions, newest first
pub fn cmd_list_sessions(config: &Config) -> Result<Vec<SessionSummary>> {
    session_store(config).list()
}

/// Load a full session transcript
pub fn cmd_show_session(config: &Config, id: &str) -> Result<Session> {
    session_store(config).load(id)
}

/// Delete a session
pub fn cmd_delete_session(config: &Config, id: &str) -> Result<()> {
    session_store(config).delete(id)
}

/// Print the session listing to the console
pub fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No sessions recorded. Use 'registrar ask --session <id> ...' to start one.");
        return;
    }

    for session in sessions {
        println!(
            "{}  {} message(s)  {}",
            session.id, session.message_count, session.preview
        );
    }
}

/// Print a session transcript to the console
pub fn print_session(session: &Session) {
    println!("Session {} (started {})\n", session.id, session.created_at);

    for message in &session.messages {
        match message.role {
            Role::User => println!("❓ {}", message.content),
            Role::Assistant => {
                println!("💬 {}", message.content);
                for citation in &message.citations {
                    println!("   [{}] page {}", citation.document_title, citation.page_number);
                }
                println!();
            }
        }
    }
}
