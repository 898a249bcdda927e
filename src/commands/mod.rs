//! CLI command implementations

mod ask;
mod docs;
mod ingest;
mod init;
mod remove;
mod search;
mod sessions;
mod status;

pub use ask::{cmd_ask, print_answer, AskOptions, AskResult};
pub use docs::{cmd_list_documents, print_documents};
pub use ingest::{cmd_ingest, print_ingest_stats, IngestStats};
pub use init::cmd_init;
pub use remove::{cmd_remove, print_remove_stats};
pub use search::{cmd_search, print_search_results, SearchOptions, SearchReport};
pub use sessions::{
    cmd_delete_session, cmd_list_sessions, cmd_show_session, print_session, print_sessions,
};
pub use status::{cmd_status, print_status, StatusReport};
