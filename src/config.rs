use crate::client::ClientConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Parser)]
#[command(name = "docchat", version, about = "Chat with your documents from the terminal")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "DOCCHAT_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Chat memory session on the backend
    #[arg(long, env = "DOCCHAT_SESSION", default_value = DEFAULT_SESSION, global = true)]
    pub session: String,

    /// Start with the dark palette
    #[arg(long, global = true)]
    pub dark: bool,

    /// Directory for log files
    #[arg(long, env = "DOCCHAT_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive chat (default)
    Chat,
    /// Upload a document and print its id
    Upload { path: PathBuf },
    /// Delete an uploaded document
    Delete { document_id: String },
    /// Ask one question and stream the answer to stdout
    Ask {
        #[arg(long, short)]
        document: String,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Render a markdown or text file the way answers are rendered
    Render { path: PathBuf },
    /// Print the preview of a local document
    Preview { path: PathBuf },
    /// List documents known to the backend
    Documents,
    /// Clear the backend's chat memory for the session
    Clear,
}

impl Cli {
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            session_id: self.session.clone(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("docchat")
        .join("logs")
}
