//! Error types for websmoke-tools

use thiserror::Error;
use websmoke_core::CollabError;

/// Failures while driving an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("failed to prepare key file: {0}")]
    KeyFile(#[source] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ToolError {
    /// Name of the tool the error came from.
    pub fn tool(&self) -> &str {
        match self {
            ToolError::Spawn { program, .. }
            | ToolError::Timeout { program, .. }
            | ToolError::NonZeroExit { program, .. } => program,
            ToolError::Parse { .. } => "parse",
            ToolError::KeyFile(_) => "ssh",
            ToolError::Http(_) => "http",
        }
    }
}

impl From<ToolError> for CollabError {
    fn from(err: ToolError) -> Self {
        CollabError::new(err.tool().to_string(), err.to_string())
    }
}

/// Result type for tool invocations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
