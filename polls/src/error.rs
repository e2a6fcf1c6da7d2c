//! Error type shared by every poll operation.

use std::path::PathBuf;

use snafu::Snafu;

/// Everything that can go wrong inside the poll library.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    /// Input rejected before any state changed.
    #[snafu(display("invalid poll: {reason}"))]
    Validation { reason: String },

    #[snafu(display("poll '{id}' not found"))]
    NotFound { id: String },

    /// Response text does not match any option of the poll.
    #[snafu(display("'{response}' is not an option of poll '{poll_id}'"))]
    InvalidOption { poll_id: String, response: String },

    #[snafu(display("poll '{id}' is not accepting responses"))]
    PollInactive { id: String },

    #[snafu(display("read snapshot {}", path.display()))]
    ReadSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("parse snapshot {}", path.display()))]
    ParseSnapshot {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("write snapshot {}", path.display()))]
    WriteSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("encode snapshot"))]
    EncodeSnapshot { source: serde_json::Error },

    #[snafu(display("read seed file {}", path.display()))]
    ReadSeed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("parse seed file {}", path.display()))]
    ParseSeed {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("write csv export"))]
    Export { source: csv::Error },
}

/// Coarse classification used by callers that map errors to exit codes or
/// HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidOption,
    Inactive,
    Persistence,
    Input,
}

impl PollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PollError::Validation { .. } => ErrorKind::Validation,
            PollError::NotFound { .. } => ErrorKind::NotFound,
            PollError::InvalidOption { .. } => ErrorKind::InvalidOption,
            PollError::PollInactive { .. } => ErrorKind::Inactive,
            PollError::ReadSnapshot { .. }
            | PollError::ParseSnapshot { .. }
            | PollError::WriteSnapshot { .. }
            | PollError::EncodeSnapshot { .. } => ErrorKind::Persistence,
            PollError::ReadSeed { .. } | PollError::ParseSeed { .. } | PollError::Export { .. } => {
                ErrorKind::Input
            }
        }
    }
}

pub type Result<T, E = PollError> = std::result::Result<T, E>;
