use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a host while closing a window.
///
/// The tracker never propagates these; they end up in a
/// [`crate::dispatcher::CloseOutcome::Failed`] and a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("window is no longer managed")]
    WindowGone,
    #[error("host rejected close: {0}")]
    Rejected(String),
}

/// Errors raised while loading or parsing a gesture trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: unknown {kind} `{name}`")]
    Unknown {
        line: usize,
        kind: &'static str,
        name: String,
    },
}

impl TraceError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        TraceError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unknown(line: usize, kind: &'static str, name: impl Into<String>) -> Self {
        TraceError::Unknown {
            line,
            kind,
            name: name.into(),
        }
    }
}
