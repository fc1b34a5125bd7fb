use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a translation request ended in the `failed` state.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no text to translate")]
    Input,
    #[error("could not reach server: {0}")]
    Transport(String),
    #[error("server returned status {}", server_summary(.status, .detail))]
    Server {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("malformed frame: {0}")]
    Decode(String),
    #[error("no answer within {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

fn server_summary(status: &reqwest::StatusCode, detail: &str) -> String {
    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    }
}

/// Fieldless mirror of [`TranslateError`], handy for status lines and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Transport,
    Server,
    Decode,
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Input => "InputError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Server => "ServerError",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Timeout => "TimeoutError",
        };
        f.write_str(name)
    }
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Input => ErrorKind::Input,
            TranslateError::Transport(_) => ErrorKind::Transport,
            TranslateError::Server { .. } => ErrorKind::Server,
            TranslateError::Decode(_) => ErrorKind::Decode,
            TranslateError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Classifies a reqwest failure. Reqwest enforces the same deadline as the
    /// outer timer, so either one firing is reported as a timeout.
    pub(crate) fn from_reqwest(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            TranslateError::Timeout(deadline)
        } else if err.is_decode() {
            TranslateError::Decode(err.to_string())
        } else {
            TranslateError::Transport(err.to_string())
        }
    }

    /// Classifies an error surfaced while reading lines off the body stream.
    pub(crate) fn from_io(err: std::io::Error, deadline: Duration) -> Self {
        if err.kind() == std::io::ErrorKind::InvalidData {
            return TranslateError::Decode(err.to_string());
        }
        match err.into_inner() {
            Some(inner) => match inner.downcast::<reqwest::Error>() {
                Ok(err) => TranslateError::from_reqwest(*err, deadline),
                Err(other) => TranslateError::Transport(other.to_string()),
            },
            None => TranslateError::Transport("connection closed unexpectedly".to_string()),
        }
    }
}

/// Failure to obtain text from the clipboard or the OS selection.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("failed to copy selection: {0}")]
    Keystroke(String),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, Error>;
