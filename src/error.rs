//! Error taxonomy shared by the API client, session store and view flows.
//!
//! Every failure the library can produce is one of these variants. The view
//! controller catches them and renders them inline; the binary layers
//! `anyhow` on top only for its own plumbing (config files, output).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{}", http_display(*status, message.as_deref()))]
    Http { status: u16, message: Option<String> },

    /// The response body was not valid JSON or not the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Local input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Session or other local state could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short machine-friendly kind, used in the activity log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }

    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the server in an error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn http_display(status: u16, message: Option<&str>) -> String {
    match message {
        Some(msg) => format!("HTTP {status}: {msg}"),
        None => format!("HTTP {status}"),
    }
}
