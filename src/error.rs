//! Error types for every layer of the service.
//!
//! Errors never cross a session boundary: each session converts what it
//! receives here into either a client-facing message or a closed socket.

use std::path::PathBuf;
use thiserror::Error;

/// Framing failures on the wire. All of these end the session without a reply.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("connection closed mid-message")]
    ConnectionClosed,

    #[error("invalid length header: {0:?}")]
    InvalidHeader(String),

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("length {len} does not fit in a {width} byte header")]
    HeaderOverflow { len: usize, width: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request problems that are reported back to the client.
///
/// The `Display` output is the exact text sent over the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Error: No '{0}' key present. Ensure the JSON has gender and letter keys.")]
    MissingKey(&'static str),

    #[error("Request error. The value in the 'gender' key, is not a gender.")]
    InvalidGender,

    #[error("Request error. The value in the 'letter' key, is not a letter.")]
    InvalidLetter,

    #[error("Request error. The message is not a JSON object: {0}")]
    MalformedRequest(String),
}

/// Failures while talking to the name catalog provider.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog responded with status {0}")]
    Status(u16),

    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog request timed out")]
    Timeout,

    #[error("catalog listing could not be parsed: {0}")]
    UnreadableListing(String),

    #[error("catalog page has {found} names, need {wanted}")]
    NotEnoughEntries { found: usize, wanted: usize },
}

impl CatalogError {
    /// The plain-text message a client receives for this failure.
    pub fn client_message(&self) -> &'static str {
        match self {
            CatalogError::Status(_) | CatalogError::Transport(_) | CatalogError::Timeout => {
                "Connection error. Try again."
            }
            CatalogError::UnreadableListing(_) => {
                "Catalog error. The name listing could not be read."
            }
            CatalogError::NotEnoughEntries { .. } => {
                "Catalog error. Not enough names were found for that letter."
            }
        }
    }
}

/// Fatal session outcomes.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("client did not send a request in time")]
    ReadTimeout,
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid listen address '{0}'")]
    InvalidListen(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
