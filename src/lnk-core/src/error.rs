// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Errors that cross the boundary of a connection supervisor.
///
/// Transient link loss never shows up here; it is handled entirely by the
/// reconnect loop.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Malformed credentials or endpoint settings, detected at `init()`.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0} is already initialized")]
    AlreadyInitialized(String),

    /// A transport call was rejected by the underlying SDK.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type LinkResult<T> = Result<T, LinkError>;

impl LinkError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Whether the host must abort startup instead of retrying.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LinkError::config("ssid must not be empty").to_string(),
            "invalid configuration: ssid must not be empty"
        );
        assert_eq!(
            LinkError::AlreadyInitialized("WifiLink".to_string()).to_string(),
            "WifiLink is already initialized"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LinkError::config("bad").is_fatal());
        assert!(!LinkError::transport("radio busy").is_fatal());
    }
}
