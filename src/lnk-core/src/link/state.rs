// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one supervised link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Constructed but `init()` has not run yet. Visited exactly once.
    #[default]
    NotInitialized,
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }

    /// Stringification handed to the observable cell.
    pub fn describe(state: &Self) -> String {
        state.as_str().to_string()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ConnectionState::NotInitialized.to_string(), "NOT_INITIALIZED");
        assert_eq!(ConnectionState::Connected.to_string(), "CONNECTED");
        assert_eq!(
            ConnectionState::describe(&ConnectionState::Disconnected),
            "DISCONNECTED"
        );
    }

    #[test]
    fn test_default_is_not_initialized() {
        assert_eq!(ConnectionState::default(), ConnectionState::NotInitialized);
        assert!(!ConnectionState::default().is_connected());
    }

    #[test]
    fn test_deserialize_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            state: ConnectionState,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"state":"connecting"}"#).unwrap();
        assert_eq!(parsed.state, ConnectionState::Connecting);
    }
}
