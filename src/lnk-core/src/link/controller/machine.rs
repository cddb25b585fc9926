// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Connection state transitions driven by transport events.
//!
//! The table is a pure function so the supervisor can evaluate it inside
//! the cell's compare-and-set and tests can check it exhaustively.

use crate::link::state::ConnectionState;
use crate::link::TransportEvent;

/// Follow-up work the supervisor performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Ask the transport to connect.
    Connect,
    /// Clear retry progress.
    ResetBackoff,
}

/// An accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: ConnectionState,
    pub action: Option<LinkAction>,
}

impl Transition {
    fn to(to: ConnectionState) -> Self {
        Self { to, action: None }
    }

    fn with(to: ConnectionState, action: LinkAction) -> Self {
        Self {
            to,
            action: Some(action),
        }
    }
}

/// Determine the next state based on current state and event.
/// Returns `None` when the event does not change anything.
pub fn next_state(current: ConnectionState, event: &TransportEvent) -> Option<Transition> {
    use ConnectionState::*;

    match (current, event) {
        // Transport came up: start the first association.
        (NotInitialized | Disconnected, TransportEvent::Started) => {
            Some(Transition::with(Connecting, LinkAction::Connect))
        }

        // A reconnect issued while Disconnected completes without a
        // separate Started event, so both states may become Connected.
        (Connecting | Disconnected, TransportEvent::Established { .. }) => {
            Some(Transition::with(Connected, LinkAction::ResetBackoff))
        }

        // Loss from any live state.
        (NotInitialized | Connecting | Connected, TransportEvent::Lost { .. }) => {
            Some(Transition::to(Disconnected))
        }

        // Duplicate or out-of-order events.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 4] = [NotInitialized, Disconnected, Connecting, Connected];

    fn established() -> TransportEvent {
        TransportEvent::established("192.168.1.20")
    }

    #[test]
    fn test_started_connects() {
        for from in [NotInitialized, Disconnected] {
            assert_eq!(
                next_state(from, &TransportEvent::Started),
                Some(Transition::with(Connecting, LinkAction::Connect))
            );
        }
        assert_eq!(next_state(Connecting, &TransportEvent::Started), None);
        assert_eq!(next_state(Connected, &TransportEvent::Started), None);
    }

    #[test]
    fn test_established_resets_backoff() {
        for from in [Connecting, Disconnected] {
            let t = next_state(from, &established()).unwrap();
            assert_eq!(t.to, Connected);
            assert_eq!(t.action, Some(LinkAction::ResetBackoff));
        }
        assert_eq!(next_state(Connected, &established()), None);
        assert_eq!(next_state(NotInitialized, &established()), None);
    }

    #[test]
    fn test_lost_from_any_state() {
        for from in ALL {
            let result = next_state(from, &TransportEvent::lost("beacon timeout"));
            if from == Disconnected {
                assert_eq!(result, None);
            } else {
                assert_eq!(result, Some(Transition::to(Disconnected)));
            }
        }
    }

    #[test]
    fn test_never_returns_not_initialized() {
        let events = [
            TransportEvent::Started,
            TransportEvent::Lost { reason: None },
            TransportEvent::Established { detail: None },
        ];
        for from in ALL {
            for event in &events {
                if let Some(t) = next_state(from, event) {
                    assert_ne!(t.to, NotInitialized);
                    assert_ne!(t.to, from);
                }
            }
        }
    }
}
