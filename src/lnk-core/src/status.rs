// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mapping of connection states to status indicators.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::link::state::ConnectionState;
use crate::observe::StateListener;

/// What an indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum IndicatorEffect {
    Off,
    On,
    Blink { interval_ms: u32 },
}

impl fmt::Display for IndicatorEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::On => write!(f, "on"),
            Self::Blink { interval_ms } => write!(f, "blink {} ms", interval_ms),
        }
    }
}

/// Indicator hardware (LEDs, a status line, ...). Must not block.
pub trait Indicator: Send + Sync {
    fn set_indicator(&self, component_id: &str, effect: IndicatorEffect);
}

/// Listener that drives indicators from connection state changes.
pub struct StatusSink {
    indicator: Arc<dyn Indicator>,
    rules: HashMap<(String, ConnectionState), IndicatorEffect>,
}

impl StatusSink {
    /// A sink with no rules.
    pub fn new(indicator: Arc<dyn Indicator>) -> Self {
        Self {
            indicator,
            rules: HashMap::new(),
        }
    }

    /// Wi-Fi blinks at 500 ms and the broker at 1 s while connected; both
    /// go dark when disconnected.
    pub fn default_table(indicator: Arc<dyn Indicator>) -> Self {
        use ConnectionState::*;

        Self::new(indicator)
            .with_rule("WifiLink", Connected, IndicatorEffect::Blink { interval_ms: 500 })
            .with_rule("WifiLink", Disconnected, IndicatorEffect::Off)
            .with_rule(
                "BrokerSession",
                Connected,
                IndicatorEffect::Blink { interval_ms: 1000 },
            )
            .with_rule("BrokerSession", Disconnected, IndicatorEffect::Off)
    }

    pub fn with_rule(
        mut self,
        component_id: impl Into<String>,
        state: ConnectionState,
        effect: IndicatorEffect,
    ) -> Self {
        self.rules.insert((component_id.into(), state), effect);
        self
    }

    pub fn effect_for(
        &self,
        component_id: &str,
        state: ConnectionState,
    ) -> Option<IndicatorEffect> {
        self.rules.get(&(component_id.to_string(), state)).copied()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl StateListener<ConnectionState> for StatusSink {
    fn on_state_change(&self, id: &str, _old: &ConnectionState, new: &ConnectionState) {
        if let Some(effect) = self.effect_for(id, *new) {
            debug!("{}: indicator {}", id, effect);
            self.indicator.set_indicator(id, effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{ObservableCell, StateLog};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIndicator {
        calls: Mutex<Vec<(String, IndicatorEffect)>>,
    }

    impl Indicator for RecordingIndicator {
        fn set_indicator(&self, component_id: &str, effect: IndicatorEffect) {
            self.calls
                .lock()
                .unwrap()
                .push((component_id.to_string(), effect));
        }
    }

    fn wifi_cell() -> ObservableCell<ConnectionState> {
        ObservableCell::new(
            "WifiLink",
            ConnectionState::NotInitialized,
            ConnectionState::describe,
        )
        .with_log(Arc::new(StateLog::default()))
    }

    #[test]
    fn test_repeated_transition_drives_indicator_once() {
        let indicator = Arc::new(RecordingIndicator::default());
        let sink = Arc::new(StatusSink::default_table(indicator.clone()));
        let cell = wifi_cell();
        cell.register_listener(&sink);

        cell.set_state(ConnectionState::Connected);
        cell.set_state(ConnectionState::Connected);
        cell.set_state(ConnectionState::Connected);

        let calls = indicator.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "WifiLink".to_string(),
                IndicatorEffect::Blink { interval_ms: 500 }
            )]
        );
    }

    #[test]
    fn test_unmapped_state_is_silent() {
        let indicator = Arc::new(RecordingIndicator::default());
        let sink = Arc::new(StatusSink::default_table(indicator.clone()));
        let cell = wifi_cell();
        cell.register_listener(&sink);

        cell.set_state(ConnectionState::Connecting);
        assert!(indicator.calls.lock().unwrap().is_empty());

        cell.set_state(ConnectionState::Disconnected);
        assert_eq!(
            indicator.calls.lock().unwrap().last(),
            Some(&("WifiLink".to_string(), IndicatorEffect::Off))
        );
    }

    #[test]
    fn test_default_table() {
        let sink = StatusSink::default_table(Arc::new(RecordingIndicator::default()));
        assert_eq!(sink.rule_count(), 4);
        assert_eq!(
            sink.effect_for("BrokerSession", ConnectionState::Connected),
            Some(IndicatorEffect::Blink { interval_ms: 1000 })
        );
        assert_eq!(sink.effect_for("Ota", ConnectionState::Connected), None);
    }

    #[test]
    fn test_custom_rule_overrides_default() {
        let sink = StatusSink::default_table(Arc::new(RecordingIndicator::default()))
            .with_rule("WifiLink", ConnectionState::Connected, IndicatorEffect::On);
        assert_eq!(
            sink.effect_for("WifiLink", ConnectionState::Connected),
            Some(IndicatorEffect::On)
        );
    }

    #[test]
    fn test_effect_serde() {
        let effect: IndicatorEffect =
            serde_json::from_str(r#"{"effect":"blink","interval_ms":250}"#).unwrap();
        assert_eq!(effect, IndicatorEffect::Blink { interval_ms: 250 });
        assert_eq!(effect.to_string(), "blink 250 ms");
    }
}
