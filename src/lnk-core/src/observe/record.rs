// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Timestamped transition records and the bounded diagnostic log.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::ring_log::{RingLog, DEFAULT_CAPACITY};

/// One accepted state transition.
#[derive(Debug, Clone, Serialize)]
pub struct StateRecord {
    pub component_id: String,
    pub from: String,
    pub to: String,
    /// Monotonic instant of the transition.
    #[serde(skip)]
    pub at: Instant,
    pub logged_at: DateTime<Utc>,
}

impl StateRecord {
    pub fn new(component_id: impl Into<String>, from: String, to: String) -> Self {
        Self {
            component_id: component_id.into(),
            from,
            to,
            at: Instant::now(),
            logged_at: Utc::now(),
        }
    }
}

impl fmt::Display for StateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} -> {}",
            self.logged_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.component_id,
            self.from,
            self.to
        )
    }
}

/// Ring log of recent transitions shared by every observable cell.
pub struct StateLog {
    records: RingLog<StateRecord>,
}

impl Default for StateLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StateLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RingLog::new(capacity),
        }
    }

    pub fn append(&self, record: StateRecord) {
        info!("{}", record);
        self.records.push(record);
    }

    pub fn size(&self) -> usize {
        self.records.size()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Record at logical index `index` (0 is oldest).
    pub fn at(&self, index: usize) -> Option<StateRecord> {
        self.records.at(index)
    }

    /// Every retained record, oldest first.
    pub fn records(&self) -> Vec<StateRecord> {
        self.records.snapshot()
    }

    /// Latest record for `component_id`, if still retained.
    pub fn last_for(&self, component_id: &str) -> Option<StateRecord> {
        self.records()
            .into_iter()
            .rev()
            .find(|r| r.component_id == component_id)
    }

    /// Emit every retained record through the log output.
    pub fn dump(&self) {
        let records = self.records();
        info!(
            "State log: {} of {} records",
            records.len(),
            self.capacity()
        );
        for record in &records {
            info!("  {}", record);
        }
    }

    /// JSON array of the retained records, oldest first.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, from: &str, to: &str) -> StateRecord {
        StateRecord::new(id, from.to_string(), to.to_string())
    }

    #[test]
    fn test_display_format() {
        let line = record("WifiLink", "CONNECTING", "CONNECTED").to_string();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] WifiLink: CONNECTING -> CONNECTED"));
    }

    #[test]
    fn test_log_is_bounded() {
        let log = StateLog::new(3);
        for i in 0..5 {
            log.append(record("cell", &i.to_string(), &(i + 1).to_string()));
        }
        assert_eq!(log.size(), 3);
        assert_eq!(log.at(0).map(|r| r.from), Some("2".to_string()));
        assert_eq!(log.at(2).map(|r| r.to), Some("5".to_string()));
    }

    #[test]
    fn test_last_for_component() {
        let log = StateLog::new(10);
        log.append(record("WifiLink", "A", "B"));
        log.append(record("BrokerSession", "A", "B"));
        log.append(record("WifiLink", "B", "C"));

        let last = log.last_for("WifiLink").unwrap();
        assert_eq!(last.to, "C");
        assert!(log.last_for("Ota").is_none());
    }

    #[test]
    fn test_json_skips_monotonic_instant() {
        let log = StateLog::new(2);
        log.append(record("WifiLink", "DISCONNECTED", "CONNECTING"));
        let json = log.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let entry = &value[0];
        assert_eq!(entry["component_id"], "WifiLink");
        assert_eq!(entry["to"], "CONNECTING");
        assert!(entry.get("at").is_none());
        assert!(entry.get("logged_at").is_some());
    }
}
