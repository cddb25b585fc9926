// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for lnk-agent.
//!
//! Config is loaded from the `[lnk-agent]` section of `lnk-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./lnk-rs.toml`
//! 3. `~/.config/lnk-rs/lnk-rs.toml`
//! 4. `/etc/lnk-rs/lnk-rs.toml`

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lnk_app::ConfigFile;
use lnk_core::{
    BrokerEndpoint, ConnectionState, ExponentialBackoff, HealthCheckPolicy, Indicator,
    IndicatorEffect, RetryPolicy, StatusSink, WifiCredentials,
};

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub general: GeneralConfig,
    pub wifi: WifiCredentials,
    pub broker: BrokerEndpoint,
    pub reconnect: ReconnectConfig,
    pub health: HealthConfig,
    pub diagnostics: DiagnosticsConfig,
    pub status: StatusConfig,
    /// Behavior of the simulated transports.
    pub sim: SimConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
    /// Device label used in log output
    pub device: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            device: "lnk-device".to_string(),
        }
    }
}

/// What happens once the retry budget is used up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectStrategy {
    /// Bounded retries, then restart.
    #[default]
    Escalate,
    /// Retry forever.
    Persist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub strategy: ReconnectStrategy,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Only used by the `escalate` strategy.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectStrategy::Escalate,
            initial_delay_ms: 10_000,
            max_delay_ms: 300_000,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    pub fn retry_policy(&self) -> Arc<dyn RetryPolicy> {
        let max_attempts = match self.strategy {
            ReconnectStrategy::Escalate => Some(self.max_attempts),
            ReconnectStrategy::Persist => None,
        };
        Arc::new(ExponentialBackoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            max_attempts,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Consecutive unreachable probes before a forced reconnect.
    pub unreachable_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 5_000,
            unreachable_threshold: 3,
        }
    }
}

impl HealthConfig {
    pub fn policy(&self) -> HealthCheckPolicy {
        if self.enabled {
            HealthCheckPolicy::every(
                Duration::from_millis(self.interval_ms),
                self.unreachable_threshold,
            )
        } else {
            HealthCheckPolicy::disabled()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Number of transitions retained in the state log.
    pub log_capacity: usize,
    /// Dump the state log when shutting down.
    pub dump_on_exit: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_capacity: 30,
            dump_on_exit: true,
        }
    }
}

/// One `(component, state) -> effect` indicator rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    pub component: String,
    pub state: ConnectionState,
    #[serde(flatten)]
    pub effect: IndicatorEffect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Start from the built-in table before applying `rules`.
    pub use_defaults: bool,
    pub rules: Vec<StatusRule>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            use_defaults: true,
            rules: Vec::new(),
        }
    }
}

impl StatusConfig {
    pub fn build_sink(&self, indicator: Arc<dyn Indicator>) -> StatusSink {
        let base = if self.use_defaults {
            StatusSink::default_table(indicator)
        } else {
            StatusSink::new(indicator)
        };
        self.rules.iter().fold(base, |sink, rule| {
            sink.with_rule(rule.component.clone(), rule.state, rule.effect)
        })
    }
}

/// Simulated link behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimLinkConfig {
    /// Time between `connect()` and the outcome event.
    pub connect_latency_ms: u64,
    /// Number of connect attempts that fail before one succeeds.
    pub fail_first_attempts: u32,
    /// Drop the link this long after it comes up. `0` keeps it up.
    pub drop_after_ms: u64,
    /// Stop answering probes this long after the link comes up, leaving it
    /// up. `0` keeps it reachable.
    pub unreachable_after_ms: u64,
    /// Reported signal strength.
    pub rssi_dbm: i32,
}

impl Default for SimLinkConfig {
    fn default() -> Self {
        Self {
            connect_latency_ms: 300,
            fail_first_attempts: 0,
            drop_after_ms: 0,
            unreachable_after_ms: 0,
            rssi_dbm: -60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub wifi: SimLinkConfig,
    pub broker: SimLinkConfig,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        self.wifi.validate().map_err(|e| format!("[wifi]: {}", e))?;
        self.broker
            .validate()
            .map_err(|e| format!("[broker]: {}", e))?;

        if self.reconnect.initial_delay_ms == 0 {
            return Err("[reconnect].initial_delay_ms must be > 0".to_string());
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err("[reconnect].max_delay_ms must be >= initial_delay_ms".to_string());
        }
        if self.reconnect.strategy == ReconnectStrategy::Escalate
            && self.reconnect.max_attempts == 0
        {
            return Err(
                "[reconnect].max_attempts must be > 0 with the escalate strategy".to_string(),
            );
        }

        if self.health.enabled {
            if self.health.interval_ms == 0 {
                return Err("[health].interval_ms must be > 0 when enabled".to_string());
            }
            if self.health.unreachable_threshold == 0 {
                return Err("[health].unreachable_threshold must be > 0".to_string());
            }
        }

        if self.diagnostics.log_capacity == 0 {
            return Err("[diagnostics].log_capacity must be > 0".to_string());
        }

        for rule in &self.status.rules {
            if rule.component.trim().is_empty() {
                return Err("[status].rules entries need a component".to_string());
            }
        }
        Ok(())
    }

    /// Generate an example configuration wrapped under the `[lnk-agent]`
    /// section header, suitable for use in a combined `lnk-rs.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "lnk-agent")]
            inner: AgentConfig,
        }
        let example = AgentConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
                device: "greenhouse-node".to_string(),
            },
            wifi: WifiCredentials::new("home-ap", "correct horse battery"),
            broker: BrokerEndpoint {
                host: "broker.local".to_string(),
                port: 1883,
                username: Some("device".to_string()),
                password: Some("secret".to_string()),
                client_id: Some("greenhouse-node".to_string()),
            },
            status: StatusConfig {
                use_defaults: true,
                rules: vec![StatusRule {
                    component: "BrokerSession".to_string(),
                    state: ConnectionState::Connecting,
                    effect: IndicatorEffect::On,
                }],
            },
            ..Default::default()
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    match level {
        None | Some("trace" | "debug" | "info" | "warn" | "error") => Ok(()),
        Some(level) => Err(format!(
            "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
            level
        )),
    }
}

impl ConfigFile for AgentConfig {
    fn section_key() -> &'static str {
        "lnk-agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AgentConfig {
        AgentConfig {
            wifi: WifiCredentials::new("home-ap", "password1"),
            broker: BrokerEndpoint {
                host: "broker.local".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.reconnect.strategy, ReconnectStrategy::Escalate);
        assert_eq!(config.reconnect.initial_delay_ms, 10_000);
        assert_eq!(config.reconnect.max_delay_ms, 300_000);
        assert_eq!(config.reconnect.max_attempts, 5);
        assert!(config.health.enabled);
        assert_eq!(config.diagnostics.log_capacity, 30);
        assert_eq!(config.broker.port, 1883);
        assert!(config.status.use_defaults);
    }

    #[test]
    fn test_default_requires_credentials() {
        let err = AgentConfig::default().validate().unwrap_err();
        assert!(err.starts_with("[wifi]"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = valid();
        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().is_err());

        let mut config = valid();
        config.reconnect.max_delay_ms = 1;
        assert!(config.validate().unwrap_err().contains("max_delay_ms"));

        let mut config = valid();
        config.reconnect.max_attempts = 0;
        assert!(config.validate().is_err());
        config.reconnect.strategy = ReconnectStrategy::Persist;
        assert!(config.validate().is_ok());

        let mut config = valid();
        config.health.interval_ms = 0;
        assert!(config.validate().is_err());
        config.health.enabled = false;
        assert!(config.validate().is_ok());

        let mut config = valid();
        config.diagnostics.log_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_section() {
        let toml = r#"
            [lnk-agent.wifi]
            ssid = "home-ap"
            password = "password1"

            [lnk-agent.broker]
            host = "10.0.0.2"

            [lnk-agent.reconnect]
            strategy = "persist"
            initial_delay_ms = 500

            [lnk-agent.sim.wifi]
            unreachable_after_ms = 2000

            [[lnk-agent.status.rules]]
            component = "WifiLink"
            state = "connecting"
            effect = "blink"
            interval_ms = 100
        "#;
        let config = AgentConfig::load_from_str(toml).unwrap();
        assert_eq!(config.wifi.ssid, "home-ap");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.reconnect.strategy, ReconnectStrategy::Persist);
        assert_eq!(config.reconnect.initial_delay_ms, 500);
        assert_eq!(config.reconnect.max_delay_ms, 300_000);
        assert_eq!(config.sim.wifi.unreachable_after_ms, 2000);
        assert_eq!(config.sim.wifi.connect_latency_ms, 300);
        assert_eq!(config.sim.broker.unreachable_after_ms, 0);
        assert_eq!(
            config.status.rules,
            vec![StatusRule {
                component: "WifiLink".to_string(),
                state: ConnectionState::Connecting,
                effect: IndicatorEffect::Blink { interval_ms: 100 },
            }]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = AgentConfig::example_combined_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        assert!(table.contains_key("lnk-agent"));

        let config = AgentConfig::load_from_str(&example).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.status.rules.len(), 1);
    }

    #[test]
    fn test_retry_policy_follows_strategy() {
        let mut reconnect = ReconnectConfig::default();
        assert_eq!(reconnect.retry_policy().max_attempts(), Some(5));
        assert_eq!(reconnect.retry_policy().delay(0), Duration::from_secs(10));

        reconnect.strategy = ReconnectStrategy::Persist;
        assert_eq!(reconnect.retry_policy().max_attempts(), None);
    }

    #[test]
    fn test_health_policy() {
        let mut health = HealthConfig::default();
        assert_eq!(health.policy().interval(), Some(Duration::from_secs(5)));
        health.enabled = false;
        assert!(!health.policy().is_enabled());
    }
}
