// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Link credentials checked before a transport is started.

use serde::{Deserialize, Serialize};

use crate::{LinkError, LinkResult};

const SSID_MAX_LEN: usize = 32;
const PASSPHRASE_MIN_LEN: usize = 8;
const PASSPHRASE_MAX_LEN: usize = 63;

/// Station-mode WiFi credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiCredentials {
    pub ssid: String,
    /// WPA2 passphrase; empty for an open network.
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.ssid.is_empty() {
            return Err(LinkError::config("wifi ssid must not be empty"));
        }
        if self.ssid.len() > SSID_MAX_LEN {
            return Err(LinkError::config(format!(
                "wifi ssid must be at most {} bytes (got {})",
                SSID_MAX_LEN,
                self.ssid.len()
            )));
        }
        let len = self.password.chars().count();
        if len != 0 && !(PASSPHRASE_MIN_LEN..=PASSPHRASE_MAX_LEN).contains(&len) {
            return Err(LinkError::config(format!(
                "wifi password must be empty or {}..={} characters (got {})",
                PASSPHRASE_MIN_LEN, PASSPHRASE_MAX_LEN, len
            )));
        }
        Ok(())
    }
}

/// Message-broker endpoint and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
}

impl Default for BrokerEndpoint {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            username: None,
            password: None,
            client_id: None,
        }
    }
}

impl BrokerEndpoint {
    pub fn validate(&self) -> LinkResult<()> {
        if self.host.trim().is_empty() {
            return Err(LinkError::config("broker host must not be empty"));
        }
        if self.port == 0 {
            return Err(LinkError::config("broker port must be > 0"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(LinkError::config("broker password requires a username"));
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_credentials() {
        assert!(WifiCredentials::new("home", "correct horse").validate().is_ok());
        assert!(WifiCredentials::new("cafe", "").validate().is_ok());
        assert!(WifiCredentials::new("", "password1").validate().is_err());
        assert!(WifiCredentials::new("home", "short").validate().is_err());
        assert!(WifiCredentials::new("x".repeat(33), "").validate().is_err());
        assert!(WifiCredentials::new("home", "p".repeat(64)).validate().is_err());
    }

    #[test]
    fn test_wifi_error_is_config() {
        let err = WifiCredentials::new("", "").validate().unwrap_err();
        assert!(matches!(err, LinkError::Config(_)));
    }

    #[test]
    fn test_broker_endpoint() {
        let mut endpoint = BrokerEndpoint {
            host: "broker.local".to_string(),
            ..Default::default()
        };
        assert!(endpoint.validate().is_ok());
        assert_eq!(endpoint.address(), "broker.local:1883");

        endpoint.port = 0;
        assert!(endpoint.validate().is_err());

        endpoint.port = 8883;
        endpoint.password = Some("secret".to_string());
        assert!(endpoint.validate().is_err());
        endpoint.username = Some("device".to_string());
        assert!(endpoint.validate().is_ok());
    }

    #[test]
    fn test_empty_broker_host() {
        assert!(BrokerEndpoint::default().validate().is_err());
    }
}
