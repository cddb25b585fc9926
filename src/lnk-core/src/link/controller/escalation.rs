// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Escalation from incremental recovery to a full device restart.

use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::status::{Indicator, IndicatorEffect};

/// Component id used for the alert indicator.
pub const ALERT_COMPONENT: &str = "Error";
/// Alert shown right before restarting.
pub const ALERT_EFFECT: IndicatorEffect = IndicatorEffect::Blink { interval_ms: 200 };

/// Device-level control collaborator.
pub trait DeviceControl: Send + Sync {
    /// Reboot the device. Real implementations do not return.
    fn restart_device(&self);
}

struct Alert {
    indicator: Arc<dyn Indicator>,
    component_id: String,
    effect: IndicatorEffect,
}

/// Action taken once a supervisor's attempt budget is used up.
#[derive(Clone)]
pub struct Escalation {
    device: Arc<dyn DeviceControl>,
    alert: Option<Arc<Alert>>,
}

impl Escalation {
    pub fn new(device: Arc<dyn DeviceControl>) -> Self {
        Self {
            device,
            alert: None,
        }
    }

    /// Raise `effect` on `component_id` before restarting.
    pub fn with_alert(
        mut self,
        indicator: Arc<dyn Indicator>,
        component_id: impl Into<String>,
        effect: IndicatorEffect,
    ) -> Self {
        self.alert = Some(Arc::new(Alert {
            indicator,
            component_id: component_id.into(),
            effect,
        }));
        self
    }

    /// Alert with the default error indicator.
    pub fn with_default_alert(self, indicator: Arc<dyn Indicator>) -> Self {
        self.with_alert(indicator, ALERT_COMPONENT, ALERT_EFFECT)
    }

    pub fn escalate(&self, component_id: &str, attempts: u32) {
        error!(
            "{}: giving up after {} reconnect attempts, restarting device",
            component_id, attempts
        );
        if let Some(alert) = &self.alert {
            alert
                .indicator
                .set_indicator(&alert.component_id, alert.effect);
        }
        self.device.restart_device();
    }
}

impl fmt::Debug for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escalation")
            .field("alert", &self.alert.as_ref().map(|a| a.component_id.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingDevice {
        restarts: AtomicUsize,
    }

    impl DeviceControl for CountingDevice {
        fn restart_device(&self) {
            self.restarts.fetch_add(1, Ordering::SeqCst);
        }
    }

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

    #[test]
    fn test_escalate_restarts_device() {
        let device = Arc::new(CountingDevice::default());
        let escalation = Escalation::new(device.clone());

        escalation.escalate("WifiLink", 5);
        assert_eq!(device.restarts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_alert_raised_before_restart() {
        let device = Arc::new(CountingDevice::default());
        let indicator = Arc::new(RecordingIndicator::default());
        let escalation = Escalation::new(device.clone()).with_default_alert(indicator.clone());

        escalation.escalate("BrokerSession", 5);

        let calls = indicator.calls.lock().unwrap();
        assert_eq!(*calls, vec![("Error".to_string(), ALERT_EFFECT)]);
        assert_eq!(device.restarts.load(Ordering::SeqCst), 1);
    }
}
