// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Host-side stand-ins for indicator hardware and device restart.

use std::sync::Arc;

use tracing::{error, info};

use lnk_core::{DeviceControl, Indicator, IndicatorEffect, StateLog};

/// Exit status that asks the service manager to start the agent again.
pub const RESTART_EXIT_CODE: i32 = 75;

/// Indicator that writes every change to the log.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set_indicator(&self, component_id: &str, effect: IndicatorEffect) {
        info!("[indicator] {} -> {}", component_id, effect);
    }
}

/// Restart by exiting the process.
pub struct ProcessRestart {
    log: Arc<StateLog>,
    dump_log: bool,
}

impl ProcessRestart {
    pub fn new(log: Arc<StateLog>, dump_log: bool) -> Self {
        Self { log, dump_log }
    }
}

impl DeviceControl for ProcessRestart {
    fn restart_device(&self) {
        if self.dump_log {
            self.log.dump();
        }
        error!("Restarting (exit status {})", RESTART_EXIT_CODE);
        std::process::exit(RESTART_EXIT_CODE);
    }
}
