// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Link controller components.
//!
//! This module contains the connection state machine, the retry and
//! health-check policies, the escalation path and the supervisor that
//! ties them to a transport.

pub mod escalation;
pub mod machine;
pub mod policies;
pub mod supervisor;

pub use escalation::{DeviceControl, Escalation, ALERT_COMPONENT, ALERT_EFFECT};
pub use machine::{next_state, LinkAction, Transition};
pub use policies::{
    Backoff, BackoffState, ExponentialBackoff, FixedDelay, HealthCheckPolicy, RetryPolicy,
    RetryStep,
};
pub use supervisor::{ConnectionSupervisor, SupervisorConfig};
