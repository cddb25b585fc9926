// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod error;
pub mod link;
pub mod observe;
pub mod ring_log;
pub mod status;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use error::{LinkError, LinkResult};
pub use link::controller::{
    Backoff, BackoffState, ConnectionSupervisor, DeviceControl, Escalation, ExponentialBackoff,
    FixedDelay, HealthCheckPolicy, RetryPolicy, RetryStep, SupervisorConfig,
};
pub use link::credentials::{BrokerEndpoint, WifiCredentials};
pub use link::state::ConnectionState;
pub use link::{EventSink, LinkHealth, Transport, TransportEvent};
pub use observe::{ListenerId, ObservableCell, StateListener, StateLog, StateRecord};
pub use ring_log::RingLog;
pub use status::{Indicator, IndicatorEffect, StatusSink};
