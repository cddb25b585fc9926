// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated transports.
//!
//! Outcomes are reported from tasks on a tokio runtime, standing in for
//! the callback context of a real radio or broker SDK.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use lnk_core::{
    BrokerEndpoint, EventSink, LinkError, LinkHealth, LinkResult, Transport, TransportEvent,
    WifiCredentials,
};

use crate::config::SimLinkConfig;

/// What the simulated transport pretends to be.
#[derive(Debug, Clone)]
pub enum SimLink {
    Wifi(WifiCredentials),
    Broker(BrokerEndpoint),
}

impl SimLink {
    fn validate(&self) -> LinkResult<()> {
        match self {
            Self::Wifi(credentials) => credentials.validate(),
            Self::Broker(endpoint) => endpoint.validate(),
        }
    }

    fn established_detail(&self, attempt: u32) -> String {
        match self {
            Self::Wifi(credentials) => {
                format!("{} ip=192.168.4.{}", credentials.ssid, 10 + attempt % 200)
            }
            Self::Broker(endpoint) => format!("session at {}", endpoint.address()),
        }
    }
}

/// State touched by the delivery tasks.
struct LinkFlags {
    up: AtomicBool,
    reachable: AtomicBool,
    /// Bumped whenever a session ends so its stale timers do nothing.
    generation: AtomicU64,
}

pub struct SimTransport {
    link: SimLink,
    behavior: SimLinkConfig,
    runtime: Handle,
    sink: Mutex<Option<EventSink>>,
    attempts: AtomicU32,
    flags: Arc<LinkFlags>,
    upstream: Option<Arc<SimTransport>>,
}

impl SimTransport {
    pub fn new(link: SimLink, behavior: SimLinkConfig, runtime: Handle) -> Self {
        Self {
            link,
            behavior,
            runtime,
            sink: Mutex::new(None),
            attempts: AtomicU32::new(0),
            flags: Arc::new(LinkFlags {
                up: AtomicBool::new(false),
                reachable: AtomicBool::new(true),
                generation: AtomicU64::new(0),
            }),
            upstream: None,
        }
    }

    /// Connect attempts fail while `upstream` is down.
    pub fn with_upstream(mut self, upstream: Arc<SimTransport>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn is_up(&self) -> bool {
        self.flags.up.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn sink(&self) -> LinkResult<EventSink> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| LinkError::transport("transport is not bound"))
    }

    fn deliver_later(&self, delay: Duration, event: TransportEvent) -> LinkResult<()> {
        let sink = self.sink()?;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sink.deliver(event);
        });
        Ok(())
    }
}

/// `0` disables the timer.
fn after_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl Transport for SimTransport {
    fn bind(&self, sink: EventSink) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn start(&self) -> LinkResult<()> {
        self.link.validate()?;
        self.deliver_later(Duration::ZERO, TransportEvent::Started)
    }

    fn connect(&self) -> LinkResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let sink = self.sink()?;
        let latency = Duration::from_millis(self.behavior.connect_latency_ms);

        let upstream_down = self.upstream.as_ref().is_some_and(|u| !u.is_up());
        if upstream_down || attempt <= self.behavior.fail_first_attempts {
            let reason = if upstream_down {
                "network unreachable"
            } else {
                "handshake rejected"
            };
            debug!("sim: attempt {} will fail ({})", attempt, reason);
            return self.deliver_later(latency, TransportEvent::lost(reason));
        }

        let flags = self.flags.clone();
        let detail = self.link.established_detail(attempt);
        let drop_after = after_ms(self.behavior.drop_after_ms);
        let unreachable_after = after_ms(self.behavior.unreachable_after_ms);
        self.runtime.spawn(async move {
            tokio::time::sleep(latency).await;
            let generation = flags.generation.load(Ordering::SeqCst);
            flags.reachable.store(true, Ordering::SeqCst);
            flags.up.store(true, Ordering::SeqCst);
            sink.deliver(TransportEvent::established(detail));

            if let Some(after) = unreachable_after {
                let flags = flags.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if flags.generation.load(Ordering::SeqCst) == generation {
                        debug!("sim: peer stopped answering probes");
                        flags.reachable.store(false, Ordering::SeqCst);
                    }
                });
            }

            if let Some(after) = drop_after {
                tokio::time::sleep(after).await;
                let ended = flags.generation.compare_exchange(
                    generation,
                    generation + 1,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                if ended.is_ok() {
                    flags.up.store(false, Ordering::SeqCst);
                    sink.deliver(TransportEvent::lost("link dropped"));
                }
            }
        });
        Ok(())
    }

    fn disconnect(&self) -> LinkResult<()> {
        self.flags.generation.fetch_add(1, Ordering::SeqCst);
        self.flags.up.store(false, Ordering::SeqCst);
        self.deliver_later(Duration::ZERO, TransportEvent::lost("disconnected by host"))
    }

    fn probe(&self) -> Option<LinkHealth> {
        if !self.is_up() {
            return None;
        }
        Some(LinkHealth {
            rssi_dbm: matches!(self.link, SimLink::Wifi(_)).then_some(self.behavior.rssi_dbm),
            reachable: self.flags.reachable.load(Ordering::SeqCst),
        })
    }
}
