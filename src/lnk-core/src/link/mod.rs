// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Link supervision: the transport seam and the connection controller.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::LinkResult;

pub mod controller;
pub mod credentials;
pub mod state;

/// Raw link signal raised by a transport SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The transport finished its own start-up and may be asked to connect.
    Started,
    /// Link or session dropped, or a connect attempt failed.
    Lost { reason: Option<String> },
    /// Link or session is usable. `detail` carries e.g. the assigned address.
    Established { detail: Option<String> },
}

impl TransportEvent {
    pub fn lost(reason: impl Into<String>) -> Self {
        Self::Lost {
            reason: Some(reason.into()),
        }
    }

    pub fn established(detail: impl Into<String>) -> Self {
        Self::Established {
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Lost { reason: Some(r) } => write!(f, "lost ({})", r),
            Self::Lost { reason: None } => write!(f, "lost"),
            Self::Established { detail: Some(d) } => write!(f, "established ({})", d),
            Self::Established { detail: None } => write!(f, "established"),
        }
    }
}

/// Link quality sample returned by [`Transport::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHealth {
    /// Received signal strength, when the transport has a radio.
    pub rssi_dbm: Option<i32>,
    /// Whether the far end answered.
    pub reachable: bool,
}

/// Receiver side of transport events, implemented by the supervisor.
pub(crate) trait EventTarget: Send + Sync {
    fn handle_event(&self, event: TransportEvent);
}

/// Non-owning handle a transport uses to deliver its events.
///
/// Events delivered after the owning supervisor has been dropped are
/// discarded.
#[derive(Clone)]
pub struct EventSink {
    target: Weak<dyn EventTarget>,
}

impl EventSink {
    pub(crate) fn new(target: Weak<dyn EventTarget>) -> Self {
        Self { target }
    }

    /// Hand an event to the supervisor. Returns `false` if it is gone.
    pub fn deliver(&self, event: TransportEvent) -> bool {
        match self.target.upgrade() {
            Some(target) => {
                target.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// One physical link or session driven by a connection supervisor.
///
/// Implementations wrap the vendor SDK. Every call must return promptly;
/// the outcome of `start` and `connect` is reported later through the
/// bound [`EventSink`], from whatever thread the SDK uses.
pub trait Transport: Send + Sync + 'static {
    /// Store the sink used for all later events.
    fn bind(&self, sink: EventSink);

    /// Transport-specific setup. Configuration problems surface here.
    fn start(&self) -> LinkResult<()>;

    fn connect(&self) -> LinkResult<()>;

    fn disconnect(&self) -> LinkResult<()>;

    /// Sample link quality while connected. `None` when unsupported.
    fn probe(&self) -> Option<LinkHealth> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn bind(&self, sink: EventSink) {
        (**self).bind(sink)
    }

    fn start(&self) -> LinkResult<()> {
        (**self).start()
    }

    fn connect(&self) -> LinkResult<()> {
        (**self).connect()
    }

    fn disconnect(&self) -> LinkResult<()> {
        (**self).disconnect()
    }

    fn probe(&self) -> Option<LinkHealth> {
        (**self).probe()
    }
}
