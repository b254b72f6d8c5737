//! Execution-context adapter between the pipeline and a sink
//!
//! The pipeline runs on whatever task or thread delivers broker messages and
//! must never block there. Sinks, on the other hand, frequently belong to one
//! thread. [`channel`] splits the two: the pipeline side gets a cloneable
//! [`EventSender`] whose `send` never blocks, and the sink side gets a
//! [`SinkDispatcher`] that drains events into the sink on the context it is
//! run on:
//!
//! - [`SinkDispatcher::run`] inside an async task
//! - [`SinkDispatcher::run_blocking`] on a dedicated thread
//! - [`SinkDispatcher::drain`] from an existing loop (e.g. once per UI frame)
//!
//! Events are delivered in the order they were sent.

use log::debug;
use roomsense_core::{ReadingSink, SinkEvent};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// The dispatcher was dropped; events can no longer be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sink dispatcher has shut down")]
pub struct DispatcherClosed;

/// Create a connected sender/dispatcher pair
pub fn channel() -> (EventSender, SinkDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, SinkDispatcher { rx, delivered: 0 })
}

/// Pipeline side of the channel
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<SinkEvent>,
}

impl EventSender {
    /// Queue an event for the sink. Never blocks.
    pub fn send(&self, event: SinkEvent) -> Result<(), DispatcherClosed> {
        self.tx.send(event).map_err(|_| DispatcherClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Sink side of the channel
#[derive(Debug)]
pub struct SinkDispatcher {
    rx: UnboundedReceiver<SinkEvent>,
    delivered: u64,
}

impl SinkDispatcher {
    /// Deliver events until every sender is dropped, then hand the sink back
    pub async fn run<S: ReadingSink>(mut self, mut sink: S) -> S {
        while let Some(event) = self.rx.recv().await {
            self.deliver(event, &mut sink);
        }
        debug!("dispatcher finished after {} events", self.delivered);
        sink
    }

    /// Blocking form of [`run`](Self::run) for a dedicated thread
    ///
    /// Must not be called from within an async runtime thread; use
    /// `tokio::task::spawn_blocking` or a plain `std::thread`.
    pub fn run_blocking<S: ReadingSink>(mut self, mut sink: S) -> S {
        while let Some(event) = self.rx.blocking_recv() {
            self.deliver(event, &mut sink);
        }
        debug!("dispatcher finished after {} events", self.delivered);
        sink
    }

    /// Deliver whatever is queued right now without waiting
    ///
    /// Returns the number of events delivered.
    pub fn drain<S: ReadingSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut count = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.deliver(event, &mut *sink);
                    count += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return count,
            }
        }
    }

    /// Total events delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    fn deliver<S: ReadingSink + ?Sized>(&mut self, event: SinkEvent, sink: &mut S) {
        event.deliver(sink);
        self.delivered += 1;
    }
}
