//! Broker Connectors for RoomSense Telemetry Ingestion
//!
//! ## Overview
//!
//! This crate connects the transport-agnostic pipeline in `roomsense-core` to
//! a real MQTT broker and to a display sink:
//!
//! ```text
//! ┌────────────────┐    ┌──────────────┐    ┌─────────────┐    ┌──────────────┐
//! │  MqttSession   │───▶│   ingest()   │───▶│ EventSender │───▶│SinkDispatcher│──▶ ReadingSink
//! │ (MessageSource)│    │   Pipeline   │    │  (channel)  │    │ (sink thread)│
//! └────────────────┘    └──────────────┘    └─────────────┘    └──────────────┘
//!    broker I/O          classify/limit        never blocks      sink's context
//! ```
//!
//! ## MQTT
//!
//! - One connection for the process lifetime
//! - One SUBSCRIBE for the configured topic list, QoS 1 (at least once) by default
//! - Per-topic ordering as provided by the broker; duplicates are not filtered
//! - Any transport failure after connect ends the session; reconnecting is the
//!   caller's decision
//!
//! ## Execution Context
//!
//! Sinks often have to be updated from one particular thread (a UI thread,
//! for instance). The pipeline never calls a sink itself when running under
//! [`ingest`](ingest::ingest): it pushes [`SinkEvent`](roomsense_core::SinkEvent)s
//! into an unbounded channel and a [`SinkDispatcher`](dispatch::SinkDispatcher)
//! calls the sink wherever it is run.
//!
//! ## Example Usage
//!
//! ```no_run
//! use roomsense_connectors::{dispatch, ingest::ingest, BrokerConfig, MqttSession, ConsoleSink};
//! use roomsense_core::Pipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BrokerConfig::new("broker.local").credentials("display", "secret");
//!
//! let mut session = MqttSession::connect(&config).await?;
//! session.subscribe(&config.topics).await?;
//!
//! let pipeline = Pipeline::new();
//! let (events, dispatcher) = dispatch::channel();
//! let display = tokio::task::spawn_blocking(move || dispatcher.run_blocking(ConsoleSink::stdout()));
//!
//! ingest(&mut session, &pipeline, &events).await?;
//! # drop(events);
//! # display.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod console;
pub mod dispatch;
pub mod ingest;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
pub use config::{BrokerConfig, ConfigError, QoS, TopicSubscription};
pub use console::ConsoleSink;
pub use dispatch::{EventSender, SinkDispatcher};

#[cfg(feature = "mqtt")]
pub use mqtt::MqttSession;

use roomsense_core::RawMessage;
use thiserror::Error;

/// Broker session errors
///
/// Every variant is terminal for the session: there is no automatic retry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connecting or authenticating to the broker failed
    #[cfg(feature = "mqtt")]
    #[error("Connection failed: {0}")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker refused a subscription
    #[error("Subscription to {topic} rejected by broker")]
    Subscribe { topic: String },

    /// The SUBACK does not answer every requested filter
    #[error("SUBACK carries {acknowledged} return codes for {requested} topics")]
    SubAckMismatch { requested: usize, acknowledged: usize },

    /// The client request queue is gone
    #[cfg(feature = "mqtt")]
    #[error("Client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The broker closed the session
    #[error("Broker closed the session")]
    Disconnected,

    /// Network or protocol failure after connect
    #[cfg(feature = "mqtt")]
    #[error("Transport error: {0}")]
    Transport(#[from] rumqttc::ConnectionError),

    /// A terminal error was already reported
    #[error("Session already terminated")]
    Terminated,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Source of raw broker deliveries
#[async_trait::async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message
    ///
    /// An error is terminal: once returned, further calls keep failing.
    async fn next_message(&mut self) -> Result<RawMessage, SessionError>;

    /// Get session statistics
    fn stats(&self) -> SessionStats;
}

/// Statistics common to all message sources
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Messages delivered to the caller
    pub messages_received: u64,
    /// Payload bytes delivered to the caller
    pub bytes_received: u64,
    /// Terminal error, once one happened
    pub last_error: Option<String>,
}

impl SessionStats {
    pub(crate) fn record(&mut self, message: &RawMessage) {
        self.messages_received += 1;
        self.bytes_received += message.payload.len() as u64;
    }
}
