//! MQTT broker session
//!
//! Wraps a `rumqttc` client/event-loop pair. The event loop is driven from
//! the session itself: [`MqttSession::connect`] polls until CONNACK,
//! [`MqttSession::subscribe`] until SUBACK, and
//! [`MessageSource::next_message`] until the next PUBLISH. Acknowledgements
//! for QoS 1 deliveries are sent by the event loop while polling.
//!
//! The session never reconnects. `rumqttc` would reconnect on the next poll
//! after an error; the session instead marks itself terminated and reports
//! [`SessionError::Terminated`] from then on.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info, warn};
use roomsense_core::time::SystemTime;
use roomsense_core::{RawMessage, TimeSource};
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, SubscribeFilter,
    SubscribeReasonCode,
};

use crate::config::{BrokerConfig, ConfigError, TopicSubscription};
use crate::{MessageSource, SessionError, SessionStats};

/// Capacity of the client request queue
const REQUEST_CAPACITY: usize = 16;

/// Connected MQTT session
pub struct MqttSession<T: TimeSource = SystemTime> {
    client: AsyncClient,
    eventloop: EventLoop,
    client_id: String,
    clock: T,
    /// Publishes that arrived while waiting for an acknowledgement
    pending: VecDeque<RawMessage>,
    terminated: bool,
    stats: SessionStats,
}

impl MqttSession<SystemTime> {
    /// Connect to the configured broker, stamping messages with the system clock
    pub async fn connect(config: &BrokerConfig) -> Result<Self, SessionError> {
        Self::connect_with_clock(config, SystemTime).await
    }
}

impl<T: TimeSource> MqttSession<T> {
    /// Connect to the configured broker
    ///
    /// Returns once the broker has accepted the connection. Failure is final;
    /// nothing is retried.
    pub async fn connect_with_clock(config: &BrokerConfig, clock: T) -> Result<Self, SessionError> {
        config.validate()?;

        let client_id = config.resolved_client_id();
        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(true);
        if let Some(username) = &config.username {
            options.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
        }

        info!(
            "connecting to {}:{} as {}",
            config.host, config.port, client_id
        );
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let mut session = Self {
            client,
            eventloop,
            client_id,
            clock,
            pending: VecDeque::new(),
            terminated: false,
            stats: SessionStats::default(),
        };
        session.await_connack().await?;
        Ok(session)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Subscribe to every topic in one request and wait for the broker's answer
    ///
    /// Messages published while waiting are kept and returned by later
    /// [`next_message`](MessageSource::next_message) calls.
    pub async fn subscribe(&mut self, topics: &[TopicSubscription]) -> Result<(), SessionError> {
        if self.terminated {
            return Err(SessionError::Terminated);
        }
        if topics.is_empty() {
            return Err(ConfigError::Missing("topics").into());
        }

        let filters = topics
            .iter()
            .map(|sub| SubscribeFilter::new(sub.topic.clone(), sub.qos.into()));
        if let Err(err) = self.client.subscribe_many(filters).await {
            return Err(self.fail(err.into()));
        }

        loop {
            match self.poll().await? {
                Packet::SubAck(ack) => {
                    if ack.return_codes.len() != topics.len() {
                        return Err(self.fail(SessionError::SubAckMismatch {
                            requested: topics.len(),
                            acknowledged: ack.return_codes.len(),
                        }));
                    }

                    let rejected = topics
                        .iter()
                        .zip(&ack.return_codes)
                        .find(|(_, code)| matches!(code, SubscribeReasonCode::Failure));
                    if let Some((sub, _)) = rejected {
                        let topic = sub.topic.clone();
                        return Err(self.fail(SessionError::Subscribe { topic }));
                    }

                    info!("subscribed to {} topics", topics.len());
                    return Ok(());
                }
                Packet::Publish(publish) => {
                    let message = self.stamp(publish);
                    self.pending.push_back(message);
                }
                _ => {}
            }
        }
    }

    async fn await_connack(&mut self) -> Result<(), SessionError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("connected (session present: {})", ack.session_present);
                    return Ok(());
                }
                Ok(_) => {}
                Err(err) => {
                    return Err(self.fail(SessionError::Connection(err)));
                }
            }
        }
    }

    /// Drive the event loop until the next incoming packet
    async fn poll(&mut self) -> Result<Packet, SessionError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    return Err(self.fail(SessionError::Disconnected));
                }
                Ok(Event::Incoming(packet)) => return Ok(packet),
                Ok(Event::Outgoing(outgoing)) => debug!("outgoing {:?}", outgoing),
                Err(err) => {
                    return Err(self.fail(err.into()));
                }
            }
        }
    }

    fn stamp(&self, publish: Publish) -> RawMessage {
        RawMessage::new(publish.topic, publish.payload.to_vec(), self.clock.now())
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        warn!("session {} terminated: {}", self.client_id, err);
        self.terminated = true;
        self.stats.last_error = Some(err.to_string());
        err
    }
}

#[async_trait::async_trait]
impl<T: TimeSource + 'static> MessageSource for MqttSession<T> {
    async fn next_message(&mut self) -> Result<RawMessage, SessionError> {
        let message = match self.pending.pop_front() {
            Some(message) => message,
            None => loop {
                if self.terminated {
                    return Err(SessionError::Terminated);
                }
                if let Packet::Publish(publish) = self.poll().await? {
                    break self.stamp(publish);
                }
            },
        };
        self.stats.record(&message);
        Ok(message)
    }

    fn stats(&self) -> SessionStats {
        self.stats.clone()
    }
}
