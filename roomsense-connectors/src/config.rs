//! Broker configuration
//!
//! Address, identity, credentials and the subscription list are supplied
//! from outside (JSON file, command line, environment) and only checked for
//! presence here.
//!
//! ```json
//! {
//!   "host": "172.31.254.123",
//!   "port": 1883,
//!   "username": "display",
//!   "password": "secret",
//!   "topics": [
//!     { "topic": "Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_de_son", "qos": "at_least_once" }
//!   ]
//! }
//! ```
//!
//! Omitted fields take their defaults: port 1883, a random client id per
//! run, 60 s keep-alive, and the three sensor topics of the default display.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roomsense_core::SensorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default MQTT port
pub const DEFAULT_PORT: u16 = 1883;

/// Default keep-alive interval in seconds
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;

/// Topic prefix of the display the default subscription list targets
pub const DEFAULT_TOPIC_PREFIX: &str = "Batiment_3/1er/KM_102/Afficheur_n_1";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is missing or empty
    #[error("Missing configuration field: {0}")]
    Missing(&'static str),

    /// A field has an unusable value
    #[error("Invalid configuration field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Delivery guarantee requested for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QoS {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

#[cfg(feature = "mqtt")]
impl From<QoS> for rumqttc::QoS {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
            QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
            QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
        }
    }
}

/// One topic filter and its requested QoS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSubscription {
    pub topic: String,
    #[serde(default)]
    pub qos: QoS,
}

impl TopicSubscription {
    pub fn new(topic: impl Into<String>, qos: QoS) -> Self {
        Self {
            topic: topic.into(),
            qos,
        }
    }
}

/// Subscriptions for every known sensor kind under `prefix`
pub fn sensor_topics(prefix: &str) -> Vec<TopicSubscription> {
    SensorKind::KNOWN
        .iter()
        .filter_map(SensorKind::topic_suffix)
        .map(|suffix| TopicSubscription::new(format!("{prefix}/{suffix}"), QoS::AtLeastOnce))
        .collect()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_keep_alive() -> u64 {
    DEFAULT_KEEP_ALIVE_SECS
}

fn default_topics() -> Vec<TopicSubscription> {
    sensor_topics(DEFAULT_TOPIC_PREFIX)
}

/// Broker connection configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host name or IP address
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Fixed client identifier; a random one is generated when absent
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicSubscription>,
}

impl BrokerConfig {
    /// Create configuration for `host` with default settings
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            topics: default_topics(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set username/password authentication
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Replace the subscription list
    pub fn topics(mut self, topics: Vec<TopicSubscription>) -> Self {
        self.topics = topics;
        self
    }

    /// Append one subscription
    pub fn topic(mut self, topic: impl Into<String>, qos: QoS) -> Self {
        self.topics.push(TopicSubscription::new(topic, qos));
        self
    }

    /// Client identifier to connect with
    ///
    /// Returns the configured one, or a fresh random identifier.
    pub fn resolved_client_id(&self) -> String {
        match &self.client_id {
            Some(id) => id.clone(),
            None => format!("roomsense-{}", uuid::Uuid::new_v4()),
        }
    }

    /// Check that every required field is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be non-zero".into(),
            });
        }
        if matches!(&self.client_id, Some(id) if id.is_empty()) {
            return Err(ConfigError::Missing("client_id"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::Missing("username"));
        }
        if self.topics.is_empty() {
            return Err(ConfigError::Missing("topics"));
        }
        if let Some(sub) = self.topics.iter().find(|sub| sub.topic.is_empty()) {
            return Err(ConfigError::Invalid {
                field: "topics",
                reason: format!("empty topic filter (qos {:?})", sub.qos),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("topics", &self.topics)
            .finish()
    }
}
