//! Event Types for the Telemetry Ingestion Pipeline
//!
//! ## Overview
//!
//! Messages enter the pipeline as [`RawMessage`]s (topic, payload bytes and
//! receive time) and leave it as [`SinkEvent`]s: either a typed [`Reading`]
//! for the display layer or a [`Diagnostic`] describing a payload that could
//! not be decoded.
//!
//! ```text
//! Broker → RawMessage → classify → rate limit → extract → Reading → Sink
//!                          ↓                        ↓
//!                        Unknown                 Diagnostic
//!                       (dropped)
//! ```
//!
//! ## Lifetimes
//!
//! - A `RawMessage` is produced once per broker delivery and consumed once.
//! - A `Reading` is built per accepted message, handed to the sink and
//!   dropped. Nothing is retained between messages.
//!
//! Duplicate deliveries (at-least-once QoS) produce identical readings, so
//! the pipeline does not deduplicate.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::errors::Diagnostic;
use crate::extract::FieldExtraction;
use crate::time::Timestamp;

/// Sensor kind enumeration
///
/// Derived from the topic a message was published on. Every topic maps to
/// exactly one kind; topics that match no known sensor are `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorKind {
    TemperatureHumidity = 0,
    Co2Particulate = 1,
    Sound = 2,
    Unknown = 255,
}

impl SensorKind {
    /// Kinds that produce readings, in classification priority order
    pub const KNOWN: [SensorKind; 3] = [
        SensorKind::TemperatureHumidity,
        SensorKind::Co2Particulate,
        SensorKind::Sound,
    ];

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorKind::TemperatureHumidity => "temperature_humidity",
            SensorKind::Co2Particulate => "co2_particulate",
            SensorKind::Sound => "sound",
            SensorKind::Unknown => "unknown",
        }
    }

    /// Topic suffix published by sensors of this kind
    pub const fn topic_suffix(&self) -> Option<&'static str> {
        match self {
            SensorKind::TemperatureHumidity => Some("Capteur_temperature_et_humidité"),
            SensorKind::Co2Particulate => Some("Capteur_de_CO2"),
            SensorKind::Sound => Some("Capteur_de_son"),
            SensorKind::Unknown => None,
        }
    }

    pub const fn is_known(&self) -> bool {
        !matches!(self, SensorKind::Unknown)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One message as delivered by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at: Timestamp,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, received_at: Timestamp) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at,
        }
    }
}

/// Decoded reading for one accepted message
///
/// Fields are extracted independently; an absent field never prevents its
/// siblings from being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    TemperatureHumidity {
        temperature: FieldExtraction,
        humidity: FieldExtraction,
    },
    Co2 {
        pm25: FieldExtraction,
        pm10: FieldExtraction,
    },
    Sound {
        level: FieldExtraction,
    },
}

impl Reading {
    pub const fn kind(&self) -> SensorKind {
        match self {
            Reading::TemperatureHumidity { .. } => SensorKind::TemperatureHumidity,
            Reading::Co2 { .. } => SensorKind::Co2Particulate,
            Reading::Sound { .. } => SensorKind::Sound,
        }
    }

    /// True when every field of the reading is absent
    pub fn is_empty(&self) -> bool {
        match self {
            Reading::TemperatureHumidity { temperature, humidity } => {
                temperature.is_absent() && humidity.is_absent()
            }
            Reading::Co2 { pm25, pm10 } => pm25.is_absent() && pm10.is_absent(),
            Reading::Sound { level } => level.is_absent(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::TemperatureHumidity { temperature, humidity } => {
                write!(f, "Temperature: {} °C, Humidity: {}%", temperature, humidity)
            }
            Reading::Co2 { pm25, pm10 } => {
                write!(f, "PM2.5: {} µg/m³, PM10: {} µg/m³", pm25, pm10)
            }
            Reading::Sound { level } => write!(f, "Sound: {} dB", level),
        }
    }
}

/// Unit transported from the pipeline to the display layer
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Reading(Reading),
    Diagnostic(Diagnostic),
}
