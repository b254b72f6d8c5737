//! Per-message ingestion pipeline
//!
//! ## Overview
//!
//! ```text
//! RawMessage ─→ classify ─→ rate limit ─→ decode ─→ extract ─→ SinkEvent
//!                  │             │           │
//!               Unknown       throttled   not UTF-8
//!               (drop)         (drop)    (Diagnostic + all fields absent)
//! ```
//!
//! [`Pipeline::process`] takes `&self` and touches no shared state apart
//! from the Sound limiter (a single compare-and-swap) and relaxed counters.
//! It can therefore be called from any number of transport threads at once,
//! and it never blocks: results are handed to an `emit` callback, typically
//! a channel sender feeding the display context.
//!
//! [`Pipeline::handle`] is the synchronous form for callers that can update
//! their sink directly.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::errors::Diagnostic;
use crate::events::{RawMessage, Reading, SensorKind, SinkEvent};
use crate::extract::{FieldExtraction, FieldSpec};
use crate::limiter::RateLimiter;
use crate::router::TopicRouter;
use crate::sink::ReadingSink;

/// Classify, rate-limit and decode incoming messages
#[derive(Debug, Default)]
pub struct Pipeline {
    router: TopicRouter,
    limiter: RateLimiter,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Run one message through the pipeline
    ///
    /// `emit` is called at most twice: once with a diagnostic if the payload
    /// could not be decoded, then once with the reading. Unknown topics and
    /// throttled Sound messages emit nothing.
    pub fn process<F>(&self, message: &RawMessage, mut emit: F)
    where
        F: FnMut(SinkEvent),
    {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let kind = self.router.classify(&message.topic);
        if !kind.is_known() {
            self.stats.unknown_topic.fetch_add(1, Ordering::Relaxed);
            log_debug!("dropping message on unrecognised topic {}", message.topic);
            return;
        }

        if !self.limiter.try_accept(kind, message.received_at) {
            self.stats.throttled.fetch_add(1, Ordering::Relaxed);
            log_debug!("throttled {} update at {}", kind, message.received_at);
            return;
        }

        let payload = match core::str::from_utf8(&message.payload) {
            Ok(text) => text,
            Err(err) => {
                let diagnostic = Diagnostic::InvalidUtf8 {
                    topic: message.topic.clone(),
                    kind,
                    valid_up_to: err.valid_up_to(),
                };
                log_warn!("{}", diagnostic);
                self.stats.diagnostics.fetch_add(1, Ordering::Relaxed);
                emit(SinkEvent::Diagnostic(diagnostic));
                // Fields stay absent; the reading is still delivered
                ""
            }
        };

        if let Some(reading) = decode(kind, payload) {
            self.stats.delivered.fetch_add(1, Ordering::Relaxed);
            emit(SinkEvent::Reading(reading));
        }
    }

    /// Run one message through the pipeline and update `sink` directly
    pub fn handle<S: ReadingSink + ?Sized>(&self, message: &RawMessage, sink: &mut S) {
        self.process(message, |event| event.deliver(&mut *sink));
    }
}

/// Extract every field of `kind` from a decoded payload
///
/// Returns `None` only for `Unknown`. Each field is extracted on its own, so
/// a missing humidity never hides a present temperature.
pub fn decode(kind: SensorKind, payload: &str) -> Option<Reading> {
    let field = |spec: FieldSpec| -> FieldExtraction { spec.extract(payload) };

    let reading = match kind {
        SensorKind::TemperatureHumidity => Reading::TemperatureHumidity {
            temperature: field(FieldSpec::TEMPERATURE),
            humidity: field(FieldSpec::HUMIDITY),
        },
        SensorKind::Co2Particulate => Reading::Co2 {
            pm25: field(FieldSpec::PM25),
            pm10: field(FieldSpec::PM10),
        },
        SensorKind::Sound => Reading::Sound {
            level: field(FieldSpec::SOUND_LEVEL),
        },
        SensorKind::Unknown => return None,
    };
    Some(reading)
}

/// Message counters, updated with relaxed ordering
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    unknown_topic: AtomicU64,
    throttled: AtomicU64,
    delivered: AtomicU64,
    diagnostics: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Messages handed to the pipeline
    pub received: u64,
    /// Dropped because the topic matched no sensor
    pub unknown_topic: u64,
    /// Dropped by the rate limiter
    pub throttled: u64,
    /// Readings emitted
    pub delivered: u64,
    /// Diagnostics emitted
    pub diagnostics: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            unknown_topic: self.unknown_topic.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    const TH_TOPIC: &str = "Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_temperature_et_humidité";
    const CO2_TOPIC: &str = "Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_de_CO2";
    const SOUND_TOPIC: &str = "Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_de_son";

    #[test]
    fn temperature_humidity_reading() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        pipeline.handle(&RawMessage::new(TH_TOPIC, "Temp=23.5C Humidity=45%", 0), &mut sink);

        assert_eq!(
            sink.events,
            [SinkEvent::Reading(Reading::TemperatureHumidity {
                temperature: FieldExtraction::present("23.5"),
                humidity: FieldExtraction::present("45"),
            })]
        );
    }

    #[test]
    fn partial_payload_keeps_present_field() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        pipeline.handle(&RawMessage::new(TH_TOPIC, "Temp=23.5C", 0), &mut sink);

        assert_eq!(
            sink.readings().next(),
            Some(&Reading::TemperatureHumidity {
                temperature: FieldExtraction::present("23.5"),
                humidity: FieldExtraction::Absent,
            })
        );
    }

    #[test]
    fn co2_reading() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        pipeline.handle(
            &RawMessage::new(CO2_TOPIC, "PM2.5=12microg/m³ PM10=20microg/m³", 0),
            &mut sink,
        );

        assert_eq!(
            sink.readings().next(),
            Some(&Reading::Co2 {
                pm25: FieldExtraction::present("12"),
                pm10: FieldExtraction::present("20"),
            })
        );
    }

    #[test]
    fn unknown_topic_is_dropped() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        pipeline.handle(&RawMessage::new("a/b/Capteur_de_lumiere", "Temp=1C", 0), &mut sink);

        assert!(sink.events.is_empty());
        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.unknown_topic, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn sound_is_throttled() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        for (at, level) in [(0, "50"), (200, "51"), (1100, "52")] {
            let payload = alloc::format!("Capteur_de_son = {level}dB");
            pipeline.handle(&RawMessage::new(SOUND_TOPIC, payload, at), &mut sink);
        }

        let levels: alloc::vec::Vec<_> = sink
            .readings()
            .map(|reading| match reading {
                Reading::Sound { level } => level.to_string(),
                other => panic!("unexpected reading {other:?}"),
            })
            .collect();
        assert_eq!(levels, ["50", "52"]);
        assert_eq!(pipeline.stats().snapshot().throttled, 1);
    }

    #[test]
    fn other_kinds_are_not_throttled() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        for at in [0, 1, 2] {
            pipeline.handle(&RawMessage::new(CO2_TOPIC, "PM10=3microg/m³", at), &mut sink);
        }
        assert_eq!(sink.readings().count(), 3);
    }

    #[test]
    fn invalid_utf8_reports_diagnostic_and_absent_fields() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        let payload = alloc::vec![b'T', b'e', 0xff, 0xfe];
        pipeline.handle(&RawMessage::new(TH_TOPIC, payload, 0), &mut sink);

        assert_eq!(
            sink.events,
            [
                SinkEvent::Diagnostic(Diagnostic::InvalidUtf8 {
                    topic: TH_TOPIC.into(),
                    kind: SensorKind::TemperatureHumidity,
                    valid_up_to: 2,
                }),
                SinkEvent::Reading(Reading::TemperatureHumidity {
                    temperature: FieldExtraction::Absent,
                    humidity: FieldExtraction::Absent,
                }),
            ]
        );

        // Later messages are unaffected
        pipeline.handle(&RawMessage::new(TH_TOPIC, "Temp=20C Humidity=40%", 1), &mut sink);
        assert_eq!(pipeline.stats().snapshot().delivered, 2);
        assert_eq!(pipeline.stats().snapshot().diagnostics, 1);
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let pipeline = Pipeline::new();
        let mut sink = RecordingSink::new();
        let message = RawMessage::new(CO2_TOPIC, "PM2.5=7microg/m³ PM10=9microg/m³", 0);
        pipeline.handle(&message, &mut sink);
        pipeline.handle(&message, &mut sink);

        assert_eq!(sink.events[0], sink.events[1]);
    }

    #[test]
    fn decode_unknown_is_none() {
        assert_eq!(decode(SensorKind::Unknown, "Temp=1C"), None);
    }
}
