//! Integration tests for the ingest loop
//!
//! Drives the full path - message source, pipeline, channel, dispatcher,
//! sink - with a scripted source standing in for the broker:
//! - Mixed topics with throttled Sound and dropped unknown topics
//! - Terminal session errors surfacing to the caller
//! - Clean stop when the display side goes away

use std::collections::VecDeque;

use roomsense_connectors::dispatch;
use roomsense_connectors::ingest::{ingest, IngestSummary};
use roomsense_connectors::{ConsoleSink, MessageSource, SessionError, SessionStats};
use roomsense_core::{FieldExtraction, Pipeline, RawMessage, Reading, RecordingSink};

const PREFIX: &str = "Batiment_3/1er/KM_102/Afficheur_n_1";

/// Replays a fixed script, then fails like a broker hanging up
struct ScriptedSource {
    script: VecDeque<RawMessage>,
    stats: SessionStats,
}

impl ScriptedSource {
    fn new(script: impl IntoIterator<Item = RawMessage>) -> Self {
        Self {
            script: script.into_iter().collect(),
            stats: SessionStats::default(),
        }
    }
}

#[async_trait::async_trait]
impl MessageSource for ScriptedSource {
    async fn next_message(&mut self) -> Result<RawMessage, SessionError> {
        match self.script.pop_front() {
            Some(message) => {
                self.stats.messages_received += 1;
                self.stats.bytes_received += message.payload.len() as u64;
                Ok(message)
            }
            None => {
                let err = SessionError::Disconnected;
                self.stats.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn stats(&self) -> SessionStats {
        self.stats.clone()
    }
}

fn message(suffix: &str, payload: &str, at: u64) -> RawMessage {
    RawMessage::new(format!("{PREFIX}/{suffix}"), payload, at)
}

fn building_script() -> Vec<RawMessage> {
    vec![
        message("Capteur_temperature_et_humidité", "Temp=23.5C Humidity=45%", 0),
        message("Capteur_de_son", "Capteur_de_son = 55dB", 10),
        message("Capteur_de_son", "Capteur_de_son = 80dB", 210),
        message("Capteur_de_lumiere", "Lux=300lx", 300),
        message("Capteur_de_CO2", "PM2.5=12microg/m³ PM10=20microg/m³", 400),
        message("Capteur_temperature_et_humidité", "Temp=24C", 900),
        message("Capteur_de_son", "Capteur_de_son = 57dB", 1110),
    ]
}

#[tokio::test]
async fn full_path_to_sink() {
    let mut source = ScriptedSource::new(building_script());
    let pipeline = Pipeline::new();
    let (events, dispatcher) = dispatch::channel();
    let display = tokio::spawn(dispatcher.run(RecordingSink::new()));

    let result = ingest(&mut source, &pipeline, &events).await;
    drop(events);
    let sink = display.await.unwrap();

    // Script exhausted → the terminal error is reported, not swallowed
    assert!(matches!(result, Err(SessionError::Disconnected)));
    assert_eq!(source.stats().messages_received, 7);
    assert_eq!(source.stats().last_error.as_deref(), Some("Broker closed the session"));

    let readings: Vec<_> = sink.readings().cloned().collect();
    assert_eq!(
        readings,
        [
            Reading::TemperatureHumidity {
                temperature: FieldExtraction::present("23.5"),
                humidity: FieldExtraction::present("45"),
            },
            Reading::Sound { level: FieldExtraction::present("55") },
            Reading::Co2 {
                pm25: FieldExtraction::present("12"),
                pm10: FieldExtraction::present("20"),
            },
            Reading::TemperatureHumidity {
                temperature: FieldExtraction::present("24"),
                humidity: FieldExtraction::Absent,
            },
            Reading::Sound { level: FieldExtraction::present("57") },
        ]
    );

    let stats = pipeline.stats().snapshot();
    assert_eq!(stats.received, 7);
    assert_eq!(stats.throttled, 1);
    assert_eq!(stats.unknown_topic, 1);
    assert_eq!(stats.delivered, 5);
}

#[tokio::test]
async fn invalid_payload_reaches_sink_as_diagnostic() {
    let bad = RawMessage::new(format!("{PREFIX}/Capteur_de_CO2"), vec![0xc3, 0x28], 0);
    let mut source = ScriptedSource::new([bad]);
    let pipeline = Pipeline::new();
    let (events, dispatcher) = dispatch::channel();
    let display = tokio::spawn(dispatcher.run(ConsoleSink::new(Vec::new())));

    let _ = ingest(&mut source, &pipeline, &events).await;
    drop(events);
    let text = String::from_utf8(display.await.unwrap().into_inner()).unwrap();

    assert_eq!(
        text,
        format!(
            "error: payload on {PREFIX}/Capteur_de_CO2 (co2_particulate) is not valid UTF-8 after 0 bytes\n\
             PM2.5: N/A µg/m³, PM10: N/A µg/m³\n"
        )
    );
}

#[tokio::test]
async fn stops_when_dispatcher_is_dropped() {
    let mut source = ScriptedSource::new(building_script());
    let pipeline = Pipeline::new();
    let (events, dispatcher) = dispatch::channel();
    drop(dispatcher);

    let summary = ingest(&mut source, &pipeline, &events).await.unwrap();
    assert_eq!(summary, IngestSummary::default());
    assert_eq!(source.stats().messages_received, 0);
}

#[tokio::test]
async fn counts_events_handed_to_dispatcher() {
    let script = vec![
        message("Capteur_de_CO2", "PM10=1microg/m³", 0),
        message("Capteur_de_CO2", "PM10=2microg/m³", 1),
    ];
    let mut source = ScriptedSource::new(script);
    let pipeline = Pipeline::new();
    let (events, mut dispatcher) = dispatch::channel();

    let result = ingest(&mut source, &pipeline, &events).await;
    assert!(result.is_err());

    let mut sink = RecordingSink::new();
    assert_eq!(dispatcher.drain(&mut sink), 2);
    assert_eq!(
        sink.readings().last(),
        Some(&Reading::Co2 {
            pm25: FieldExtraction::Absent,
            pm10: FieldExtraction::present("2"),
        })
    );
}
