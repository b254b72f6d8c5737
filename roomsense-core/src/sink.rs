//! Egress boundary of the pipeline
//!
//! The display layer implements [`ReadingSink`]. The pipeline calls exactly
//! one update method per accepted message, synchronously. Rendering absent
//! fields (as `N/A` or otherwise) and any thread marshalling the sink needs
//! are the implementation's business; see the connectors crate for a
//! channel-based adapter that moves calls onto a dedicated context.

use crate::errors::Diagnostic;
use crate::events::{Reading, SinkEvent};
use crate::extract::FieldExtraction;

/// Receives decoded readings
pub trait ReadingSink {
    fn on_temperature_humidity(&mut self, temperature: FieldExtraction, humidity: FieldExtraction);

    fn on_co2(&mut self, pm25: FieldExtraction, pm10: FieldExtraction);

    fn on_sound(&mut self, level: FieldExtraction);

    /// Out-of-band notification about an undecodable payload
    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

impl<S: ReadingSink + ?Sized> ReadingSink for &mut S {
    fn on_temperature_humidity(&mut self, temperature: FieldExtraction, humidity: FieldExtraction) {
        (**self).on_temperature_humidity(temperature, humidity)
    }

    fn on_co2(&mut self, pm25: FieldExtraction, pm10: FieldExtraction) {
        (**self).on_co2(pm25, pm10)
    }

    fn on_sound(&mut self, level: FieldExtraction) {
        (**self).on_sound(level)
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        (**self).on_diagnostic(diagnostic)
    }
}

impl Reading {
    /// Hand the reading to the matching sink method
    pub fn deliver<S: ReadingSink + ?Sized>(self, sink: &mut S) {
        match self {
            Reading::TemperatureHumidity { temperature, humidity } => {
                sink.on_temperature_humidity(temperature, humidity)
            }
            Reading::Co2 { pm25, pm10 } => sink.on_co2(pm25, pm10),
            Reading::Sound { level } => sink.on_sound(level),
        }
    }
}

impl SinkEvent {
    pub fn deliver<S: ReadingSink + ?Sized>(self, sink: &mut S) {
        match self {
            SinkEvent::Reading(reading) => reading.deliver(sink),
            SinkEvent::Diagnostic(diagnostic) => sink.on_diagnostic(&diagnostic),
        }
    }
}

/// Sink that collects everything it receives, in order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSink {
    pub events: alloc::vec::Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.events.iter().filter_map(|event| match event {
            SinkEvent::Reading(reading) => Some(reading),
            SinkEvent::Diagnostic(_) => None,
        })
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter().filter_map(|event| match event {
            SinkEvent::Diagnostic(diagnostic) => Some(diagnostic),
            SinkEvent::Reading(_) => None,
        })
    }
}

impl ReadingSink for RecordingSink {
    fn on_temperature_humidity(&mut self, temperature: FieldExtraction, humidity: FieldExtraction) {
        self.events
            .push(SinkEvent::Reading(Reading::TemperatureHumidity { temperature, humidity }));
    }

    fn on_co2(&mut self, pm25: FieldExtraction, pm10: FieldExtraction) {
        self.events.push(SinkEvent::Reading(Reading::Co2 { pm25, pm10 }));
    }

    fn on_sound(&mut self, level: FieldExtraction) {
        self.events.push(SinkEvent::Reading(Reading::Sound { level }));
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.events.push(SinkEvent::Diagnostic(diagnostic.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SensorKind;

    #[test]
    fn deliver_routes_to_matching_method() {
        let mut sink = RecordingSink::new();
        Reading::Sound { level: FieldExtraction::present("55") }.deliver(&mut sink);
        Reading::Co2 {
            pm25: FieldExtraction::present("12"),
            pm10: FieldExtraction::Absent,
        }
        .deliver(&mut sink);

        let kinds: alloc::vec::Vec<_> = sink.readings().map(Reading::kind).collect();
        assert_eq!(kinds, [SensorKind::Sound, SensorKind::Co2Particulate]);
    }

    #[test]
    fn diagnostics_default_to_noop() {
        struct Quiet(usize);
        impl ReadingSink for Quiet {
            fn on_temperature_humidity(&mut self, _: FieldExtraction, _: FieldExtraction) {
                self.0 += 1;
            }
            fn on_co2(&mut self, _: FieldExtraction, _: FieldExtraction) {
                self.0 += 1;
            }
            fn on_sound(&mut self, _: FieldExtraction) {
                self.0 += 1;
            }
        }

        let mut sink = Quiet(0);
        SinkEvent::Diagnostic(Diagnostic::InvalidUtf8 {
            topic: "t".into(),
            kind: SensorKind::Sound,
            valid_up_to: 0,
        })
        .deliver(&mut sink);
        assert_eq!(sink.0, 0);
    }
}
