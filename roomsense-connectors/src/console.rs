//! Line-oriented display sink
//!
//! Writes one line per reading, e.g. `Sound: 55 dB`, absent fields as `N/A`.
//! Diagnostics are printed as `error: ...` lines and logged as warnings.

use std::fmt;
use std::io::{self, Stdout, Write};

use log::warn;
use roomsense_core::{Diagnostic, FieldExtraction, Reading, ReadingSink};

/// Sink that renders readings as text lines
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn show(&mut self, reading: Reading) {
        if let Err(err) = self.write_line(format_args!("{}", reading)) {
            warn!("failed to display {} reading: {}", reading.kind(), err);
        }
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) -> io::Result<()> {
        self.out.write_fmt(line)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> ReadingSink for ConsoleSink<W> {
    fn on_temperature_humidity(&mut self, temperature: FieldExtraction, humidity: FieldExtraction) {
        self.show(Reading::TemperatureHumidity { temperature, humidity });
    }

    fn on_co2(&mut self, pm25: FieldExtraction, pm10: FieldExtraction) {
        self.show(Reading::Co2 { pm25, pm10 });
    }

    fn on_sound(&mut self, level: FieldExtraction) {
        self.show(Reading::Sound { level });
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        warn!("extraction failed: {}", diagnostic);
        if let Err(err) = self.write_line(format_args!("error: {}", diagnostic)) {
            warn!("failed to display diagnostic for {}: {}", diagnostic.topic(), err);
        }
    }
}
