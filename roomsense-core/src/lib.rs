//! Telemetry ingestion core for RoomSense
//!
//! Turns raw broker deliveries from room sensors (temperature/humidity,
//! particulate, sound level) into typed readings for a display sink.
//!
//! Key constraints:
//! - Payloads are free text, not a schema; missing fields degrade to `N/A`
//! - Per-message handling is non-blocking and safe to call concurrently
//! - Sound updates are limited to one per second
//!
//! ```no_run
//! use roomsense_core::{Pipeline, RawMessage, RecordingSink};
//!
//! let pipeline = Pipeline::new();
//! let mut sink = RecordingSink::new();
//!
//! let message = RawMessage::new(
//!     "Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_temperature_et_humidité",
//!     "Temp=23.5C Humidity=45%",
//!     0,
//! );
//! pipeline.handle(&message, &mut sink);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod events;
pub mod extract;
pub mod limiter;
pub mod pipeline;
pub mod router;
pub mod sink;
pub mod time;

// Public API
pub use errors::Diagnostic;
pub use events::{RawMessage, Reading, SensorKind, SinkEvent};
pub use extract::{extract, FieldExtraction, FieldSpec, Separator};
pub use limiter::{RateLimiter, RateLimiterState, SOUND_INTERVAL};
pub use pipeline::{Pipeline, PipelineStats, StatsSnapshot};
pub use router::{classify, TopicRouter};
pub use sink::{ReadingSink, RecordingSink};
pub use time::{TimeSource, Timestamp};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
