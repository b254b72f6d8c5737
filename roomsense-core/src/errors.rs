//! Diagnostics for payloads that could not be decoded
//!
//! Extraction itself never fails: a missing key or terminator is an ordinary
//! outcome and surfaces as [`FieldExtraction::Absent`](crate::extract::FieldExtraction).
//! Anything beyond that - a payload that is not text at all - is recovered
//! at the same boundary (every field of the reading becomes absent) and
//! reported out of band as a [`Diagnostic`]. The display layer decides
//! whether to surface it.
//!
//! Diagnostics never abort message handling for other topics or for later
//! messages.

use alloc::string::String;

use thiserror_no_std::Error;

use crate::events::SensorKind;

/// Out-of-band notification about a message whose fields could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Payload bytes are not valid UTF-8
    #[error("payload on {topic} ({kind}) is not valid UTF-8 after {valid_up_to} bytes")]
    InvalidUtf8 {
        topic: String,
        kind: SensorKind,
        /// Length of the longest valid prefix
        valid_up_to: usize,
    },
}

impl Diagnostic {
    pub fn topic(&self) -> &str {
        match self {
            Diagnostic::InvalidUtf8 { topic, .. } => topic,
        }
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            Diagnostic::InvalidUtf8 { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn diagnostic_message() {
        let diag = Diagnostic::InvalidUtf8 {
            topic: "a/Capteur_de_son".into(),
            kind: SensorKind::Sound,
            valid_up_to: 3,
        };
        assert_eq!(
            diag.to_string(),
            "payload on a/Capteur_de_son (sound) is not valid UTF-8 after 3 bytes"
        );
        assert_eq!(diag.topic(), "a/Capteur_de_son");
        assert_eq!(diag.kind(), SensorKind::Sound);
    }
}
