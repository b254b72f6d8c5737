//! Free-text Field Extraction
//!
//! ## Overview
//!
//! Sensors publish human-readable payloads rather than a fixed schema:
//!
//! ```text
//! Temp=23.5C Humidity=45%
//! PM2.5=12microg/m³ PM10=20microg/m³
//! Capteur_de_son = 55dB
//! ```
//!
//! Each value sits between a key (followed by a one-character separator,
//! usually `=`) and a unit that doubles as its terminator. Extraction looks
//! up the key, skips the separator, and takes everything up to the first
//! terminator after it.
//!
//! ## Algorithm
//!
//! ```text
//! "Temp=23.5C Humidity=45%"      key = "Temp", delimiter = "C"
//!  ^^^^                          first occurrence of key
//!      ^                         one separator char skipped
//!       ^^^^                     value
//!           ^                    first delimiter at or after start
//! ```
//!
//! 1. Find the first occurrence of the key; none → absent.
//! 2. Start after the key, plus one separator character unless the key is
//!    a literal prefix that already contains its separator.
//! 3. Find the first delimiter at or after start; none → absent.
//! 4. Start must be strictly before the delimiter, otherwise absent.
//! 5. Trim surrounding whitespace.
//!
//! Only the first occurrence of the key is consulted. A delimiter appearing
//! before the key is ignored. All offsets fall on UTF-8 boundaries, so no
//! input can make extraction panic.

use alloc::string::String;
use core::fmt;

/// Placeholder rendered for a field that could not be extracted
pub const ABSENT_PLACEHOLDER: &str = "N/A";

/// Result of extracting one named field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldExtraction {
    /// Trimmed textual value
    Present(String),
    /// Key or terminator not found, or offsets invalid
    #[default]
    Absent,
}

impl FieldExtraction {
    pub fn present(value: impl Into<String>) -> Self {
        FieldExtraction::Present(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldExtraction::Present(value) => Some(value),
            FieldExtraction::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldExtraction::Absent)
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            FieldExtraction::Present(value) => Some(value),
            FieldExtraction::Absent => None,
        }
    }
}

impl fmt::Display for FieldExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or(ABSENT_PLACEHOLDER))
    }
}

impl From<Option<&str>> for FieldExtraction {
    fn from(value: Option<&str>) -> Self {
        value.map_or(FieldExtraction::Absent, FieldExtraction::present)
    }
}

/// How the value start is located relative to the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Skip exactly one character after the key (`Temp=23.5C`)
    SkipOne,
    /// Key already ends with its separator; value starts right after it
    Literal,
}

/// Where to find one field in a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub delimiter: &'static str,
    pub separator: Separator,
}

impl FieldSpec {
    pub const TEMPERATURE: FieldSpec = FieldSpec::new("Temp", "C");
    pub const HUMIDITY: FieldSpec = FieldSpec::new("Humidity", "%");
    pub const PM25: FieldSpec = FieldSpec::new("PM2.5", "microg/m³");
    pub const PM10: FieldSpec = FieldSpec::new("PM10", "microg/m³");
    /// The sound sensor's key carries its own `=`; it is matched as-is.
    pub const SOUND_LEVEL: FieldSpec = FieldSpec::literal("Capteur_de_son =", "dB");

    /// Key followed by a one-character separator
    pub const fn new(key: &'static str, delimiter: &'static str) -> Self {
        Self {
            key,
            delimiter,
            separator: Separator::SkipOne,
        }
    }

    /// Key used as an opaque literal prefix
    pub const fn literal(key: &'static str, delimiter: &'static str) -> Self {
        Self {
            key,
            delimiter,
            separator: Separator::Literal,
        }
    }

    pub fn extract(&self, payload: &str) -> FieldExtraction {
        extract_with(payload, self.key, self.delimiter, self.separator)
    }
}

/// Extract the value following `key` and a one-character separator, up to `delimiter`
pub fn extract(payload: &str, key: &str, delimiter: &str) -> FieldExtraction {
    extract_with(payload, key, delimiter, Separator::SkipOne)
}

/// Extract with an explicit separator convention
pub fn extract_with(payload: &str, key: &str, delimiter: &str, separator: Separator) -> FieldExtraction {
    value_span(payload, key, delimiter, separator)
        .map(|value| value.trim())
        .into()
}

fn value_span<'a>(payload: &'a str, key: &str, delimiter: &str, separator: Separator) -> Option<&'a str> {
    if key.is_empty() || delimiter.is_empty() {
        return None;
    }

    let key_end = payload.find(key)? + key.len();
    let start = match separator {
        Separator::SkipOne => key_end + payload[key_end..].chars().next()?.len_utf8(),
        Separator::Literal => key_end,
    };

    let end = start + payload[start..].find(delimiter)?;
    if start >= end {
        return None;
    }

    // The slice ends at the first delimiter after start, so it cannot
    // contain another one; only whitespace needs stripping.
    Some(&payload[start..end])
}
