//! Physical/API port numbering and the port selector vocabulary.
//!
//! The FireBreak device addresses its 12 ports as 0-11 (API numbering) while
//! the housing labels them 1-12 (physical numbering). When the offset is
//! enabled, callers speak physical numbering and the translation is applied
//! symmetrically: requests are shifted down before they reach the device and
//! response port numbers are shifted back up.

use crate::error::HandlerError;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One port's state as reported by or sent to the device. `active` is the
/// device-native 0|1 value and is passed through unchanged; `port` is kept
/// in API numbering internally and translated only at the handler boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: i64,
    pub active: u8,
}

/// The port argument of a control request: one specific port or all of them.
///
/// `Specific` always holds the API (0-based) number; translation from the
/// caller's convention happens in [`PortSelector::parse`]. `All` bypasses
/// numeric validation and translation entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum PortSelector {
    Specific(i64),
    All,
}

impl PortSelector {
    /// Parses the raw `port` field of an invocation event.
    ///
    /// Accepts an integer in the range valid for the current numbering
    /// convention (0-11 with the offset disabled, 1-12 with it enabled) or
    /// the exact string `"all"`. Anything else is a validation error whose
    /// message echoes the offending value and the expected range.
    pub fn parse(raw: &Value, offset_enabled: bool) -> Result<Self, HandlerError> {
        match raw {
            Value::String(s) if s == "all" => Ok(PortSelector::All),
            Value::Number(n) => match n.as_i64() {
                Some(port) if in_valid_range(port, offset_enabled) => {
                    Ok(PortSelector::Specific(to_api_numbering(port, offset_enabled)))
                }
                _ => Err(out_of_range(raw, offset_enabled)),
            },
            _ => Err(out_of_range(raw, offset_enabled)),
        }
    }
}

// The device expects `"port": 3` or `"port": "all"` in the request body.
impl Serialize for PortSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PortSelector::Specific(port) => serializer.serialize_i64(*port),
            PortSelector::All => serializer.serialize_str("all"),
        }
    }
}

/// Converts a caller-supplied port number to API numbering.
/// Identity when the offset is disabled. No bounds checks here - the raw
/// input range is validated by the caller in the convention in effect.
pub fn to_api_numbering(port: i64, offset_enabled: bool) -> i64 {
    if offset_enabled {
        port - 1
    } else {
        port
    }
}

/// Converts a device-reported port number back to the caller's convention.
/// Inverse of [`to_api_numbering`].
pub fn to_physical_numbering(port: i64, offset_enabled: bool) -> i64 {
    if offset_enabled {
        port + 1
    } else {
        port
    }
}

/// Translates every record of a device port list back to the caller's
/// numbering convention, leaving the `active` values untouched.
pub fn to_physical_records(ports: Vec<PortRecord>, offset_enabled: bool) -> Vec<PortRecord> {
    ports
        .into_iter()
        .map(|r| PortRecord {
            port: to_physical_numbering(r.port, offset_enabled),
            active: r.active,
        })
        .collect()
}

fn in_valid_range(port: i64, offset_enabled: bool) -> bool {
    if offset_enabled {
        (1..=12).contains(&port)
    } else {
        (0..=11).contains(&port)
    }
}

fn out_of_range(raw: &Value, offset_enabled: bool) -> HandlerError {
    let (range, numbering) = if offset_enabled {
        ("1-12", "physical")
    } else {
        ("0-11", "API")
    };
    HandlerError::Validation(format!(
        "FireBreak port must be an integer ({}, {} numbering) or 'all', got: {}",
        range, numbering, raw
    ))
}
