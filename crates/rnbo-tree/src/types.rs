//! Parameter value types, access modes, and domains.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
    Impulse,
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Get,
    Set,
    Bi,
}

impl AccessMode {
    pub fn is_readable(self) -> bool {
        matches!(self, AccessMode::Get | AccessMode::Bi)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::Set | AccessMode::Bi)
    }
}

/// Optional numeric or enumerated domain, with clip-to-range behavior.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub accepted_values: Option<Vec<ParamValue>>,
    pub clip: bool,
}

impl Domain {
    pub fn numeric(min: f64, max: f64, clip: bool) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            accepted_values: None,
            clip,
        }
    }

    /// Apply the domain's clip policy to a numeric value. Non-clipping
    /// domains and non-numeric domains pass the value through unchanged.
    pub fn apply(&self, value: ParamValue) -> ParamValue {
        if !self.clip {
            return value;
        }
        match (value.as_f64(), self.min, self.max) {
            (Some(v), min, max) => {
                let mut clipped = v;
                if let Some(min) = min {
                    clipped = clipped.max(min);
                }
                if let Some(max) = max {
                    clipped = clipped.min(max);
                }
                if clipped == v {
                    value
                } else if matches!(value, ParamValue::Int(_)) {
                    ParamValue::Int(clipped as i64)
                } else {
                    ParamValue::Float(clipped)
                }
            }
            _ => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_bounds_values() {
        let d = Domain::numeric(0.0, 1.0, true);
        assert_eq!(d.apply(ParamValue::Float(2.0)), ParamValue::Float(1.0));
        assert_eq!(d.apply(ParamValue::Float(-2.0)), ParamValue::Float(0.0));
        assert_eq!(d.apply(ParamValue::Float(0.5)), ParamValue::Float(0.5));
    }

    #[test]
    fn non_clip_domain_passes_through() {
        let d = Domain::numeric(0.0, 1.0, false);
        assert_eq!(d.apply(ParamValue::Float(5.0)), ParamValue::Float(5.0));
    }

    #[test]
    fn access_mode_queries() {
        assert!(AccessMode::Bi.is_readable());
        assert!(AccessMode::Bi.is_writable());
        assert!(AccessMode::Get.is_readable());
        assert!(!AccessMode::Get.is_writable());
    }
}
