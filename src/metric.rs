use std::{fmt, str::FromStr};

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    Value,
    Increment,
    Start,
    Stop,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Value => "VALUE",
            MetricKind::Increment => "INCREMENT",
            MetricKind::Start => "START",
            MetricKind::Stop => "STOP",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VALUE" => Ok(MetricKind::Value),
            "INCREMENT" => Ok(MetricKind::Increment),
            "START" => Ok(MetricKind::Start),
            "STOP" => Ok(MetricKind::Stop),
            _ => Err(StoreError::UnknownKind(s.to_string())),
        }
    }
}

// A single row of the Metrics table. Timestamps are seconds since the epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricObservation {
    pub kind: MetricKind,
    pub name: String,
    pub timestamp: f64,
    pub value: f64,
}
