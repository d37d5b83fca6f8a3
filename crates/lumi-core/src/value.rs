// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Values produced by merging and the raw samples they are merged from.

use std::fmt::Display;

/// A lumi section number. Opaque and monotonically non-decreasing; the
/// pipeline only uses it as a key for merge and discard.
pub type Epoch = u32;

/// Index of a processing stream.
pub type StreamId = usize;

/// Text written for a value that has no meaningful content in an epoch.
pub const NOT_APPLICABLE: &str = "N/A";

/// A single observation of a tracked quantity, captured by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// The observed counter value.
    pub value: u64,
    /// Snapshot sequence number at capture time. Higher means more recent.
    pub seq: u64,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(value: u64, seq: u64) -> Self {
        Self { value, seq }
    }
}

/// The result of merging the samples of one variable for one epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorValue {
    /// An unsigned integer, e.g. a summed event count.
    Integer(u64),
    /// A real number, e.g. an average across streams.
    Real(f64),
    /// Per-bin occurrence counts.
    Histogram(Vec<u64>),
    /// The variable has no meaningful value for this epoch.
    NotApplicable,
}

impl MonitorValue {
    /// Returns `true` for [`MonitorValue::NotApplicable`].
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, MonitorValue::NotApplicable)
    }

    /// Returns the value as a `u64` if it is an `Integer`.
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            MonitorValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is an `Integer` or `Real`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MonitorValue::Integer(v) => Some(*v as f64),
            MonitorValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the bin counts if this is a `Histogram`.
    pub fn as_histogram(&self) -> Option<&[u64]> {
        match self {
            MonitorValue::Histogram(bins) => Some(bins),
            _ => None,
        }
    }
}

/// Formats the value as a single CSV field. Histogram bins are separated by
/// spaces so the field never contains a comma.
impl Display for MonitorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorValue::Integer(v) => write!(f, "{v}"),
            MonitorValue::Real(v) => write!(f, "{v}"),
            MonitorValue::Histogram(bins) => {
                let joined = bins
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "[{joined}]")
            }
            MonitorValue::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let v = MonitorValue::Integer(12);
        assert_eq!(v.as_integer(), Some(12));
        assert_eq!(v.as_f64(), Some(12.0));
        assert!(!v.is_not_applicable());

        let avg = MonitorValue::Real(2.5);
        assert_eq!(avg.as_integer(), None);
        assert_eq!(avg.as_f64(), Some(2.5));

        assert!(MonitorValue::NotApplicable.is_not_applicable());
        assert_eq!(MonitorValue::NotApplicable.as_f64(), None);
    }

    #[test]
    fn test_csv_formatting() {
        assert_eq!(MonitorValue::Integer(7).to_string(), "7");
        assert_eq!(MonitorValue::Real(0.5).to_string(), "0.5");
        assert_eq!(MonitorValue::NotApplicable.to_string(), "N/A");
        assert_eq!(
            MonitorValue::Histogram(vec![0, 3, 1]).to_string(),
            "[0 3 1]"
        );
    }
}
