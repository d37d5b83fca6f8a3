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

//! Merge operations that collapse per-stream samples into one value.
//!
//! The operation for a variable comes from the schema and is resolved once,
//! when the registry is bound. Merging never depends on the order in which
//! streams are visited.

use crate::error::MonitorError;
use crate::value::{MonitorValue, Sample, StreamId};
use std::fmt::Display;
use std::str::FromStr;

/// Upper bound on the number of histogram bins, registered or inferred.
///
/// Samples at or beyond the bound are dropped like any other out-of-range
/// value.
pub const MAX_HISTOGRAM_BINS: usize = 4096;

/// How the samples of one epoch are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeOperation {
    /// Saturating sum of all samples.
    #[default]
    Sum,
    /// Arithmetic mean, reported as a real number.
    Average,
    /// The common value when every sample agrees, `N/A` otherwise.
    Same,
    /// The most recently captured sample.
    Last,
    /// The smallest sample.
    Min,
    /// The largest sample.
    Max,
    /// Occurrence counts per sample value.
    Histogram,
    /// Bitwise OR of all samples.
    BinaryOr,
}

impl MergeOperation {
    /// The name of the operation as written in schema definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeOperation::Sum => "sum",
            MergeOperation::Average => "avg",
            MergeOperation::Same => "same",
            MergeOperation::Last => "last",
            MergeOperation::Min => "min",
            MergeOperation::Max => "max",
            MergeOperation::Histogram => "histo",
            MergeOperation::BinaryOr => "binaryOr",
        }
    }

    /// Merges the samples captured for one epoch.
    ///
    /// `bins` is the histogram size registered for the variable; without it
    /// a histogram is sized to hold the largest sample. Either way the size
    /// is capped at [`MAX_HISTOGRAM_BINS`]. An empty sample set yields `N/A`
    /// when `zero_as_na` is set, and the operation's empty value otherwise.
    pub fn merge(
        &self,
        samples: &[(StreamId, Sample)],
        bins: Option<usize>,
        zero_as_na: bool,
    ) -> MonitorValue {
        if samples.is_empty() {
            return if zero_as_na {
                MonitorValue::NotApplicable
            } else {
                self.empty_value(bins)
            };
        }

        let values = samples.iter().map(|(_, s)| s.value);
        match self {
            MergeOperation::Sum => {
                MonitorValue::Integer(values.fold(0u64, |acc, v| acc.saturating_add(v)))
            }
            MergeOperation::Average => {
                let total: f64 = values.map(|v| v as f64).sum();
                MonitorValue::Real(total / samples.len() as f64)
            }
            MergeOperation::Same => {
                let first = samples[0].1.value;
                if samples.iter().all(|(_, s)| s.value == first) {
                    MonitorValue::Integer(first)
                } else {
                    MonitorValue::NotApplicable
                }
            }
            MergeOperation::Last => samples
                .iter()
                .max_by_key(|(stream, s)| (s.seq, *stream))
                .map(|(_, s)| MonitorValue::Integer(s.value))
                .unwrap_or(MonitorValue::NotApplicable),
            MergeOperation::Min => values
                .min()
                .map(MonitorValue::Integer)
                .unwrap_or(MonitorValue::NotApplicable),
            MergeOperation::Max => values
                .max()
                .map(MonitorValue::Integer)
                .unwrap_or(MonitorValue::NotApplicable),
            MergeOperation::Histogram => {
                let size = bins
                    .unwrap_or_else(|| {
                        samples
                            .iter()
                            .map(|(_, s)| {
                                usize::try_from(s.value)
                                    .ok()
                                    .and_then(|v| v.checked_add(1))
                                    .unwrap_or(usize::MAX)
                            })
                            .max()
                            .unwrap_or(0)
                    })
                    .min(MAX_HISTOGRAM_BINS);
                let mut counts = vec![0u64; size];
                for v in values {
                    // Values outside the bins are dropped.
                    let bin = usize::try_from(v).ok().and_then(|i| counts.get_mut(i));
                    if let Some(bin) = bin {
                        *bin += 1;
                    }
                }
                MonitorValue::Histogram(counts)
            }
            MergeOperation::BinaryOr => MonitorValue::Integer(values.fold(0u64, |acc, v| acc | v)),
        }
    }

    /// The value reported for an epoch without samples.
    ///
    /// A histogram without a registered size has nothing to report and
    /// yields `N/A`.
    pub fn empty_value(&self, bins: Option<usize>) -> MonitorValue {
        match (self, bins) {
            (MergeOperation::Sum | MergeOperation::BinaryOr, _) => MonitorValue::Integer(0),
            (MergeOperation::Histogram, Some(bins)) => {
                MonitorValue::Histogram(vec![0; bins.min(MAX_HISTOGRAM_BINS)])
            }
            _ => MonitorValue::NotApplicable,
        }
    }
}

impl Display for MergeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeOperation {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(MergeOperation::Sum),
            "avg" | "average" => Ok(MergeOperation::Average),
            "same" => Ok(MergeOperation::Same),
            "last" => Ok(MergeOperation::Last),
            "min" => Ok(MergeOperation::Min),
            "max" => Ok(MergeOperation::Max),
            "histo" | "histogram" => Ok(MergeOperation::Histogram),
            "binaryOr" => Ok(MergeOperation::BinaryOr),
            other => Err(MonitorError::InvalidSchema(format!(
                "unknown merge operation '{other}'"
            ))),
        }
    }
}
