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

//! A single monitored variable and its per-epoch samples.

use lumi_core::{
    Epoch, MergeOperation, MonitorError, MonitorResult, MonitorValue, Sample, SlotKind,
    StreamEpochs, StreamId, TrackedValue,
};
use std::collections::{BTreeMap, BTreeSet};

/// Binds a producer-updated value to a name and keeps the samples captured
/// for each open epoch.
///
/// The merge operation is not chosen by the producer: it is assigned when the
/// registry is bound to its schema.
#[derive(Debug)]
pub struct MonitorableSlot {
    name: String,
    tracked: TrackedValue,
    zero_as_na: bool,
    histogram_bins: Option<usize>,
    operation: Option<MergeOperation>,
    /// One map per stream; scalars use a single map, dummies none.
    samples: Vec<BTreeMap<Epoch, Sample>>,
}

impl MonitorableSlot {
    /// Creates a slot tracking `tracked`.
    pub fn new(
        name: impl Into<String>,
        tracked: TrackedValue,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> Self {
        let sample_maps = match tracked.kind() {
            SlotKind::Dummy => 0,
            _ => tracked.stream_count(),
        };
        Self {
            name: name.into(),
            tracked,
            zero_as_na,
            histogram_bins,
            operation: None,
            samples: vec![BTreeMap::new(); sample_maps],
        }
    }

    /// Creates a placeholder that always reports `N/A`.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, TrackedValue::Dummy, true, None)
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable's kind.
    pub fn kind(&self) -> SlotKind {
        self.tracked.kind()
    }

    /// Number of streams tracked.
    pub fn stream_count(&self) -> usize {
        self.tracked.stream_count()
    }

    /// The merge operation assigned at bind time, if any.
    pub fn operation(&self) -> Option<MergeOperation> {
        self.operation
    }

    pub(crate) fn set_operation(&mut self, operation: MergeOperation) {
        self.operation = Some(operation);
    }

    /// Whether an epoch without samples is reported as `N/A`.
    pub fn zero_as_na(&self) -> bool {
        self.zero_as_na
    }

    /// Histogram size registered for this variable.
    pub fn histogram_bins(&self) -> Option<usize> {
        self.histogram_bins
    }

    /// Timed snapshot: scalars at `epoch`, every stream of a vector at the
    /// epoch that stream is currently processing.
    pub(crate) fn snap_timed(&mut self, epoch: Epoch, streams: Option<&StreamEpochs>, seq: u64) {
        match self.kind() {
            SlotKind::Scalar => self.record(0, epoch, seq),
            SlotKind::StreamVector | SlotKind::AtomicStreamVector => {
                for stream in 0..self.samples.len() {
                    let stream_epoch = streams.and_then(|s| s.get(stream)).unwrap_or(epoch);
                    self.record(stream, stream_epoch, seq);
                }
            }
            SlotKind::Dummy => {}
        }
    }

    /// End-of-epoch snapshot: only scalars are final at the epoch boundary.
    pub(crate) fn snap_global(&mut self, epoch: Epoch, seq: u64) {
        if self.kind() == SlotKind::Scalar {
            self.record(0, epoch, seq);
        }
    }

    /// Captures one stream of an atomic vector. Other kinds are untouched.
    pub(crate) fn snap_stream_atomic(&mut self, stream: StreamId, epoch: Epoch, seq: u64) {
        if self.kind() == SlotKind::AtomicStreamVector {
            self.record(stream, epoch, seq);
        }
    }

    /// Fails if an atomic stream snapshot of `stream` cannot apply to this slot.
    pub(crate) fn check_stream(&self, stream: StreamId) -> MonitorResult<()> {
        if self.kind() == SlotKind::AtomicStreamVector && stream >= self.stream_count() {
            return Err(MonitorError::StreamOutOfRange {
                name: self.name.clone(),
                stream,
                stream_count: self.stream_count(),
            });
        }
        Ok(())
    }

    fn record(&mut self, stream: StreamId, epoch: Epoch, seq: u64) {
        if let (Some(value), Some(map)) = (self.tracked.read(stream), self.samples.get_mut(stream))
        {
            map.insert(epoch, Sample::new(value, seq));
        }
    }

    /// The samples captured for `epoch`, one per stream that has one.
    pub fn samples_for(&self, epoch: Epoch) -> Vec<(StreamId, Sample)> {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(stream, map)| map.get(&epoch).map(|s| (stream, *s)))
            .collect()
    }

    /// Merges the samples of `epoch` with the bound operation.
    ///
    /// Variables absent from the schema have no operation and are summed.
    pub fn merge(&self, epoch: Epoch) -> MonitorValue {
        if self.kind() == SlotKind::Dummy {
            return MonitorValue::NotApplicable;
        }
        self.operation.unwrap_or_default().merge(
            &self.samples_for(epoch),
            self.histogram_bins,
            self.zero_as_na,
        )
    }

    /// Reads the tracked value directly, with no snapshot and no merge.
    /// Vectors report stream 0.
    pub fn latest(&self) -> MonitorValue {
        self.tracked
            .read(0)
            .map(MonitorValue::Integer)
            .unwrap_or(MonitorValue::NotApplicable)
    }

    /// Drops every sample captured for `epoch`.
    pub(crate) fn discard(&mut self, epoch: Epoch) {
        for map in &mut self.samples {
            map.remove(&epoch);
        }
    }

    /// Epochs for which at least one sample is retained.
    pub fn retained_epochs(&self) -> BTreeSet<Epoch> {
        self.samples
            .iter()
            .flat_map(|map| map.keys().copied())
            .collect()
    }
}
