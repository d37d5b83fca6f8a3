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

//! Handles that producers update and the monitor reads.
//!
//! Producers create a handle, keep one clone for their own updates, and
//! register another with the monitor. Clones share the same atomics, so a
//! registered variable never outlives the memory it reads. Updates and reads
//! use `Ordering::Relaxed`: a snapshot sees a recent value of each counter,
//! not a consistent view across counters.

use crate::value::{Epoch, StreamId};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// A process-wide counter.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter with an initial value.
    pub fn with_value(value: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(value)),
        }
    }

    /// Adds `delta` and returns the new value. Wraps on overflow.
    pub fn add(&self, delta: u64) -> u64 {
        self.value
            .fetch_add(delta, Ordering::Relaxed)
            .wrapping_add(delta)
    }

    /// Overwrites the value.
    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Reads the current value without blocking writers.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A fixed-size array of counters, one per processing stream.
///
/// Each stream's counter sits on its own cache line so streams updating
/// their own slot never contend with each other.
#[derive(Debug, Clone)]
pub struct StreamCounters {
    slots: Arc<[CachePadded<AtomicU64>]>,
}

impl StreamCounters {
    /// Creates `streams` counters, all starting at zero.
    pub fn new(streams: usize) -> Self {
        Self {
            slots: (0..streams)
                .map(|_| CachePadded::new(AtomicU64::new(0)))
                .collect(),
        }
    }

    /// Creates counters with the given initial per-stream values.
    pub fn from_values(values: &[u64]) -> Self {
        Self {
            slots: values
                .iter()
                .map(|&v| CachePadded::new(AtomicU64::new(v)))
                .collect(),
        }
    }

    /// Number of streams tracked.
    pub fn stream_count(&self) -> usize {
        self.slots.len()
    }

    /// Adds `delta` to one stream's counter. Out-of-range streams are ignored.
    pub fn add(&self, stream: StreamId, delta: u64) {
        if let Some(slot) = self.slots.get(stream) {
            slot.fetch_add(delta, Ordering::Relaxed);
        }
    }

    /// Overwrites one stream's counter. Out-of-range streams are ignored.
    pub fn set(&self, stream: StreamId, value: u64) {
        if let Some(slot) = self.slots.get(stream) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    /// Reads one stream's counter, or `None` if the stream is out of range.
    pub fn get(&self, stream: StreamId) -> Option<u64> {
        self.slots.get(stream).map(|s| s.load(Ordering::Relaxed))
    }
}

/// The lumi section each stream is currently processing.
///
/// Streams advance at their own pace; timed snapshots use this to attribute
/// each stream's sample to the epoch that stream is actually in.
#[derive(Debug, Clone)]
pub struct StreamEpochs {
    epochs: Arc<[AtomicU32]>,
}

impl StreamEpochs {
    /// Creates the tracker with every stream at epoch 0.
    pub fn new(streams: usize) -> Self {
        Self {
            epochs: (0..streams).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Records that `stream` moved to `epoch`.
    pub fn set(&self, stream: StreamId, epoch: Epoch) {
        if let Some(e) = self.epochs.get(stream) {
            e.store(epoch, Ordering::Relaxed);
        }
    }

    /// The epoch `stream` is processing, or `None` if out of range.
    pub fn get(&self, stream: StreamId) -> Option<Epoch> {
        self.epochs.get(stream).map(|e| e.load(Ordering::Relaxed))
    }

    /// Number of streams tracked.
    pub fn stream_count(&self) -> usize {
        self.epochs.len()
    }
}

/// The category of a monitored variable, which decides which snapshot
/// flavors capture it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A process-wide value, captured by timed and end-of-epoch snapshots.
    Scalar,
    /// Per-stream values only refreshed by timed snapshots.
    StreamVector,
    /// Per-stream counters also captured stream by stream, outside the timer.
    AtomicStreamVector,
    /// A placeholder for a schema entry nobody registered. Always `N/A`.
    Dummy,
}

/// The producer-owned quantity behind a registered variable.
#[derive(Debug, Clone)]
pub enum TrackedValue {
    /// See [`SlotKind::Scalar`].
    Scalar(Counter),
    /// See [`SlotKind::StreamVector`].
    StreamVector(StreamCounters),
    /// See [`SlotKind::AtomicStreamVector`].
    AtomicStreamVector(StreamCounters),
    /// See [`SlotKind::Dummy`].
    Dummy,
}

impl TrackedValue {
    /// Returns the [`SlotKind`] corresponding to this value.
    pub fn kind(&self) -> SlotKind {
        match self {
            TrackedValue::Scalar(_) => SlotKind::Scalar,
            TrackedValue::StreamVector(_) => SlotKind::StreamVector,
            TrackedValue::AtomicStreamVector(_) => SlotKind::AtomicStreamVector,
            TrackedValue::Dummy => SlotKind::Dummy,
        }
    }

    /// Number of streams tracked; scalars count as one.
    pub fn stream_count(&self) -> usize {
        match self {
            TrackedValue::Scalar(_) => 1,
            TrackedValue::StreamVector(c) | TrackedValue::AtomicStreamVector(c) => {
                c.stream_count()
            }
            TrackedValue::Dummy => 0,
        }
    }

    /// Reads the live value for `stream`. Scalars ignore the stream index.
    pub fn read(&self, stream: StreamId) -> Option<u64> {
        match self {
            TrackedValue::Scalar(c) => Some(c.get()),
            TrackedValue::StreamVector(c) | TrackedValue::AtomicStreamVector(c) => c.get(stream),
            TrackedValue::Dummy => None,
        }
    }
}
