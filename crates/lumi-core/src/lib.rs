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

//! # Lumi Core
//!
//! Foundational crate for lumi-section monitoring: the value and merge
//! vocabulary, the handles producers update from their streams, and the
//! error contract shared by every layer above.
//!
//! This crate defines the abstract "what" of monitoring. `lumi-telemetry`
//! provides the registry, schema binding, and the epoch pipeline that
//! snapshots, merges, and renders these values.

#![warn(missing_docs)]

pub mod error;
pub mod merge;
pub mod tracked;
pub mod value;

pub use error::{MonitorError, MonitorResult};
pub use merge::{MergeOperation, MAX_HISTOGRAM_BINS};
pub use tracked::{Counter, SlotKind, StreamCounters, StreamEpochs, TrackedValue};
pub use value::{Epoch, MonitorValue, Sample, StreamId};
