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

//! The epoch-scoped snapshot, merge, and render pipeline.

use super::binder::{BindingIndex, SchemaBinder};
use super::registry::Registry;
use crate::output::render::{self, RenderedReport, ReportHeader};
use crate::schema::SchemaDefinition;
use lumi_core::{
    Counter, Epoch, MonitorError, MonitorResult, MonitorValue, StreamCounters, StreamEpochs,
    StreamId,
};

/// A registry, its schema, and the binding between them.
///
/// The pipeline has two phases. During setup variables are registered;
/// [`commit`](Self::commit) binds them to the schema exactly once. After
/// that, snapshots capture samples per epoch, merges combine them, and
/// [`discard`](Self::discard) releases closed epochs.
#[derive(Debug)]
pub struct EpochPipeline {
    registry: Registry,
    schema: SchemaDefinition,
    binder: SchemaBinder,
    binding: Option<BindingIndex>,
    stream_epochs: Option<StreamEpochs>,
    seq: u64,
}

impl EpochPipeline {
    /// Creates an uncommitted pipeline for `schema`.
    pub fn new(schema: SchemaDefinition, strict: bool) -> Self {
        Self {
            registry: Registry::new(),
            schema,
            binder: SchemaBinder::new(strict),
            binding: None,
            stream_epochs: None,
            seq: 0,
        }
    }

    /// The registered variables.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The schema reports follow.
    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// The binding, once committed.
    pub fn binding(&self) -> Option<&BindingIndex> {
        self.binding.as_ref()
    }

    /// Whether [`commit`](Self::commit) succeeded.
    pub fn is_committed(&self) -> bool {
        self.binding.is_some()
    }

    fn setup_registry(&mut self) -> MonitorResult<&mut Registry> {
        if self.is_committed() {
            return Err(MonitorError::AlreadyCommitted);
        }
        Ok(&mut self.registry)
    }

    /// Registers a process-wide counter. See [`Registry::register_scalar`].
    pub fn register_scalar(
        &mut self,
        name: impl Into<String>,
        counter: Counter,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.setup_registry()?
            .register_scalar(name, counter, zero_as_na, histogram_bins)
    }

    /// Registers per-stream values. See [`Registry::register_stream_vector`].
    pub fn register_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.setup_registry()?
            .register_stream_vector(name, counters, zero_as_na, histogram_bins)
    }

    /// Registers per-stream atomic counters. See
    /// [`Registry::register_atomic_stream_vector`].
    pub fn register_atomic_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.setup_registry()?
            .register_atomic_stream_vector(name, counters, zero_as_na, histogram_bins)
    }

    /// Fails with the error [`commit`](Self::commit) would return, leaving
    /// the pipeline untouched.
    pub fn check_commit(&self) -> MonitorResult<()> {
        if self.is_committed() {
            return Err(MonitorError::AlreadyCommitted);
        }
        self.binder.check(&self.registry, &self.schema)
    }

    /// Binds the registry to the schema, ending the setup phase.
    ///
    /// `stream_epochs`, when given, tells timed snapshots which epoch each
    /// stream is in. A failed commit leaves the pipeline uncommitted, so
    /// every later snapshot fails too.
    pub fn commit(&mut self, stream_epochs: Option<StreamEpochs>) -> MonitorResult<()> {
        self.check_commit()?;
        let binding = self.binder.bind(&mut self.registry, &self.schema)?;
        self.binding = Some(binding);
        self.stream_epochs = stream_epochs;
        Ok(())
    }

    /// Returns the producer-registered slots and a fresh sequence number.
    fn begin_snapshot(&mut self) -> MonitorResult<(usize, u64)> {
        let pre_commit_len = self
            .binding
            .as_ref()
            .map(BindingIndex::pre_commit_len)
            .ok_or(MonitorError::NotCommitted)?;
        self.seq += 1;
        Ok((pre_commit_len, self.seq))
    }

    /// Captures every registered variable. Per-stream values are keyed by
    /// the epoch each stream is processing, falling back to `epoch`.
    pub fn snapshot_timed(&mut self, epoch: Epoch) -> MonitorResult<()> {
        let (pre_commit_len, seq) = self.begin_snapshot()?;
        let streams = self.stream_epochs.as_ref();
        for slot in &mut self.registry.slots_mut()[..pre_commit_len] {
            slot.snap_timed(epoch, streams, seq);
        }
        Ok(())
    }

    /// Captures the process-wide values that are final once `epoch` closes.
    pub fn snapshot_global(&mut self, epoch: Epoch) -> MonitorResult<()> {
        let (pre_commit_len, seq) = self.begin_snapshot()?;
        for slot in &mut self.registry.slots_mut()[..pre_commit_len] {
            slot.snap_global(epoch, seq);
        }
        Ok(())
    }

    /// Captures one stream of every atomic per-stream variable.
    ///
    /// Fails without capturing anything if some atomic variable does not
    /// track `stream`.
    pub fn snapshot_stream_atomic(&mut self, stream: StreamId, epoch: Epoch) -> MonitorResult<()> {
        let pre_commit_len = self
            .binding
            .as_ref()
            .map(BindingIndex::pre_commit_len)
            .ok_or(MonitorError::NotCommitted)?;
        for slot in self.registry.iter().take(pre_commit_len) {
            slot.check_stream(stream)?;
        }

        let (_, seq) = self.begin_snapshot()?;
        for slot in &mut self.registry.slots_mut()[..pre_commit_len] {
            slot.snap_stream_atomic(stream, epoch, seq);
        }
        Ok(())
    }

    /// Merges the samples of `name` for `epoch` with its bound operation.
    pub fn merge_and_retrieve(&self, name: &str, epoch: Epoch) -> MonitorResult<MonitorValue> {
        Ok(self.registry.slot_by_name(name)?.merge(epoch))
    }

    /// Merges every bound field for `epoch`, in schema order.
    pub fn merged_fields(&self, epoch: Epoch) -> MonitorResult<Vec<(&str, MonitorValue)>> {
        let binding = self.binding.as_ref().ok_or(MonitorError::NotCommitted)?;
        Ok(binding
            .positions()
            .iter()
            .filter_map(|&position| self.registry.get(position))
            .map(|slot| (slot.name(), slot.merge(epoch)))
            .collect())
    }

    /// Renders `epoch` as CSV and JSON in schema order.
    pub fn render(&self, epoch: Epoch, header: &ReportHeader) -> MonitorResult<RenderedReport> {
        let fields = self.merged_fields(epoch)?;
        let values: Vec<MonitorValue> = fields.iter().map(|(_, v)| v.clone()).collect();
        Ok(RenderedReport {
            csv: render::render_csv(self.schema.source(), &values),
            json: render::render_json(header, &fields),
        })
    }

    /// Releases every sample captured for `epoch`.
    pub fn discard(&mut self, epoch: Epoch) {
        for slot in self.registry.slots_mut() {
            slot.discard(epoch);
        }
        log::trace!("Discarded samples of epoch {epoch} from {}", self.schema.source());
    }
}
