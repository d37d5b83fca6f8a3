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

//! Service owning one monitoring engine instance.

use crate::config::MonitorConfig;
use crate::identity::SourceIdentity;
use crate::monitor::{EpochPipeline, FastPathRegistry};
use crate::output::{RenderedReport, ReportHeader, ReportSink};
use crate::schema::SchemaDefinition;
use lumi_core::{
    Counter, Epoch, MonitorError, MonitorResult, MonitorValue, StreamCounters, StreamEpochs,
    StreamId,
};

/// A complete monitoring engine: the primary pipeline, an optional fast
/// path, and the report emission around them.
///
/// Instances share nothing, so several monitors can run side by side in one
/// process. The orchestrating thread drives registration, [`commit`], the
/// snapshots, and report output; producers only touch their counters.
///
/// [`commit`]: MonitorService::commit
#[derive(Debug)]
pub struct MonitorService {
    pipeline: EpochPipeline,
    fast_path: Option<FastPathRegistry>,
    identity: Option<SourceIdentity>,
    use_definition: bool,
    snap_count: u64,
    timer_snap_count: u64,
}

impl MonitorService {
    /// Creates a service for `schema` that reports the current process
    /// identity and the schema path.
    pub fn new(schema: SchemaDefinition, strict: bool) -> Self {
        Self::new_with_source(schema, strict, true)
    }

    /// Like [`new`](Self::new), but the process identity is only looked up
    /// when `use_source` is set.
    pub fn new_with_source(schema: SchemaDefinition, strict: bool, use_source: bool) -> Self {
        Self {
            pipeline: EpochPipeline::new(schema, strict),
            fast_path: None,
            identity: use_source.then(SourceIdentity::current),
            use_definition: true,
            snap_count: 0,
            timer_snap_count: 0,
        }
    }

    /// Creates a service from configuration, loading the schema files it
    /// names.
    pub fn from_config(config: &MonitorConfig) -> MonitorResult<Self> {
        let schema = SchemaDefinition::load(&config.definition_path)?;
        let mut service = Self::new_with_source(schema, config.strict, config.use_source)
            .with_definition_header(config.use_definition);
        if let Some(fast) = &config.fast_path {
            service.add_fast_path(SchemaDefinition::load(&fast.definition_path)?, fast.strict)?;
        }
        Ok(service)
    }

    /// Replaces the identity written to JSON reports; `None` omits it.
    pub fn with_identity(mut self, identity: Option<SourceIdentity>) -> Self {
        self.identity = identity;
        self
    }

    /// Whether JSON reports carry the schema path.
    pub fn with_definition_header(mut self, enabled: bool) -> Self {
        self.use_definition = enabled;
        self
    }

    /// Adds a fast path with its own schema and strictness.
    pub fn add_fast_path(&mut self, schema: SchemaDefinition, strict: bool) -> MonitorResult<()> {
        if self.pipeline.is_committed() {
            return Err(MonitorError::AlreadyCommitted);
        }
        log::info!("Fast path enabled with {}", schema.source());
        self.fast_path = Some(FastPathRegistry::new(schema, strict));
        Ok(())
    }

    /// The primary pipeline.
    pub fn pipeline(&self) -> &EpochPipeline {
        &self.pipeline
    }

    /// The fast path, if one was added.
    pub fn fast_path(&self) -> Option<&FastPathRegistry> {
        self.fast_path.as_ref()
    }

    /// The identity written to JSON reports.
    pub fn identity(&self) -> Option<&SourceIdentity> {
        self.identity.as_ref()
    }

    /// Registers a process-wide counter.
    pub fn register_scalar(
        &mut self,
        name: impl Into<String>,
        counter: Counter,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.pipeline
            .register_scalar(name, counter, zero_as_na, histogram_bins)
    }

    /// Registers per-stream values captured by timed snapshots.
    pub fn register_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.pipeline
            .register_stream_vector(name, counters, zero_as_na, histogram_bins)
    }

    /// Registers per-stream atomic counters.
    pub fn register_atomic_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.pipeline
            .register_atomic_stream_vector(name, counters, zero_as_na, histogram_bins)
    }

    /// Registers a counter on the fast path.
    pub fn register_fast(
        &mut self,
        name: impl Into<String>,
        counter: Counter,
    ) -> MonitorResult<usize> {
        self.fast_path
            .as_mut()
            .ok_or_else(|| MonitorError::InvalidConfig("no fast path configured".to_string()))?
            .register(name, counter)
    }

    /// Binds the primary registry, then the fast path, to their schemas.
    ///
    /// Both bindings are checked before either is made, so a failed commit
    /// leaves the whole service uncommitted.
    pub fn commit(&mut self, stream_epochs: Option<StreamEpochs>) -> MonitorResult<()> {
        self.pipeline.check_commit()?;
        if let Some(fast) = &self.fast_path {
            fast.check_commit()?;
        }
        self.pipeline.commit(stream_epochs)?;
        if let Some(fast) = &mut self.fast_path {
            fast.commit()?;
        }
        Ok(())
    }

    /// Timed snapshot of every registered variable.
    pub fn snapshot_timed(&mut self, epoch: Epoch) -> MonitorResult<()> {
        self.pipeline.snapshot_timed(epoch)?;
        self.snap_count += 1;
        self.timer_snap_count += 1;
        Ok(())
    }

    /// End-of-epoch snapshot of process-wide variables.
    pub fn snapshot_global(&mut self, epoch: Epoch) -> MonitorResult<()> {
        self.pipeline.snapshot_global(epoch)?;
        self.snap_count += 1;
        Ok(())
    }

    /// Snapshot of one stream's atomic counters.
    pub fn snapshot_stream_atomic(&mut self, stream: StreamId, epoch: Epoch) -> MonitorResult<()> {
        self.pipeline.snapshot_stream_atomic(stream, epoch)?;
        self.snap_count += 1;
        Ok(())
    }

    /// Snapshots taken since the last JSON report.
    pub fn snap_count(&self) -> u64 {
        self.snap_count
    }

    /// Timed snapshots taken since the last JSON report.
    pub fn timer_snap_count(&self) -> u64 {
        self.timer_snap_count
    }

    /// Merged value of one variable for `epoch`.
    pub fn merge_and_retrieve(&self, name: &str, epoch: Epoch) -> MonitorResult<MonitorValue> {
        self.pipeline.merge_and_retrieve(name, epoch)
    }

    /// The header written by the first field of JSON reports.
    pub fn header(&self) -> ReportHeader {
        ReportHeader {
            source: self.identity.as_ref().map(SourceIdentity::to_string),
            definition: self
                .use_definition
                .then(|| self.pipeline.schema().source().to_string()),
        }
    }

    /// Renders `epoch` as CSV and JSON in schema order.
    pub fn render(&self, epoch: Epoch) -> MonitorResult<RenderedReport> {
        self.pipeline.render(epoch, &self.header())
    }

    /// Writes the CSV report of `epoch` to `sink`.
    pub fn output_csv(&self, sink: &dyn ReportSink, epoch: Epoch) -> MonitorResult<()> {
        let report = self.render(epoch)?;
        sink.write_report(&report.csv)?;
        log::debug!("Wrote CSV for epoch {epoch} to {}", sink.describe());
        Ok(())
    }

    /// Writes the fast-path CSV report to `sink`.
    pub fn output_fast_csv(&self, sink: &dyn ReportSink) -> MonitorResult<()> {
        let fast = self
            .fast_path
            .as_ref()
            .ok_or_else(|| MonitorError::InvalidConfig("no fast path configured".to_string()))?;
        sink.write_report(&fast.render_csv()?)?;
        log::trace!("Wrote fast CSV to {}", sink.describe());
        Ok(())
    }

    /// Writes the JSON report of `epoch` to `sink` and resets the snapshot
    /// counters.
    pub fn output_full_json(&mut self, sink: &dyn ReportSink, epoch: Epoch) -> MonitorResult<()> {
        log::info!(
            "Snapshot updates: {} (by timer: {}) in epoch {}",
            self.snap_count,
            self.timer_snap_count,
            epoch
        );
        self.snap_count = 0;
        self.timer_snap_count = 0;

        let report = self.render(epoch)?;
        let text = serde_json::to_string_pretty(&report.json)
            .map_err(|e| MonitorError::Io(e.to_string()))?;
        sink.write_report(&text)?;
        log::debug!("Wrote JSON for epoch {epoch} to {}", sink.describe());
        Ok(())
    }

    /// Releases every sample captured for `epoch`.
    pub fn discard(&mut self, epoch: Epoch) {
        self.pipeline.discard(epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use lumi_core::MergeOperation;

    fn service() -> MonitorService {
        let schema = SchemaDefinition::new(
            "defs/main.jsd",
            [("events", MergeOperation::Sum), ("bytes", MergeOperation::Last)],
        );
        MonitorService::new(schema, false).with_identity(Some(SourceIdentity::new("node01", 7)))
    }

    #[test]
    fn test_snap_counters_reset_by_json_output() {
        let mut service = service();
        service
            .register_atomic_stream_vector("events", StreamCounters::from_values(&[1, 2]), false, None)
            .unwrap();
        service.commit(None).unwrap();

        service.snapshot_timed(1).unwrap();
        service.snapshot_global(1).unwrap();
        service.snapshot_stream_atomic(0, 1).unwrap();
        assert_eq!(service.snap_count(), 3);
        assert_eq!(service.timer_snap_count(), 1);

        let sink = MemorySink::new();
        service.output_full_json(&sink, 1).unwrap();
        assert_eq!(service.snap_count(), 0);
        assert_eq!(service.timer_snap_count(), 0);

        let json: serde_json::Value = serde_json::from_str(&sink.contents().unwrap()).unwrap();
        assert_eq!(json["source"], "node01_7");
        assert_eq!(json["definition"], "defs/main.jsd");
        assert_eq!(json["data"]["events"], 3);
        assert_eq!(json["data"]["bytes"], "N/A");
    }

    #[test]
    fn test_failed_snapshot_is_not_counted() {
        let mut service = service();
        assert!(service.snapshot_timed(1).is_err());
        assert_eq!(service.snap_count(), 0);
    }

    #[test]
    fn test_header_flags() {
        let service = service()
            .with_identity(None)
            .with_definition_header(false);
        assert_eq!(service.header(), ReportHeader::default());
    }

    #[test]
    fn test_source_disabled_at_construction() {
        let service =
            MonitorService::new_with_source(SchemaDefinition::empty("defs/main.jsd"), false, false);
        assert_eq!(service.identity(), None);
        assert_eq!(service.header().source, None);
    }

    #[test]
    fn test_from_config_without_source() {
        let dir = tempfile::tempdir().unwrap();
        let definition = dir.path().join("main.jsd");
        std::fs::write(
            &definition,
            r#"{"data":[{"name":"events","operation":"sum"}]}"#,
        )
        .unwrap();
        let mut config = MonitorConfig::new(&definition);
        config.use_source = false;

        let service = MonitorService::from_config(&config).unwrap();
        assert_eq!(service.identity(), None);
        assert_eq!(
            service.header().definition,
            Some(definition.display().to_string())
        );
    }

    #[test]
    fn test_fast_path_requires_configuration() {
        let mut service = service();
        assert!(matches!(
            service.register_fast("x", Counter::new()),
            Err(MonitorError::InvalidConfig(_))
        ));
        assert!(matches!(
            service.output_fast_csv(&MemorySink::new()),
            Err(MonitorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fast_path_added_after_commit_is_rejected() {
        let mut service = service();
        service.commit(None).unwrap();
        assert_eq!(
            service.add_fast_path(SchemaDefinition::empty("defs/fast.jsd"), false),
            Err(MonitorError::AlreadyCommitted)
        );
    }
}
