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

//! # Lumi Telemetry
//!
//! Registry, schema binding, and the epoch pipeline that turn per-stream
//! counters into one schema-ordered report per lumi section.
//!
//! Producers register their counters on a [`MonitorService`]. A single
//! commit binds them to the schema, after which the orchestrator takes
//! snapshots, merges each epoch, writes CSV and JSON reports to a
//! [`ReportSink`], and discards closed epochs.

#![warn(missing_docs)]

pub mod config;
pub mod identity;
pub mod monitor;
pub mod output;
pub mod schema;
pub mod service;

pub use config::{FastPathConfig, MonitorConfig};
pub use identity::SourceIdentity;
pub use monitor::{
    BindingIndex, EpochPipeline, FastPathRegistry, MonitorableSlot, Registry, SchemaBinder,
};
pub use output::{FileSink, MemorySink, RenderedReport, ReportHeader, ReportSink};
pub use schema::{SchemaDefinition, SchemaEntry};
pub use service::MonitorService;
