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

//! Destinations for rendered reports.

use lumi_core::MonitorResult;
use std::fmt::Debug;

/// Trait defining where a rendered report goes.
///
/// Every write replaces the previous report entirely: a sink holds the
/// latest report, never a log of them.
pub trait ReportSink: Send + Sync + Debug {
    /// Replaces the sink's content with `contents`.
    fn write_report(&self, contents: &str) -> MonitorResult<()>;

    /// A short description of the destination, for logging.
    fn describe(&self) -> String;
}
