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

//! In-memory report sink.

use super::sink::ReportSink;
use lumi_core::{MonitorError, MonitorResult};
use std::sync::RwLock;

/// Keeps the latest report in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// The latest report and the number of writes so far.
    state: RwLock<(Option<String>, usize)>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest report, if any was written.
    pub fn contents(&self) -> Option<String> {
        self.state.read().ok().and_then(|state| state.0.clone())
    }

    /// How many reports were written.
    pub fn write_count(&self) -> usize {
        self.state.read().map(|state| state.1).unwrap_or(0)
    }
}

impl ReportSink for MemorySink {
    fn write_report(&self, contents: &str) -> MonitorResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| MonitorError::Io("Failed to acquire write lock".to_string()))?;
        state.0 = Some(contents.to_string());
        state.1 += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
