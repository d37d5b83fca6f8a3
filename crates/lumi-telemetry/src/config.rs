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

//! Monitor configuration.
//!
//! Configuration is written in RON:
//!
//! ```ron
//! (
//!     definition_path: "defs/main.jsd",
//!     strict: true,
//!     fast_path: Some((definition_path: "defs/fast.jsd", strict: false)),
//! )
//! ```

use lumi_core::{MonitorError, MonitorResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn enabled() -> bool {
    true
}

/// Settings of a [`MonitorService`](crate::service::MonitorService).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Schema definition of the primary reports.
    pub definition_path: PathBuf,
    /// Fail the commit when a schema field is not registered.
    #[serde(default)]
    pub strict: bool,
    /// Include `<hostname>_<pid>` in JSON reports.
    #[serde(default = "enabled")]
    pub use_source: bool,
    /// Include the schema path in JSON reports.
    #[serde(default = "enabled")]
    pub use_definition: bool,
    /// Optional fast path.
    #[serde(default)]
    pub fast_path: Option<FastPathConfig>,
}

/// Settings of the fast path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FastPathConfig {
    /// Schema definition of fast reports.
    pub definition_path: PathBuf,
    /// Fail the commit when a fast schema field is not registered.
    #[serde(default)]
    pub strict: bool,
}

impl MonitorConfig {
    /// A lenient configuration for `definition_path` with both JSON header
    /// fields enabled and no fast path.
    pub fn new(definition_path: impl Into<PathBuf>) -> Self {
        Self {
            definition_path: definition_path.into(),
            strict: false,
            use_source: true,
            use_definition: true,
            fast_path: None,
        }
    }

    /// Parses a RON configuration.
    pub fn from_ron_str(text: &str) -> MonitorResult<Self> {
        ron::from_str(text).map_err(|e| MonitorError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Io(format!("{}: {e}", path.display())))?;
        Self::from_ron_str(&text)
    }
}
