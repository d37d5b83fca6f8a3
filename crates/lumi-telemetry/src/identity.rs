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

//! Identity of the reporting process.

use std::fmt::Display;
use sysinfo::System;

/// Host name and process id, rendered as `<hostname>_<pid>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    host: String,
    pid: u32,
}

impl SourceIdentity {
    /// Creates an identity from explicit parts.
    pub fn new(host: impl Into<String>, pid: u32) -> Self {
        Self {
            host: host.into(),
            pid,
        }
    }

    /// The identity of the current process.
    pub fn current() -> Self {
        let host = System::host_name().unwrap_or_else(|| {
            log::warn!("Could not determine host name, using 'localhost'");
            "localhost".to_string()
        });
        Self::new(host, std::process::id())
    }

    /// The host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Display for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.host, self.pid)
    }
}
