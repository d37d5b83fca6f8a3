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

//! Ordered schema definitions.
//!
//! A definition lists the fields a report must contain, in output order,
//! together with the merge operation of each. Definitions are JSON documents
//! of the form:
//!
//! ```json
//! { "data": [ { "name": "NEvents", "operation": "sum", "type": "integer" } ] }
//! ```
//!
//! Keys other than `name` and `operation` are ignored.

use lumi_core::{MergeOperation, MonitorError, MonitorResult};
use serde::Deserialize;
use std::path::Path;

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Field name, matched against registered variable names.
    pub name: String,
    /// How the field's samples are merged.
    pub operation: MergeOperation,
}

/// An immutable, ordered list of fields plus the identifier of its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    source: String,
    entries: Vec<SchemaEntry>,
}

#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default)]
    data: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    name: String,
    operation: String,
}

impl SchemaDefinition {
    /// Creates a definition from `(name, operation)` pairs.
    pub fn new<N: Into<String>>(
        source: impl Into<String>,
        fields: impl IntoIterator<Item = (N, MergeOperation)>,
    ) -> Self {
        Self {
            source: source.into(),
            entries: fields
                .into_iter()
                .map(|(name, operation)| SchemaEntry {
                    name: name.into(),
                    operation,
                })
                .collect(),
        }
    }

    /// Creates a definition without fields.
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    /// Parses a JSON definition. `source` identifies it in reports.
    pub fn from_json_str(source: impl Into<String>, text: &str) -> MonitorResult<Self> {
        let source = source.into();
        let raw: RawDefinition = serde_json::from_str(text)
            .map_err(|e| MonitorError::InvalidSchema(format!("{source}: {e}")))?;

        let entries = raw
            .data
            .into_iter()
            .map(|entry| -> MonitorResult<SchemaEntry> {
                Ok(SchemaEntry {
                    operation: entry.operation.parse()?,
                    name: entry.name,
                })
            })
            .collect::<MonitorResult<Vec<_>>>()?;

        log::debug!("Loaded schema {} with {} fields", source, entries.len());
        Ok(Self { source, entries })
    }

    /// Reads and parses a JSON definition file. The path becomes the source.
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(path.display().to_string(), &text)
    }

    /// Identifier of the definition, usually its path.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The fields in output order.
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the definition has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
