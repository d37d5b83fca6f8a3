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

//! Binding a registry to its schema.
//!
//! Binding runs once, after every producer has registered. It decides the
//! output order of reports and assigns each variable its merge operation.

use super::registry::Registry;
use crate::schema::SchemaDefinition;
use lumi_core::{MonitorError, MonitorResult};

/// For each schema position, the index of the registry slot rendered there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingIndex {
    positions: Vec<usize>,
    pre_commit_len: usize,
}

impl BindingIndex {
    /// Registry indices in schema order.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Number of slots registered by producers. Placeholders appended during
    /// binding sit after this boundary and are never snapshotted.
    pub fn pre_commit_len(&self) -> usize {
        self.pre_commit_len
    }

    /// Number of schema positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` for an empty schema.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Reconciles a [`Registry`] against a [`SchemaDefinition`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaBinder {
    strict: bool,
    assign_operations: bool,
}

impl SchemaBinder {
    /// Creates a binder. In strict mode a schema field nobody registered is
    /// an error; otherwise it is filled with an `N/A` placeholder.
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            assign_operations: true,
        }
    }

    /// A binder that leaves merge operations untouched, for registries whose
    /// values are passed through without merging.
    pub fn without_operations(mut self) -> Self {
        self.assign_operations = false;
        self
    }

    /// Whether missing fields are errors.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Fails with the error [`bind`](Self::bind) would return, without
    /// touching the registry.
    pub fn check(&self, registry: &Registry, schema: &SchemaDefinition) -> MonitorResult<()> {
        if !self.strict {
            return Ok(());
        }
        match schema
            .entries()
            .iter()
            .find(|entry| registry.lookup(&entry.name).is_err())
        {
            Some(missing) => Err(MonitorError::SchemaMismatch {
                name: missing.name.clone(),
                schema: schema.source().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Binds `registry` to `schema`.
    ///
    /// The returned index always has one entry per schema field. A field
    /// listed twice binds twice to the same slot, and the later operation is
    /// the one kept. In strict mode the registry is not modified on failure.
    pub fn bind(
        &self,
        registry: &mut Registry,
        schema: &SchemaDefinition,
    ) -> MonitorResult<BindingIndex> {
        self.check(registry, schema)?;
        let pre_commit_len = registry.len();
        let resolved: Vec<Option<usize>> = schema
            .entries()
            .iter()
            .map(|entry| registry.lookup(&entry.name).ok())
            .collect();

        let mut positions = Vec::with_capacity(schema.len());
        let mut placeholders = 0usize;
        for (entry, found) in schema.entries().iter().zip(resolved) {
            let position = match found {
                Some(position) => {
                    if self.assign_operations {
                        if let Some(slot) = registry.get_mut(position) {
                            slot.set_operation(entry.operation);
                        }
                    }
                    position
                }
                None => {
                    log::warn!(
                        "'{}' required by {} is not registered, reporting N/A",
                        entry.name,
                        schema.source()
                    );
                    placeholders += 1;
                    registry.push_placeholder(&entry.name)
                }
            };
            positions.push(position);
        }

        log::info!(
            "Bound {} fields of {} to {} registered monitorables ({} placeholders)",
            positions.len(),
            schema.source(),
            pre_commit_len,
            placeholders
        );
        Ok(BindingIndex {
            positions,
            pre_commit_len,
        })
    }
}
