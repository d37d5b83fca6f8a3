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

//! The fast path: a separate registry whose values skip merging.

use super::binder::{BindingIndex, SchemaBinder};
use super::registry::Registry;
use crate::output::render;
use crate::schema::SchemaDefinition;
use lumi_core::{Counter, MonitorError, MonitorResult, MonitorValue};

/// A registry and schema independent of the primary pipeline.
///
/// Values are read straight from the producers' counters when rendered; no
/// samples are kept and no merge operation applies. Names registered here
/// are invisible to the primary registry and the reverse.
#[derive(Debug)]
pub struct FastPathRegistry {
    registry: Registry,
    schema: SchemaDefinition,
    binder: SchemaBinder,
    binding: Option<BindingIndex>,
}

impl FastPathRegistry {
    /// Creates an uncommitted fast path for `schema` with its own strictness.
    pub fn new(schema: SchemaDefinition, strict: bool) -> Self {
        Self {
            registry: Registry::new(),
            schema,
            binder: SchemaBinder::new(strict).without_operations(),
            binding: None,
        }
    }

    /// The schema fast reports follow.
    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// The registered variables.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether [`commit`](Self::commit) succeeded.
    pub fn is_committed(&self) -> bool {
        self.binding.is_some()
    }

    /// Registers a process-wide counter.
    pub fn register(&mut self, name: impl Into<String>, counter: Counter) -> MonitorResult<usize> {
        if self.is_committed() {
            return Err(MonitorError::AlreadyCommitted);
        }
        self.registry.register_scalar(name, counter, false, None)
    }

    /// Fails with the error [`commit`](Self::commit) would return, leaving
    /// the fast path untouched.
    pub fn check_commit(&self) -> MonitorResult<()> {
        if self.is_committed() {
            return Err(MonitorError::AlreadyCommitted);
        }
        self.binder.check(&self.registry, &self.schema)
    }

    /// Binds the fast registry to its schema.
    pub fn commit(&mut self) -> MonitorResult<()> {
        self.check_commit()?;
        self.binding = Some(self.binder.bind(&mut self.registry, &self.schema)?);
        Ok(())
    }

    /// The value most recently written to `name`'s counter.
    pub fn latest(&self, name: &str) -> MonitorResult<MonitorValue> {
        Ok(self.registry.slot_by_name(name)?.latest())
    }

    /// Latest values of every bound field, in schema order.
    pub fn latest_values(&self) -> MonitorResult<Vec<MonitorValue>> {
        let binding = self.binding.as_ref().ok_or(MonitorError::NotCommitted)?;
        Ok(binding
            .positions()
            .iter()
            .filter_map(|&position| self.registry.get(position))
            .map(|slot| slot.latest())
            .collect())
    }

    /// Renders the fast CSV document.
    pub fn render_csv(&self) -> MonitorResult<String> {
        Ok(render::render_csv(
            self.schema.source(),
            &self.latest_values()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumi_core::MergeOperation;

    #[test]
    fn test_latest_value_passthrough() {
        let inflight = Counter::with_value(4);
        let schema = SchemaDefinition::new(
            "defs/fast.jsd",
            [
                ("inflight", MergeOperation::Sum),
                ("absent", MergeOperation::Sum),
            ],
        );
        let mut fast = FastPathRegistry::new(schema, false);
        fast.register("inflight", inflight.clone()).unwrap();
        fast.commit().unwrap();

        inflight.set(9);
        assert_eq!(fast.latest("inflight").unwrap(), MonitorValue::Integer(9));
        assert_eq!(fast.render_csv().unwrap(), "defs/fast.jsd\n9,N/A\n");
        assert_eq!(
            fast.registry().slot_by_name("inflight").unwrap().operation(),
            None
        );
    }

    #[test]
    fn test_strict_fast_path() {
        let schema = SchemaDefinition::new("defs/fast.jsd", [("absent", MergeOperation::Sum)]);
        let mut fast = FastPathRegistry::new(schema, true);
        assert!(matches!(
            fast.commit(),
            Err(MonitorError::SchemaMismatch { .. })
        ));
        assert_eq!(fast.render_csv(), Err(MonitorError::NotCommitted));
    }

    #[test]
    fn test_register_after_commit() {
        let mut fast = FastPathRegistry::new(SchemaDefinition::empty("defs/fast.jsd"), false);
        fast.commit().unwrap();
        assert_eq!(
            fast.register("late", Counter::new()),
            Err(MonitorError::AlreadyCommitted)
        );
        assert_eq!(fast.commit(), Err(MonitorError::AlreadyCommitted));
    }
}
