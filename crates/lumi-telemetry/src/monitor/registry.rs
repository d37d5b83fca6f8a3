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

//! Registry of monitored variables.

use super::slot::MonitorableSlot;
use lumi_core::{Counter, MonitorError, MonitorResult, StreamCounters, TrackedValue};
use std::collections::HashMap;

/// The variables registered by producers, in registration order, with a
/// name index.
///
/// Registration happens during setup on a single thread. Once the registry is
/// bound to a schema the only further change is the placeholders appended by
/// the binder.
#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<MonitorableSlot>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a slot and returns its index.
    ///
    /// A name may only be registered once; the registry is left unchanged if
    /// it is already present.
    pub fn register(&mut self, slot: MonitorableSlot) -> MonitorResult<usize> {
        if self.index.contains_key(slot.name()) {
            return Err(MonitorError::DuplicateName(slot.name().to_string()));
        }
        let position = self.slots.len();
        log::debug!(
            "Registered monitorable '{}' ({:?}, {} streams)",
            slot.name(),
            slot.kind(),
            slot.stream_count()
        );
        self.index.insert(slot.name().to_string(), position);
        self.slots.push(slot);
        Ok(position)
    }

    /// Registers a process-wide counter.
    pub fn register_scalar(
        &mut self,
        name: impl Into<String>,
        counter: Counter,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.register(MonitorableSlot::new(
            name,
            TrackedValue::Scalar(counter),
            zero_as_na,
            histogram_bins,
        ))
    }

    /// Registers per-stream values captured only by timed snapshots.
    pub fn register_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.register(MonitorableSlot::new(
            name,
            TrackedValue::StreamVector(counters),
            zero_as_na,
            histogram_bins,
        ))
    }

    /// Registers per-stream counters that can also be captured stream by
    /// stream.
    pub fn register_atomic_stream_vector(
        &mut self,
        name: impl Into<String>,
        counters: StreamCounters,
        zero_as_na: bool,
        histogram_bins: Option<usize>,
    ) -> MonitorResult<usize> {
        self.register(MonitorableSlot::new(
            name,
            TrackedValue::AtomicStreamVector(counters),
            zero_as_na,
            histogram_bins,
        ))
    }

    /// Appends a placeholder without indexing its name, so it can never
    /// collide with or shadow a registered variable.
    pub(crate) fn push_placeholder(&mut self, name: &str) -> usize {
        self.slots.push(MonitorableSlot::dummy(name));
        self.slots.len() - 1
    }

    /// Returns the index of the variable registered as `name`.
    pub fn lookup(&self, name: &str) -> MonitorResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| MonitorError::UnknownName(name.to_string()))
    }

    /// Returns the variable registered as `name`.
    pub fn slot_by_name(&self, name: &str) -> MonitorResult<&MonitorableSlot> {
        let position = self.lookup(name)?;
        Ok(&self.slots[position])
    }

    /// Returns the slot at `position`.
    pub fn get(&self, position: usize) -> Option<&MonitorableSlot> {
        self.slots.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut MonitorableSlot> {
        self.slots.get_mut(position)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [MonitorableSlot] {
        &mut self.slots
    }

    /// Iterates over all slots, placeholders included.
    pub fn iter(&self) -> impl Iterator<Item = &MonitorableSlot> {
        self.slots.iter()
    }

    /// Number of slots, placeholders included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumi_core::SlotKind;

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        let a = registry
            .register_scalar("bytes", Counter::new(), false, None)
            .unwrap();
        let b = registry
            .register_atomic_stream_vector("events", StreamCounters::new(2), true, None)
            .unwrap();

        assert_eq!((a, b), (0, 1));
        assert_eq!(registry.lookup("events").unwrap(), 1);
        assert_eq!(
            registry.slot_by_name("events").unwrap().kind(),
            SlotKind::AtomicStreamVector
        );
        assert_eq!(
            registry.lookup("nope"),
            Err(MonitorError::UnknownName("nope".to_string()))
        );
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register_scalar("events", Counter::new(), false, None)
            .unwrap();
        let err = registry
            .register_stream_vector("events", StreamCounters::new(4), false, None)
            .unwrap_err();

        assert_eq!(err, MonitorError::DuplicateName("events".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.slot_by_name("events").unwrap().kind(),
            SlotKind::Scalar
        );
    }

    #[test]
    fn test_placeholders_are_not_indexed() {
        let mut registry = Registry::new();
        let position = registry.push_placeholder("missing");

        assert_eq!(position, 0);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("missing").is_err());
        assert_eq!(registry.get(0).unwrap().kind(), SlotKind::Dummy);

        // A later registration under the same name is still allowed.
        assert!(registry
            .register_scalar("missing", Counter::new(), false, None)
            .is_ok());
    }
}
