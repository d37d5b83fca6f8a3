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

//! Registries, schema binding, and the epoch pipeline.

pub mod binder;
pub mod fast_path;
pub mod pipeline;
pub mod registry;
pub mod slot;

pub use binder::{BindingIndex, SchemaBinder};
pub use fast_path::FastPathRegistry;
pub use pipeline::EpochPipeline;
pub use registry::Registry;
pub use slot::MonitorableSlot;
