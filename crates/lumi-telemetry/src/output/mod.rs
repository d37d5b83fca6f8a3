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

//! Rendering of reports and the sinks they are written to.

pub mod file_sink;
pub mod memory_sink;
pub mod render;
pub mod sink;

pub use file_sink::FileSink;
pub use memory_sink::MemorySink;
pub use render::{RenderedReport, ReportHeader};
pub use sink::ReportSink;
