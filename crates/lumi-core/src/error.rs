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

//! Error contract for the monitoring system.

use crate::value::StreamId;
use std::fmt::Display;

/// A specialized `Result` type for monitoring operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// An error that can occur while registering, binding, snapshotting, or
/// emitting monitored values.
///
/// Every variant except `Io` describes a mismatch between producer code and
/// its schema. These are detected during setup or binding and are not meant
/// to be recovered from at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// A variable with this name was already registered in the same registry.
    DuplicateName(String),
    /// No variable with this name exists in the registry.
    UnknownName(String),
    /// Strict binding found a schema entry that no producer registered.
    SchemaMismatch {
        /// The schema entry without a matching registration.
        name: String,
        /// Source identifier of the schema being bound.
        schema: String,
    },
    /// Registration or binding was attempted after the registry was committed.
    AlreadyCommitted,
    /// A snapshot was requested before the registry was committed.
    NotCommitted,
    /// A per-stream operation referenced a stream the variable does not track.
    StreamOutOfRange {
        /// The offending variable.
        name: String,
        /// The requested stream.
        stream: StreamId,
        /// Number of streams the variable tracks.
        stream_count: usize,
    },
    /// The schema definition could not be parsed.
    InvalidSchema(String),
    /// The monitor configuration could not be parsed or is inconsistent.
    InvalidConfig(String),
    /// Reading a definition or writing a report failed.
    Io(String),
}

impl Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::DuplicateName(name) => {
                write!(f, "Monitorable registered twice: {name}")
            }
            MonitorError::UnknownName(name) => write!(f, "Monitorable not registered: {name}"),
            MonitorError::SchemaMismatch { name, schema } => {
                write!(f, "Schema {schema} requires '{name}' but nothing registered it")
            }
            MonitorError::AlreadyCommitted => write!(f, "Registry is already committed"),
            MonitorError::NotCommitted => write!(f, "Registry has not been committed"),
            MonitorError::StreamOutOfRange {
                name,
                stream,
                stream_count,
            } => write!(
                f,
                "Stream {stream} out of range for '{name}' ({stream_count} streams)"
            ),
            MonitorError::InvalidSchema(msg) => write!(f, "Invalid schema: {msg}"),
            MonitorError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            MonitorError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err.to_string())
    }
}
