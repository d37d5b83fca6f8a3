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

//! CSV and JSON rendering of merged values.

use lumi_core::MonitorValue;
use serde_json::{Map, Value};

/// Key of the source identity in the JSON header.
pub const SOURCE_KEY: &str = "source";
/// Key of the schema path in the JSON header.
pub const DEFINITION_KEY: &str = "definition";
/// Key of the per-field payload in JSON reports.
pub const DATA_KEY: &str = "data";

/// Metadata shared by every field of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportHeader {
    /// `<hostname>_<pid>` of the reporting process, when enabled.
    pub source: Option<String>,
    /// Path of the schema the report follows, when enabled.
    pub definition: Option<String>,
}

/// Both renderings of one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    /// Schema source id on the first line, comma-joined values on the second.
    pub csv: String,
    /// Header metadata followed by the values keyed by field name.
    pub json: Value,
}

/// Renders the two-line CSV document: the schema source id, then one field
/// per value with no trailing comma.
pub fn render_csv(schema_source: &str, values: &[MonitorValue]) -> String {
    let line = values
        .iter()
        .map(MonitorValue::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{schema_source}\n{line}\n")
}

/// Converts a merged value to JSON. `N/A` stays a string so consumers can
/// tell it apart from zero.
pub fn value_to_json(value: &MonitorValue) -> Value {
    match value {
        MonitorValue::Integer(v) => Value::from(*v),
        MonitorValue::Real(v) => Value::from(*v),
        MonitorValue::Histogram(bins) => Value::from(bins.clone()),
        MonitorValue::NotApplicable => Value::from(value.to_string()),
    }
}

/// Adds one field to a JSON report.
///
/// Only the first field of a report writes the header; later fields add
/// their own payload under `data`.
pub fn serialize_field(
    root: &mut Map<String, Value>,
    header: &ReportHeader,
    name: &str,
    value: &MonitorValue,
    first: bool,
) {
    if first {
        if let Some(source) = &header.source {
            root.insert(SOURCE_KEY.to_string(), Value::from(source.as_str()));
        }
        if let Some(definition) = &header.definition {
            root.insert(DEFINITION_KEY.to_string(), Value::from(definition.as_str()));
        }
        root.insert(DATA_KEY.to_string(), Value::Object(Map::new()));
    }
    if let Some(Value::Object(data)) = root.get_mut(DATA_KEY) {
        data.insert(name.to_string(), value_to_json(value));
    }
}

/// Renders a JSON report from fields in schema order. A field repeated in
/// the schema appears once, at its first position.
pub fn render_json(header: &ReportHeader, fields: &[(&str, MonitorValue)]) -> Value {
    let mut root = Map::new();
    for (position, (name, value)) in fields.iter().enumerate() {
        serialize_field(&mut root, header, name, value, position == 0);
    }
    Value::Object(root)
}
