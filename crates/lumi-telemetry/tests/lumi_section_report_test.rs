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

use lumi_core::{
    Counter, MergeOperation, MonitorError, MonitorValue, StreamCounters, StreamEpochs,
};
use lumi_telemetry::{
    FileSink, MemorySink, MonitorConfig, MonitorService, ReportSink, SchemaDefinition,
    SourceIdentity,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn identity() -> Option<SourceIdentity> {
    Some(SourceIdentity::new("node01", 4242))
}

#[test]
fn test_render_order_follows_schema_not_registration() {
    // --- 1. ARRANGE ---
    let schema = SchemaDefinition::new(
        "defs/ba.jsd",
        [("b", MergeOperation::Sum), ("a", MergeOperation::Last)],
    );
    let mut service = MonitorService::new(schema, true).with_identity(identity());
    service
        .register_scalar("a", Counter::with_value(1), false, None)
        .unwrap();
    service
        .register_scalar("b", Counter::with_value(2), false, None)
        .unwrap();
    service.commit(None).unwrap();

    // --- 2. ACT ---
    service.snapshot_global(1).unwrap();
    let report = service.render(1).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(report.csv, "defs/ba.jsd\n2,1\n");
    let fields: Vec<_> = report.json["data"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(fields, ["b", "a"]);
}

#[test]
fn test_lenient_binding_covers_every_schema_field() {
    let names = ["n0", "n1", "n2", "n3", "n4"];
    let schema = SchemaDefinition::new(
        "defs/gaps.jsd",
        names.iter().map(|n| (*n, MergeOperation::Sum)),
    );

    // Register every other field, in reverse order.
    let mut service = MonitorService::new(schema, false);
    for name in names.iter().rev().step_by(2) {
        service
            .register_scalar(*name, Counter::with_value(1), false, None)
            .unwrap();
    }
    service.commit(None).unwrap();
    service.snapshot_global(3).unwrap();

    let binding = service.pipeline().binding().unwrap();
    assert_eq!(binding.len(), names.len());
    assert_eq!(service.render(3).unwrap().csv, "defs/gaps.jsd\n1,N/A,1,N/A,1\n");
}

#[test]
fn test_strict_binding_fails_only_on_gaps() {
    let schema = || {
        SchemaDefinition::new(
            "defs/strict.jsd",
            [("x", MergeOperation::Sum), ("y", MergeOperation::Sum)],
        )
    };

    let mut complete = MonitorService::new(schema(), true);
    complete.register_scalar("y", Counter::new(), false, None).unwrap();
    complete.register_scalar("x", Counter::new(), false, None).unwrap();
    complete.register_scalar("extra", Counter::new(), false, None).unwrap();
    assert!(complete.commit(None).is_ok());

    let mut partial = MonitorService::new(schema(), true);
    partial.register_scalar("x", Counter::new(), false, None).unwrap();
    assert_eq!(
        partial.commit(None),
        Err(MonitorError::SchemaMismatch {
            name: "y".to_string(),
            schema: "defs/strict.jsd".to_string(),
        })
    );
    assert_eq!(partial.snapshot_timed(1), Err(MonitorError::NotCommitted));
}

#[test]
fn test_zero_updates_render_not_applicable() {
    let schema = SchemaDefinition::new("defs/na.jsd", [("events", MergeOperation::Sum)]);
    let events = StreamCounters::new(2);
    let mut service = MonitorService::new(schema, false);
    service
        .register_atomic_stream_vector("events", events.clone(), true, None)
        .unwrap();
    service.commit(None).unwrap();

    assert!(service.merge_and_retrieve("events", 1).unwrap().is_not_applicable());
    assert_eq!(service.render(1).unwrap().csv, "defs/na.jsd\nN/A\n");

    events.add(1, 6);
    service.snapshot_stream_atomic(1, 1).unwrap();
    assert_eq!(
        service.merge_and_retrieve("events", 1).unwrap(),
        MonitorValue::Integer(6)
    );
}

#[test]
fn test_discard_leaves_no_trace() {
    let schema = SchemaDefinition::new(
        "defs/discard.jsd",
        [("na", MergeOperation::Sum), ("zero", MergeOperation::Sum)],
    );
    let mut service = MonitorService::new(schema, false);
    service
        .register_scalar("na", Counter::with_value(3), true, None)
        .unwrap();
    service
        .register_scalar("zero", Counter::with_value(3), false, None)
        .unwrap();
    service.commit(None).unwrap();

    let untouched = service.render(5).unwrap();
    service.snapshot_timed(5).unwrap();
    service.snapshot_timed(6).unwrap();
    service.discard(5);

    assert_eq!(service.render(5).unwrap(), untouched);
    assert_eq!(
        service.merge_and_retrieve("zero", 5).unwrap(),
        MonitorValue::Integer(0)
    );
    assert_eq!(
        service.merge_and_retrieve("na", 6).unwrap(),
        MonitorValue::Integer(3)
    );
}

#[test]
fn test_fast_path_is_independent_of_primary() {
    let primary_events = StreamCounters::from_values(&[5, 7]);
    let fast_events = Counter::with_value(40);

    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("events", MergeOperation::Sum)]),
        true,
    );
    service
        .add_fast_path(
            SchemaDefinition::new(
                "defs/fast.jsd",
                [("events", MergeOperation::Sum), ("rate", MergeOperation::Sum)],
            ),
            false,
        )
        .unwrap();
    service
        .register_atomic_stream_vector("events", primary_events, false, None)
        .unwrap();
    service.register_fast("events", fast_events.clone()).unwrap();
    service.commit(None).unwrap();

    service.snapshot_timed(1).unwrap();
    fast_events.set(41);

    let fast = service.fast_path().unwrap();
    assert_eq!(fast.latest("events").unwrap(), MonitorValue::Integer(41));
    assert!(matches!(
        fast.latest("rate"),
        Err(MonitorError::UnknownName(_))
    ));
    assert_eq!(
        service.merge_and_retrieve("events", 1).unwrap(),
        MonitorValue::Integer(12)
    );

    let sink = MemorySink::new();
    service.output_fast_csv(&sink).unwrap();
    assert_eq!(sink.contents().unwrap(), "defs/fast.jsd\n41,N/A\n");
}

#[test]
fn test_fast_path_strictness_is_its_own() {
    let mut service = MonitorService::new(SchemaDefinition::empty("defs/main.jsd"), false);
    service
        .add_fast_path(
            SchemaDefinition::new("defs/fast.jsd", [("rate", MergeOperation::Sum)]),
            true,
        )
        .unwrap();

    assert!(matches!(
        service.commit(None),
        Err(MonitorError::SchemaMismatch { name, .. }) if name == "rate"
    ));
}

#[test]
fn test_failed_fast_path_commit_leaves_service_uncommitted() {
    // --- 1. ARRANGE ---
    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("events", MergeOperation::Sum)]),
        true,
    );
    service
        .register_scalar("events", Counter::with_value(3), false, None)
        .unwrap();
    service
        .add_fast_path(
            SchemaDefinition::new("defs/fast.jsd", [("rate", MergeOperation::Sum)]),
            true,
        )
        .unwrap();

    // --- 2. ACT ---
    let first = service.commit(None);

    // --- 3. ASSERT ---
    assert!(matches!(first, Err(MonitorError::SchemaMismatch { .. })));
    assert!(!service.pipeline().is_committed());
    assert_eq!(service.snapshot_timed(1), Err(MonitorError::NotCommitted));
    assert_eq!(service.snap_count(), 0);

    // The missing fast variable can still be registered and the commit retried.
    service.register_fast("rate", Counter::with_value(8)).unwrap();
    service.commit(None).unwrap();
    service.snapshot_timed(1).unwrap();

    let sink = MemorySink::new();
    service.output_fast_csv(&sink).unwrap();
    assert_eq!(sink.contents().unwrap(), "defs/fast.jsd\n8\n");
    assert_eq!(
        service.merge_and_retrieve("events", 1).unwrap(),
        MonitorValue::Integer(3)
    );
}

#[test]
fn test_events_summed_from_atomic_snapshots() {
    let events = StreamCounters::from_values(&[5, 7]);
    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("events", MergeOperation::Sum)]),
        true,
    );
    service
        .register_atomic_stream_vector("events", events, false, None)
        .unwrap();
    service.commit(None).unwrap();

    service.snapshot_stream_atomic(0, 1).unwrap();
    service.snapshot_stream_atomic(1, 1).unwrap();

    assert_eq!(
        service.merge_and_retrieve("events", 1).unwrap(),
        MonitorValue::Integer(12)
    );
}

#[test]
fn test_duplicate_registration_rejected_before_binding() {
    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("events", MergeOperation::Sum)]),
        true,
    );
    service
        .register_scalar("events", Counter::new(), false, None)
        .unwrap();
    assert_eq!(
        service.register_atomic_stream_vector("events", StreamCounters::new(2), false, None),
        Err(MonitorError::DuplicateName("events".to_string()))
    );
    assert!(!service.pipeline().is_committed());
}

#[test]
fn test_lagging_stream_reports_into_its_own_epoch() {
    let latency = StreamCounters::from_values(&[10, 30]);
    let epochs = StreamEpochs::new(2);
    epochs.set(0, 2);
    epochs.set(1, 3);

    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("latency", MergeOperation::Average)]),
        true,
    );
    service
        .register_stream_vector("latency", latency, true, None)
        .unwrap();
    service.commit(Some(epochs)).unwrap();
    service.snapshot_timed(3).unwrap();

    assert_eq!(
        service.merge_and_retrieve("latency", 2).unwrap(),
        MonitorValue::Real(10.0)
    );
    assert_eq!(
        service.merge_and_retrieve("latency", 3).unwrap(),
        MonitorValue::Real(30.0)
    );
}

#[test]
fn test_histogram_of_stream_states() {
    let states = StreamCounters::from_values(&[0, 2, 2, 1]);
    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("state", MergeOperation::Histogram)]),
        true,
    );
    service
        .register_stream_vector("state", states, false, Some(4))
        .unwrap();
    service.commit(None).unwrap();
    service.snapshot_timed(1).unwrap();

    let report = service.render(1).unwrap();
    assert_eq!(report.csv, "defs/main.jsd\n[1 1 2 0]\n");
    assert_eq!(report.json["data"]["state"], serde_json::json!([1, 1, 2, 0]));
}

#[test]
fn test_snapshots_race_with_producers() {
    let streams = 4;
    let events = StreamCounters::new(streams);
    let mut service = MonitorService::new(
        SchemaDefinition::new("defs/main.jsd", [("events", MergeOperation::Sum)]),
        true,
    );
    service
        .register_atomic_stream_vector("events", events.clone(), false, None)
        .unwrap();
    service.commit(None).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let producers: Vec<_> = (0..streams)
        .map(|stream| {
            let events = events.clone();
            let running = running.clone();
            thread::spawn(move || {
                let mut produced = 0u64;
                while running.load(Ordering::Relaxed) && produced < 100_000 {
                    events.add(stream, 1);
                    produced += 1;
                }
            })
        })
        .collect();

    let mut previous = 0u64;
    for _ in 0..50 {
        for stream in 0..streams {
            service.snapshot_stream_atomic(stream, 1).unwrap();
        }
        let merged = service
            .merge_and_retrieve("events", 1)
            .unwrap()
            .as_integer()
            .unwrap();
        assert!(merged >= previous, "counters only grow");
        previous = merged;
    }

    running.store(false, Ordering::Relaxed);
    for producer in producers {
        producer.join().unwrap();
    }

    for stream in 0..streams {
        service.snapshot_stream_atomic(stream, 1).unwrap();
    }
    let expected: u64 = (0..streams).filter_map(|s| events.get(s)).sum();
    assert_eq!(
        service.merge_and_retrieve("events", 1).unwrap(),
        MonitorValue::Integer(expected)
    );
}

#[test]
fn test_file_reports_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let main_def = dir.path().join("main.jsd");
    let fast_def = dir.path().join("fast.jsd");
    std::fs::write(
        &main_def,
        r#"{ "data": [
            { "name": "NEvents", "operation": "sum", "type": "integer" },
            { "name": "NLumis", "operation": "max", "type": "integer" }
        ] }"#,
    )
    .unwrap();
    std::fs::write(
        &fast_def,
        r#"{ "data": [ { "name": "Inflight", "operation": "same" } ] }"#,
    )
    .unwrap();

    let config = MonitorConfig::from_ron_str(&format!(
        r#"(
            definition_path: "{}",
            strict: false,
            use_source: false,
            fast_path: Some((definition_path: "{}", strict: true)),
        )"#,
        main_def.display(),
        fast_def.display()
    ))
    .unwrap();

    let mut service = MonitorService::from_config(&config).unwrap();
    assert!(service.identity().is_none());
    service
        .register_atomic_stream_vector("NEvents", StreamCounters::from_values(&[3, 4]), false, None)
        .unwrap();
    service.register_fast("Inflight", Counter::with_value(2)).unwrap();
    service.commit(None).unwrap();
    service.snapshot_timed(9).unwrap();

    let csv_sink = FileSink::new(dir.path().join("report.csv"));
    let json_sink = FileSink::new(dir.path().join("report.jsn"));
    let fast_sink = FileSink::new(dir.path().join("fast.csv"));
    service.output_csv(&csv_sink, 9).unwrap();
    service.output_full_json(&json_sink, 9).unwrap();
    service.output_fast_csv(&fast_sink).unwrap();

    let csv = std::fs::read_to_string(csv_sink.path()).unwrap();
    assert_eq!(csv, format!("{}\n7,N/A\n", main_def.display()));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_sink.path()).unwrap()).unwrap();
    assert!(json.get("source").is_none());
    assert_eq!(json["definition"], main_def.display().to_string());
    assert_eq!(json["data"]["NEvents"], 7);
    assert_eq!(json["data"]["NLumis"], "N/A");

    let fast = std::fs::read_to_string(fast_sink.path()).unwrap();
    assert_eq!(fast, format!("{}\n2\n", fast_def.display()));

    // A second report replaces the first.
    service.discard(9);
    service.output_csv(&csv_sink, 9).unwrap();
    let csv = std::fs::read_to_string(csv_sink.path()).unwrap();
    assert_eq!(csv, format!("{}\n0,N/A\n", main_def.display()));
    assert_eq!(csv_sink.describe(), dir.path().join("report.csv").display().to_string());
}

#[test]
fn test_empty_schema_renders_nothing() {
    let mut service = MonitorService::new(SchemaDefinition::empty("defs/none.jsd"), true)
        .with_identity(identity());
    service
        .register_scalar("ignored", Counter::with_value(1), false, None)
        .unwrap();
    service.commit(None).unwrap();
    service.snapshot_timed(1).unwrap();

    let report = service.render(1).unwrap();
    assert_eq!(report.csv, "defs/none.jsd\n\n");
    assert_eq!(report.json, serde_json::json!({}));
}
