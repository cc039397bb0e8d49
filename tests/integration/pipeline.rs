//! JSONL pipeline behaviour through the public API.

use func_views::config::load_from_str;
use func_views::{PipelineOptions, RecordPipeline};
use serde_json::Value;
use std::fs;
use std::io::Cursor;

fn record(source: &str) -> String {
    serde_json::json!({
        "repository_name": "example/repo",
        "func_path_in_repository": "pkg/module.py",
        "whole_func_string": source,
        "language": "python",
    })
    .to_string()
}

#[test]
fn jsonl_round_trip_keeps_passthrough_fields() {
    let input = [
        record("def add(a, b):\n    \"\"\"Adds two numbers.\"\"\"\n    # simple\n    return a + b\n"),
        record("def sub(a, b):\n    return a - b\n"),
    ]
    .join("\n");

    let pipeline = RecordPipeline::new(PipelineOptions {
        jobs: 2,
        ..PipelineOptions::default()
    });
    let mut out = Vec::new();
    let summary = pipeline.run(Cursor::new(input), &mut out).unwrap();
    assert_eq!(summary.read, 2);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.skipped(), 0);

    let text = String::from_utf8(out).unwrap();
    let records: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

    let add = &records[0];
    assert_eq!(add["repository_name"], "example/repo");
    assert_eq!(add["language"], "python");
    assert_eq!(add["result_func_name"], "add");
    assert_eq!(add["result_body_no_coms"], "return a + b");
    assert_eq!(add["result_masked_no_coms"], "<NAME_MASK>(a, b):\n    return a + b");
    assert!(add["result_body_with_coms"]
        .as_str()
        .unwrap()
        .contains("Adds two numbers."));

    assert_eq!(records[1]["result_func_name"], "sub");
}

#[test]
fn one_bad_record_does_not_stop_the_batch() {
    let input = [
        record("def first():\n    return 1\n"),
        record("def broken(:\n"),
        record("only = lambda: None\n"),
        record("def last():\n    return 3\n"),
    ]
    .join("\n");

    let pipeline = RecordPipeline::new(PipelineOptions {
        jobs: 1,
        batch_size: 1,
        ..PipelineOptions::default()
    });
    let mut out = Vec::new();
    let summary = pipeline.run(Cursor::new(input), &mut out).unwrap();

    assert_eq!(summary.written, 2);
    assert_eq!(summary.skipped_extraction, 2);
    let names: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| {
            let v: Value = serde_json::from_str(l).unwrap();
            v["result_func_name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names, vec!["first", "last"]);
}

#[test]
fn config_drives_pipeline_options() {
    let config = load_from_str(
        "[input]\nsource_field = \"code\"\n[extraction]\nstrategy = \"query\"\n[run]\njobs = 1\n",
    )
    .unwrap();
    let pipeline = RecordPipeline::new(config.pipeline_options());

    let input = serde_json::json!({ "code": "def q():\n    # c\n    return 0\n" }).to_string();
    let mut out = Vec::new();
    let summary = pipeline.run(Cursor::new(input), &mut out).unwrap();
    assert_eq!(summary.written, 1);

    let value: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["result_body_no_coms"], "return 0");
}

#[test]
fn file_run_replaces_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("functions.jsonl");
    let output = dir.path().join("result.jsonl");
    fs::write(&input, record("def only():\n    return 1\n") + "\n").unwrap();
    fs::write(&output, "stale contents\n").unwrap();

    let pipeline = RecordPipeline::new(PipelineOptions::default());
    let summary = pipeline.run_files(&input, &output).unwrap();
    assert_eq!(summary.written, 1);

    let written = fs::read_to_string(&output).unwrap();
    assert!(!written.contains("stale"));
    assert!(written.contains("\"result_func_name\":\"only\""));
}
