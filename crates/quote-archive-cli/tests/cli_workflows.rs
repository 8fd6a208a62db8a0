//! Integration tests for the `qarchive` binary.

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

mod common;

use common::{
    TestResult, archive_root, write_bar_archive, write_bars_named, write_quote_archive,
};

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("qarchive"))
}

fn bar_archive(tmp: &TempDir, rows: usize) -> TestResult<String> {
    let root = archive_root(tmp, "EURUSD Bid S10 20180608 20180609");
    write_bar_archive(&root, rows)?;
    Ok(root.to_string_lossy().into_owned())
}

#[test]
fn info_reports_kind_name_and_span() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 20)?;

    cli()
        .args(["info", "--archive", root.as_str()])
        .assert()
        .success()
        .stdout(contains("name: EURUSD Bid S10 20180608 20180609"))
        .stdout(contains("kind: bars"))
        .stdout(contains("DataBars"))
        .stdout(contains("[20, 2]"))
        .stdout(contains("first: 2018-06-08T00:00:00+00:00"))
        .stdout(contains("last: 2018-06-08T00:03:10+00:00"));
    Ok(())
}

#[test]
fn info_on_empty_archive_has_no_span() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 0)?;

    cli()
        .args(["info", "--archive", root.as_str()])
        .assert()
        .success()
        .stdout(contains("kind: bars"))
        .stdout(contains("(no rows)"));
    Ok(())
}

#[test]
fn locate_prints_row_bounds() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 20)?;

    cli()
        .args([
            "locate",
            "--archive",
            root.as_str(),
            "--dataset",
            "DataBars",
            "--from",
            "2018-06-08T00:00:50Z",
            "--to",
            "2018-06-08T00:01:30Z",
        ])
        .assert()
        .success()
        .stdout(contains("index_from: 5"))
        .stdout(contains("index_to: 10"));

    // Offsets are honored.
    cli()
        .args([
            "locate",
            "--archive",
            root.as_str(),
            "--dataset",
            "DataBars",
            "--from",
            "2018-06-08T02:00:50+02:00",
            "--to",
            "2018-06-08T02:00:50+02:00",
        ])
        .assert()
        .success()
        .stdout(contains("index_from: 5"))
        .stdout(contains("index_to: 6"));
    Ok(())
}

#[test]
fn bars_by_time_window() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 20)?;

    cli()
        .args([
            "bars",
            "--archive",
            root.as_str(),
            "--from",
            "2018-06-08T00:00:50Z",
            "--to",
            "2018-06-08T00:01:30Z",
        ])
        .assert()
        .success()
        .stdout(contains("Preview output"))
        .stdout(contains("date_from"))
        .stdout(contains("2018-06-08T00:00:50"))
        .stdout(contains("total_rows: 5"));
    Ok(())
}

#[test]
fn bars_by_index_clamps_past_the_end() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 20)?;

    cli()
        .args([
            "bars",
            "--archive",
            root.as_str(),
            "--index-from",
            "15",
            "--index-to",
            "100",
        ])
        .assert()
        .success()
        .stdout(contains("total_rows: 5"));
    Ok(())
}

#[test]
fn bars_export_csv_writes_every_row() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 20)?;
    let out = tmp.path().join("bars.csv");

    cli()
        .args([
            "bars",
            "--archive",
            root.as_str(),
            "--max-rows",
            "2",
            "--output",
            out.to_string_lossy().as_ref(),
            "--format",
            "csv",
        ])
        .assert()
        .success()
        .stdout(contains("total_rows: 20"))
        .stdout(contains("wrote:"));

    let text = std::fs::read_to_string(&out)?;
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("date_from,price_type,volume,open,close,high,low")
    );
    assert_eq!(lines.count(), 20);
    Ok(())
}

#[test]
fn quotes_export_jsonl_flattens_levels() -> TestResult {
    let tmp = TempDir::new()?;
    let root = archive_root(&tmp, "EURUSD level2 20180608 20180609");
    write_quote_archive(&root, 12, 3)?;
    let out = tmp.path().join("quotes.jsonl");

    cli()
        .args([
            "quotes",
            "--archive",
            root.to_string_lossy().as_ref(),
            "--from",
            "2018-06-08T00:00:20Z",
            "--to",
            "2018-06-08T00:01:00Z",
            "--output",
            out.to_string_lossy().as_ref(),
            "--format",
            "jsonl",
        ])
        .assert()
        .success()
        .stdout(contains("ask_price_0"))
        .stdout(contains("total_rows: 5"));

    let text = std::fs::read_to_string(&out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("\"bid_volume_2\":30"));
    Ok(())
}

#[test]
fn zero_max_rows_suppresses_preview() -> TestResult {
    let tmp = TempDir::new()?;
    let root = bar_archive(&tmp, 3)?;

    cli()
        .args(["bars", "--archive", root.as_str(), "--max-rows", "0"])
        .assert()
        .success()
        .stdout(contains("(preview suppressed; use --max-rows > 0)"))
        .stdout(contains("total_rows: 3"));
    Ok(())
}

#[test]
fn schema_file_renames_datasets() -> TestResult {
    let tmp = TempDir::new()?;
    let root = archive_root(&tmp, "custom");
    write_bars_named(&root, 4, "Candles", "CandleMeta")?;
    let schema = tmp.path().join("schema.json");
    std::fs::write(&schema, r#"{"bars": "Candles", "data_bars": "CandleMeta"}"#)?;

    // Default names find nothing.
    cli()
        .args(["bars", "--archive", root.to_string_lossy().as_ref()])
        .assert()
        .failure()
        .stderr(contains("neither bars nor quotes"));

    cli()
        .args([
            "--schema",
            schema.to_string_lossy().as_ref(),
            "bars",
            "--archive",
            root.to_string_lossy().as_ref(),
        ])
        .assert()
        .success()
        .stdout(contains("total_rows: 4"));
    Ok(())
}

#[test]
fn failures_exit_with_code_one() -> TestResult {
    let tmp = TempDir::new()?;
    let missing = tmp.path().join("absent");

    cli()
        .args(["info", "--archive", missing.to_string_lossy().as_ref()])
        .assert()
        .code(1)
        .stderr(contains("Failed to open archive"));

    let root = bar_archive(&tmp, 5)?;
    cli()
        .args(["quotes", "--archive", root.as_str()])
        .assert()
        .code(1)
        .stderr(contains("Dataset Quotes is missing"));

    cli()
        .args([
            "locate",
            "--archive",
            root.as_str(),
            "--dataset",
            "DataBars",
            "--from",
            "yesterday",
            "--to",
            "2018-06-08T00:00:00Z",
        ])
        .assert()
        .code(1)
        .stderr(contains("Invalid timestamp 'yesterday'").and(contains("RFC 3339")));
    Ok(())
}
