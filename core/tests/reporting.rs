//! Integration tests for the channel report build and CSV export.
//!
//! Tests verify:
//! 1. The report is a pure function of the four upstream tables
//! 2. Purge + rebuild are atomic: a failed rebuild leaves the prior report
//! 3. The export carries a header row and correct CPO / ROAS arithmetic

use std::path::PathBuf;

use attribution_core::{
    report::{build_channel_report, export_channel_report},
    sql::{SqlCatalog, SCHEMA_ATTRIBUTION, SCHEMA_CHANNEL_REPORTING, SCHEMA_SESSION_COSTS},
    store::{PipelineStore, REPORT_TABLE},
};

const BASE_TABLES: &str = "
    CREATE TABLE session_sources (
        session_id             TEXT NOT NULL PRIMARY KEY,
        user_id                TEXT NOT NULL,
        event_date             TEXT NOT NULL,
        event_time             TEXT NOT NULL,
        channel_name           TEXT NOT NULL,
        holder_engagement      INTEGER NOT NULL DEFAULT 0,
        closer_engagement      INTEGER NOT NULL DEFAULT 0,
        impression_interaction INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE conversions (
        conv_id   TEXT NOT NULL PRIMARY KEY,
        user_id   TEXT NOT NULL,
        conv_date TEXT NOT NULL,
        conv_time TEXT NOT NULL,
        revenue   REAL NOT NULL DEFAULT 0
    );
";

fn catalog() -> SqlCatalog {
    SqlCatalog::new(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../sql"))
}

/// One journey, two attributed touchpoints on distinct channels, with
/// session costs: everything the four-table aggregation needs.
fn build_store() -> PipelineStore {
    let store = PipelineStore::in_memory().unwrap();
    let catalog = catalog();
    store.execute_batch(BASE_TABLES).unwrap();
    for schema in [
        SCHEMA_SESSION_COSTS,
        SCHEMA_ATTRIBUTION,
        SCHEMA_CHANNEL_REPORTING,
    ] {
        store.execute_batch(&catalog.load(schema).unwrap()).unwrap();
    }
    store
        .execute_batch(
            "INSERT INTO conversions VALUES ('c-1', 'u-1', '2024-01-01', '10:00:00', 200.0);
             INSERT INTO session_sources VALUES
                 ('s-1', 'u-1', '2024-01-01', '09:00:00', 'Paid Search Brand', 1, 0, 0),
                 ('s-2', 'u-1', '2024-01-01', '10:00:00', 'Newsletter & Email', 0, 1, 0);
             INSERT INTO session_costs VALUES ('s-1', 10.0), ('s-2', 5.0);
             INSERT INTO attribution_customer_journey VALUES
                 ('c-1', 's-1', 0.75),
                 ('c-1', 's-2', 0.25);",
        )
        .unwrap();
    store
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: report content is a pure function of the upstream tables
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn report_is_recomputed_wholesale() {
    let store = build_store();
    build_channel_report(&store, &catalog()).expect("report build failed");
    assert_eq!(store.count_rows(REPORT_TABLE).unwrap(), 2);

    // Rebuilding against unchanged upstream tables changes nothing.
    build_channel_report(&store, &catalog()).expect("rebuild failed");
    assert_eq!(
        store.count_rows(REPORT_TABLE).unwrap(),
        2,
        "rebuild must replace, not accumulate"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: purge + rebuild are one transaction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn failed_rebuild_leaves_the_prior_report_intact() {
    let store = build_store();
    build_channel_report(&store, &catalog()).expect("report build failed");

    let result = store
        .rebuild_channel_report("INSERT INTO channel_reporting SELECT * FROM missing_table;");
    assert!(result.is_err(), "a malformed rebuild statement must propagate");

    assert_eq!(
        store.count_rows(REPORT_TABLE).unwrap(),
        2,
        "the failed rebuild must roll back to the prior report"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: CSV export with header, CPO and ROAS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn export_writes_header_and_efficiency_metrics() {
    let store = build_store();
    build_channel_report(&store, &catalog()).expect("report build failed");

    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("exports/channel_reporting.csv");
    export_channel_report(&store, &catalog(), &export_path).expect("export failed");

    let text = std::fs::read_to_string(&export_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "channel_name,date,cost,ihc,ihc_revenue,CPO,ROAS");

    // CPO = cost / attributed orders, ROAS = attributed revenue / cost.
    assert_eq!(lines[1], "Newsletter & Email,2024-01-01,5,0.25,50,20,10");
    assert_eq!(lines[2], "Paid Search Brand,2024-01-01,10,0.75,150,13.33,15");
    assert_eq!(lines.len(), 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: a missing export script fails loudly
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_export_script_is_a_not_found_error() {
    let store = build_store();
    build_channel_report(&store, &catalog()).expect("report build failed");

    let empty = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let result = export_channel_report(
        &store,
        &SqlCatalog::new(empty.path()),
        &dir.path().join("out.csv"),
    );
    assert!(
        matches!(result, Err(attribution_core::PipelineError::SqlFileNotFound { .. })),
        "expected SqlFileNotFound, got {result:?}"
    );
}
