use chrono::NaiveDate;
use proptest::prelude::*;
use site_problem_sync::config::NOT_REGISTERED_WARNING;
use site_problem_sync::{
    FieldMapping, FieldRule, ReconcileConfig, Reconciler, Table, ToolError, UpdateMode,
};

const TODAY: &str = "2024-06-01";

const SOURCE_COLUMNS: [&str; 5] = ["Unique ID", "DU ID", "Site Code", "Owner", "Status"];
const TARGET_COLUMNS: [&str; 6] = [
    "Duplicate in HW DB",
    "DU ID",
    "Site ID",
    "Owner",
    "Status",
    "DO NOT UPDATE",
];

fn config() -> ReconcileConfig {
    ReconcileConfig::new(FieldMapping::new(vec![
        FieldRule::new("Site ID", "Site Code", UpdateMode::Key),
        FieldRule::new("Owner", "Owner", UpdateMode::CopyIfBlank),
        FieldRule::new("Status", "Status", UpdateMode::Overwrite),
    ]))
}

fn reconciler() -> Reconciler {
    Reconciler::new(config()).with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn source(rows: Vec<Vec<&str>>) -> Table {
    Table::from_rows(SOURCE_COLUMNS, rows).expect("source table")
}

fn target(rows: Vec<Vec<&str>>) -> Table {
    Table::from_rows(TARGET_COLUMNS, rows).expect("target table")
}

fn cell<'a>(table: &'a Table, row: usize, column: &str) -> &'a str {
    table.value(row, column).expect("known column")
}

#[test]
fn mixed_batch_updates_falls_back_and_warns() {
    let source = source(vec![
        vec!["A1", "D1", "S1", "Alice", "Open"],
        vec!["A1", "D2", "S2", "Bob", "Closed"],
        vec!["A2", "D3", "S3", "Carol", "Open"],
        vec!["A2", "D3", "S3", "Carol", "Open"],
    ]);
    let target = target(vec![
        vec!["a1", "d1", "S1", "", "Open", ""],
        vec!["a1", "d9", "", "", "Open", ""],
        vec!["a3", "", "S7", "", "", "yes"],
        vec!["", "", "S8", "", "", ""],
    ]);

    let outcome = reconciler().reconcile(&source, target).expect("reconciled");
    let table = &outcome.table;

    assert_eq!(outcome.dedup.duplicate_uids, 2);
    assert_eq!(outcome.rows_updated, 2);
    assert_eq!(outcome.warnings_added, 1);

    assert_eq!(cell(table, 0, "Owner"), "Alice");
    assert_eq!(cell(table, 0, "Updated Date"), TODAY);

    // Unknown DU ID falls back to the first row kept for that UID.
    assert_eq!(cell(table, 1, "Owner"), "Alice");
    assert_eq!(cell(table, 1, "Updated Date"), TODAY);

    assert_eq!(cell(table, 2, "Warning"), NOT_REGISTERED_WARNING);
    assert_eq!(cell(table, 2, "Updated Date"), "");

    assert_eq!(table.rows()[3], vec!["", "", "S8", "", "", "", "", ""]);
}

#[test]
fn identifier_match_wins_over_composite_key() {
    let source = source(vec![
        vec!["A1", "D1", "S1", "Alice", "Open"],
        vec!["A2", "D2", "S2", "Bob", "Closed"],
    ]);
    // The key points at A2's row, the UID at A1's.
    let target = target(vec![vec!["A1", "D1", "S2", "", "", ""]]);

    let outcome = reconciler().reconcile(&source, target).unwrap();
    assert_eq!(cell(&outcome.table, 0, "Owner"), "Alice");
    assert_eq!(cell(&outcome.table, 0, "Status"), "Open");
}

#[test]
fn composite_key_is_case_and_space_insensitive() {
    let source = source(vec![vec!["", "", " site-4 ", "Dana", "Open"]]);
    let target = target(vec![vec!["", "", "SITE-4", "", "Closed", ""]]);

    let outcome = reconciler().reconcile(&source, target).unwrap();
    assert_eq!(outcome.rows_updated, 1);
    assert_eq!(cell(&outcome.table, 0, "Owner"), "Dana");
    assert_eq!(cell(&outcome.table, 0, "Status"), "Open");
    // Key columns are never copied.
    assert_eq!(cell(&outcome.table, 0, "Site ID"), "SITE-4");
}

#[test]
fn overwrite_compares_raw_strings() {
    let source = source(vec![vec!["A1", "D1", "S1", "", "Open"]]);
    let target = target(vec![vec!["A1", "D1", "S1", "", "OPEN", ""]]);

    let outcome = reconciler().reconcile(&source, target).unwrap();
    assert_eq!(outcome.rows_updated, 1);
    assert_eq!(cell(&outcome.table, 0, "Status"), "Open");
}

#[test]
fn update_clears_previous_warning() {
    let source = source(vec![vec!["A1", "D1", "S1", "", "Closed"]]);
    let target = Table::from_rows(
        [
            "Duplicate in HW DB",
            "DU ID",
            "Site ID",
            "Owner",
            "Status",
            "Warning",
            "Updated Date",
        ],
        [vec!["A1", "D1", "S1", "", "Open", NOT_REGISTERED_WARNING, "2024-01-01"]],
    )
    .unwrap();

    let outcome = reconciler().reconcile(&source, target).unwrap();
    assert_eq!(outcome.table.columns().len(), 7);
    assert_eq!(cell(&outcome.table, 0, "Warning"), "");
    assert_eq!(cell(&outcome.table, 0, "Updated Date"), TODAY);
}

#[test]
fn existing_warning_is_not_counted_again() {
    let source = source(vec![vec!["A1", "D1", "S1", "", "Open"]]);
    let first = reconciler()
        .reconcile(&source, target(vec![vec!["Z9", "", "S9", "", "", "x"]]))
        .unwrap();
    assert_eq!(first.warnings_added, 1);

    let second = reconciler().reconcile(&source, first.table.clone()).unwrap();
    assert_eq!(second.warnings_added, 0);
    assert!(!second.has_changes());
    assert_eq!(second.table, first.table);
}

#[test]
fn custom_column_names_and_warning_text() {
    let mut config = config();
    config.columns.target_uid = "Ticket".into();
    config.columns.do_not_update = "Escalated".into();
    config.warning_text = "missing upstream".into();

    let source = source(vec![vec!["A1", "D1", "S1", "", "Open"]]);
    let target = Table::from_rows(
        ["Ticket", "DU ID", "Site ID", "Owner", "Status", "Escalated"],
        [vec!["B7", "", "S5", "", "", "1"]],
    )
    .unwrap();

    let outcome = Reconciler::new(config).reconcile(&source, target).unwrap();
    assert_eq!(cell(&outcome.table, 0, "Warning"), "missing upstream");
}

#[test]
fn missing_identifier_column_is_a_configuration_error() {
    let source = Table::from_rows(
        ["DU ID", "Site Code", "Owner", "Status"],
        [vec!["D1", "S1", "", "Open"]],
    )
    .unwrap();
    let target = target(vec![vec!["A1", "D1", "S1", "", "", ""]]);

    match reconciler().reconcile(&source, target) {
        Err(ToolError::MissingColumn { table, column }) => {
            assert_eq!(table, "source");
            assert_eq!(column, "Unique ID");
        }
        other => panic!("expected missing column, got {other:?}"),
    }
}

#[test]
fn free_function_uses_local_date() {
    let source = source(vec![vec!["A1", "D1", "S1", "Alice", "Open"]]);
    let target = target(vec![vec!["A1", "D1", "S1", "", "Open", ""]]);
    let outcome = site_problem_sync::reconcile(&source, target, &config()).unwrap();
    let stamped = cell(&outcome.table, 0, "Updated Date");
    assert!(NaiveDate::parse_from_str(stamped, "%Y-%m-%d").is_ok());
}

fn source_row() -> impl Strategy<Value = Vec<String>> {
    (
        prop::sample::select(vec!["A", "B", "C", ""]),
        prop::sample::select(vec!["1", "2"]),
        prop::sample::select(vec!["S1", "S2", "S3"]),
        prop::sample::select(vec!["x", "y", ""]),
        prop::sample::select(vec!["open", "closed"]),
    )
        .prop_map(|(uid, du, site, owner, status)| {
            vec![uid, du, site, owner, status]
                .into_iter()
                .map(String::from)
                .collect()
        })
}

fn target_row() -> impl Strategy<Value = Vec<String>> {
    (
        prop::sample::select(vec!["a", "b", "z", ""]),
        prop::sample::select(vec!["1", "2", "9"]),
        prop::sample::select(vec!["s1", "s2", "s9"]),
        prop::sample::select(vec!["", "x", "q"]),
        prop::sample::select(vec!["open", "closed", ""]),
        prop::sample::select(vec!["", "yes"]),
    )
        .prop_map(|(uid, du, site, owner, status, protect)| {
            vec![uid, du, site, owner, status, protect]
                .into_iter()
                .map(String::from)
                .collect()
        })
}

fn owned_table(columns: &[&str], rows: Vec<Vec<String>>) -> Table {
    Table::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

proptest! {
    #[test]
    fn counters_match_observed_changes(
        source_rows in proptest::collection::vec(source_row(), 0..12),
        target_rows in proptest::collection::vec(target_row(), 0..12),
    ) {
        let source = owned_table(&SOURCE_COLUMNS, source_rows);
        let before = owned_table(&TARGET_COLUMNS, target_rows);
        let outcome = reconciler().reconcile(&source, before.clone()).unwrap();
        let after = &outcome.table;

        let mut changed_rows = 0;
        let mut warned_rows = 0;
        for row in 0..before.len() {
            let changed = ["Owner", "Status"]
                .iter()
                .any(|column| before.value(row, column) != after.value(row, column));
            if changed {
                changed_rows += 1;
                prop_assert_eq!(after.value(row, "Updated Date"), Some(TODAY));
            } else {
                prop_assert_eq!(after.value(row, "Updated Date"), Some(""));
            }
            if after.value(row, "Warning") == Some(NOT_REGISTERED_WARNING) {
                warned_rows += 1;
                prop_assert!(!changed);
            }
            // Columns that existed before are only touched through the mapping.
            for column in ["Duplicate in HW DB", "DU ID", "Site ID", "DO NOT UPDATE"] {
                prop_assert_eq!(before.value(row, column), after.value(row, column));
            }
        }

        prop_assert_eq!(outcome.rows_updated, changed_rows);
        prop_assert_eq!(outcome.warnings_added, warned_rows);
    }

    #[test]
    fn copy_if_blank_only_fills_blanks(
        source_rows in proptest::collection::vec(source_row(), 1..8),
        target_rows in proptest::collection::vec(target_row(), 1..8),
    ) {
        let source = owned_table(&SOURCE_COLUMNS, source_rows);
        let before = owned_table(&TARGET_COLUMNS, target_rows);
        let outcome = reconciler().reconcile(&source, before.clone()).unwrap();

        for row in 0..before.len() {
            let old = before.value(row, "Owner").unwrap();
            let new = outcome.table.value(row, "Owner").unwrap();
            if !old.is_empty() {
                prop_assert_eq!(old, new);
            }
        }
    }
}
