use std::fs;
use std::path::Path;

use acorndb::executor::{self, SelectResult};
use acorndb::parser::{self, Command};
use acorndb::types::SelectTarget;
use acorndb::Error;
use tempfile::TempDir;

/// Write a load file and run `LOAD <table> FROM '<file>' [WITH INDEX]`.
fn load_table(dir: &Path, table: &str, lines: &[&str], with_index: bool) -> usize {
    let file = dir.join(format!("{table}.del"));
    fs::write(&file, lines.join("\n")).unwrap();
    executor::load(dir, table, file.to_str().unwrap(), with_index).unwrap()
}

fn run_select(dir: &Path, sql: &str) -> SelectResult {
    let Command::Select {
        target,
        table,
        conds,
    } = parser::parse(sql).unwrap()
    else {
        panic!("not a select: {sql}");
    };
    executor::select(dir, target, &table, &conds).unwrap()
}

fn keys(result: &SelectResult) -> Vec<i32> {
    result.rows.iter().map(|t| t.key).collect()
}

#[test]
fn load_appends_and_counts() {
    let dir = TempDir::new().unwrap();
    let n = load_table(
        dir.path(),
        "movie",
        &["10, 'Heat'", "20, \"Alien\"", "30, Jaws"],
        false,
    );
    assert_eq!(n, 3);

    let result = run_select(dir.path(), "SELECT * FROM movie");
    assert_eq!(result.count, 3);
    assert_eq!(keys(&result), vec![10, 20, 30]);
    assert_eq!(result.rows[0].value, "Heat");
    assert_eq!(result.rows[1].value, "Alien");
    assert_eq!(result.rows[2].value, "Jaws");
}

#[test]
fn range_scan_uses_index() {
    let dir = TempDir::new().unwrap();
    load_table(
        dir.path(),
        "t",
        &["10, a", "20, b", "30, c", "40, d", "50, e"],
        true,
    );

    let result = run_select(dir.path(), "SELECT key FROM t WHERE key > 15 AND key < 45");
    assert_eq!(keys(&result), vec![20, 30, 40]);
    assert_eq!(result.count, 3);

    // count(*) with an upper bound is answered from the index alone
    let result = run_select(dir.path(), "SELECT count(*) FROM t WHERE key <= 30");
    assert_eq!(result.count, 3);
    assert!(result.rows.is_empty());
}

#[test]
fn equality_lookup_via_index() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (1..=300).map(|k| format!("{k}, v{k}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    load_table(dir.path(), "big", &refs, true);

    let result = run_select(dir.path(), "SELECT * FROM big WHERE key = 250");
    assert_eq!(result.count, 1);
    assert_eq!(result.rows[0].key, 250);
    assert_eq!(result.rows[0].value, "v250");

    let result = run_select(dir.path(), "SELECT count(*) FROM big WHERE key = 9999");
    assert_eq!(result.count, 0);
}

#[test]
fn contradictory_conditions_return_nothing() {
    let dir = TempDir::new().unwrap();
    load_table(dir.path(), "t", &["10, a", "20, b"], true);

    let result = run_select(dir.path(), "SELECT * FROM t WHERE key = 10 AND key = 20");
    assert_eq!(result.count, 0);
    assert!(result.rows.is_empty());

    let result = run_select(
        dir.path(),
        "SELECT count(*) FROM t WHERE key = 10 AND key = 20",
    );
    assert_eq!(result.count, 0);

    let result = run_select(dir.path(), "SELECT * FROM t WHERE key > 10 AND key <= 10");
    assert_eq!(result.count, 0);
}

#[test]
fn ne_on_key_bypasses_index() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (1..=10).map(|k| format!("{k}, v{k}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    load_table(dir.path(), "t", &refs, true);

    let result = run_select(dir.path(), "SELECT key FROM t WHERE key <> 7");
    assert_eq!(result.count, 9);
    assert!(!keys(&result).contains(&7));

    // count(*) with NE still walks tuples and gets the right answer
    let result = run_select(dir.path(), "SELECT count(*) FROM t WHERE key <> 7");
    assert_eq!(result.count, 9);
}

#[test]
fn value_conditions_filter_during_index_scan() {
    let dir = TempDir::new().unwrap();
    load_table(
        dir.path(),
        "t",
        &["1, red", "2, blue", "3, red", "4, green", "5, red"],
        true,
    );

    let result = run_select(
        dir.path(),
        "SELECT key FROM t WHERE key >= 2 AND value = 'red'",
    );
    assert_eq!(keys(&result), vec![3, 5]);

    let result = run_select(dir.path(), "SELECT value FROM t WHERE value <> 'red'");
    assert_eq!(result.count, 2);
}

#[test]
fn queries_work_without_an_index() {
    let dir = TempDir::new().unwrap();
    load_table(dir.path(), "t", &["10, a", "20, b", "30, c"], false);

    let result = run_select(dir.path(), "SELECT key FROM t WHERE key >= 20");
    assert_eq!(keys(&result), vec![20, 30]);

    let result = run_select(dir.path(), "SELECT count(*) FROM t");
    assert_eq!(result.count, 3);
}

#[test]
fn bare_count_uses_index_when_present() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (1..=200).map(|k| format!("{k}, x")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    load_table(dir.path(), "t", &refs, true);

    let result = run_select(dir.path(), "SELECT count(*) FROM t");
    assert_eq!(result.count, 200);
}

#[test]
fn missing_table_is_reported() {
    let dir = TempDir::new().unwrap();
    let Command::Select {
        target,
        table,
        conds,
    } = parser::parse("SELECT * FROM nothing").unwrap()
    else {
        panic!()
    };
    let err = executor::select(dir.path(), target, &table, &conds).unwrap_err();
    assert!(matches!(err, Error::TableNotFound(name) if name == "nothing"));
}

#[test]
fn malformed_load_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let n = load_table(
        dir.path(),
        "t",
        &["1, good", "this line has no comma", "3, 'also good'"],
        false,
    );
    assert_eq!(n, 2);

    let result = run_select(dir.path(), "SELECT key FROM t");
    assert_eq!(keys(&result), vec![1, 3]);
}

#[test]
fn failed_index_open_during_load_closes_the_table() {
    let dir = TempDir::new().unwrap();
    // a directory where the index file should be makes the open fail
    fs::create_dir(dir.path().join("t.idx")).unwrap();
    let file = dir.path().join("t.del");
    fs::write(&file, "1, a\n2, b").unwrap();

    let err = executor::load(dir.path(), "t", file.to_str().unwrap(), true).unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    // the heap file was closed on the error path: loading without the
    // index and querying the table still work
    let n = executor::load(dir.path(), "t", file.to_str().unwrap(), false).unwrap();
    assert_eq!(n, 2);
    let result = run_select(dir.path(), "SELECT count(*) FROM t");
    assert_eq!(result.count, 2);
}

#[test]
fn repeated_loads_append() {
    let dir = TempDir::new().unwrap();
    load_table(dir.path(), "t", &["1, a", "2, b"], true);
    load_table(dir.path(), "t", &["3, c"], true);

    let result = run_select(dir.path(), "SELECT count(*) FROM t");
    assert_eq!(result.count, 3);
    let result = run_select(dir.path(), "SELECT * FROM t WHERE key = 3");
    assert_eq!(result.rows[0].value, "c");
}

#[test]
fn select_target_shapes() {
    let dir = TempDir::new().unwrap();
    load_table(dir.path(), "t", &["1, one"], false);

    let Command::Select { target, .. } = parser::parse("SELECT count(*) FROM t").unwrap() else {
        panic!()
    };
    assert_eq!(target, SelectTarget::Count);

    let result = run_select(dir.path(), "SELECT value FROM t");
    assert_eq!(result.rows[0].value, "one");
}
