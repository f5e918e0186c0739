//! Statement execution.
//!
//! `select` picks between a full heap scan and an index range scan. The
//! index is used when it opens successfully and the folded plan has a key
//! condition to seek on (or the target is a bare count(*)). Because an
//! index scan visits keys in ascending order, a failed equality or upper
//! bound stops the scan outright, while other misses only skip the
//! current tuple; `ScanAction` encodes that distinction per tuple.
//!
//! `load` appends `<int>, <string>` lines from a file to the heap,
//! optionally inserting each rid into the table's B+Tree index.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::parser::parse_load_line;
use crate::planner::{self, SelectPlan};
use crate::storage::{BTreeIndex, OpenMode, RecordFile, RecordId};
use crate::types::{Predicate, SelectTarget, Tuple};

/// Outcome of evaluating the conditions against one scanned tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanAction {
    Match,
    Skip,
    Stop,
}

/// Result of a SELECT: the matching tuples (empty for count(*)) and the
/// number of matches.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectResult {
    pub rows: Vec<Tuple>,
    pub count: usize,
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.tbl"))
}

fn index_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.idx"))
}

/// Execute a SELECT against one table.
pub fn select(
    data_dir: &Path,
    target: SelectTarget,
    table: &str,
    conds: &[Predicate],
) -> Result<SelectResult> {
    let mut rf = RecordFile::open(table_path(data_dir, table), OpenMode::Read)
        .map_err(|_| Error::TableNotFound(table.to_string()))?;

    let plan = planner::fold(conds);
    let scanned = if plan.impossible {
        debug!(table, "contradictory conditions, empty result");
        Ok(SelectResult::default())
    } else {
        let tree = if plan.use_index(target) {
            match BTreeIndex::open(index_path(data_dir, table), OpenMode::Read) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    debug!(table, error = %e, "index unavailable, falling back to heap scan");
                    None
                }
            }
        } else {
            None
        };

        match tree {
            Some(mut tree) => {
                debug!(table, start_key = plan.start_key(), "index scan");
                let scanned = index_scan(&mut tree, &mut rf, target, table, conds, &plan);
                let closed = tree.close();
                scanned.and_then(|r| closed.map(|_| r))
            }
            None => {
                debug!(table, "heap scan");
                heap_scan(&mut rf, target, table, conds)
            }
        }
    };

    let closed = rf.close();
    let result = scanned?;
    closed?;
    Ok(result)
}

fn index_scan(
    tree: &mut BTreeIndex,
    rf: &mut RecordFile,
    target: SelectTarget,
    table: &str,
    conds: &[Predicate],
    plan: &SelectPlan,
) -> Result<SelectResult> {
    let mut result = SelectResult::default();

    let mut cursor = match tree.locate(plan.start_key()) {
        Ok((cursor, _)) => cursor,
        // empty index: nothing can match
        Err(Error::NoSuchRecord) => return Ok(result),
        Err(e) => return Err(e),
    };

    // count(*) can be answered from the index alone as long as every
    // condition is folded into the plan's bounds
    let count_only = target == SelectTarget::Count
        && !plan.has_value_pred
        && !plan.has_ne_key_pred;

    while let Some((key, rid)) = tree.read_forward(&mut cursor)? {
        let action = if count_only {
            check_bounds(plan, key)
        } else {
            let tuple = read_tuple(rf, rid, table)?;
            let action = check_indexed(conds, &tuple);
            if action == ScanAction::Match && target != SelectTarget::Count {
                result.rows.push(tuple);
            }
            action
        };
        match action {
            ScanAction::Match => result.count += 1,
            ScanAction::Skip => {}
            ScanAction::Stop => break,
        }
    }
    Ok(result)
}

fn heap_scan(
    rf: &mut RecordFile,
    target: SelectTarget,
    table: &str,
    conds: &[Predicate],
) -> Result<SelectResult> {
    let mut result = SelectResult::default();
    let mut rid = RecordId::default();
    while rid < rf.end_rid() {
        let tuple = read_tuple(rf, rid, table)?;
        if conds.iter().all(|cond| cond.matches(&tuple)) {
            result.count += 1;
            if target != SelectTarget::Count {
                result.rows.push(tuple);
            }
        }
        rid = rf.next_rid(rid);
    }
    Ok(result)
}

fn read_tuple(rf: &mut RecordFile, rid: RecordId, table: &str) -> Result<Tuple> {
    match rf.read(rid) {
        Ok((key, value)) => Ok(Tuple { key, value }),
        Err(e) => {
            eprintln!("Error: while reading a tuple from table {table}");
            Err(e)
        }
    }
}

/// Evaluate the full condition list against a tuple fetched during an
/// index scan. Keys arrive in ascending order, so a failed key equality
/// or upper bound ends the scan; every other miss skips the tuple.
fn check_indexed(conds: &[Predicate], tuple: &Tuple) -> ScanAction {
    use crate::types::CompOp::*;
    for cond in conds {
        if cond.matches(tuple) {
            continue;
        }
        return match cond {
            Predicate::Key { op: Eq | Lt | Le, .. } => ScanAction::Stop,
            _ => ScanAction::Skip,
        };
    }
    ScanAction::Match
}

/// Evaluate the folded bounds against a key during a count-only scan.
fn check_bounds(plan: &SelectPlan, key: i32) -> ScanAction {
    if plan.equal.is_some_and(|equal| key != equal) {
        return ScanAction::Stop;
    }
    if let Some(max) = plan.max {
        if key > max.value || (!max.inclusive && key == max.value) {
            return ScanAction::Stop;
        }
    }
    if let Some(min) = plan.min {
        if key < min.value || (!min.inclusive && key == min.value) {
            return ScanAction::Skip;
        }
    }
    ScanAction::Match
}

/// Load tuples from `file` into `table`, building the index alongside
/// when requested. Malformed lines are reported on stderr and skipped;
/// the heap append remains the source of truth for rids. Returns the
/// number of tuples stored.
pub fn load(data_dir: &Path, table: &str, file: &str, with_index: bool) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);

    let mut rf = RecordFile::open(table_path(data_dir, table), OpenMode::Write)?;
    let mut tree = if with_index {
        match BTreeIndex::open(index_path(data_dir, table), OpenMode::Write) {
            Ok(tree) => Some(tree),
            Err(e) => {
                // the heap file is already open; close it before bailing
                rf.close()?;
                return Err(e);
            }
        }
    } else {
        None
    };

    let loaded = load_lines(reader, &mut rf, tree.as_mut());

    let tree_closed = tree.map_or(Ok(()), BTreeIndex::close);
    let rf_closed = rf.close();
    let loaded = loaded?;
    tree_closed?;
    rf_closed?;

    info!(table, rows = loaded, with_index, "load complete");
    Ok(loaded)
}

fn load_lines(
    reader: impl BufRead,
    rf: &mut RecordFile,
    mut tree: Option<&mut BTreeIndex>,
) -> Result<usize> {
    let mut loaded = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = match parse_load_line(&line) {
            Ok(tuple) => tuple,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };
        let rid = rf.append(key, &value)?;
        if let Some(tree) = tree.as_mut() {
            tree.insert(key, rid)?;
        }
        loaded += 1;
    }
    Ok(loaded)
}
