//! Ordered persistence of the record hierarchy.
//!
//! Levels are written strictly parent-before-child. Every written row's
//! generated identifier is recorded under the row's natural unit key;
//! child rows resolve their parent's key through that map into the
//! parent-reference column before their own insert. A child whose
//! parent key cannot be resolved is a write-order violation and aborts
//! the run; by construction it can only happen on a malformed
//! submission, never on bad field data.

use std::collections::HashMap;
use std::hash::Hash;

use polars::prelude::*;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReportError;
use crate::records::Level;
use crate::schema::staging;
use crate::store::{RecordStore, Row};
use crate::validate::{validate, ValidationReport};

// ── Sequence numbering ──────────────────────────────────────────────────────

/// Dense 1-based sequence numbers scoped to a parent key, in arrival
/// order: the n-th row seen for a parent gets n.
pub fn sequence_within<K: Eq + Hash>(keys: impl IntoIterator<Item = K>) -> Vec<i64> {
    let mut counters: HashMap<K, i64> = HashMap::new();
    keys.into_iter()
        .map(|k| {
            let c = counters.entry(k).or_insert(0);
            *c += 1;
            *c
        })
        .collect()
}

/// Dense 1-based rank over an ordering field; missing keys sort last and
/// ties keep arrival order, so the ranking is total and deterministic.
pub fn sequence_by_order<K: Ord>(keys: &[Option<K>]) -> Vec<i64> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| match (&keys[a], &keys[b]) {
        (Some(x), Some(y)) => x.cmp(y).then(a.cmp(&b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(&b),
    });
    let mut ranks = vec![0_i64; keys.len()];
    for (rank, &i) in order.iter().enumerate() {
        ranks[i] = rank as i64 + 1;
    }
    ranks
}

// ── Submission containers ───────────────────────────────────────────────────

/// One built-and-validated level table awaiting persistence.
#[derive(Debug, Clone)]
pub struct LevelBatch {
    pub level: Level,
    pub frame: DataFrame,
    pub report: ValidationReport,
}

impl LevelBatch {
    /// Validate the frame against the level's catalogue on construction.
    pub fn new(level: Level, frame: DataFrame) -> Result<Self, ReportError> {
        let report = validate(&frame, &level.field_specs())?;
        Ok(Self {
            level,
            frame,
            report,
        })
    }
}

/// The full set of built tables for one submission run.
#[derive(Debug, Clone, Default)]
pub struct HierarchySubmission {
    /// Standalone listings, written first, no parent resolution.
    pub references: Vec<LevelBatch>,
    /// The seven hierarchy levels, in any order; the assembler writes
    /// them in canonical parent-before-child order.
    pub hierarchy: Vec<LevelBatch>,
}

impl HierarchySubmission {
    pub fn reports(&self) -> impl Iterator<Item = (Level, &ValidationReport)> {
        self.references
            .iter()
            .chain(self.hierarchy.iter())
            .map(|b| (b.level, &b.report))
    }

    pub fn has_blocking_errors(&self) -> bool {
        self.reports().any(|(_, r)| r.has_blocking_errors())
    }
}

/// Whether validation findings stop the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Skip every write when any level's report blocks.
    Strict,
    /// Write regardless; the reports still travel with the outcome.
    BestEffort,
}

/// What a write run did, with every validation report attached so the
/// caller can render or log the findings either way.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub run: Uuid,
    pub written: Vec<(Level, usize)>,
    pub reports: Vec<(Level, ValidationReport)>,
    pub blocked: bool,
}

// ── Assembler ───────────────────────────────────────────────────────────────

pub struct Assembler<'a, S: RecordStore> {
    store: &'a mut S,
}

impl<'a, S: RecordStore> Assembler<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Persist a submission. Reference listings go first, then the
    /// hierarchy levels in canonical order, each row's parent reference
    /// back-filled from its parent's write result. Empty levels are
    /// skipped.
    pub fn write(
        &mut self,
        submission: &HierarchySubmission,
        mode: WriteMode,
    ) -> Result<SubmissionOutcome, ReportError> {
        let run = Uuid::new_v4();
        let reports: Vec<(Level, ValidationReport)> = submission
            .reports()
            .map(|(level, r)| (level, r.clone()))
            .collect();
        let blocked = submission.has_blocking_errors();

        if blocked && mode == WriteMode::Strict {
            warn!(%run, "submission blocked by validation findings, nothing written");
            return Ok(SubmissionOutcome {
                run,
                written: Vec::new(),
                reports,
                blocked,
            });
        }

        let mut written = Vec::new();
        let mut ids: HashMap<Level, HashMap<String, i64>> = HashMap::new();

        for batch in &submission.references {
            let count = self.write_level(batch, None, &mut ids)?;
            if count > 0 {
                written.push((batch.level, count));
            }
        }

        for level in Level::HIERARCHY {
            let Some(batch) = submission.hierarchy.iter().find(|b| b.level == level) else {
                continue;
            };
            let parent_ids = level.parent().map(|p| {
                ids.get(&p)
                    .cloned()
                    .unwrap_or_default()
            });
            let count = self.write_level(batch, parent_ids.as_ref(), &mut ids)?;
            if count > 0 {
                written.push((batch.level, count));
            }
        }

        info!(
            %run,
            levels = written.len(),
            rows = written.iter().map(|(_, n)| n).sum::<usize>(),
            "hierarchy written"
        );

        Ok(SubmissionOutcome {
            run,
            written,
            reports,
            blocked,
        })
    }

    fn write_level(
        &mut self,
        batch: &LevelBatch,
        parent_ids: Option<&HashMap<String, i64>>,
        ids: &mut HashMap<Level, HashMap<String, i64>>,
    ) -> Result<usize, ReportError> {
        let level = batch.level;
        let frame = &batch.frame;
        if frame.height() == 0 {
            return Ok(0);
        }

        let unit_keys = frame.column(staging::UNIT_KEY)?.str()?.clone();
        let parent_keys = frame.column(staging::PARENT_KEY)?.str()?.clone();

        let mut count = 0;
        for i in 0..frame.height() {
            let parent_id = match (parent_ids, level.parent_id_column()) {
                (Some(map), Some(_)) => {
                    let key = parent_keys.get(i).ok_or_else(|| {
                        ReportError::WriteOrder(format!(
                            "{} row {i} has no parent key",
                            level.table()
                        ))
                    })?;
                    let id = map.get(key).ok_or_else(|| {
                        ReportError::WriteOrder(format!(
                            "{} row {i} references unwritten parent '{key}'",
                            level.table()
                        ))
                    })?;
                    Some(*id)
                }
                _ => None,
            };

            let row = row_to_json(frame, level, i, parent_id)?;
            let id = self.store.insert(level, &row)?;
            if let Some(key) = unit_keys.get(i) {
                ids.entry(level).or_default().insert(key.to_string(), id);
            }
            count += 1;
        }

        Ok(count)
    }
}

/// Project one frame row onto the level's declared columns as a JSON
/// map, substituting the resolved parent identifier.
fn row_to_json(
    frame: &DataFrame,
    level: Level,
    row: usize,
    parent_id: Option<i64>,
) -> Result<Row, ReportError> {
    let mut out = Row::new();
    for &name in level.columns() {
        if Some(name) == level.parent_id_column() {
            out.insert(
                name.to_string(),
                parent_id.map(Value::from).unwrap_or(Value::Null),
            );
            continue;
        }
        let value = frame.column(name)?.get(row)?;
        out.insert(name.to_string(), json_value(&value));
    }
    Ok(out)
}

fn json_value(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::from(*b),
        AnyValue::Int8(v) => Value::from(i64::from(*v)),
        AnyValue::Int16(v) => Value::from(i64::from(*v)),
        AnyValue::Int32(v) => Value::from(i64::from(*v)),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(i64::from(*v)),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::from(*s),
        AnyValue::StringOwned(s) => Value::from(s.as_str()),
        other => Value::from(format!("{other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        Design, FishingOperation, FishingTrip, SamplingDetails, VesselDetails,
    };
    use crate::store::MemoryStore;
    use serde_json::json;

    fn submission_with_operations(children_per_trip: &[usize]) -> HierarchySubmission {
        let design = Design::new(2024, "MAKR-2024");
        let details = SamplingDetails::new(&design.unit_key, "IS", "4766");

        let mut trips = Vec::new();
        let mut operations = Vec::new();
        for (t, &children) in children_per_trip.iter().enumerate() {
            let trip_id = format!("T{t}");
            let mut trip = FishingTrip::new(&trip_id, &details.unit_key, t as i64 + 1, children > 0);
            trip.encrypted_vessel_code = Some(format!("V{t}"));
            trip.arrival_location = Some("ISREY".to_string());
            trip.arrival_date = Some("2024-06-03".to_string());
            trips.push(trip);
            for c in 0..children {
                let mut op = FishingOperation::new(&format!("S{t}-{c}"), &trip_id);
                op.sequence_number = Some(c as i64 + 1);
                op.end_date = Some("2024-06-02".to_string());
                operations.push(op);
            }
        }

        HierarchySubmission {
            references: Vec::new(),
            hierarchy: vec![
                LevelBatch::new(Level::Design, Design::frame(&[design]).unwrap()).unwrap(),
                LevelBatch::new(
                    Level::SamplingDetails,
                    SamplingDetails::frame(&[details]).unwrap(),
                )
                .unwrap(),
                LevelBatch::new(Level::FishingTrip, FishingTrip::frame(&trips).unwrap()).unwrap(),
                LevelBatch::new(
                    Level::FishingOperation,
                    FishingOperation::frame(&operations).unwrap(),
                )
                .unwrap(),
            ],
        }
    }

    #[test]
    fn sequence_within_is_dense_per_parent() {
        let seq = sequence_within(["a", "a", "b", "a", "b"]);
        assert_eq!(seq, vec![1, 2, 1, 3, 2]);

        // Parents with 1, 2 and 5 children each get a dense 1..n range.
        let keys: Vec<&str> = std::iter::repeat("one")
            .take(1)
            .chain(std::iter::repeat("two").take(2))
            .chain(std::iter::repeat("five").take(5))
            .collect();
        let seq = sequence_within(keys);
        assert_eq!(seq, vec![1, 1, 2, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sequence_by_order_ranks_by_key_with_stable_ties() {
        let keys = [Some(3), Some(1), None, Some(1), Some(2)];
        let seq = sequence_by_order(&keys);
        // 1 (first), 1 (second), 2, 3, then the missing key last.
        assert_eq!(seq, vec![4, 1, 5, 2, 3]);
    }

    #[test]
    fn children_receive_their_written_parents_identifier() {
        let submission = submission_with_operations(&[0, 1, 3]);
        let mut store = MemoryStore::new();
        let outcome = Assembler::new(&mut store)
            .write(&submission, WriteMode::BestEffort)
            .unwrap();
        assert!(!outcome.blocked);

        let trips = store.select(Level::FishingTrip).unwrap();
        let ops = store.select(Level::FishingOperation).unwrap();
        assert_eq!(trips.len(), 3);
        assert_eq!(ops.len(), 4);

        // Map trip unit names to their generated ids.
        let trip_id = |name: &str| {
            trips
                .iter()
                .find(|t| t["FTunitName"] == json!(name))
                .and_then(|t| t["FTid"].as_i64())
                .unwrap()
        };
        // T0 has no children; T1 one; T2 three.
        assert_eq!(
            ops.iter()
                .filter(|o| o["FTid"].as_i64() == Some(trip_id("T1")))
                .count(),
            1
        );
        assert_eq!(
            ops.iter()
                .filter(|o| o["FTid"].as_i64() == Some(trip_id("T2")))
                .count(),
            3
        );
        // Every operation points at some written trip.
        for op in &ops {
            let ft = op["FTid"].as_i64().unwrap();
            assert!(trips.iter().any(|t| t["FTid"].as_i64() == Some(ft)));
        }
    }

    #[test]
    fn unresolvable_parent_key_is_a_write_order_violation() {
        let mut submission = submission_with_operations(&[1]);
        // An operation pointing at a trip that is not in the submission.
        let orphan = FishingOperation::new("S-orphan", "T-missing");
        submission.hierarchy.push(
            LevelBatch::new(
                Level::FishingOperation,
                FishingOperation::frame(&[orphan]).unwrap(),
            )
            .unwrap(),
        );
        // Two batches for the same level: only the first is written, so
        // collapse them to make the orphan visible.
        let frames: Vec<_> = submission
            .hierarchy
            .iter()
            .filter(|b| b.level == Level::FishingOperation)
            .map(|b| b.frame.clone())
            .collect();
        let merged = frames[0].vstack(&frames[1]).unwrap();
        submission
            .hierarchy
            .retain(|b| b.level != Level::FishingOperation);
        submission
            .hierarchy
            .push(LevelBatch::new(Level::FishingOperation, merged).unwrap());

        let mut store = MemoryStore::new();
        let err = Assembler::new(&mut store)
            .write(&submission, WriteMode::BestEffort)
            .unwrap_err();
        assert!(matches!(err, ReportError::WriteOrder(_)));
    }

    #[test]
    fn strict_mode_withholds_writes_but_returns_reports() {
        let mut submission = submission_with_operations(&[1]);
        // Break a required field: trips without an arrival date.
        if let Some(batch) = submission
            .hierarchy
            .iter_mut()
            .find(|b| b.level == Level::FishingTrip)
        {
            let mut trip = FishingTrip::new("T-bad", "SD-DE-MAKR-2024", 1, false);
            trip.encrypted_vessel_code = Some("V9".to_string());
            trip.arrival_location = Some("ISREY".to_string());
            trip.arrival_date = None;
            *batch = LevelBatch::new(
                Level::FishingTrip,
                FishingTrip::frame(&[trip]).unwrap(),
            )
            .unwrap();
        }
        assert!(submission.has_blocking_errors());

        let mut store = MemoryStore::new();
        let outcome = Assembler::new(&mut store)
            .write(&submission, WriteMode::Strict)
            .unwrap();
        assert!(outcome.blocked);
        assert!(outcome.written.is_empty());
        assert!(outcome
            .reports
            .iter()
            .any(|(level, r)| *level == Level::FishingTrip && r.has_blocking_errors()));
        assert!(store.select(Level::Design).unwrap().is_empty());
    }

    #[test]
    fn empty_levels_are_skipped_not_errors() {
        let mut submission = submission_with_operations(&[1]);
        submission.references.push(
            LevelBatch::new(
                Level::VesselDetails,
                VesselDetails::frame(&[]).unwrap(),
            )
            .unwrap(),
        );
        let mut store = MemoryStore::new();
        let outcome = Assembler::new(&mut store)
            .write(&submission, WriteMode::BestEffort)
            .unwrap();
        assert!(outcome
            .written
            .iter()
            .all(|(level, _)| *level != Level::VesselDetails));
    }
}
