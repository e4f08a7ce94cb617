//! Ordering and grade partitioning of mastery records

use std::cmp::Ordering;
use std::collections::VecDeque;

use super::record::{Grade, StackRecord};

/// Compare two labels ignoring case, then lowercase before uppercase.
///
/// Digits are compared character by character, so `"10"` sorts before `"9"`.
pub fn text_order(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| b.cmp(a))
}

/// Compare by (domain, cluster, standard_id), each ascending by [`text_order`].
pub fn record_order(a: &StackRecord, b: &StackRecord) -> Ordering {
    text_order(&a.domain, &b.domain)
        .then_with(|| text_order(&a.cluster, &b.cluster))
        .then_with(|| text_order(&a.standard_id, &b.standard_id))
}

/// Sort records by domain, then cluster, then standard id.
///
/// The sort is stable: records with equal keys keep their input order.
pub fn sort_records(mut records: Vec<StackRecord>) -> Vec<StackRecord> {
    records.sort_by(record_order);
    records
}

/// A record left out of every stack because its grade label is unknown
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedRecord {
    /// Position in the sorted input
    pub position: usize,
    pub standard_id: String,
    pub grade: String,
}

/// One consumable queue of records per grade
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GradeQueues {
    queues: [VecDeque<StackRecord>; 3],
}

impl GradeQueues {
    /// Records still queued for `grade`, front first
    pub fn get(&self, grade: Grade) -> &VecDeque<StackRecord> {
        &self.queues[grade.index()]
    }

    /// Take the next record for `grade`
    pub fn pop_front(&mut self, grade: Grade) -> Option<StackRecord> {
        self.queues[grade.index()].pop_front()
    }

    /// Number of records queued for `grade`
    pub fn len(&self, grade: Grade) -> usize {
        self.queues[grade.index()].len()
    }

    /// Records queued across all grades
    pub fn total(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Whether every queue is drained
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn push_back(&mut self, grade: Grade, record: StackRecord) {
        self.queues[grade.index()].push_back(record);
    }
}

/// Output of [`partition_by_grade`]
#[derive(Clone, Debug, Default)]
pub struct Partition {
    pub queues: GradeQueues,
    pub dropped: Vec<DroppedRecord>,
}

/// Split sorted records into per-grade queues in a single pass.
///
/// Order within each queue follows the input. Records whose grade label is not
/// one of the three known grades are dropped and reported, never queued.
pub fn partition_by_grade(sorted: Vec<StackRecord>) -> Partition {
    let mut partition = Partition::default();

    for (position, record) in sorted.into_iter().enumerate() {
        match record.grade() {
            Some(grade) => partition.queues.push_back(grade, record),
            None => {
                log::warn!(
                    "Dropping record {} ({}): unknown grade {:?}",
                    position, record.standard_id, record.grade
                );
                partition.dropped.push(DroppedRecord {
                    position,
                    standard_id: record.standard_id,
                    grade: record.grade,
                });
            }
        }
    }

    partition
}
