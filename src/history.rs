//! The typed, append-only simulation trace.

/// The kind of time span a [`HistoryEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionType {
    Task,
    EndJobOverhead,
    TickOverhead,
    PreemptionOverhead,
    InitOverhead,
    MissedDeadline,
}

/// A label or numeric payload carried by some history entries — an overhead's
/// name ("SAVE", "GET_HPT", ...) or, for a missed deadline, the absolute
/// deadline that was missed.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    None,
    Label(&'static str),
    AbsoluteDeadline(f64),
}

/// One charged or executed time span in simulated order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub task_name: i64,
    pub used_time: f64,
    pub execution_type: ExecutionType,
    pub detail: Detail,
}

impl HistoryEntry {
    pub fn new(task_name: i64, used_time: f64, execution_type: ExecutionType, detail: Detail) -> Self {
        HistoryEntry { task_name, used_time, execution_type, detail }
    }
}
