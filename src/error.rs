//! Input parsing error taxonomy.

use thiserror::Error;

/// Errors produced while parsing a configuration file into a `TaskSet` +
/// `SchedulerPolicy` + `OverheadTable`. Each variant carries enough context
/// (source path, line number where applicable) to point a user at the fix.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: expected first line 'Task set', found {found:?}")]
    MissingTaskSetHeader { path: String, found: String },

    #[error("{path}:{line}: malformed task line {content:?}: {reason}")]
    MalformedTaskLine { path: String, line: usize, content: String, reason: String },

    #[error("{path}: expected 'Algorithm' section after task set, none found")]
    MissingAlgorithmHeader { path: String },

    #[error("{path}:{line}: unknown scheduling algorithm {found:?}, expected RM or EDF")]
    UnknownAlgorithm { path: String, line: usize, found: String },

    #[error("{path}: expected 'System overheads' section after algorithm, none found")]
    MissingOverheadsHeader { path: String },

    #[error("{path}:{line}: malformed overhead entry {content:?}: {reason}")]
    MalformedOverheadLine { path: String, line: usize, content: String, reason: String },

    #[error("{path}: missing required overhead key {key:?}")]
    MissingOverheadKey { path: String, key: String },

    #[error("{path}: task set must contain at least one task")]
    EmptyTaskSet { path: String },
}
