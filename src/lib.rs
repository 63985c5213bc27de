//! # rt-sim
//!
//! A discrete-event simulator for uniprocessor real-time task scheduling under
//! Rate Monotonic (RM) and Earliest Deadline First (EDF) policies.
//!
//! ```text
//!   Task ──get_new_job──▶ Job ──insert──▶ ReadyQueue ──dispatch──▶ Simulator
//!    ▲                                                                 │
//!    └──────────────────── TimerControlBlock ◀───────releases─────────┘
//! ```
//!
//! The simulator advances in fixed-size ticks, alternating an **execution phase**
//! (charging CPU time to the currently dispatched job) and a **tick phase**
//! (releasing new jobs, evaluating preemption, charging kernel overheads). A run
//! either terminates on the first missed deadline, or — in open-ended mode — once
//! the system state repeats across hyperperiod boundaries, proving a finite
//! feasibility interval.
//!
//! Module layout, leaves first:
//! - [`task`] — static task descriptors.
//! - [`job`] — per-invocation job state and the policy-aware priority ordering.
//! - [`timer`] — per-task period countdown and release machinery.
//! - [`ready_queue`] — the priority queue of pending jobs.
//! - [`task_set`] — owns tasks, derives hyperperiod/feasibility interval.
//! - [`overhead`] — the kernel overhead catalogue.
//! - [`history`] — the typed simulation trace.
//! - [`simulator`] — the tick-driven scheduler core.
//! - [`error`] — input parsing error taxonomy.
//! - [`input`] — the line-delimited configuration file parser.
//! - [`render`] — a textual stand-in for the original Gantt chart.

pub mod error;
pub mod history;
pub mod input;
pub mod job;
pub mod overhead;
pub mod ready_queue;
pub mod render;
pub mod simulator;
pub mod task;
pub mod task_set;
pub mod timer;

pub use error::InputError;
pub use history::{ExecutionType, HistoryEntry};
pub use job::{Job, SchedulerPolicy};
pub use overhead::OverheadTable;
pub use simulator::Simulator;
pub use task::Task;
pub use task_set::TaskSet;
pub use timer::TimerControlBlock;

/// Reserved task identity for the idle sentinel job.
pub const IDLE_TASK: i64 = -1;
/// Task identity used to tag history entries charged against the tick itself
/// rather than any particular task (e.g. SAVE, RESUME).
pub const TICK_TASK: i64 = -2;
