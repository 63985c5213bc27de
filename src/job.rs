//! Per-invocation job state and the policy-aware priority ordering.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::task::Task;

/// The two scheduling policies this simulator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPolicy {
    /// Fixed-priority: shorter period sorts first.
    Rm,
    /// Dynamic-priority: earlier absolute deadline sorts first.
    Edf,
}

/// A single invocation of a [`Task`].
///
/// Snapshots `name`/`period`/`deadline`/`wcet` from the task at release time and
/// tracks its own remaining budget and deadline bookkeeping thereafter. Held
/// behind `Rc<RefCell<_>>` wherever the simulator needs two handles (ready
/// queue membership, `current_job`, `last_interrupted_job`) to observe the same
/// mutations — see the crate-level Design Notes on shared mutable state.
#[derive(Debug)]
pub struct Job {
    pub name: i64,
    pub offset: f64,
    pub wcet: f64,
    pub deadline: f64,
    pub period: f64,
    pub remaining_time: f64,
    pub time_til_deadline: f64,
    pub task: Rc<RefCell<Task>>,
    pub absolute_deadline: f64,
}

impl Job {
    pub fn new(task: Rc<RefCell<Task>>, absolute_deadline: f64, time_til_deadline: f64) -> Self {
        let t = task.borrow();
        let job = Job {
            name: t.name,
            offset: t.offset,
            wcet: t.wcet,
            deadline: t.deadline,
            period: t.period,
            remaining_time: t.wcet,
            time_til_deadline,
            task: Rc::clone(&task),
            absolute_deadline,
        };
        drop(t);
        job
    }

    pub fn init_overhead(&self) -> f64 {
        self.task.borrow().init_overhead
    }

    pub fn decrement_time_til_deadline(&mut self, tick_rate: f64) {
        self.time_til_deadline -= tick_rate;
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_time <= 0.0
    }

    /// `true` iff `self` has strictly higher priority than `other` under
    /// `policy` — the direct port of the reference's `Job.__lt__`.
    ///
    /// RM ties on equal period go to the *numerically greater* task name; this
    /// is intentionally the inverse of "lower id = higher priority" and is
    /// preserved exactly rather than corrected, per the Design Notes.
    pub fn higher_priority(&self, other: &Job, policy: SchedulerPolicy) -> bool {
        match policy {
            SchedulerPolicy::Rm => {
                if self.period == other.period {
                    if self.name == other.name {
                        self.absolute_deadline < other.absolute_deadline
                    } else {
                        self.name > other.name
                    }
                } else {
                    self.period < other.period
                }
            }
            SchedulerPolicy::Edf => {
                if self.absolute_deadline.is_nan() {
                    false
                } else if other.absolute_deadline.is_nan() {
                    true
                } else {
                    self.absolute_deadline < other.absolute_deadline
                }
            }
        }
    }

    /// A total order derived from [`Job::higher_priority`] evaluated in both
    /// directions, used to keep the ready queue sorted. Jobs incomparable in
    /// both directions (can happen with NaN deadlines under EDF) are `Equal`.
    pub fn cmp_priority(&self, other: &Job, policy: SchedulerPolicy) -> Ordering {
        if self.higher_priority(other, policy) {
            Ordering::Less
        } else if other.higher_priority(self, policy) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}
