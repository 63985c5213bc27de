//! Static task descriptors and job release.

use std::cell::RefCell;
use std::rc::Rc;

use crate::job::Job;
use crate::IDLE_TASK;

/// A periodic (or, for the idle sentinel, perpetual) workload descriptor.
///
/// Most fields are fixed at construction; `remaining_init_time`,
/// `cumulative_cpu_time`, `time_since_last_quest` and `job_counter` are mutated
/// by the simulator and the owning [`crate::timer::TimerControlBlock`] over the
/// course of a run.
#[derive(Debug)]
pub struct Task {
    pub name: i64,
    pub offset: f64,
    pub period: f64,
    pub deadline: f64,
    pub wcet: f64,
    pub init_overhead: f64,

    pub remaining_init_time: f64,
    pub cumulative_cpu_time: f64,
    pub time_since_last_quest: f64,
    pub job_counter: u64,
}

impl Task {
    pub fn new(name: i64, offset: f64, wcet: f64, period: f64, deadline: f64, init_overhead: f64) -> Self {
        Task {
            name,
            offset,
            period,
            deadline,
            wcet,
            init_overhead,
            remaining_init_time: init_overhead,
            cumulative_cpu_time: 0.0,
            time_since_last_quest: 0.0,
            job_counter: 0,
        }
    }

    /// Constructs the perpetual idle sentinel: infinite WCET, period and
    /// deadline, so its first (and only) job never finishes and always sorts
    /// last under either policy.
    pub fn idle() -> Self {
        Task::new(IDLE_TASK, 0.0, f64::INFINITY, f64::INFINITY, f64::INFINITY, 0.0)
    }

    /// Releases a new job for this task at `current_time`, using the job
    /// counter *before* incrementing it, matching the reference release
    /// arithmetic exactly (including the idle task's `0 * inf = NaN` deadline).
    pub fn new_job(task: &Rc<RefCell<Task>>, current_time: f64) -> Job {
        let mut t = task.borrow_mut();
        let absolute_deadline = t.offset + (t.job_counter as f64) * t.period + t.deadline;
        let time_til_deadline = absolute_deadline - current_time;
        t.job_counter += 1;
        drop(t);
        Job::new(Rc::clone(task), absolute_deadline, time_til_deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_task_has_infinite_budget() {
        let idle = Task::idle();
        assert_eq!(idle.name, IDLE_TASK);
        assert!(idle.wcet.is_infinite());
        assert!(idle.period.is_infinite());
        assert!(idle.deadline.is_infinite());
    }

    #[test]
    fn idle_job_absolute_deadline_is_nan() {
        let idle = Rc::new(RefCell::new(Task::idle()));
        let job = Task::new_job(&idle, 0.0);
        assert!(job.absolute_deadline.is_nan());
    }

    #[test]
    fn job_counter_increments_and_deadline_advances() {
        let task = Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)));
        let j1 = Task::new_job(&task, 0.0);
        let j2 = Task::new_job(&task, 5.0);
        assert_eq!(j1.absolute_deadline, 5.0);
        assert_eq!(j2.absolute_deadline, 10.0);
        assert_eq!(task.borrow().job_counter, 2);
    }
}
