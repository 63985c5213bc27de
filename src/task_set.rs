//! Owns the task list and derives hyperperiod-related quantities.

use std::cell::RefCell;
use std::rc::Rc;

use crate::task::Task;

/// A parsed collection of tasks plus the quantities derived from their
/// (integer-truncated) offsets and periods.
pub struct TaskSet {
    tasks: Vec<Rc<RefCell<Task>>>,
    pub max_offset: i64,
    pub hyperperiod: i64,
    pub feasibility_interval: i64,
}

impl TaskSet {
    pub fn new(tasks: Vec<Rc<RefCell<Task>>>) -> Self {
        let max_offset = calculate_max_offset(&tasks);
        let hyperperiod = calculate_hyperperiod(&tasks);
        let feasibility_interval = max_offset + 2 * hyperperiod;
        TaskSet { tasks, max_offset, hyperperiod, feasibility_interval }
    }

    pub fn tasks(&self) -> &[Rc<RefCell<Task>>] {
        &self.tasks
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Maximum integer-truncated offset across the task list.
pub fn calculate_max_offset(tasks: &[Rc<RefCell<Task>>]) -> i64 {
    tasks.iter().map(|t| t.borrow().offset as i64).max().unwrap_or(0)
}

/// Least common multiple of the integer-truncated task periods.
pub fn calculate_hyperperiod(tasks: &[Rc<RefCell<Task>>]) -> i64 {
    tasks
        .iter()
        .map(|t| t.borrow().period as i64)
        .fold(1, |lcm, p| lcm * p / gcd(lcm, p))
}
