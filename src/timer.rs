//! Per-task period countdown and release.

use std::cell::RefCell;
use std::rc::Rc;

use crate::task::Task;

/// Counts down to the next release of its task, re-arming itself on firing.
pub struct TimerControlBlock {
    task: Rc<RefCell<Task>>,
    period: f64,
    timer: f64,
}

impl TimerControlBlock {
    pub fn new(task: Rc<RefCell<Task>>) -> Self {
        let period = task.borrow().period;
        let timer = Self::initial_timer(&task, period);
        TimerControlBlock { task, period, timer }
    }

    fn initial_timer(task: &Rc<RefCell<Task>>, period: f64) -> f64 {
        let offset = task.borrow().offset;
        if offset == 0.0 {
            period
        } else {
            offset
        }
    }

    /// Re-arms the timer, preserving any negative overshoot (release jitter),
    /// and zeroes the owning task's per-period counters.
    fn restart(&mut self) {
        let mut t = self.task.borrow_mut();
        t.time_since_last_quest = 0.0;
        t.cumulative_cpu_time = 0.0;
        drop(t);
        self.timer = self.period + self.timer;
    }

    /// Advances the countdown by `tick_rate`; returns `true` iff a release
    /// occurred (the task's new job must then be pushed by the caller).
    pub fn decrement(&mut self, tick_rate: f64) -> bool {
        self.task.borrow_mut().time_since_last_quest += tick_rate;
        self.timer -= tick_rate;

        if self.timer <= 0.0 {
            self.restart();
            true
        } else {
            false
        }
    }

    pub fn task(&self) -> &Rc<RefCell<Task>> {
        &self.task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_offset_arms_to_period() {
        let task = Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)));
        let tcb = TimerControlBlock::new(task);
        assert_eq!(tcb.timer, 5.0);
    }

    #[test]
    fn nonzero_offset_arms_to_offset() {
        let task = Rc::new(RefCell::new(Task::new(1, 3.0, 1.0, 5.0, 5.0, 0.0)));
        let tcb = TimerControlBlock::new(task);
        assert_eq!(tcb.timer, 3.0);
    }

    #[test]
    fn fires_and_rearms_preserving_overshoot() {
        let task = Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)));
        let mut tcb = TimerControlBlock::new(task.clone());
        assert!(!tcb.decrement(4.0));
        assert!(tcb.decrement(4.0)); // 5 - 4 - 4 = -3 <= 0
        assert_eq!(tcb.timer, 5.0 + (-3.0));
        assert_eq!(task.borrow().cumulative_cpu_time, 0.0);
    }

    #[test]
    fn restart_resets_task_counters() {
        let task = Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)));
        task.borrow_mut().cumulative_cpu_time = 2.0;
        task.borrow_mut().time_since_last_quest = 3.0;
        let mut tcb = TimerControlBlock::new(task.clone());
        tcb.decrement(5.0);
        assert_eq!(task.borrow().cumulative_cpu_time, 0.0);
        assert_eq!(task.borrow().time_since_last_quest, 0.0);
    }
}
