//! The tick-driven scheduler core: dispatch, execution, tick-phase overhead
//! accounting, and deadline-miss detection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::history::{Detail, ExecutionType, HistoryEntry};
use crate::job::{Job, SchedulerPolicy};
use crate::overhead::OverheadTable;
use crate::ready_queue::ReadyQueue;
use crate::task::Task;
use crate::task_set::TaskSet;
use crate::timer::TimerControlBlock;
use crate::{IDLE_TASK, TICK_TASK};

type TaskStateSnapshot = HashMap<i64, (f64, f64)>;

/// The discrete-event simulator. Owns the task set, the per-task timers, the
/// ready queue, and the append-only history trace produced by a run.
pub struct Simulator {
    task_set: TaskSet,
    policy: SchedulerPolicy,
    overheads: OverheadTable,
    tasks: Vec<Rc<RefCell<Task>>>,
    timers: Vec<TimerControlBlock>,
    ready_queue: ReadyQueue,
    current_time: f64,
    time_before_tick: f64,
    current_job: Option<Rc<RefCell<Job>>>,
    last_interrupted_job: Option<Rc<RefCell<Job>>>,
    history: Vec<HistoryEntry>,
    has_missed_deadline: bool,
    deadline_miss_time: f64,
    context_switch_flag: bool,
    cumulative_overhead_time: f64,
    tasks_state: TaskStateSnapshot,
}

impl Simulator {
    pub fn new(task_set: TaskSet, policy: SchedulerPolicy, overheads: OverheadTable) -> Self {
        let tasks: Vec<Rc<RefCell<Task>>> = task_set.tasks().to_vec();
        let mut timers = Vec::with_capacity(tasks.len());
        let mut ready_queue = ReadyQueue::new(policy);
        let current_time = 0.0;

        for task in &tasks {
            timers.push(TimerControlBlock::new(Rc::clone(task)));
            let offset = task.borrow().offset;
            if offset == 0.0 {
                ready_queue.insert(Rc::new(RefCell::new(Task::new_job(task, current_time))));
            }
        }

        let idle_task = Rc::new(RefCell::new(Task::idle()));
        ready_queue.insert(Rc::new(RefCell::new(Task::new_job(&idle_task, current_time))));

        tracing::info!(task_count = tasks.len(), policy = ?policy, "simulator initialized");

        Simulator {
            task_set,
            policy,
            overheads,
            tasks,
            timers,
            ready_queue,
            current_time,
            time_before_tick: overheads.tick_rate,
            current_job: None,
            last_interrupted_job: None,
            history: Vec::new(),
            has_missed_deadline: false,
            deadline_miss_time: 0.0,
            context_switch_flag: false,
            cumulative_overhead_time: 0.0,
            tasks_state: HashMap::new(),
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn task_set(&self) -> &TaskSet {
        &self.task_set
    }

    /// Runs until `total_time` (simulated time) is reached or a deadline is
    /// missed. Returns `(missed, miss_time)`.
    pub fn run_bounded(&mut self, total_time: f64) -> (bool, f64) {
        self.dispatch();
        while self.current_time < total_time && !self.has_missed_deadline {
            self.step();
        }
        (self.has_missed_deadline, self.deadline_miss_time)
    }

    /// Runs open-ended, stopping either on the first missed deadline or once
    /// the system state (cumulative overhead plus per-task counters) repeats
    /// across a hyperperiod boundary, proving a finite feasibility interval.
    /// Returns `((missed, miss_time), feasibility_interval_end)`.
    pub fn run_open_ended(&mut self) -> ((bool, f64), f64) {
        self.dispatch();
        let h = self.task_set.hyperperiod;
        let mut k: i64 = 0;
        let mut previous_system_state: Option<(f64, TaskStateSnapshot)> = None;
        let mut previous_system_state_time = 0.0;

        while !self.has_missed_deadline {
            let period = h + k * h;
            if self.current_time > 0.0 && period > 0 && self.current_time % (period as f64) == 0.0 {
                let current_system_state = (self.cumulative_overhead_time, self.tasks_state.clone());
                if previous_system_state.as_ref() == Some(&current_system_state) {
                    break;
                }
                previous_system_state = Some(current_system_state);
                previous_system_state_time = self.current_time;
                self.cumulative_overhead_time = 0.0;
                k += 1;
            }
            self.step();
        }

        ((self.has_missed_deadline, self.deadline_miss_time), previous_system_state_time)
    }

    fn step(&mut self) {
        if self.time_before_tick > 0.0 {
            self.execute_job();
        } else {
            self.tick();
        }
    }

    fn dispatch(&mut self) {
        let head_is_idle = self.ready_queue.peek().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
        self.current_job = if head_is_idle { self.ready_queue.peek().cloned() } else { self.ready_queue.pop() };
        tracing::trace!(job = ?self.current_job.as_ref().map(|j| j.borrow().name), "dispatched");
    }

    fn execute_job(&mut self) {
        self.last_interrupted_job = self.current_job.clone();
        let job_rc = self.current_job.clone().expect("execute_job called with no current job");

        let remaining_init = job_rc.borrow().task.borrow().remaining_init_time;
        if remaining_init > 0.0 {
            self.execute_job_til_tick(true);
            if self.time_before_tick <= 0.0 {
                return;
            }
        }

        self.execute_job_til_tick(false);
        if job_rc.borrow().is_finished() {
            if self.is_ctx_flag_needed() {
                self.context_switch_flag = true;
            }
            self.add_end_task_overhead();
            self.dispatch();
        }
    }

    fn execute_job_til_tick(&mut self, init_phase: bool) {
        let job_rc = self.current_job.clone().expect("execute_job_til_tick called with no current job");
        let (used_cpu_time, updated_time_before_tick, name);

        if init_phase {
            let remaining_init = job_rc.borrow().task.borrow().remaining_init_time;
            updated_time_before_tick = (self.time_before_tick - remaining_init).max(0.0);
            used_cpu_time = self.time_before_tick.min(remaining_init);
            self.cumulative_overhead_time += used_cpu_time;
            job_rc.borrow().task.borrow_mut().remaining_init_time -= used_cpu_time;
            name = job_rc.borrow().name;
            self.history.push(HistoryEntry::new(name, used_cpu_time, ExecutionType::InitOverhead, Detail::None));
        } else {
            let remaining = job_rc.borrow().remaining_time;
            updated_time_before_tick = (self.time_before_tick - remaining).max(0.0);
            used_cpu_time = self.time_before_tick.min(remaining);
            job_rc.borrow_mut().remaining_time -= used_cpu_time;
            name = job_rc.borrow().name;
            self.history.push(HistoryEntry::new(name, used_cpu_time, ExecutionType::Task, Detail::None));
        }

        self.time_before_tick = updated_time_before_tick;
        job_rc.borrow().task.borrow_mut().cumulative_cpu_time += used_cpu_time;
        self.decrement_time_til_deadlines(used_cpu_time);
    }

    fn tick(&mut self) {
        self.current_time += self.overheads.tick_rate;
        self.time_before_tick = self.overheads.tick_rate;

        self.save_tasks_state();
        self.reset_ctx_flag();

        let some_task_awaken = self.decrement_timers();

        if self.is_preemption_required(some_task_awaken) {
            self.handle_preemption();
            self.add_preemption_overhead();
        } else {
            self.add_get_hpt_overhead();
        }

        let current_is_idle = self.current_job.as_ref().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
        if !current_is_idle {
            self.add_tick_overhead(self.overheads.load, "LOAD");
        }
        self.add_tick_overhead(self.overheads.resume, "RESUME");
    }

    fn add_get_hpt_overhead(&mut self) {
        if self.has_interrupted_job_finished() {
            self.history.push(HistoryEntry::new(
                TICK_TASK,
                self.overheads.get_hpt,
                ExecutionType::PreemptionOverhead,
                Detail::Label("GET HPT"),
            ));
            self.time_before_tick -= self.overheads.get_hpt;
            self.cumulative_overhead_time += self.overheads.get_hpt;
            self.decrement_time_til_deadlines(self.overheads.get_hpt);
        }

        let current_is_idle = self.current_job.as_ref().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
        if current_is_idle {
            self.dispatch();
        }
    }

    fn has_interrupted_job_finished(&self) -> bool {
        self.last_interrupted_job.as_ref().map(|j| j.borrow().remaining_time == 0.0).unwrap_or(false)
    }

    fn is_preemption_required(&self, some_task_awaken: bool) -> bool {
        let awaken_higher_priority = match (self.ready_queue.peek(), &self.last_interrupted_job) {
            (Some(head), Some(last)) => head.borrow().higher_priority(&last.borrow(), self.policy),
            _ => false,
        };
        some_task_awaken && awaken_higher_priority
    }

    fn handle_preemption(&mut self) {
        let is_idle = self.current_job.as_ref().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
        if !is_idle {
            if let Some(cur) = self.current_job.clone() {
                self.ready_queue.insert(cur);
            }
        }
        self.dispatch();
    }

    fn add_preemption_overhead(&mut self) {
        let mut preemption_overheads = self.overheads.get_hpt;
        let last_is_idle = self.last_interrupted_job.as_ref().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
        if !self.has_interrupted_job_finished() && !last_is_idle {
            self.history.push(HistoryEntry::new(
                TICK_TASK,
                self.overheads.add_ready,
                ExecutionType::PreemptionOverhead,
                Detail::Label("ADD READY"),
            ));
            preemption_overheads += self.overheads.add_ready;
        }
        self.history.push(HistoryEntry::new(
            TICK_TASK,
            self.overheads.get_hpt,
            ExecutionType::PreemptionOverhead,
            Detail::Label("GET HPT"),
        ));
        self.time_before_tick -= preemption_overheads;
        self.cumulative_overhead_time += preemption_overheads;
        self.decrement_time_til_deadlines(preemption_overheads);
    }

    fn add_end_task_overhead(&mut self) {
        let job_name = self.current_job.as_ref().unwrap().borrow().name;
        let mut timeleft = self.time_before_tick;
        let mut overheads = 0.0;

        if self.overheads.save <= timeleft {
            self.history.push(HistoryEntry::new(job_name, self.overheads.save, ExecutionType::EndJobOverhead, Detail::Label("SAVE")));
            timeleft -= self.overheads.save;
            overheads += self.overheads.save;

            if self.overheads.get_hpt <= timeleft {
                self.history.push(HistoryEntry::new(job_name, self.overheads.get_hpt, ExecutionType::EndJobOverhead, Detail::Label("GET_HPT")));
                timeleft -= self.overheads.get_hpt;
                overheads += self.overheads.get_hpt;

                let next_is_idle = self.ready_queue.peek().map(|j| j.borrow().name == IDLE_TASK).unwrap_or(false);
                if !next_is_idle {
                    if self.overheads.load <= timeleft {
                        self.history.push(HistoryEntry::new(job_name, self.overheads.load, ExecutionType::EndJobOverhead, Detail::Label("LOAD")));
                        overheads += self.overheads.load;
                    } else {
                        self.history.push(HistoryEntry::new(job_name, timeleft, ExecutionType::EndJobOverhead, Detail::Label("LOAD")));
                        overheads += timeleft;
                    }
                }
            } else {
                self.history.push(HistoryEntry::new(job_name, timeleft, ExecutionType::EndJobOverhead, Detail::Label("GET_HPT")));
                overheads += timeleft;
            }
        } else {
            self.history.push(HistoryEntry::new(job_name, timeleft, ExecutionType::EndJobOverhead, Detail::Label("SAVE")));
            overheads += timeleft;
        }

        self.time_before_tick -= overheads;
        self.cumulative_overhead_time += overheads;
        self.decrement_time_til_deadlines(overheads);
    }

    fn add_tick_overhead(&mut self, overhead: f64, label: &'static str) {
        self.history.push(HistoryEntry::new(TICK_TASK, overhead, ExecutionType::TickOverhead, Detail::Label(label)));
        self.time_before_tick -= overhead;
        self.cumulative_overhead_time += overhead;
        self.decrement_time_til_deadlines(overhead);
    }

    fn save_tasks_state(&mut self) {
        for task in &self.tasks {
            let t = task.borrow();
            self.tasks_state.insert(t.name, (t.time_since_last_quest, t.cumulative_cpu_time));
        }
    }

    fn is_ctx_flag_needed(&self) -> bool {
        self.overheads.save <= self.time_before_tick
            && self.overheads.get_hpt + self.overheads.load > (self.time_before_tick - self.overheads.save)
    }

    fn reset_ctx_flag(&mut self) {
        let eligible = self.last_interrupted_job.as_ref().map(|j| j.borrow().name != IDLE_TASK).unwrap_or(false);
        if !self.context_switch_flag && eligible {
            self.add_tick_overhead(self.overheads.save, "SAVE");
        } else {
            self.context_switch_flag = false;
        }
    }

    fn decrement_timers(&mut self) -> bool {
        let mut timers = std::mem::take(&mut self.timers);
        let mut some_task_awaken = false;
        let mut timers_overhead_included = false;
        let tick_rate = self.overheads.tick_rate;

        for timer in &mut timers {
            let mut current_task_awaken = false;
            if timer.decrement(tick_rate) {
                let job = Rc::new(RefCell::new(Task::new_job(timer.task(), self.current_time)));
                self.ready_queue.insert(job);
                some_task_awaken = true;
                current_task_awaken = true;
            }

            if !timers_overhead_included {
                self.add_tick_overhead(self.overheads.decrement_timer, "DECREMENT TIMER");
                timers_overhead_included = true;
            }

            if current_task_awaken {
                self.add_tick_overhead(self.overheads.restart_timer, "RESTART TIMER");
                self.add_tick_overhead(self.overheads.add_ready, "ADD READY");
            }
        }

        self.timers = timers;
        some_task_awaken
    }

    /// Decrements `time_til_deadline` on every live job by `duration` and
    /// evaluates the ahead-looking miss predicate. The sweep is deduplicated
    /// by identity (the idle sentinel is simultaneously in the ready queue and
    /// possibly `current_job`) and the idle sentinel is exempt, per the
    /// Design Notes.
    fn decrement_time_til_deadlines(&mut self, duration: f64) -> bool {
        if self.has_missed_deadline {
            return false;
        }

        let mut jobs: Vec<Rc<RefCell<Job>>> = self.ready_queue.iter().cloned().collect();
        if let Some(cur) = &self.current_job {
            if !jobs.iter().any(|j| Rc::ptr_eq(j, cur)) {
                jobs.push(Rc::clone(cur));
            }
        }

        for job_rc in jobs {
            let mut job = job_rc.borrow_mut();
            job.decrement_time_til_deadline(duration);
            if job.name == IDLE_TASK {
                continue;
            }
            if job.absolute_deadline - self.current_time - (self.overheads.tick_rate - self.time_before_tick) < job.remaining_time {
                self.has_missed_deadline = true;
                self.deadline_miss_time = job.absolute_deadline;
                let name = job.name;
                let absolute_deadline = job.absolute_deadline;
                drop(job);
                self.history.push(HistoryEntry::new(name, 2.0, ExecutionType::MissedDeadline, Detail::AbsoluteDeadline(absolute_deadline)));
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn overheads(tick_rate: f64) -> OverheadTable {
        OverheadTable::zero(tick_rate)
    }

    fn task_set(specs: &[(f64, f64, f64, f64)]) -> TaskSet {
        let tasks = specs
            .iter()
            .enumerate()
            .map(|(i, &(offset, wcet, period, deadline))| {
                Rc::new(RefCell::new(Task::new((specs.len() - i) as i64, offset, wcet, period, deadline, 0.0)))
            })
            .collect();
        TaskSet::new(tasks)
    }

    #[test]
    fn single_task_no_overhead_no_miss() {
        let ts = task_set(&[(0.0, 1.0, 2.0, 2.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
        let (missed, _) = sim.run_bounded(10.0);
        assert!(!missed);
    }

    #[test]
    fn rm_shorter_period_preempts() {
        // T2 (shorter period) must be given priority over T1 whenever both are ready.
        let ts = task_set(&[(0.0, 1.0, 3.0, 3.0), (0.0, 1.0, 2.0, 2.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
        let (missed, _) = sim.run_bounded(12.0);
        assert!(!missed);
    }

    #[test]
    fn overcommitted_task_set_misses_deadline() {
        let ts = task_set(&[(0.0, 2.0, 3.0, 3.0), (0.0, 2.0, 3.0, 3.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
        let (missed, _) = sim.run_bounded(30.0);
        assert!(missed);
    }

    #[test]
    fn edf_equal_period_earlier_deadline_first() {
        let ts = task_set(&[(0.0, 1.0, 4.0, 2.0), (0.0, 1.0, 4.0, 4.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Edf, overheads(1.0));
        let (missed, _) = sim.run_bounded(8.0);
        assert!(!missed);
    }

    #[test]
    fn steady_state_detection_returns_bounded_interval() {
        let ts = task_set(&[(0.0, 1.0, 4.0, 4.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
        let ((missed, _), interval_end) = sim.run_open_ended();
        assert!(!missed);
        assert!(interval_end > 0.0);
    }

    #[test]
    fn idle_sentinel_never_popped() {
        let ts = task_set(&[(0.0, 1.0, 4.0, 4.0)]);
        let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
        sim.run_bounded(20.0);
        assert!(sim.ready_queue.iter().any(|j| j.borrow().name == IDLE_TASK));
    }

    proptest! {
        /// For any single task with utilization <= 1 and zero overheads, no
        /// deadline is missed over a window spanning two of its periods —
        /// the single-task instance of the utilization invariant in §8.
        #[test]
        fn feasible_single_task_never_misses_deadline(period in 2u32..30, wcet_frac in 1u32..=100) {
            let period = period as f64;
            let wcet = (period * wcet_frac as f64 / 100.0).max(1.0).min(period);
            let ts = task_set(&[(0.0, wcet, period, period)]);
            let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
            let (missed, _) = sim.run_bounded(period * 2.0);
            prop_assert!(!missed);
        }

        /// The idle sentinel is never popped from the ready queue, for any
        /// bounded run length on a lightly-loaded single task.
        #[test]
        fn idle_sentinel_never_popped_property(total_time in 5u32..100) {
            let ts = task_set(&[(0.0, 1.0, 10.0, 10.0)]);
            let mut sim = Simulator::new(ts, SchedulerPolicy::Rm, overheads(1.0));
            sim.run_bounded(total_time as f64);
            prop_assert!(sim.ready_queue.iter().any(|j| j.borrow().name == IDLE_TASK));
        }
    }
}
