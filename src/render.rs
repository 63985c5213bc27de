//! A textual stand-in for the original Gantt chart renderer.
//!
//! The reference implementation (`draw.py`) rasterizes the history into a
//! matplotlib figure: one broken-bar row per task, hatched overhead spans,
//! downward arrows at each release, deadline circles, and a red marker at a
//! missed deadline. No plotting crate appears anywhere in this crate's
//! dependency pack, so this renders the same structure — one line per history
//! entry, task rows distinguished by label, overhead spans and the missed
//! deadline marker called out the same way `draw_tasks` dispatches on
//! [`ExecutionType`] — as plain text instead of an image.

use std::fmt::Write as _;

use crate::history::{Detail, ExecutionType, HistoryEntry};
use crate::task_set::TaskSet;
use crate::{IDLE_TASK, TICK_TASK};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub show_ticks: bool,
    pub show_hyperperiods: bool,
    pub show_overhead_labels: bool,
}

pub fn render_schedule(history: &[HistoryEntry], task_set: &TaskSet, tick_rate: f64, opts: &RenderOptions) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "hyperperiod={} max_offset={} feasibility_interval={}",
        task_set.hyperperiod, task_set.max_offset, task_set.feasibility_interval
    )
    .unwrap();
    if opts.show_hyperperiods {
        writeln!(out, "hyperperiod boundary every {} time units", task_set.hyperperiod).unwrap();
    }
    if opts.show_ticks {
        writeln!(out, "tick boundary every {tick_rate} time units").unwrap();
    }
    writeln!(out, "{:>8}  {:>8}  {:<8}  {:<20}  detail", "start", "end", "task", "kind").unwrap();

    let mut cpu_time = 0.0f64;
    for entry in history {
        if entry.used_time <= 0.0 && entry.execution_type != ExecutionType::MissedDeadline {
            continue;
        }

        let label = task_label(entry.task_name);
        let kind = kind_label(entry.execution_type);
        let detail = detail_label(&entry.detail, opts.show_overhead_labels);

        if entry.execution_type == ExecutionType::MissedDeadline {
            writeln!(out, "{cpu_time:>8.2}  {:>8}  {label:<8}  {kind:<20}  {detail}", "--").unwrap();
            break;
        }

        writeln!(out, "{cpu_time:>8.2}  {:>8.2}  {label:<8}  {kind:<20}  {detail}", cpu_time + entry.used_time).unwrap();
        cpu_time += entry.used_time;
    }

    out
}

fn task_label(name: i64) -> String {
    if name == IDLE_TASK {
        "idle".to_string()
    } else if name == TICK_TASK {
        "tick".to_string()
    } else {
        format!("task{name}")
    }
}

fn kind_label(exec_type: ExecutionType) -> &'static str {
    match exec_type {
        ExecutionType::Task => "TASK",
        ExecutionType::InitOverhead => "INIT_OVERHEAD",
        ExecutionType::EndJobOverhead => "END_JOB_OVERHEAD",
        ExecutionType::TickOverhead => "TICK_OVERHEAD",
        ExecutionType::PreemptionOverhead => "PREEMPTION_OVERHEAD",
        ExecutionType::MissedDeadline => "MISSED_DEADLINE",
    }
}

fn detail_label(detail: &Detail, show_overhead_labels: bool) -> String {
    match detail {
        Detail::Label(l) if show_overhead_labels => l.to_string(),
        Detail::AbsoluteDeadline(d) => format!("absolute_deadline={d}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn renders_task_and_missed_deadline_entries() {
        let tasks = vec![Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)))];
        let task_set = TaskSet::new(tasks);
        let history = vec![
            HistoryEntry::new(1, 1.0, ExecutionType::Task, Detail::None),
            HistoryEntry::new(1, 2.0, ExecutionType::MissedDeadline, Detail::AbsoluteDeadline(5.0)),
        ];
        let out = render_schedule(&history, &task_set, 1.0, &RenderOptions::default());
        assert!(out.contains("task1"));
        assert!(out.contains("MISSED_DEADLINE"));
        assert!(out.contains("absolute_deadline=5"));
    }

    #[test]
    fn skips_zero_length_entries_except_missed_deadline() {
        let tasks = vec![Rc::new(RefCell::new(Task::new(1, 0.0, 1.0, 5.0, 5.0, 0.0)))];
        let task_set = TaskSet::new(tasks);
        let history = vec![HistoryEntry::new(TICK_TASK, 0.0, ExecutionType::TickOverhead, Detail::Label("SAVE"))];
        let out = render_schedule(&history, &task_set, 1.0, &RenderOptions::default());
        assert!(!out.contains("TICK_OVERHEAD"));
    }
}
