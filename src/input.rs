//! Parses the line-delimited configuration file into a [`TaskSet`], a
//! [`SchedulerPolicy`] and an [`OverheadTable`].
//!
//! Expected format (blank line between sections):
//!
//! ```text
//! Task set
//! <offset> <wcet> <period> <deadline> <init_overhead>
//! ...
//!
//! Algorithm
//! RM | EDF
//!
//! System overheads
//! Tick_rate = <number>
//! Save = <number>
//! Load = <number>
//! Decrement_timer = <number>
//! Restart_timer = <number>
//! Resume = <number>
//! Add_ready = <number>
//! Get_hpt = <number>
//! ```
//!
//! Task names are assigned high-to-low: the first task line gets
//! `task_count`, the last gets `1`, matching the reference parser.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use crate::error::InputError;
use crate::job::SchedulerPolicy;
use crate::overhead::OverheadTable;
use crate::task::Task;
use crate::task_set::TaskSet;

pub fn parse_input_file(path: &str) -> Result<(TaskSet, SchedulerPolicy, OverheadTable), InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Io { path: path.to_string(), source })?;
    let lines: Vec<&str> = content.lines().collect();

    if lines.first().map(|l| l.trim()) != Some("Task set") {
        return Err(InputError::MissingTaskSetHeader {
            path: path.to_string(),
            found: lines.first().unwrap_or(&"").to_string(),
        });
    }

    let mut task_set_lines = Vec::new();
    let mut task_set_end_at_line = lines.len();
    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            task_set_end_at_line = i;
            break;
        }
        task_set_lines.push(*line);
    }

    if task_set_lines.is_empty() {
        return Err(InputError::EmptyTaskSet { path: path.to_string() });
    }

    let count = task_set_lines.len();
    let mut tasks = Vec::with_capacity(count);
    for (idx, line) in task_set_lines.iter().enumerate() {
        let task = parse_task_line(path, idx + 2, line, count)?;
        tasks.push(Rc::new(RefCell::new(task)));
    }

    if lines.get(task_set_end_at_line + 1).map(|l| l.trim()) != Some("Algorithm") {
        return Err(InputError::MissingAlgorithmHeader { path: path.to_string() });
    }

    let mut algorithm_end_at_line = lines.len();
    for (i, line) in lines.iter().enumerate().skip(task_set_end_at_line + 1) {
        if line.trim().is_empty() {
            algorithm_end_at_line = i;
            break;
        }
    }

    let algorithm_line_no = algorithm_end_at_line;
    let algorithm_text = lines
        .get(algorithm_end_at_line.wrapping_sub(1))
        .map(|l| l.trim().to_uppercase())
        .unwrap_or_default();
    let policy = match algorithm_text.as_str() {
        "RM" => SchedulerPolicy::Rm,
        "EDF" => SchedulerPolicy::Edf,
        other => {
            return Err(InputError::UnknownAlgorithm {
                path: path.to_string(),
                line: algorithm_line_no,
                found: other.to_string(),
            })
        }
    };

    if lines.get(algorithm_end_at_line + 1).map(|l| l.trim()) != Some("System overheads") {
        return Err(InputError::MissingOverheadsHeader { path: path.to_string() });
    }

    let mut raw_overheads = HashMap::new();
    for (offset, line) in lines[(algorithm_end_at_line + 2).min(lines.len())..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| InputError::MalformedOverheadLine {
            path: path.to_string(),
            line: algorithm_end_at_line + 2 + offset,
            content: line.to_string(),
            reason: "expected 'key = value'".to_string(),
        })?;
        let key = key.trim().to_string();
        let value: f64 = value.trim().parse().map_err(|e| InputError::MalformedOverheadLine {
            path: path.to_string(),
            line: algorithm_end_at_line + 2 + offset,
            content: line.to_string(),
            reason: format!("{e}"),
        })?;
        raw_overheads.insert(key, value);
    }

    let overheads = build_overhead_table(path, &raw_overheads)?;

    tracing::info!(task_count = count, policy = ?policy, path, "parsed input file");

    Ok((TaskSet::new(tasks), policy, overheads))
}

fn parse_task_line(path: &str, line_no: usize, line: &str, count: usize) -> Result<Task, InputError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(InputError::MalformedTaskLine {
            path: path.to_string(),
            line: line_no,
            content: line.to_string(),
            reason: format!("expected 5 fields (offset wcet period deadline init_overhead), got {}", parts.len()),
        });
    }

    let field = |idx: usize, name: &str| -> Result<f64, InputError> {
        parts[idx].parse::<f64>().map_err(|e| InputError::MalformedTaskLine {
            path: path.to_string(),
            line: line_no,
            content: line.to_string(),
            reason: format!("field {name}: {e}"),
        })
    };

    let offset = field(0, "offset")?;
    let wcet = field(1, "wcet")?;
    let period = field(2, "period")?;
    let deadline = field(3, "deadline")?;
    let init_overhead = field(4, "init_overhead")?;

    // Names are assigned high-to-low: the first-listed task is `count`, the
    // last-listed is `1`. `line_no` is the 1-based file line; the 0-based
    // task-list index is `line_no - 2`.
    let idx = line_no - 2;
    let name = (count - idx) as i64;

    Ok(Task::new(name, offset, wcet, period, deadline, init_overhead))
}

fn build_overhead_table(path: &str, raw: &HashMap<String, f64>) -> Result<OverheadTable, InputError> {
    let get = |key: &str| -> Result<f64, InputError> {
        raw.get(key)
            .copied()
            .ok_or_else(|| InputError::MissingOverheadKey { path: path.to_string(), key: key.to_string() })
    };

    Ok(OverheadTable {
        tick_rate: get("Tick_rate")?,
        save: get("Save")?,
        load: get("Load")?,
        decrement_timer: get("Decrement_timer")?,
        restart_timer: get("Restart_timer")?,
        resume: get("Resume")?,
        add_ready: get("Add_ready")?,
        get_hpt: get("Get_hpt")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const WELL_FORMED: &str = "Task set\n0 1 5 5 0\n0 1 10 10 0\n\nAlgorithm\nRM\n\nSystem overheads\nTick_rate = 1\nSave = 0\nLoad = 0\nDecrement_timer = 0\nRestart_timer = 0\nResume = 0\nAdd_ready = 0\nGet_hpt = 0\n";

    #[test]
    fn parses_well_formed_file() {
        let f = write_temp(WELL_FORMED);
        let (task_set, policy, overheads) = parse_input_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(policy, SchedulerPolicy::Rm);
        assert_eq!(task_set.tasks().len(), 2);
        assert_eq!(task_set.tasks()[0].borrow().name, 2);
        assert_eq!(task_set.tasks()[1].borrow().name, 1);
        assert_eq!(overheads.tick_rate, 1.0);
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let content = WELL_FORMED.replace("RM", "FOO");
        let f = write_temp(&content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::UnknownAlgorithm { .. }));
    }

    #[test]
    fn rejects_missing_task_set_header() {
        let f = write_temp("Not a task set\n");
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MissingTaskSetHeader { .. }));
    }

    #[test]
    fn rejects_malformed_task_line() {
        let content = "Task set\n0 1 5\n\nAlgorithm\nRM\n\nSystem overheads\nTick_rate = 1\nSave = 0\nLoad = 0\nDecrement_timer = 0\nRestart_timer = 0\nResume = 0\nAdd_ready = 0\nGet_hpt = 0\n";
        let f = write_temp(content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MalformedTaskLine { .. }));
    }

    #[test]
    fn rejects_missing_overhead_key() {
        let content = "Task set\n0 1 5 5 0\n\nAlgorithm\nRM\n\nSystem overheads\nTick_rate = 1\n";
        let f = write_temp(content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MissingOverheadKey { .. }));
    }

    #[test]
    fn rejects_missing_algorithm_header() {
        let content = "Task set\n0 1 5 5 0\n";
        let f = write_temp(content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MissingAlgorithmHeader { .. }));
    }

    #[test]
    fn rejects_missing_overheads_header() {
        let content = "Task set\n0 1 5 5 0\n\nAlgorithm\nRM\n";
        let f = write_temp(content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MissingOverheadsHeader { .. }));
    }

    #[test]
    fn rejects_empty_task_set() {
        let content = "Task set\n\nAlgorithm\nRM\n\nSystem overheads\nTick_rate = 1\nSave = 0\nLoad = 0\nDecrement_timer = 0\nRestart_timer = 0\nResume = 0\nAdd_ready = 0\nGet_hpt = 0\n";
        let f = write_temp(content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::EmptyTaskSet { .. }));
    }

    #[test]
    fn rejects_malformed_overhead_line() {
        let content = WELL_FORMED.replace("Tick_rate = 1", "Tick_rate 1");
        let f = write_temp(&content);
        let err = parse_input_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::MalformedOverheadLine { .. }));
    }
}
