//! Command-line argument surface for the `rt-sim` binary.

use std::path::PathBuf;

use clap::Parser;

/// Discrete-event simulator for uniprocessor RM/EDF real-time task scheduling.
#[derive(Debug, Parser)]
#[command(name = "rt-sim", version, about, long_about = None)]
pub struct Cli {
    /// Path to the task-set/algorithm/overhead configuration file.
    #[arg(long = "input")]
    pub input: PathBuf,

    /// Render a textual schedule to OUTPUT, bounding the rendering run at
    /// INTERVAL simulated time units.
    #[arg(long = "draw", num_args = 2, value_names = ["OUTPUT", "INTERVAL"])]
    pub draw: Option<Vec<String>>,

    /// Include tick boundaries in the rendered schedule.
    #[arg(long = "ticks")]
    pub ticks: bool,

    /// Include hyperperiod boundaries in the rendered schedule.
    #[arg(long = "hps")]
    pub hps: bool,

    /// Include overhead labels (SAVE, LOAD, ...) in the rendered schedule.
    #[arg(long = "labels")]
    pub labels: bool,

    /// Raise the tracing log level; repeatable (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The `tracing` level implied by the repeated `-v` flag: `info` by
    /// default, `debug` at `-v`, `trace` at `-vv` or higher.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Parses `--draw`'s two positional values into `(path, interval)`.
    pub fn draw_target(&self) -> anyhow::Result<Option<(PathBuf, f64)>> {
        let Some(values) = &self.draw else {
            return Ok(None);
        };
        let [output, interval] = &values[..] else {
            anyhow::bail!("--draw expects exactly two values: OUTPUT INTERVAL");
        };
        let interval: f64 = interval.parse().map_err(|e| anyhow::anyhow!("--draw interval {interval:?}: {e}"))?;
        Ok(Some((PathBuf::from(output), interval)))
    }
}
