//! Pipeline progress reporting.
//!
//! Long batch stages (download, parse, chunk, embed) report how far along
//! they are. Progress is emitted on **stderr** so stdout remains parseable
//! for scripts.

use std::io::{IsTerminal, Write};

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `n` items of `total` done in `stage`.
    Advanced { stage: String, n: u64, total: u64 },
    /// One item in `stage` failed and was skipped.
    Skipped { stage: String, item: String, reason: String },
}

impl ProgressEvent {
    pub fn advanced(stage: &str, n: usize, total: usize) -> Self {
        ProgressEvent::Advanced {
            stage: stage.to_string(),
            n: n as u64,
            total: total as u64,
        }
    }

    pub fn skipped(stage: &str, item: &str, reason: impl std::fmt::Display) -> Self {
        ProgressEvent::Skipped {
            stage: stage.to_string(),
            item: item.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Reports pipeline progress.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "embed  1,024 / 5,000".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Advanced { stage, n, total } => {
                format!("{}  {} / {}\n", stage, format_number(*n), format_number(*total))
            }
            ProgressEvent::Skipped {
                stage,
                item,
                reason,
            } => format!("{}  skipped {}: {}\n", stage, item, reason),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Advanced { stage, n, total } => serde_json::json!({
                "event": "progress",
                "stage": stage,
                "n": n,
                "total": total
            }),
            ProgressEvent::Skipped {
                stage,
                item,
                reason,
            } => serde_json::json!({
                "event": "skipped",
                "stage": stage,
                "item": item,
                "reason": reason
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter, for tests and library callers.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if std::io::stderr().is_terminal() {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
