//! Compile progress reporting.
//!
//! Reports observable progress during `treedoc compile` so users see which
//! issue is being fetched and when document assembly starts. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a compile run.
#[derive(Clone, Debug)]
pub enum CompileProgressEvent {
    /// A node was visited (fetched and resolved). `n` counts visited nodes
    /// so far; there is no total — the tree size is unknown until traversal
    /// finishes.
    Visited { key: String, depth: usize, n: u64 },
    /// All nodes are collected; document assembly is starting.
    Assembling { total: u64 },
}

/// Reports compile progress. Implementations write to stderr (human or JSON).
pub trait CompileProgressReporter: Send + Sync {
    /// Emit a progress event. Called once per visited node and once at
    /// document-assembly start.
    fn report(&self, event: CompileProgressEvent);
}

/// Human-friendly progress on stderr: "compile  PROJ-42  (depth 2, 17 visited)".
pub struct StderrProgress;

impl CompileProgressReporter for StderrProgress {
    fn report(&self, event: CompileProgressEvent) {
        let line = match &event {
            CompileProgressEvent::Visited { key, depth, n } => {
                format!("compile  {}  (depth {}, {} visited)\n", key, depth, n)
            }
            CompileProgressEvent::Assembling { total } => {
                format!("compile  assembling document  ({} sections)\n", total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl CompileProgressReporter for JsonProgress {
    fn report(&self, event: CompileProgressEvent) {
        let obj = match &event {
            CompileProgressEvent::Visited { key, depth, n } => serde_json::json!({
                "event": "progress",
                "phase": "visiting",
                "key": key,
                "depth": depth,
                "n": n
            }),
            CompileProgressEvent::Assembling { total } => serde_json::json!({
                "event": "progress",
                "phase": "assembling",
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CompileProgressReporter for NoProgress {
    fn report(&self, _event: CompileProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller can pass it to the collector.
    pub fn reporter(&self) -> Box<dyn CompileProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
