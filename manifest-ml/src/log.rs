//! Logging capability handed to each stage.
//!
//! Stages never reach for a global logger; they report through a
//! `&dyn PipelineLog`, so a test can swap in [`MemoryLog`] and assert on
//! what a stage said.

use crate::stage::Stage;
use std::cell::RefCell;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// Sink for stage progress and diagnostics.
pub trait PipelineLog {
    fn log(&self, level: LogLevel, stage: Stage, message: &str);

    fn debug(&self, stage: Stage, message: &str) {
        self.log(LogLevel::Debug, stage, message);
    }

    fn info(&self, stage: Stage, message: &str) {
        self.log(LogLevel::Info, stage, message);
    }

    fn warn(&self, stage: Stage, message: &str) {
        self.log(LogLevel::Warn, stage, message);
    }
}

/// Forwards to `tracing` with a `stage` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl PipelineLog for TracingLog {
    fn log(&self, level: LogLevel, stage: Stage, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(stage = %stage, "{message}"),
            LogLevel::Info => tracing::info!(stage = %stage, "{message}"),
            LogLevel::Warn => tracing::warn!(stage = %stage, "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl PipelineLog for NullLog {
    fn log(&self, _level: LogLevel, _stage: Stage, _message: &str) {}
}

/// A recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub stage: Stage,
    pub message: String,
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Messages logged by one stage, in order.
    pub fn messages_for(&self, stage: Stage) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl PipelineLog for MemoryLog {
    fn log(&self, level: LogLevel, stage: Stage, message: &str) {
        self.entries.borrow_mut().push(LogEntry {
            level,
            stage,
            message: message.to_string(),
        });
    }
}
