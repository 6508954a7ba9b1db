//! Progress reporting and cooperative cancellation.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Receives task progress from the driver and the algorithms.
///
/// Tasks nest: every `begin` is matched by a `done`, and a `begin` issued while another task
/// is open starts a subtask of it.
pub trait ProgressMonitor {
    fn begin(&mut self, task: &str, total_work: f64);
    fn worked(&mut self, work: f64);
    fn done(&mut self);
    fn is_canceled(&self) -> bool;
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub name: String,
    pub total_work: f64,
    pub worked: f64,
    pub elapsed: Duration,
    pub children: Vec<TaskRecord>,
}

#[derive(Debug)]
struct OpenTask {
    record: TaskRecord,
    started: Instant,
}

/// Records a tree of finished tasks with their timings.
#[derive(Debug, Default)]
pub struct BasicProgressMonitor {
    open: Vec<OpenTask>,
    finished: Vec<TaskRecord>,
    cancel: CancelToken,
}

impl BasicProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(cancel: CancelToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Finished top-level tasks, in completion order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.finished
    }

    /// Number of tasks begun but not yet done.
    pub fn open_tasks(&self) -> usize {
        self.open.len()
    }
}

impl ProgressMonitor for BasicProgressMonitor {
    fn begin(&mut self, task: &str, total_work: f64) {
        self.open.push(OpenTask {
            record: TaskRecord {
                name: task.to_string(),
                total_work,
                worked: 0.0,
                elapsed: Duration::ZERO,
                children: Vec::new(),
            },
            started: Instant::now(),
        });
    }

    fn worked(&mut self, work: f64) {
        if let Some(top) = self.open.last_mut() {
            top.record.worked += work;
        }
    }

    fn done(&mut self) {
        let Some(task) = self.open.pop() else {
            return;
        };
        let mut record = task.record;
        record.elapsed = task.started.elapsed();
        debug!(
            task = %record.name,
            depth = self.open.len(),
            elapsed_us = record.elapsed.as_micros() as u64,
            "task finished"
        );
        match self.open.last_mut() {
            Some(parent) => parent.record.children.push(record),
            None => self.finished.push(record),
        }
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}

/// Discards all reports and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressMonitor;

impl ProgressMonitor for NullProgressMonitor {
    fn begin(&mut self, _task: &str, _total_work: f64) {}

    fn worked(&mut self, _work: f64) {}

    fn done(&mut self) {}

    fn is_canceled(&self) -> bool {
        false
    }
}
