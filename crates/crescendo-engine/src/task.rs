//! Bookkeeping for in-flight analysis tasks.
//!
//! One [`TaskEntry`] exists per file with work outstanding. Requests that
//! arrive while it lives attach their event senders to it instead of
//! scheduling a second run.

use crate::events::AnalysisEvent;
use crate::file_id::FileId;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::Instant;

/// Unique identifier for one scheduled run.
///
/// A fresh id per run lets workers detect queue messages that outlived
/// their task (cancelled and re-requested files).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Generate a process-unique task id.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Where an in-flight task currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting in the job queue.
    Queued,
    /// Claimed by a worker.
    Running,
}

const STATE_QUEUED: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// Shared state for one outstanding run.
///
/// The waiter list is `None` once the terminal event went out; a failed
/// attach tells the caller the run ended between its registry lookup and
/// now, so it must fall back to the cache.
pub(crate) struct TaskEntry {
    pub(crate) task_id: TaskId,
    state: AtomicU8,
    cancel: AtomicBool,
    deadline: Option<Instant>,
    waiters: Mutex<Option<Vec<Sender<AnalysisEvent>>>>,
}

impl TaskEntry {
    pub(crate) fn new(task_id: TaskId, deadline: Option<Instant>) -> Self {
        Self {
            task_id,
            state: AtomicU8::new(STATE_QUEUED),
            cancel: AtomicBool::new(false),
            deadline,
            waiters: Mutex::new(Some(Vec::new())),
        }
    }

    /// Register another event channel on this run. Returns `false` when the
    /// run already finished.
    pub(crate) fn attach(&self, tx: Sender<AnalysisEvent>) -> bool {
        match self.waiters.lock().as_mut() {
            Some(waiters) => {
                waiters.push(tx);
                true
            }
            None => false,
        }
    }

    /// Send a progress event to every attached waiter.
    pub(crate) fn broadcast(&self, event: &AnalysisEvent) {
        if let Some(waiters) = self.waiters.lock().as_ref() {
            for tx in waiters {
                let _ = tx.send(event.clone());
            }
        }
    }

    /// Close the waiter list and hand back the senders to notify. `None`
    /// when another caller already finished this task. Later attaches fail
    /// and later broadcasts are no-ops.
    ///
    /// The winner records its bookkeeping before sending the terminal
    /// event, so state is consistent by the time a waiter observes it.
    pub(crate) fn take_waiters(&self) -> Option<Vec<Sender<AnalysisEvent>>> {
        self.waiters.lock().take()
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub(crate) fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub(crate) fn mark_running(&self) {
        self.state.store(STATE_RUNNING, Ordering::Release);
    }

    pub(crate) fn state(&self) -> TaskState {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => TaskState::Running,
            _ => TaskState::Queued,
        }
    }
}

/// Send a terminal event to waiters taken from a finished task.
pub(crate) fn deliver(waiters: &[Sender<AnalysisEvent>], event: &AnalysisEvent) {
    for tx in waiters {
        let _ = tx.send(event.clone());
    }
}

/// Message handed to the worker pool.
pub(crate) struct Job {
    pub(crate) file_id: FileId,
    pub(crate) task_id: TaskId,
}
