//! The analysis engine: request intake, deduplication, worker pool, cache.

use crate::cache::{CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::events::{AnalysisEvent, AnalysisHandle};
use crate::file_id::FileId;
use crate::metrics::{EngineMetrics, EngineMetricsSnapshot};
use crate::result::{AnalysisResult, AnalysisStatus};
use crate::task::{deliver, Job, TaskEntry, TaskId, TaskState};
use crate::traits::{AudioDecoder, TagReader, TempoEstimator};
use crescendo_dsp::{analyze_buffer, AnalysisParams};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use thread_priority::ThreadPriority;

/// State shared between the engine front end and its workers.
struct Shared {
    params: AnalysisParams,
    cache: ResultCache,
    tasks: DashMap<FileId, Arc<TaskEntry>>,
    metrics: EngineMetrics,
    decoder: Box<dyn AudioDecoder>,
    tag_reader: Option<Box<dyn TagReader>>,
    tempo_estimator: Option<Box<dyn TempoEstimator>>,
    shutdown: AtomicBool,
}

/// Builder for [`AnalysisEngine`].
///
/// A decoder is mandatory; tag reading and tempo estimation are optional
/// and their absence does not degrade results.
pub struct AnalysisEngineBuilder {
    config: EngineConfig,
    decoder: Box<dyn AudioDecoder>,
    tag_reader: Option<Box<dyn TagReader>>,
    tempo_estimator: Option<Box<dyn TempoEstimator>>,
}

impl AnalysisEngineBuilder {
    pub fn new(decoder: impl AudioDecoder + 'static) -> Self {
        Self {
            config: EngineConfig::default(),
            decoder: Box::new(decoder),
            tag_reader: None,
            tempo_estimator: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn tag_reader(mut self, reader: impl TagReader + 'static) -> Self {
        self.tag_reader = Some(Box::new(reader));
        self
    }

    pub fn tempo_estimator(mut self, estimator: impl TempoEstimator + 'static) -> Self {
        self.tempo_estimator = Some(Box::new(estimator));
        self
    }

    /// Validate the configuration and start the worker pool.
    pub fn build(self) -> Result<AnalysisEngine> {
        self.config.validate()?;
        let worker_count = self.config.effective_workers();
        let (job_tx, job_rx) = crossbeam_channel::bounded(self.config.queue_capacity);

        let shared = Arc::new(Shared {
            params: self.config.analysis_params(),
            cache: ResultCache::new(self.config.cache_capacity),
            tasks: DashMap::new(),
            metrics: EngineMetrics::new(),
            decoder: self.decoder,
            tag_reader: self.tag_reader,
            tempo_estimator: self.tempo_estimator,
            shutdown: AtomicBool::new(false),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let shared = Arc::clone(&shared);
            let jobs = job_rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("crescendo-worker-{i}"))
                .spawn(move || {
                    // Analysis yields to audio and UI threads.
                    let _ = thread_priority::set_current_thread_priority(ThreadPriority::Min);
                    worker_loop(&shared, &jobs);
                })?;
            workers.push(handle);
        }

        tracing::info!(
            workers = worker_count,
            cache_capacity = self.config.cache_capacity,
            decoder = shared.decoder.name(),
            "analysis engine started"
        );
        Ok(AnalysisEngine {
            config: self.config,
            shared,
            job_tx: Some(job_tx),
            workers,
        })
    }
}

/// Concurrent analysis manager.
///
/// Requests are deduplicated per [`FileId`]: while a file is queued or
/// running, further requests for it attach to the same run and all observe
/// its events. Finished results land in an LRU cache so repeat requests
/// return without touching the worker pool.
///
/// Dropping the engine shuts it down: in-flight work stops at its next
/// checkpoint and outstanding handles observe a terminal event.
pub struct AnalysisEngine {
    config: EngineConfig,
    shared: Arc<Shared>,
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl AnalysisEngine {
    pub fn builder(decoder: impl AudioDecoder + 'static) -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::new(decoder)
    }

    /// Request analysis of the file at `path`.
    ///
    /// Never blocks and never returns an error: a path that cannot be
    /// stat'ed, or a job queue already at capacity, yields a handle whose
    /// result carries a `Failure` status.
    pub fn request(&self, path: impl AsRef<Path>) -> AnalysisHandle {
        let path = path.as_ref();
        match FileId::for_path(path) {
            Ok(id) => self.request_file(id),
            Err(error) => {
                self.shared.metrics.record_request();
                self.shared.metrics.record_failed();
                let id = FileId::unverified(path);
                tracing::warn!(file = %id, %error, "cannot stat file for analysis");
                self.failed_handle(id, Error::Decode(error.to_string()).to_string())
            }
        }
    }

    /// Request analysis for an id the caller already holds.
    pub fn request_file(&self, id: FileId) -> AnalysisHandle {
        self.request_file_inner(id, None)
    }

    /// Like [`request_file`](AnalysisEngine::request_file) with a deadline.
    ///
    /// A run past its deadline stops at the next checkpoint and reports a
    /// `Failure`. When the request attaches to an already in-flight run,
    /// that run's original deadline (if any) governs.
    pub fn request_file_with_deadline(&self, id: FileId, timeout: Duration) -> AnalysisHandle {
        self.request_file_inner(id, Some(Instant::now() + timeout))
    }

    fn request_file_inner(&self, id: FileId, deadline: Option<Instant>) -> AnalysisHandle {
        self.shared.metrics.record_request();

        if let Some(result) = self.shared.cache.get(&id) {
            self.shared.metrics.record_cache_hit();
            tracing::debug!(file = %id, "served analysis from cache");
            return AnalysisHandle::preloaded(id, vec![AnalysisEvent::Finished(result)]);
        }

        let Some(job_tx) = self.job_tx.as_ref() else {
            self.shared.metrics.record_failed();
            return self.failed_handle(id, Error::ShutDown.to_string());
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let task = loop {
            match self.shared.tasks.entry(id.clone()) {
                Entry::Occupied(occupied) => {
                    let existing = Arc::clone(occupied.get());
                    drop(occupied);
                    if existing.attach(tx.clone()) {
                        self.shared.metrics.record_coalesced();
                        tracing::debug!(
                            file = %id,
                            task = existing.task_id.raw(),
                            "attached to in-flight analysis"
                        );
                        return AnalysisHandle::attached(id, rx);
                    }
                    // That run ended between lookup and attach; its result
                    // may now be cached.
                    if let Some(result) = self.shared.cache.get(&id) {
                        self.shared.metrics.record_cache_hit();
                        return AnalysisHandle::preloaded(
                            id,
                            vec![AnalysisEvent::Finished(result)],
                        );
                    }
                }
                Entry::Vacant(vacant) => {
                    let task = Arc::new(TaskEntry::new(TaskId::generate(), deadline));
                    let _ = task.attach(tx.clone());
                    vacant.insert(Arc::clone(&task));
                    break task;
                }
            }
        };

        let job = Job {
            file_id: id.clone(),
            task_id: task.task_id,
        };
        if let Err(send_err) = job_tx.try_send(job) {
            let reason = match send_err {
                TrySendError::Full(_) => Error::QueueFull,
                TrySendError::Disconnected(_) => Error::ShutDown,
            };
            self.shared.tasks.remove_if(&id, |_, t| t.task_id == task.task_id);
            self.shared.metrics.record_failed();
            tracing::warn!(file = %id, %reason, "cannot schedule analysis");
            let result = Arc::new(AnalysisResult::failed(id.clone(), reason.to_string()));
            if let Some(waiters) = task.take_waiters() {
                deliver(&waiters, &AnalysisEvent::Finished(result));
            }
            return AnalysisHandle::attached(id, rx);
        }
        self.shared.metrics.record_scheduled();
        tracing::debug!(file = %id, task = task.task_id.raw(), "scheduled analysis");
        AnalysisHandle::attached(id, rx)
    }

    fn failed_handle(&self, id: FileId, reason: String) -> AnalysisHandle {
        let result = Arc::new(AnalysisResult::failed(id.clone(), reason));
        AnalysisHandle::preloaded(id, vec![AnalysisEvent::Finished(result)])
    }

    /// Cancel outstanding work on `id`. Returns whether a task was found.
    ///
    /// A queued task is withdrawn immediately and its waiters observe
    /// [`AnalysisEvent::Cancelled`] at once. A running task stops at its
    /// next checkpoint; nothing it produced reaches the cache.
    pub fn cancel(&self, id: &FileId) -> bool {
        let Some(task) = self.shared.tasks.get(id).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        task.request_cancel();
        if task.state() == TaskState::Queued {
            self.shared.tasks.remove_if(id, |_, t| t.task_id == task.task_id);
            if let Some(waiters) = task.take_waiters() {
                self.shared.metrics.record_cancelled();
                tracing::debug!(file = %id, "cancelled queued analysis");
                deliver(&waiters, &AnalysisEvent::Cancelled { file_id: id.clone() });
            }
        } else {
            tracing::debug!(file = %id, "cancellation requested for running analysis");
        }
        true
    }

    /// Queue/running state of outstanding work on `id`, if any.
    pub fn task_state(&self, id: &FileId) -> Option<TaskState> {
        self.shared.tasks.get(id).map(|e| e.value().state())
    }

    /// Number of files with work outstanding.
    pub fn in_flight(&self) -> usize {
        self.shared.tasks.len()
    }

    /// Cached result for `id` without scheduling anything.
    pub fn cached_result(&self, id: &FileId) -> Option<Arc<AnalysisResult>> {
        self.shared.cache.get(id)
    }

    /// Drop the cached result for `id`. Returns whether one was present.
    pub fn invalidate(&self, id: &FileId) -> bool {
        self.shared.cache.invalidate(id)
    }

    pub fn clear_cache(&self) {
        self.shared.cache.clear();
    }

    /// Ids with cached results, in no particular order.
    pub fn cache_snapshot(&self) -> Vec<FileId> {
        self.shared.cache.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.shared.cache.stats()
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the worker pool and join it.
    ///
    /// Queued jobs are cancelled, the running ones stop at their next
    /// checkpoint, and every outstanding handle observes a terminal event.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        let Some(job_tx) = self.job_tx.take() else {
            return;
        };
        tracing::info!("shutting down analysis engine");
        self.shared.shutdown.store(true, Ordering::Release);
        drop(job_tx);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("analysis worker panicked during shutdown");
            }
        }
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("config", &self.config)
            .field("workers", &self.workers.len())
            .field("in_flight", &self.shared.tasks.len())
            .field("cached", &self.shared.cache.len())
            .finish()
    }
}

enum TaskOutcome {
    Finished(AnalysisResult),
    Cancelled,
}

fn worker_loop(shared: &Arc<Shared>, jobs: &Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        let Some(task) = shared.tasks.get(&job.file_id).map(|e| Arc::clone(e.value())) else {
            // Cancelled while queued; the entry is already gone.
            continue;
        };
        if task.task_id != job.task_id {
            // Stale message for an older run of this file.
            continue;
        }
        if shared.shutdown.load(Ordering::Acquire) {
            shared.tasks.remove_if(&job.file_id, |_, t| t.task_id == job.task_id);
            if let Some(waiters) = task.take_waiters() {
                shared.metrics.record_cancelled();
                deliver(
                    &waiters,
                    &AnalysisEvent::Cancelled {
                        file_id: job.file_id.clone(),
                    },
                );
            }
            continue;
        }
        run_task(shared, &job.file_id, &task);
    }
    tracing::trace!("analysis worker exiting");
}

fn run_task(shared: &Arc<Shared>, file_id: &FileId, task: &Arc<TaskEntry>) {
    task.mark_running();
    let started = Instant::now();

    let outcome = catch_unwind(AssertUnwindSafe(|| analyze_one(shared, file_id, task)))
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            tracing::error!(file = %file_id, %message, "worker fault during analysis");
            TaskOutcome::Finished(AnalysisResult::failed(
                file_id.clone(),
                Error::WorkerFault(message).to_string(),
            ))
        });

    match outcome {
        TaskOutcome::Cancelled => {
            shared.tasks.remove_if(file_id, |_, t| t.task_id == task.task_id);
            if let Some(waiters) = task.take_waiters() {
                shared.metrics.record_cancelled();
                tracing::debug!(file = %file_id, "analysis cancelled");
                deliver(
                    &waiters,
                    &AnalysisEvent::Cancelled {
                        file_id: file_id.clone(),
                    },
                );
            }
        }
        TaskOutcome::Finished(result) => {
            let result = Arc::new(result);
            // Cache before fan-out so a waiter that re-requests on seeing
            // the event hits the cache. Failures are skipped inside put().
            shared.cache.put(Arc::clone(&result));
            match &result.status {
                AnalysisStatus::Failure(reason) => {
                    shared.metrics.record_failed();
                    tracing::warn!(file = %file_id, %reason, "analysis failed");
                }
                status => {
                    shared.metrics.record_completed();
                    tracing::info!(
                        file = %file_id,
                        windows = result.energy.len(),
                        peak = result.peak_amplitude,
                        degraded = !status.is_success(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "analysis finished"
                    );
                }
            }
            shared.tasks.remove_if(file_id, |_, t| t.task_id == task.task_id);
            if let Some(waiters) = task.take_waiters() {
                deliver(&waiters, &AnalysisEvent::Finished(result));
            }
        }
    }
}

fn analyze_one(shared: &Shared, file_id: &FileId, task: &TaskEntry) -> TaskOutcome {
    if let Some(outcome) = interrupted(shared, file_id, task) {
        return outcome;
    }
    task.broadcast(&AnalysisEvent::Started {
        file_id: file_id.clone(),
    });
    tracing::debug!(file = %file_id, decoder = shared.decoder.name(), "decoding");

    let buffer = match shared.decoder.decode(file_id.path()) {
        Ok(buffer) => buffer,
        Err(error) => {
            return TaskOutcome::Finished(AnalysisResult::failed(
                file_id.clone(),
                error.to_string(),
            ));
        }
    };
    if let Some(outcome) = interrupted(shared, file_id, task) {
        return outcome;
    }
    task.broadcast(&AnalysisEvent::Decoded {
        file_id: file_id.clone(),
        duration_secs: buffer.duration_secs(),
    });

    let metrics = match analyze_buffer(&buffer, &shared.params) {
        Ok(metrics) => metrics,
        Err(error) => {
            return TaskOutcome::Finished(AnalysisResult::failed(
                file_id.clone(),
                Error::from(error).to_string(),
            ));
        }
    };
    if let Some(outcome) = interrupted(shared, file_id, task) {
        return outcome;
    }

    let mut degradations = Vec::new();
    if metrics.short_clip() {
        degradations.push("clip shorter than analysis window".to_string());
    }
    if metrics.stats.non_finite > 0 {
        degradations.push(format!(
            "{} non-finite samples zeroed",
            metrics.stats.non_finite
        ));
    }

    let tags = match shared.tag_reader.as_deref() {
        Some(reader) => {
            let tags = reader.read_tags(file_id.path());
            if tags.is_none() {
                tracing::debug!(file = %file_id, reader = reader.name(), "no tags found");
                degradations.push(Error::MetadataUnavailable.to_string());
            }
            tags
        }
        None => None,
    };
    if let Some(outcome) = interrupted(shared, file_id, task) {
        return outcome;
    }

    let tempo_bpm = match shared.tempo_estimator.as_deref() {
        Some(estimator) => {
            let tempo = estimator.estimate(&buffer);
            if tempo.is_none() {
                tracing::debug!(file = %file_id, estimator = estimator.name(), "no tempo estimate");
                degradations.push(Error::TempoUnavailable.to_string());
            }
            tempo
        }
        None => None,
    };
    if let Some(outcome) = interrupted(shared, file_id, task) {
        return outcome;
    }

    let status = if degradations.is_empty() {
        AnalysisStatus::Success
    } else {
        AnalysisStatus::PartialFailure(degradations.join("; "))
    };
    TaskOutcome::Finished(AnalysisResult {
        file_id: file_id.clone(),
        energy: metrics.energy,
        scale: metrics.scale,
        peak_amplitude: metrics.stats.peak,
        average_amplitude: metrics.stats.average,
        tempo_bpm,
        tags,
        status,
        computed_at: SystemTime::now(),
    })
}

/// Cancellation/deadline checkpoint between pipeline stages.
fn interrupted(shared: &Shared, file_id: &FileId, task: &TaskEntry) -> Option<TaskOutcome> {
    if task.is_cancelled() || shared.shutdown.load(Ordering::Acquire) {
        return Some(TaskOutcome::Cancelled);
    }
    if task.expired() {
        tracing::warn!(file = %file_id, "analysis deadline exceeded");
        return Some(TaskOutcome::Finished(AnalysisResult::failed(
            file_id.clone(),
            "timeout: analysis deadline exceeded",
        )));
    }
    None
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
