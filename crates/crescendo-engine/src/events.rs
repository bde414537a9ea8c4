//! Per-request progress events and the handle that receives them.

use crate::error::{Error, Result};
use crate::file_id::FileId;
use crate::result::AnalysisResult;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Progress notification for one analysis request.
///
/// Every request observes at most one terminal event
/// ([`Finished`](AnalysisEvent::Finished) or
/// [`Cancelled`](AnalysisEvent::Cancelled)), after which its channel closes.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// A worker picked the file up.
    Started { file_id: FileId },
    /// Decoding succeeded; analysis is running.
    Decoded { file_id: FileId, duration_secs: f32 },
    /// The run ended with a result (any status, including failure).
    Finished(Arc<AnalysisResult>),
    /// The request was cancelled before producing a result.
    Cancelled { file_id: FileId },
}

impl AnalysisEvent {
    /// Whether this event ends the request.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisEvent::Finished(_) | AnalysisEvent::Cancelled { .. }
        )
    }
}

/// Where a request currently stands, as seen through its handle.
#[derive(Debug, Clone)]
pub enum RequestStatus {
    /// Queued, no worker has started it yet.
    Pending,
    /// A worker is on it.
    Running,
    /// Finished with this result.
    Completed(Arc<AnalysisResult>),
    /// Cancelled before completion.
    Cancelled,
}

/// Caller-side handle for one analysis request.
///
/// Multiple handles may observe the same underlying run when requests for
/// one file coalesce; each handle owns its own event channel and sees the
/// full event sequence.
pub struct AnalysisHandle {
    file_id: FileId,
    rx: Receiver<AnalysisEvent>,
    started: bool,
    terminal: Option<RequestStatus>,
}

impl AnalysisHandle {
    pub(crate) fn attached(file_id: FileId, rx: Receiver<AnalysisEvent>) -> Self {
        Self {
            file_id,
            rx,
            started: false,
            terminal: None,
        }
    }

    /// A handle whose outcome is already known (cache hits, failed stats).
    /// The events are observable through the channel as usual.
    pub(crate) fn preloaded(file_id: FileId, events: Vec<AnalysisEvent>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        for event in events {
            let _ = tx.send(event);
        }
        Self::attached(file_id, rx)
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// Pull the next pending event without blocking.
    pub fn try_next(&mut self) -> Option<AnalysisEvent> {
        match self.rx.try_recv() {
            Ok(event) => {
                self.record(&event);
                Some(event)
            }
            Err(_) => None,
        }
    }

    /// Drain pending events and report the current status.
    pub fn poll(&mut self) -> RequestStatus {
        while self.try_next().is_some() {}
        match &self.terminal {
            Some(status) => status.clone(),
            None if self.started => RequestStatus::Running,
            None => RequestStatus::Pending,
        }
    }

    /// Block until the run ends and return its result.
    ///
    /// The result is returned whatever its status; inspect
    /// [`AnalysisResult::status`] for failures. Cancellation surfaces as
    /// [`Error::Cancelled`].
    pub fn wait_result(&mut self) -> Result<Arc<AnalysisResult>> {
        loop {
            if let Some(outcome) = self.terminal_outcome() {
                return outcome;
            }
            match self.rx.recv() {
                Ok(event) => self.record(&event),
                Err(_) => return Err(Error::ChannelClosed),
            }
        }
    }

    /// Like [`wait_result`](AnalysisHandle::wait_result) but gives up after
    /// `timeout`.
    pub fn wait_result_timeout(&mut self, timeout: Duration) -> Result<Arc<AnalysisResult>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = self.terminal_outcome() {
                return outcome;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) => self.record(&event),
                Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(Error::ChannelClosed),
            }
        }
    }

    /// The raw event stream, for callers integrating with their own select
    /// loop. Events consumed here bypass the handle's bookkeeping.
    pub fn events(&self) -> &Receiver<AnalysisEvent> {
        &self.rx
    }

    fn record(&mut self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::Started { .. } | AnalysisEvent::Decoded { .. } => {
                self.started = true;
            }
            AnalysisEvent::Finished(result) => {
                self.terminal = Some(RequestStatus::Completed(Arc::clone(result)));
            }
            AnalysisEvent::Cancelled { .. } => {
                self.terminal = Some(RequestStatus::Cancelled);
            }
        }
    }

    fn terminal_outcome(&self) -> Option<Result<Arc<AnalysisResult>>> {
        match &self.terminal {
            Some(RequestStatus::Completed(result)) => Some(Ok(Arc::clone(result))),
            Some(RequestStatus::Cancelled) => Some(Err(Error::Cancelled)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AnalysisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisHandle")
            .field("file_id", &self.file_id)
            .field("started", &self.started)
            .field("terminal", &self.terminal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AnalysisStatus;
    use std::time::SystemTime;

    fn test_id() -> FileId {
        FileId::new("/tmp/handle-test.wav", SystemTime::UNIX_EPOCH)
    }

    fn success_result() -> Arc<AnalysisResult> {
        let mut r = AnalysisResult::failed(test_id(), "placeholder");
        r.status = AnalysisStatus::Success;
        Arc::new(r)
    }

    #[test]
    fn poll_tracks_progress() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut handle = AnalysisHandle::attached(test_id(), rx);

        assert!(matches!(handle.poll(), RequestStatus::Pending));

        tx.send(AnalysisEvent::Started { file_id: test_id() }).unwrap();
        assert!(matches!(handle.poll(), RequestStatus::Running));

        tx.send(AnalysisEvent::Finished(success_result())).unwrap();
        assert!(matches!(handle.poll(), RequestStatus::Completed(_)));
    }

    #[test]
    fn wait_result_returns_finished_result() {
        let result = success_result();
        let mut handle = AnalysisHandle::preloaded(
            test_id(),
            vec![
                AnalysisEvent::Started { file_id: test_id() },
                AnalysisEvent::Finished(Arc::clone(&result)),
            ],
        );
        let got = handle.wait_result().unwrap();
        assert!(Arc::ptr_eq(&got, &result));
        // The outcome stays available after the channel closed.
        assert!(handle.wait_result().is_ok());
    }

    #[test]
    fn wait_result_surfaces_cancellation() {
        let mut handle = AnalysisHandle::preloaded(
            test_id(),
            vec![AnalysisEvent::Cancelled { file_id: test_id() }],
        );
        assert!(matches!(handle.wait_result(), Err(Error::Cancelled)));
    }

    #[test]
    fn dropped_sender_without_terminal_is_an_error() {
        let mut handle = AnalysisHandle::preloaded(test_id(), vec![]);
        assert!(matches!(handle.wait_result(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn wait_result_timeout_expires() {
        let (_tx, rx) = crossbeam_channel::unbounded::<AnalysisEvent>();
        let mut handle = AnalysisHandle::attached(test_id(), rx);
        let err = handle
            .wait_result_timeout(Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn finished_event_is_terminal() {
        assert!(AnalysisEvent::Finished(success_result()).is_terminal());
        assert!(AnalysisEvent::Cancelled { file_id: test_id() }.is_terminal());
        assert!(!AnalysisEvent::Started { file_id: test_id() }.is_terminal());
    }
}
