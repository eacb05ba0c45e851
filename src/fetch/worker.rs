//! Background thread for frame fetching.
//!
//! `FetchThread` owns a worker thread that services fetch requests against a
//! `FrameSource` and queues the outcomes. The owning event loop polls the
//! outcomes and feeds them back into the channel controllers, so controller
//! state is only ever touched from one thread.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use web_time::Instant;

use super::source::{FrameKey, FrameSource};
use crate::data::RawFrame;
use crate::error::FetchError;

/// Message sent to the fetch thread.
enum ThreadMessage {
    /// Fetch one frame
    Fetch(FrameKey),
    /// Shutdown the thread
    Shutdown,
}

/// Result of one fetch, posted back by the worker.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The frame that was fetched
    pub key: FrameKey,
    /// Frame data or the reason it could not be fetched
    pub result: Result<RawFrame, FetchError>,
    /// Time spent inside the frame source
    pub elapsed: Duration,
}

/// Manages a background thread for frame fetching.
pub struct FetchThread {
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for outcomes from the background thread
    result_rx: Receiver<FetchOutcome>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Outstanding requests per key
    pending: HashMap<FrameKey, usize>,
}

impl FetchThread {
    /// Spawn a new fetch thread serving requests from `source`.
    pub fn spawn(source: Arc<dyn FrameSource>) -> Result<Self, FetchError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<FetchOutcome>();

        let thread_handle = thread::Builder::new()
            .name("frame-fetch".to_string())
            .spawn(move || {
                log::debug!("Frame fetch thread started");
                Self::thread_loop(source.as_ref(), request_rx, result_tx);
                log::debug!("Frame fetch thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: HashMap::new(),
        })
    }

    /// Background thread main loop.
    fn thread_loop(
        source: &dyn FrameSource,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<FetchOutcome>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Fetch(key)) => {
                    let started = Instant::now();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| source.fetch(&key)))
                        .unwrap_or_else(|payload| {
                            Err(FetchError::SourcePanicked {
                                key: key.clone(),
                                message: panic_message(payload.as_ref()),
                            })
                        });
                    let elapsed = started.elapsed();

                    match &result {
                        Ok(frame) => log::debug!(
                            "Fetched {} ({}x{}) in {:?}",
                            key,
                            frame.width(),
                            frame.height(),
                            elapsed
                        ),
                        Err(e) => log::debug!("Fetch of {} failed after {:?}: {}", key, elapsed, e),
                    }

                    let outcome = FetchOutcome {
                        key,
                        result,
                        elapsed,
                    };
                    if result_tx.send(outcome).is_err() {
                        log::warn!("Result channel closed, fetch thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::trace!("Received shutdown signal");
                    break;
                }
                Err(RecvError) => {
                    log::trace!("Request channel closed, fetch thread exiting");
                    break;
                }
            }
        }
    }

    /// Queue a fetch of `key` on the background thread.
    pub fn request(&mut self, key: FrameKey) -> Result<(), FetchError> {
        self.request_tx
            .send(ThreadMessage::Fetch(key.clone()))
            .map_err(|_| FetchError::WorkerDisconnected)?;

        log::trace!("Sent fetch request for {}", key);
        *self.pending.entry(key).or_insert(0) += 1;
        Ok(())
    }

    /// Take one completed outcome, if any. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<FetchOutcome> {
        match self.result_rx.try_recv() {
            Ok(outcome) => {
                self.finish(&outcome.key);
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.abandon_one(),
        }
    }

    /// Block until the next outcome arrives.
    ///
    /// Returns `None` immediately when nothing is pending. If the worker has
    /// gone away, pending requests come back one by one as
    /// [`FetchError::WorkerDisconnected`].
    pub fn wait_result(&mut self) -> Option<FetchOutcome> {
        if self.pending.is_empty() {
            return None;
        }

        match self.result_rx.recv() {
            Ok(outcome) => {
                self.finish(&outcome.key);
                Some(outcome)
            }
            Err(RecvError) => self.abandon_one(),
        }
    }

    /// Fail one pending request after the worker has gone away.
    fn abandon_one(&mut self) -> Option<FetchOutcome> {
        let key = self.pending.keys().next().cloned()?;
        log::warn!("Fetch thread disconnected, failing pending fetch of {}", key);
        self.finish(&key);
        Some(FetchOutcome {
            key,
            result: Err(FetchError::WorkerDisconnected),
            elapsed: Duration::ZERO,
        })
    }

    fn finish(&mut self, key: &FrameKey) {
        if let Some(count) = self.pending.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(key);
            }
        }
    }

    /// Number of requests sent but not yet taken back.
    pub fn pending_count(&self) -> usize {
        self.pending.values().sum()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl Drop for FetchThread {
    fn drop(&mut self) {
        log::trace!("Shutting down frame fetch thread");

        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("Frame fetch thread panicked");
            }
        }
    }
}
