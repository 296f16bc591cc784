//! # Analysis Worker
//!
//! Runs capture and analysis on a dedicated thread and streams readings back
//! over a crossbeam channel.
//!
//! ## Loop
//! 1. Open the capture source on the worker thread
//! 2. Build a [`PitchAnalyzer`] for the rate the source actually delivers
//! 3. Read one block, analyze it, send the reading
//! 4. Wait for the refresh interval, or stop early on shutdown
//!
//! The pacing in step 4 sets the output cadence; the analyzer itself has no
//! notion of time.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info};

use crate::{
    AnalysisResult, PitchAnalyzer,
    audio::CaptureSource,
    config::TunerConfig,
    error::CaptureError,
};

/// Events buffered between the worker and a slow consumer before the worker
/// waits.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Messages sent from the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// The source opened; readings are analyzed at this rate.
    Started { sample_rate: u32 },
    /// One analyzed block; `None` means no clear tone.
    Reading(Option<AnalysisResult>),
    /// The source failed. No further events follow.
    Failed(CaptureError),
    /// A finite source ran out of audio. No further events follow.
    Finished,
}

/// Block size and cadence for the worker loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSettings {
    pub buffer_size: usize,
    pub refresh_interval: Duration,
}

impl From<&TunerConfig> for WorkerSettings {
    fn from(config: &TunerConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            refresh_interval: config.refresh_interval(),
        }
    }
}

/// Handle to the worker thread.
///
/// Dropping the handle signals shutdown and joins the thread.
#[derive(Debug)]
pub struct AnalysisWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Spawns the worker thread.
    ///
    /// `open_source` runs on the new thread, so the source itself does not
    /// need to be `Send`.
    ///
    /// # Returns
    /// * The worker handle and the receiving end of its event channel, which
    ///   holds at most [`EVENT_QUEUE_DEPTH`] undelivered events
    pub fn spawn<S, F>(settings: WorkerSettings, open_source: F) -> (Self, Receiver<WorkerEvent>)
    where
        S: CaptureSource + 'static,
        F: FnOnce() -> Result<S, CaptureError> + Send + 'static,
    {
        let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::spawn(move || {
            info!("Analysis thread starting");
            match open_source() {
                Ok(source) => run_loop(source, settings, event_tx, shutdown_rx),
                Err(e) => {
                    error!("Failed to open capture source: {}", e);
                    emit(&event_tx, &shutdown_rx, WorkerEvent::Failed(e));
                }
            }
            info!("Analysis thread finished");
        });

        (
            Self {
                shutdown_tx,
                thread_handle: Some(thread_handle),
            },
            event_rx,
        )
    }

    /// Signals the worker to stop and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.shutdown_tx.try_send(());
            if handle.join().is_err() {
                error!("Analysis thread panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sends one event, giving up if shutdown is signalled while the queue is full.
///
/// Returns `false` when the loop should stop.
fn emit(events: &Sender<WorkerEvent>, shutdown_rx: &Receiver<()>, event: WorkerEvent) -> bool {
    crossbeam_channel::select! {
        send(events, event) -> res => res.is_ok(),
        recv(shutdown_rx) -> _ => {
            info!("Received shutdown signal while the event queue was full");
            false
        },
    }
}

fn run_loop<S: CaptureSource>(
    mut source: S,
    settings: WorkerSettings,
    events: Sender<WorkerEvent>,
    shutdown_rx: Receiver<()>,
) {
    let sample_rate = source.sample_rate();
    let analyzer = match PitchAnalyzer::new(sample_rate) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            error!("Capture source reported an unusable rate: {}", e);
            emit(
                &events,
                &shutdown_rx,
                WorkerEvent::Failed(CaptureError::BadValue(e.to_string())),
            );
            return;
        }
    };
    if !emit(&events, &shutdown_rx, WorkerEvent::Started { sample_rate }) {
        return;
    }
    info!(
        "Analyzing {}-sample blocks at {} Hz every {:?}",
        settings.buffer_size, sample_rate, settings.refresh_interval
    );

    let mut block = vec![0i16; settings.buffer_size.max(1)];
    loop {
        let n = match source.read(&mut block) {
            Ok(n) => n,
            Err(e) => {
                error!("Capture failed: {}", e);
                emit(&events, &shutdown_rx, WorkerEvent::Failed(e));
                return;
            }
        };

        if n > 0 {
            let reading = analyzer.analyze(&block[..n]);
            debug!("{} samples -> {:?}", n, reading);
            if !emit(&events, &shutdown_rx, WorkerEvent::Reading(reading)) {
                info!("Stopping after the last reading");
                return;
            }
        }

        if source.is_exhausted() {
            emit(&events, &shutdown_rx, WorkerEvent::Finished);
            return;
        }

        crossbeam_channel::select! {
            recv(shutdown_rx) -> _ => {
                info!("Received shutdown signal");
                return;
            },
            default(settings.refresh_interval) => {},
        }
    }
}
