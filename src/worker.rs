// Background tracing. Tracing a big photo can take seconds, so it runs on its
// own thread and the caller races the result against a deadline. If the
// deadline wins, the caller gets the blocky fallback instead and the late
// result is dropped on the floor.
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::vectorize::{self, TraceOptions};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq)]
pub enum TraceOutcome {
    Traced(String),
    /// The deadline passed; this is [`vectorize::coarse_svg`] output.
    Fallback(String),
}

impl TraceOutcome {
    pub fn svg(&self) -> &str {
        match self {
            TraceOutcome::Traced(svg) | TraceOutcome::Fallback(svg) => svg,
        }
    }

    pub fn into_svg(self) -> String {
        match self {
            TraceOutcome::Traced(svg) | TraceOutcome::Fallback(svg) => svg,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TraceOutcome::Fallback(_))
    }
}

pub struct TraceJob {
    image: Arc<RgbaImage>,
    alpha_threshold: u8,
    rx: Receiver<String>,
    started: Instant,
    timeout: Duration,
}

/// Start tracing `image` on a worker thread.
pub fn spawn_vectorize(image: Arc<RgbaImage>, opts: TraceOptions, timeout: Duration) -> Result<TraceJob> {
    let (tx, rx) = mpsc::channel();
    let worker_image = Arc::clone(&image);
    let alpha_threshold = opts.alpha_threshold;

    thread::Builder::new().name("trace-worker".into()).spawn(move || {
        let t0 = Instant::now();
        let svg = vectorize::vectorize(&worker_image, &opts);
        info!("trace finished in {:.2?}", t0.elapsed());
        // Receiver gone means the caller already fell back.
        tx.send(svg).ok();
    })?;

    Ok(TraceJob { image, alpha_threshold, rx, started: Instant::now(), timeout })
}

impl TraceJob {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn fallback(&self) -> TraceOutcome {
        warn!("trace exceeded {:?}, using coarse fallback", self.timeout);
        TraceOutcome::Fallback(vectorize::coarse_svg(&self.image, self.alpha_threshold))
    }

    /// Non-blocking check for the editor loop. `None` while still running.
    pub fn poll(&self) -> Option<Result<TraceOutcome>> {
        match self.rx.try_recv() {
            Ok(svg) => Some(Ok(TraceOutcome::Traced(svg))),
            Err(TryRecvError::Empty) if self.elapsed() >= self.timeout => Some(Ok(self.fallback())),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_died())),
        }
    }

    /// Block until the trace lands or the deadline passes.
    pub fn wait(self) -> Result<TraceOutcome> {
        let remaining = self.timeout.saturating_sub(self.elapsed());
        match self.rx.recv_timeout(remaining) {
            Ok(svg) => Ok(TraceOutcome::Traced(svg)),
            Err(RecvTimeoutError::Timeout) => Ok(self.fallback()),
            Err(RecvTimeoutError::Disconnected) => Err(worker_died()),
        }
    }
}

fn worker_died() -> Error {
    Error::Tracing("trace worker stopped without a result".into())
}
