//! One-way observability channel
//!
//! The bridge reports lifecycle changes and callback failures as
//! [`BridgeEvent`]s. Every event is pushed with a non-blocking `try_send`
//! into a bounded crossbeam channel and forwarded to the configured
//! [`EventSink`] from a dedicated `bridge-events` thread. The frame handler
//! never performs I/O, and a sink may call back into the bridge (for example
//! `stop()` on a callback failure) without waiting on its own queue.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Capacity of the event channel
const EVENT_QUEUE_SIZE: usize = 256;

/// How often the dispatcher re-checks its stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Category of a bridge event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StreamOpened,
    StreamStarted,
    StreamStopped,
    StreamClosed,
    /// The DSP callback returned an error, panicked, or returned a bad buffer
    CallbackFailed,
    /// The backend reported a problem delivering or controlling audio
    StreamError,
    /// Releasing the hardware session failed
    TeardownFailed,
}

/// A single observability event
#[derive(Debug, Clone, Serialize)]
pub struct BridgeEvent {
    pub kind: EventKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl BridgeEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of bridge events
///
/// The sink runs on the dispatcher thread, never on the audio thread.
pub trait EventSink: Send + 'static {
    fn on_event(&mut self, event: &BridgeEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&BridgeEvent) + Send + 'static,
{
    fn on_event(&mut self, event: &BridgeEvent) {
        self(event)
    }
}

/// Default sink: forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, event: &BridgeEvent) {
        match event.kind {
            EventKind::CallbackFailed | EventKind::StreamError | EventKind::TeardownFailed => {
                tracing::error!(kind = ?event.kind, "{}", event.message)
            }
            _ => tracing::info!(kind = ?event.kind, "{}", event.message),
        }
    }
}

/// Cloneable sending side of the event channel
#[derive(Clone)]
pub struct EventEmitter {
    tx: Sender<BridgeEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventEmitter {
    /// Queue an event without blocking; overflow is counted, never waited on
    ///
    /// Safe from the real-time path and from lifecycle calls made by a sink
    /// on the dispatcher thread itself.
    pub fn emit(&self, kind: EventKind, message: impl Into<String>) {
        if self.tx.try_send(BridgeEvent::new(kind, message)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Events lost to a full or closed queue
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns the dispatcher thread that drains the event channel into a sink
pub struct EventDispatcher {
    emitter: EventEmitter,
    stop_flag: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl EventDispatcher {
    /// Spawn the dispatcher thread for `sink`
    pub fn spawn(sink: Box<dyn EventSink>) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<BridgeEvent>(EVENT_QUEUE_SIZE);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag_clone = Arc::clone(&stop_flag);

        let thread = std::thread::Builder::new()
            .name("bridge-events".into())
            .spawn(move || dispatch_loop(sink, rx, flag_clone))?;

        Ok(Self {
            emitter: EventEmitter {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            stop_flag,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    /// Deliver every queued event, then stop the thread. Idempotent.
    ///
    /// Called from the sink itself, it only flags the thread to exit.
    pub fn shutdown(&self) {
        self.stop_flag.store(true, Ordering::Release);
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(h) = handle {
            if h.thread().id() == std::thread::current().id() {
                return;
            }
            if h.join().is_err() {
                tracing::error!("Event dispatcher thread panicked");
            }
        }
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch_loop(mut sink: Box<dyn EventSink>, rx: Receiver<BridgeEvent>, stop_flag: Arc<AtomicBool>) {
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => deliver(sink.as_mut(), &event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if stop_flag.load(Ordering::Acquire) {
            // Flush whatever is already queued
            while let Ok(event) = rx.try_recv() {
                deliver(sink.as_mut(), &event);
            }
            break;
        }
    }
}

fn deliver(sink: &mut dyn EventSink, event: &BridgeEvent) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.on_event(event)));
    if result.is_err() {
        tracing::error!(kind = ?event.kind, "Event sink panicked");
    }
}
