use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::bridge::DispatchBridge;
use super::events::SessionEvent;
use crate::config::RecognitionConfig;
use crate::stt::{AudioInlet, BatchLimits, LinkState, RecognitionLink, SentenceAccumulator, SentenceBatch};

/// Handle to a running per-room session thread.
pub struct SessionHandle {
    shutdown: watch::Sender<bool>,
    link_state: watch::Receiver<LinkState>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Ask the session's loops to wind down. Returns immediately.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the session thread to exit. Blocking; call off the
    /// primary runtime.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("session thread panicked");
            }
        }
    }

    pub fn link_state(&self) -> LinkState {
        *self.link_state.borrow()
    }
}

/// Spawn the dedicated execution context for one room: an OS thread running
/// its own event loop hosting the recognition socket and the deferred-flush
/// timers, isolated from the primary runtime.
pub fn spawn_session(
    room_id: String,
    recognition: RecognitionConfig,
    limits: BatchLimits,
    inlet: AudioInlet,
    bridge: Arc<DispatchBridge>,
) -> Result<SessionHandle> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (link, link_state) = RecognitionLink::new(room_id.clone(), recognition);

    let thread = thread::Builder::new()
        .name(format!("session-{}", room_id))
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("failed to build session runtime for room {}: {}", room_id, e);
                    bridge.deliver(SessionEvent::LinkClosed {
                        room_id,
                        reason: format!("session runtime: {}", e),
                    });
                    return;
                }
            };
            runtime.block_on(session_main(room_id, link, inlet, shutdown_rx, bridge, limits));
        })
        .context("failed to spawn session thread")?;

    Ok(SessionHandle {
        shutdown: shutdown_tx,
        link_state,
        thread: Some(thread),
    })
}

async fn session_main(
    room_id: String,
    link: RecognitionLink,
    inlet: AudioInlet,
    shutdown: watch::Receiver<bool>,
    bridge: Arc<DispatchBridge>,
    limits: BatchLimits,
) {
    let accumulator = Arc::new(Mutex::new(SentenceAccumulator::new(limits)));

    let scheduler = {
        let bridge = bridge.clone();
        let room_id = room_id.clone();
        FlushScheduler::new(
            accumulator.clone(),
            move |batch| deliver_batch(&bridge, &room_id, batch),
        )
    };

    let on_transcript = {
        let bridge = bridge.clone();
        let room_id = room_id.clone();
        let accumulator = accumulator.clone();
        let scheduler = scheduler.clone();
        move |text: String| {
            bridge.deliver(SessionEvent::Transcript {
                room_id: room_id.clone(),
                text: text.clone(),
                timestamp: Utc::now(),
            });

            let batch = accumulator.lock().unwrap().ingest(&text);
            if let Some(batch) = batch {
                deliver_batch(&bridge, &room_id, batch);
            }
            scheduler.rearm();
        }
    };

    let result = link.run(inlet.clone(), shutdown, on_transcript).await;
    scheduler.cancel();
    inlet.close();

    let reason = match result {
        Ok(()) => {
            info!("session for room {} ended", room_id);
            "room closed".to_string()
        }
        Err(e) => {
            error!("session for room {} failed: {}", room_id, e);
            e.to_string()
        }
    };

    bridge.deliver(SessionEvent::LinkClosed { room_id, reason });
}

fn deliver_batch(bridge: &DispatchBridge, room_id: &str, batch: SentenceBatch) {
    bridge.deliver(SessionEvent::BatchReady {
        room_id: room_id.to_string(),
        batch_id: short_id(),
        korean_text: batch.text,
        context: batch.context,
        timestamp: Utc::now(),
    });
}

/// Short unique token for correlating a provisional translation notice
/// with its resolved result.
fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

struct SchedulerInner {
    accumulator: Arc<Mutex<SentenceAccumulator>>,
    on_batch: Box<dyn Fn(SentenceBatch) + Send + Sync>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Arms the accumulator's deferred-flush timer on the session runtime.
/// At most one timer is live; rearming cancels the previous one.
#[derive(Clone)]
pub struct FlushScheduler {
    inner: Arc<SchedulerInner>,
}

impl FlushScheduler {
    pub fn new<F>(accumulator: Arc<Mutex<SentenceAccumulator>>, on_batch: F) -> Self
    where
        F: Fn(SentenceBatch) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SchedulerInner {
                accumulator,
                on_batch: Box::new(on_batch),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Cancel any live timer and arm the one the accumulator currently
    /// requests, if any.
    pub fn rearm(&self) {
        let mut timer = self.inner.timer.lock().unwrap();
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let timeout = self.inner.accumulator.lock().unwrap().armed_timeout();
        if let Some(timeout) = timeout {
            let inner = self.inner.clone();
            *timer = Some(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                // A flush that already happened leaves nothing to do here.
                let batch = inner.accumulator.lock().unwrap().flush();
                if let Some(batch) = batch {
                    (inner.on_batch)(batch);
                }
            }));
        }
    }

    /// Cancel any live timer without flushing.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}
