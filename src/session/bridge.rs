use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use super::events::SessionEvent;

/// How long `deliver` blocks waiting for the primary sink before falling
/// back to the holding queue.
const READY_WAIT: Duration = Duration::from_secs(5);
/// Events held for replay while no sink is attached.
const HOLD_CAPACITY: usize = 256;

struct BridgeState {
    sink: Option<mpsc::UnboundedSender<SessionEvent>>,
    held: VecDeque<SessionEvent>,
    dropped: u64,
}

/// Carries events from session threads into the primary runtime.
///
/// `deliver` is callable from any thread. Events delivered from the same
/// session arrive in delivery order; events raised before the primary sink
/// is attached are held (bounded) and replayed, in order, on attach.
pub struct DispatchBridge {
    state: Mutex<BridgeState>,
    ready: Condvar,
    ready_wait: Duration,
}

impl DispatchBridge {
    pub fn new() -> Self {
        Self::with_ready_wait(READY_WAIT)
    }

    /// Bridge with a custom ready cap, for callers that cannot afford the
    /// default block.
    pub fn with_ready_wait(ready_wait: Duration) -> Self {
        Self {
            state: Mutex::new(BridgeState {
                sink: None,
                held: VecDeque::new(),
                dropped: 0,
            }),
            ready: Condvar::new(),
            ready_wait,
        }
    }

    /// Hand an event to the primary runtime. Blocks up to the ready cap if
    /// no sink is attached yet, then falls back to the holding queue
    /// (oldest dropped with a warning when full).
    pub fn deliver(&self, event: SessionEvent) {
        let mut state = self.state.lock().unwrap();
        if state.sink.is_none() {
            let (guard, _timeout) = self
                .ready
                .wait_timeout_while(state, self.ready_wait, |s| s.sink.is_none())
                .unwrap();
            state = guard;
        }

        if let Some(sink) = state.sink.clone() {
            drop(state);
            if sink.send(event).is_err() {
                warn!("dispatch sink dropped, discarding event");
            }
            return;
        }

        if state.held.len() >= HOLD_CAPACITY {
            state.held.pop_front();
            state.dropped += 1;
            warn!("dispatch holding queue full, dropping oldest event");
        }
        state.held.push_back(event);
    }

    /// Attach the primary sink, replaying held events in order first.
    pub fn attach(&self, sink: mpsc::UnboundedSender<SessionEvent>) {
        let mut state = self.state.lock().unwrap();
        while let Some(event) = state.held.pop_front() {
            if sink.send(event).is_err() {
                warn!("dispatch sink dropped during replay");
                break;
            }
        }
        state.sink = Some(sink);
        self.ready.notify_all();
    }

    /// Create the primary event channel and attach its sender.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach(tx);
        rx
    }

    /// Events currently waiting for a sink.
    pub fn held_len(&self) -> usize {
        self.state.lock().unwrap().held.len()
    }

    /// Events dropped from the holding queue since startup.
    pub fn dropped(&self) -> u64 {
        self.state.lock().unwrap().dropped
    }
}

impl Default for DispatchBridge {
    fn default() -> Self {
        Self::new()
    }
}
