use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const DEFAULT_PENDING_CAPACITY: usize = 512;

#[derive(Debug)]
struct InletState {
    ready: bool,
    closed: bool,
    pending: VecDeque<Vec<u8>>,
    outbound: VecDeque<Vec<u8>>,
    pending_capacity: usize,
    dropped: u64,
}

/// FIFO conduit between the audio producer and the recognition send loop.
///
/// Frames submitted before the socket handshake completes are held in a
/// bounded pending buffer; `mark_ready` moves them, in submission order, onto
/// the outbound queue ahead of any later frames. After `close`, submissions
/// are discarded.
#[derive(Debug, Clone)]
pub struct AudioInlet {
    state: Arc<Mutex<InletState>>,
}

impl AudioInlet {
    pub fn new() -> Self {
        Self::with_pending_capacity(DEFAULT_PENDING_CAPACITY)
    }

    pub fn with_pending_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(InletState {
                ready: false,
                closed: false,
                pending: VecDeque::new(),
                outbound: VecDeque::new(),
                pending_capacity: capacity,
                dropped: 0,
            })),
        }
    }

    /// Accept one audio frame. Never blocks and never fails from the
    /// caller's perspective.
    pub fn submit(&self, frame: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        if state.ready {
            state.outbound.push_back(frame);
            return;
        }
        if state.pending.len() >= state.pending_capacity {
            state.pending.pop_front();
            state.dropped += 1;
            warn!(
                "audio inlet pending buffer full ({} frames), dropping oldest",
                state.pending_capacity
            );
        }
        state.pending.push_back(frame);
    }

    /// Flush buffered frames onto the outbound queue and route all further
    /// submissions there directly.
    pub fn mark_ready(&self) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        if !state.pending.is_empty() {
            info!("flushing {} buffered audio frames", state.pending.len());
        }
        let mut pending = std::mem::take(&mut state.pending);
        state.outbound.append(&mut pending);
        state.ready = true;
    }

    /// Next frame for transmission, FIFO.
    pub fn pop(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().outbound.pop_front()
    }

    /// Discard all queued frames and reject future submissions.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.ready = false;
        state.pending.clear();
        state.outbound.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().unwrap().ready
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Frames currently awaiting transmission.
    pub fn outbound_len(&self) -> usize {
        self.state.lock().unwrap().outbound.len()
    }

    /// Frames buffered while waiting for the socket.
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Frames lost to pending-buffer overflow.
    pub fn dropped(&self) -> u64 {
        self.state.lock().unwrap().dropped
    }
}

impl Default for AudioInlet {
    fn default() -> Self {
        Self::new()
    }
}
