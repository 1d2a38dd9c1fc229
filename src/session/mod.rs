//! Per-room session orchestration
//!
//! Each room runs its recognition socket and deferred-flush timers on a
//! dedicated thread with its own event loop; the dispatch bridge carries
//! the resulting events back into the primary runtime, where the pump
//! translates batches and notifies listeners.

mod bridge;
mod coordinator;
mod events;
mod pump;

pub use bridge::DispatchBridge;
pub use coordinator::{spawn_session, FlushScheduler, SessionHandle};
pub use events::{OutboundMessage, SessionEvent};
pub use pump::{run_event_pump, FAILED_TRANSLATION, PENDING_TRANSLATION};
