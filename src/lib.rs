pub mod config;
pub mod http;
pub mod room;
pub mod session;
pub mod stt;
pub mod translate;

pub use config::Config;
pub use http::{create_router, AppState};
pub use room::{Room, RoomRegistry, RoomSnapshot, RoomStatus};
pub use session::{
    run_event_pump, DispatchBridge, FlushScheduler, OutboundMessage, SessionEvent, SessionHandle,
};
pub use stt::{
    AudioInlet, BatchLimits, FlushTimer, LinkError, LinkState, RecognitionLink,
    SentenceAccumulator, SentenceBatch, TextCorrector,
};
pub use translate::Translator;
