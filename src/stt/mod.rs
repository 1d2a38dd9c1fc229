//! Streaming speech recognition: the provider socket, the audio conduit
//! that feeds it, and sentence accumulation over its transcript output.

pub mod accumulator;
pub mod corrector;
pub mod inlet;
pub mod link;
pub mod messages;

pub use accumulator::{BatchLimits, FlushTimer, SentenceAccumulator, SentenceBatch};
pub use corrector::TextCorrector;
pub use inlet::AudioInlet;
pub use link::{LinkError, LinkState, RecognitionLink};
pub use messages::{Alternative, StreamingResult};
