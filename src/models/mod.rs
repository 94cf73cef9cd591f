mod attempt;
mod generation;
mod message;

#[allow(unused_imports)]
pub use attempt::{AttemptOutcome, InjectionAttempt};
pub use generation::{GenerationCounter, GenerationId};
#[allow(unused_imports)]
pub use message::{StatusEnvelope, StatusMessage, TabId};
