//! Application layer - orchestrates the intake domain over the ports.
//!
//! - `SessionGate` serializes turns per session key
//! - `ConversationStore` owns session lookup, the single-active-session
//!   invariant, and the inactivity reset
//! - `HandleUtteranceHandler` runs one full turn: gate, load, apply,
//!   phrase, persist

mod conversation_store;
mod handle_utterance;
mod session_gate;

pub use conversation_store::ConversationStore;
pub use handle_utterance::{HandleUtteranceCommand, HandleUtteranceHandler, UtteranceReply};
pub use session_gate::SessionGate;
