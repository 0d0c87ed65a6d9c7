//! Ports - interfaces between the intake domain and the outside world.
//!
//! Following hexagonal architecture, ports define the contracts the
//! application layer depends on; adapters implement them.
//!
//! - `CompletionProvider` - language-model collaborator that rephrases prompts
//! - `SessionStore` - persistence for intake sessions
//! - `MessageLog` - append-only transcript of every turn
//! - `IntakeFormRepository` - persistence for finished intake forms
//! - `ResponseCache` - short-lived cache for rephrased replies

mod completion_provider;
mod intake_forms;
mod message_log;
mod response_cache;
mod session_store;

pub use completion_provider::{CompletionError, CompletionProvider, PhrasingRequest};
pub use intake_forms::{IntakeForm, IntakeFormRepository};
pub use message_log::{MessageLog, MessageRecord};
pub use response_cache::ResponseCache;
pub use session_store::{SessionKey, SessionStore};
