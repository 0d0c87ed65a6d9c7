//! In-memory adapters.
//!
//! Used by the test suite and by single-process deployments where the
//! session universe fits in RAM. Each store supports error injection so
//! resilience paths can be exercised.

mod intake_forms;
mod message_log;
mod response_cache;
mod session_store;

pub use intake_forms::InMemoryIntakeForms;
pub use message_log::InMemoryMessageLog;
pub use response_cache::InMemoryResponseCache;
pub use session_store::InMemorySessionStore;
