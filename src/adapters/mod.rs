//! Adapters - implementations of the ports.
//!
//! - `ai` - completion providers (HTTP and a configurable mock)
//! - `memory` - in-memory stores for tests and single-process deployments
//! - `storage` - file-backed session persistence

pub mod ai;
pub mod memory;
pub mod storage;
