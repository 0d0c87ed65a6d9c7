//! Completion provider adapters.

mod http_provider;
mod mock_provider;

pub use http_provider::{HttpCompletionProvider, HttpProviderConfig};
pub use mock_provider::{MockCompletionProvider, MockError, MockReply};
