//! Response cache port.
//!
//! Rephrased replies for common prompts (the greeting, the stage questions)
//! are cached per tenant so repeat callers don't cost a provider round trip.
//! Cache failures are soft: callers log and continue without the cache.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Short-lived cache of rephrased replies, keyed by an opaque string the
/// caller derives from (tenant, stage, base reply).
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// The cached phrasing, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a phrasing under the configured TTL.
    async fn put(&self, key: &str, value: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_cache_is_object_safe() {
        fn _accepts_dyn(_cache: &dyn ResponseCache) {}
    }
}
