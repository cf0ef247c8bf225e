//! Lost-update-free counters stored as player fields

use crate::context::ServiceContext;
use loyalty_core::{Error, PlayerId, Result, VersionedField};
use tracing::{debug, warn};

/// Decimal counter value; absent or garbage reads as 0
pub fn parse_counter(field: Option<&VersionedField>) -> u64 {
    match field {
        None => 0,
        Some(field) => field.value.trim().parse().unwrap_or_else(|_| {
            warn!(value = %field.value, "counter field is not a number, reading as 0");
            0
        }),
    }
}

/// Add one to `key` on `player` with a compare-and-set retry loop.
/// Returns the new value.
pub async fn increment_counter(ctx: &ServiceContext, player: &PlayerId, key: &str) -> Result<u64> {
    let backend = ctx.backend();
    let attempts = ctx.config().max_write_retries.max(1);

    for attempt in 1..=attempts {
        let field = ctx
            .bounded("get_field", backend.get_field(player, key))
            .await?;
        let next = parse_counter(field.as_ref()) + 1;
        let expected = field.map(|f| f.version);

        let written = ctx
            .bounded(
                "compare_and_set_field",
                backend.compare_and_set_field(player, key, &next.to_string(), expected),
            )
            .await?;
        if written {
            return Ok(next);
        }
        debug!(player = %player, key, attempt, "counter changed concurrently, retrying");
    }

    Err(Error::Conflict(format!(
        "{} for {} still contended after {} attempts",
        key, player, attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::EngineConfig;
    use crate::testing::MemoryBackend;
    use loyalty_core::PlayerStore;
    use std::sync::Arc;

    fn ctx(backend: Arc<MemoryBackend>) -> ServiceContext {
        ServiceContext::new(backend, Arc::new(SystemClock), EngineConfig::default())
    }

    #[test]
    fn test_parse_counter() {
        let field = |value: &str| VersionedField {
            value: value.to_string(),
            version: 1,
        };
        assert_eq!(parse_counter(None), 0);
        assert_eq!(parse_counter(Some(&field("12"))), 12);
        assert_eq!(parse_counter(Some(&field("twelve"))), 0);
    }

    #[tokio::test]
    async fn test_concurrent_increments_all_land() {
        let backend = Arc::new(MemoryBackend::interleaved());
        let player = backend.add_player("root");
        let ctx = ctx(backend.clone());

        let (a, b, c, d) = tokio::join!(
            increment_counter(&ctx, &player, "n"),
            increment_counter(&ctx, &player, "n"),
            increment_counter(&ctx, &player, "n"),
            increment_counter(&ctx, &player, "n"),
        );
        let mut values = vec![a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
        values.sort();

        assert_eq!(values, vec![1, 2, 3, 4]);
        assert_eq!(backend.field(&player, "n").as_deref(), Some("4"));
    }

    async fn naive_increment(backend: &MemoryBackend, player: &PlayerId) {
        let current = backend.get_field(player, "n").await.unwrap();
        let next = parse_counter(current.as_ref()) + 1;
        backend.set_field(player, "n", &next.to_string()).await.unwrap();
    }

    // Known race: a plain read-then-overwrite loses updates under the same
    // interleaving, which is why counters go through compare-and-set.
    #[tokio::test]
    async fn test_naive_read_modify_write_loses_updates() {
        let backend = Arc::new(MemoryBackend::interleaved());
        let player = backend.add_player("root");

        tokio::join!(
            naive_increment(&backend, &player),
            naive_increment(&backend, &player)
        );

        assert_eq!(backend.field(&player, "n").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_gives_up_with_conflict() {
        let backend = Arc::new(MemoryBackend::new());
        let player = backend.add_player("root");
        backend.fail("compare_and_set_field");

        let err = increment_counter(&ctx(backend), &player, "n").await.unwrap_err();
        assert!(err.is_transient());
    }
}
