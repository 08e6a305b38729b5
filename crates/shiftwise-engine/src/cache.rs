//! Caching layer for processed constraints.
//!
//! Constraint processing is deterministic, so identical constraint sets on
//! identical problems can reuse a previous result. Entries expire after a
//! short TTL so edited constraint files are picked up quickly.

use std::time::Duration;

use moka::future::Cache;

use shiftwise_core::{fingerprint, ProblemContext, ProcessedConstraints, RawConstraints};

/// Cache of processed constraints keyed by content fingerprint.
pub struct ConstraintCache {
    cache: Cache<u64, ProcessedConstraints>,
}

impl ConstraintCache {
    /// Create a cache with the given capacity and entry lifetime.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Processed constraints for this exact constraint set and problem, if
    /// still cached.
    pub async fn get(&self, raw: &RawConstraints, ctx: &ProblemContext) -> Option<ProcessedConstraints> {
        self.cache.get(&fingerprint(raw, ctx)).await
    }

    /// Stores a processing result.
    pub async fn insert(
        &self,
        raw: &RawConstraints,
        ctx: &ProblemContext,
        processed: ProcessedConstraints,
    ) {
        self.cache.insert(fingerprint(raw, ctx), processed).await;
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ConstraintCache {
    fn default() -> Self {
        Self::new(256, Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shiftwise_core::{IntegrationLayer, StaffGroup};

    fn fixture() -> (RawConstraints, ProblemContext) {
        let mut raw = RawConstraints::default();
        raw.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        let ctx = ProblemContext::analyze(
            vec!["a".into(), "b".into()],
            (0..3)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
            &raw,
        );
        (raw, ctx)
    }

    #[tokio::test]
    async fn test_cache_hit_after_insert() {
        let cache = ConstraintCache::default();
        let (raw, ctx) = fixture();

        assert!(cache.get(&raw, &ctx).await.is_none());

        let processed = IntegrationLayer::new().process(&raw, &ctx);
        cache.insert(&raw, &ctx, processed).await;

        let cached = cache.get(&raw, &ctx).await;
        assert!(cached.is_some());
        assert!(cached.unwrap().constraint_count() > 0);
    }

    #[tokio::test]
    async fn test_different_constraints_miss() {
        let cache = ConstraintCache::default();
        let (raw, ctx) = fixture();
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        cache.insert(&raw, &ctx, processed).await;

        let mut other = raw.clone();
        other.staff_groups[0].members.push("c".into());
        assert!(cache.get(&other, &ctx).await.is_none());
    }
}
