//! Process-scoped cache of currency rates keyed by `"{base}_{dest}"`.
//!
//! Each pair owns an async slot, so concurrent callers asking for the same
//! pair wait on a single fetch instead of issuing their own. Entries never
//! expire unless a TTL is configured.

use crate::constants::rate_key;
use crate::error::SalaryError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

type Slot = Arc<tokio::sync::Mutex<Option<CachedRate>>>;

/// Where a rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Fetched,
}

#[derive(Debug)]
pub struct RateCache {
    slots: Mutex<HashMap<String, Slot>>,
    ttl: Option<Duration>,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RateCache {
    /// `ttl` of `None` trusts a rate for the lifetime of the process
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(Some(ttl))
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    fn is_fresh(&self, entry: &CachedRate) -> bool {
        match self.ttl {
            Some(ttl) => entry.fetched_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Cached rate for the pair, if present and fresh. Never fetches.
    pub async fn get(&self, base_code: &str, dest_code: &str) -> Option<f64> {
        let slot = self.slot(&rate_key(base_code, dest_code));
        let entry = slot.lock().await;
        (*entry).filter(|e| self.is_fresh(e)).map(|e| e.rate)
    }

    pub async fn insert(&self, base_code: &str, dest_code: &str, rate: f64) {
        let slot = self.slot(&rate_key(base_code, dest_code));
        *slot.lock().await = Some(CachedRate {
            rate,
            fetched_at: Instant::now(),
        });
    }

    /// Return the cached rate for the pair or run `fetch` and cache its result.
    ///
    /// The pair's slot stays locked while `fetch` runs. A failed fetch is not
    /// cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        base_code: &str,
        dest_code: &str,
        fetch: F,
    ) -> Result<(f64, RateSource), SalaryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<f64, SalaryError>>,
    {
        let slot = self.slot(&rate_key(base_code, dest_code));
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|e| self.is_fresh(e)) {
            return Ok((cached.rate, RateSource::Cache));
        }

        let rate = fetch().await?;
        *entry = Some(CachedRate {
            rate,
            fetched_at: Instant::now(),
        });
        Ok((rate, RateSource::Fetched))
    }

    /// Number of pairs holding a rate, expired ones included
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.values().cloned().collect()
        };
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let cache = RateCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_fetch("EUR", "USD", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1.1)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("EUR", "USD").await, Some(1.1));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_pairs_are_directional() {
        let cache = RateCache::default();
        cache.insert("EUR", "USD", 1.1).await;
        assert_eq!(cache.get("USD", "EUR").await, None);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = RateCache::default();
        let result = cache
            .get_or_fetch("XXX", "USD", || async {
                Err(SalaryError::RateUnavailable {
                    base: "XXX".to_string(),
                    dest: "USD".to_string(),
                    message: "unknown".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);

        let (rate, source) = cache
            .get_or_fetch("XXX", "USD", || async { Ok(2.0) })
            .await
            .unwrap();
        assert_eq!(rate, 2.0);
        assert_eq!(source, RateSource::Fetched);
    }

    #[tokio::test]
    async fn test_expired_rate_is_refetched() {
        let cache = RateCache::with_ttl(Duration::from_millis(20));
        cache.insert("GBP", "USD", 1.2).await;
        assert_eq!(cache.get("GBP", "USD").await, Some(1.2));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("GBP", "USD").await, None);

        let (rate, source) = cache
            .get_or_fetch("GBP", "USD", || async { Ok(1.3) })
            .await
            .unwrap();
        assert_eq!(rate, 1.3);
        assert_eq!(source, RateSource::Fetched);
    }
}
