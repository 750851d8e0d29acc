//! Cached, rate-limited registry lookups.
//!
//! Every outcome is cached under the digits-only CNPJ, failures included, so
//! an identifier costs at most one upstream request per run. Cache misses go
//! through a minimum-interval gate shared by the whole client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use cnpj_common::{Cnpj, RegistryRecord};

use crate::traits::RegistrySource;

/// Why a registry lookup produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct LookupFailure {
    pub reason: String,
}

impl LookupFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type FetchOutcome = std::result::Result<RegistryRecord, LookupFailure>;

pub struct RegistryClient {
    source: Arc<dyn RegistrySource>,
    cache: Mutex<HashMap<Cnpj, FetchOutcome>>,
    gate: RateGate,
    network_calls: AtomicU64,
    cache_hits: AtomicU64,
}

impl RegistryClient {
    pub fn new(source: Arc<dyn RegistrySource>, min_interval: Duration) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            gate: RateGate::new(min_interval),
            network_calls: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// Look up a raw identifier. Formatting characters are stripped first.
    pub async fn fetch(&self, identifier: &str) -> FetchOutcome {
        self.fetch_cnpj(&Cnpj::normalize(identifier)).await
    }

    /// Look up an already-normalized CNPJ.
    pub async fn fetch_cnpj(&self, cnpj: &Cnpj) -> FetchOutcome {
        if cnpj.is_empty() {
            return Err(LookupFailure::new("missing identifier"));
        }
        if let Some(cached) = self.cached(cnpj) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(cnpj = %cnpj, "Registry cache hit");
            return cached;
        }

        self.gate.wait().await;
        self.network_calls.fetch_add(1, Ordering::Relaxed);

        let outcome = self
            .source
            .company(cnpj.as_str())
            .await
            .map_err(|e| LookupFailure::new(e.to_string()));

        if let Err(ref failure) = outcome {
            warn!(cnpj = %cnpj, reason = %failure, "Registry lookup failed");
        }

        self.cache
            .lock()
            .expect("registry cache lock poisoned")
            .insert(cnpj.clone(), outcome.clone());

        outcome
    }

    fn cached(&self, cnpj: &Cnpj) -> Option<FetchOutcome> {
        self.cache
            .lock()
            .expect("registry cache lock poisoned")
            .get(cnpj)
            .cloned()
    }

    /// Upstream requests issued so far.
    pub fn network_calls(&self) -> u64 {
        self.network_calls.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().expect("registry cache lock poisoned").len()
    }
}

/// Minimum-interval gate on a monotonic clock. The interval is measured from
/// the moment the previous caller was let through.
struct RateGate {
    min_interval: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
}

impl RateGate {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: tokio::sync::Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry_record, MockRegistry};

    #[tokio::test]
    async fn same_identifier_hits_network_once() {
        let source = Arc::new(
            MockRegistry::new().on_company("11222333000181", registry_record("SP", "SAO PAULO")),
        );
        let client = RegistryClient::new(source.clone(), Duration::ZERO);

        let first = client.fetch("11.222.333/0001-81").await;
        let second = client.fetch("11222333000181").await;

        assert!(first.is_ok());
        assert_eq!(first, second);
        assert_eq!(source.call_count(), 1);
        assert_eq!(client.network_calls(), 1);
        assert_eq!(client.cache_hits(), 1);
    }

    #[tokio::test]
    async fn identifier_is_normalized_before_upstream_call() {
        let source = Arc::new(MockRegistry::new());
        let client = RegistryClient::new(source.clone(), Duration::ZERO);

        let _ = client.fetch("11.222.333/0001-81").await;

        assert_eq!(source.calls(), vec!["11222333000181".to_string()]);
    }

    #[tokio::test]
    async fn identifier_without_digits_never_reaches_upstream() {
        let source = Arc::new(MockRegistry::new());
        let client = RegistryClient::new(source.clone(), Duration::ZERO);

        let outcome = client.fetch("--/.").await;

        assert_eq!(outcome.unwrap_err().reason, "missing identifier");
        assert_eq!(source.call_count(), 0);
        assert_eq!(client.network_calls(), 0);
        assert_eq!(client.cached_len(), 0);
    }

    #[tokio::test]
    async fn failures_are_cached() {
        let source = Arc::new(
            MockRegistry::new().on_failure("11222333000181", "API error (status 500): boom"),
        );
        let client = RegistryClient::new(source.clone(), Duration::ZERO);

        let first = client.fetch("11222333000181").await;
        let second = client.fetch("11.222.333/0001-81").await;

        assert_eq!(
            first.unwrap_err().reason,
            "API error (status 500): boom".to_string()
        );
        assert!(second.is_err());
        assert_eq!(source.call_count(), 1);
        assert_eq!(client.cached_len(), 1);
    }

    #[tokio::test]
    async fn consecutive_misses_are_spaced() {
        let source = Arc::new(MockRegistry::new());
        let client = RegistryClient::new(source.clone(), Duration::from_millis(50));

        let start = std::time::Instant::now();
        let _ = client.fetch("11111111000111").await;
        let _ = client.fetch("22222222000122").await;
        let _ = client.fetch("33333333000133").await;

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn cache_hits_skip_the_gate() {
        let source = Arc::new(MockRegistry::new());
        let client = RegistryClient::new(source, Duration::from_secs(60));

        let _ = client.fetch("11111111000111").await;
        let start = std::time::Instant::now();
        let _ = client.fetch("11111111000111").await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
