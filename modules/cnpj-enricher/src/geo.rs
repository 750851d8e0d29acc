//! Per-state municipality index backed by IBGE.
//!
//! The first query for a state loads its full municipality list and builds a
//! `name_key → canonical name` map. A failed load is remembered as an empty
//! index, so an unreachable state costs one request per run and every lookup
//! against it resolves as invalid.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use cnpj_common::name_key;

use crate::traits::GeoSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoResolution {
    pub canonical_name: Option<String>,
    pub is_valid: bool,
}

impl GeoResolution {
    fn unknown() -> Self {
        Self {
            canonical_name: None,
            is_valid: false,
        }
    }
}

#[derive(Debug, Default)]
struct MunicipalityIndex {
    names: HashMap<String, String>,
}

impl MunicipalityIndex {
    /// First name to produce a key keeps it.
    fn build(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for name in names {
            index.entry(name_key(&name)).or_insert(name);
        }
        Self { names: index }
    }

    fn get(&self, municipality: &str) -> Option<&String> {
        self.names.get(&name_key(municipality))
    }
}

pub struct GeoReference {
    source: Arc<dyn GeoSource>,
    indexes: Mutex<HashMap<String, Arc<MunicipalityIndex>>>,
    fetches: AtomicU64,
}

impl GeoReference {
    pub fn new(source: Arc<dyn GeoSource>) -> Self {
        Self {
            source,
            indexes: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Resolve a municipality within a state. Never fails: anything that cannot
    /// be confirmed comes back as `is_valid = false` with no canonical name.
    pub async fn resolve(&self, state: &str, municipality: &str) -> GeoResolution {
        let uf = state.trim().to_uppercase();
        if uf.is_empty() || municipality.trim().is_empty() {
            return GeoResolution::unknown();
        }

        let index = self.index_for(&uf).await;
        match index.get(municipality) {
            Some(canonical) => GeoResolution {
                canonical_name: Some(canonical.clone()),
                is_valid: true,
            },
            None => GeoResolution::unknown(),
        }
    }

    async fn index_for(&self, uf: &str) -> Arc<MunicipalityIndex> {
        let cached = self
            .indexes
            .lock()
            .expect("geo index lock poisoned")
            .get(uf)
            .cloned();
        if let Some(index) = cached {
            return index;
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let index = match self.source.municipality_names(uf).await {
            Ok(names) => {
                info!(uf, count = names.len(), "Loaded municipality index");
                MunicipalityIndex::build(names)
            }
            Err(e) => {
                warn!(uf, error = %e, "Failed to load municipalities, state resolves as unknown");
                MunicipalityIndex::default()
            }
        };

        let index = Arc::new(index);
        self.indexes
            .lock()
            .expect("geo index lock poisoned")
            .insert(uf.to_string(), index.clone());
        index
    }

    /// Municipality-list requests issued so far.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn loaded_states(&self) -> usize {
        self.indexes.lock().expect("geo index lock poisoned").len()
    }
}
