// Test mocks for the enrichment pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockRegistry (RegistrySource): HashMap-based CNPJ→record, records every call
// - MockGeo (GeoSource): HashMap-based UF→municipality names, failing states
//
// Plus builders for RegistryRecord and EnrichedRecord fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use cnpj_common::{EnrichedRecord, InputRow, MetroRegion, RecordStatus, RegistryRecord};

use crate::traits::{GeoSource, RegistrySource};

// ---------------------------------------------------------------------------
// MockRegistry
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered CNPJs, like a 404 from BrasilAPI.
pub struct MockRegistry {
    companies: HashMap<String, RegistryRecord>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            companies: HashMap::new(),
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_company(mut self, cnpj: &str, record: RegistryRecord) -> Self {
        self.companies.insert(cnpj.to_string(), record);
        self
    }

    pub fn on_failure(mut self, cnpj: &str, reason: &str) -> Self {
        self.failures.insert(cnpj.to_string(), reason.to_string());
        self
    }

    /// Every CNPJ the mock was asked for, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrySource for MockRegistry {
    async fn company(&self, cnpj: &str) -> Result<RegistryRecord> {
        self.calls.lock().unwrap().push(cnpj.to_string());
        if let Some(reason) = self.failures.get(cnpj) {
            bail!("{reason}");
        }
        self.companies
            .get(cnpj)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("API error (status 404): CNPJ {cnpj} não encontrado"))
    }
}

// ---------------------------------------------------------------------------
// MockGeo
// ---------------------------------------------------------------------------

/// Unregistered states return an empty list; `failing` states return `Err`.
pub struct MockGeo {
    states: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockGeo {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_state(mut self, uf: &str, municipalities: &[&str]) -> Self {
        self.states.insert(
            uf.to_string(),
            municipalities.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn failing(mut self, uf: &str) -> Self {
        self.failing.insert(uf.to_string());
        self
    }

    pub fn calls_for(&self, uf: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == uf).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGeo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoSource for MockGeo {
    async fn municipality_names(&self, uf: &str) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(uf.to_string());
        if self.failing.contains(uf) {
            bail!("Network error: IBGE unreachable for {uf}");
        }
        Ok(self.states.get(uf).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A minimal active company located in `state`/`municipality`.
pub fn registry_record(state: &str, municipality: &str) -> RegistryRecord {
    RegistryRecord {
        legal_name: "EMPRESA TESTE LTDA".to_string(),
        trade_name: None,
        street: Some("AVENIDA PAULISTA".to_string()),
        number: Some("1000".to_string()),
        district: Some("BELA VISTA".to_string()),
        postal_code: Some("01310100".to_string()),
        municipality: Some(municipality.to_string()),
        state: Some(state.to_string()),
        activity_code: Some("4751201".to_string()),
        activity_description: Some(
            "Comércio varejista especializado de equipamentos e suprimentos de informática"
                .to_string(),
        ),
        secondary_activities: Vec::new(),
        legal_nature: Some("Sociedade Empresária Limitada".to_string()),
        status_code: Some("2".to_string()),
        status_date: Some("2005-11-03".to_string()),
        raw_status: Some("ATIVA".to_string()),
    }
}

/// A finished record whose origin and registry agree on everything.
pub fn complete_record(
    cnpj: &str,
    state: &str,
    municipality: &str,
    metro_region: Option<MetroRegion>,
) -> EnrichedRecord {
    EnrichedRecord {
        identifier: cnpj.to_string(),
        cnpj: cnpj.to_string(),
        origin_state: state.to_string(),
        origin_municipality: Some(municipality.to_string()),
        origin_label: None,
        registry: Some(registry_record(state, municipality)),
        canonical_municipality: Some(municipality.to_string()),
        municipality_valid: Some(true),
        state_match: Some(true),
        municipality_match: Some(true),
        metro_region,
        status: RecordStatus::Complete,
        error_reason: None,
        queried_at: Utc::now(),
    }
}

pub fn error_record(cnpj: &str, state: &str) -> EnrichedRecord {
    EnrichedRecord::failed(&InputRow::new(cnpj, state), cnpj.to_string(), "API error (status 500)")
}
