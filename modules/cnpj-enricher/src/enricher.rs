use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use brasilapi_client::BrasilApiClient;
use cnpj_common::{name_key, Cnpj, Config, EnrichedRecord, InputRow, RecordStatus};
use ibge_client::IbgeClient;

use crate::geo::GeoReference;
use crate::metro::MetroClassifier;
use crate::registry::RegistryClient;

/// Turns one input row into one enriched record: registry lookup, IBGE
/// validation, metro classification and the origin-vs-registry comparisons.
pub struct RecordEnricher {
    registry: RegistryClient,
    geo: GeoReference,
    metro: MetroClassifier,
}

impl RecordEnricher {
    pub fn new(registry: RegistryClient, geo: GeoReference, metro: MetroClassifier) -> Self {
        Self {
            registry,
            geo,
            metro,
        }
    }

    /// Wire the real BrasilAPI and IBGE clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let brasilapi =
            BrasilApiClient::with_base_url(&config.registry_base_url, config.registry_timeout)?;
        let ibge = IbgeClient::with_base_url(&config.geo_base_url, config.geo_timeout)?;

        Ok(Self::new(
            RegistryClient::new(Arc::new(brasilapi), config.min_interval),
            GeoReference::new(Arc::new(ibge)),
            MetroClassifier::new(),
        ))
    }

    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    pub fn geo(&self) -> &GeoReference {
        &self.geo
    }

    /// Never fails: lookup problems become an `ERROR` record.
    pub async fn enrich(&self, row: &InputRow) -> EnrichedRecord {
        let cnpj = Cnpj::normalize(&row.identifier);

        if cnpj.is_empty() {
            return EnrichedRecord::failed(row, cnpj.into_string(), "missing identifier");
        }
        if row.origin_state.trim().is_empty() {
            return EnrichedRecord::failed(row, cnpj.into_string(), "missing origin state");
        }

        let company = match self.registry.fetch_cnpj(&cnpj).await {
            Ok(company) => company,
            Err(failure) => return EnrichedRecord::failed(row, cnpj.into_string(), failure.reason),
        };

        let registry_state = company.state.as_deref().unwrap_or_default();
        let registry_municipality = company.municipality.as_deref().unwrap_or_default();

        let resolution = self.geo.resolve(registry_state, registry_municipality).await;
        let municipality = resolution
            .canonical_name
            .as_deref()
            .unwrap_or(registry_municipality);

        let metro_region = self.metro.classify_in_state(registry_state, municipality);

        let state_match = !registry_state.trim().is_empty()
            && row.origin_state.trim().eq_ignore_ascii_case(registry_state.trim());

        let municipality_match = row
            .origin_municipality
            .as_deref()
            .map(|origin| !municipality.trim().is_empty() && name_key(origin) == name_key(municipality));

        debug!(
            cnpj = %cnpj,
            municipality_valid = resolution.is_valid,
            state_match,
            metro = ?metro_region,
            "Record enriched"
        );

        EnrichedRecord {
            identifier: row.identifier.clone(),
            cnpj: cnpj.into_string(),
            origin_state: row.origin_state.clone(),
            origin_municipality: row.origin_municipality.clone(),
            origin_label: row.origin_label.clone(),
            canonical_municipality: resolution.canonical_name,
            municipality_valid: Some(resolution.is_valid),
            state_match: Some(state_match),
            municipality_match,
            metro_region,
            registry: Some(company),
            status: RecordStatus::Complete,
            error_reason: None,
            queried_at: Utc::now(),
        }
    }
}
