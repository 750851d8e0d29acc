use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Input ---

/// One source row, as read from the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    /// Raw CNPJ as typed in the source; may contain `.`, `/`, `-`.
    pub identifier: String,
    /// Two-letter UF the source claims for this company.
    pub origin_state: String,
    pub origin_municipality: Option<String>,
    /// Company name as it appears in the source.
    pub origin_label: Option<String>,
}

impl InputRow {
    pub fn new(identifier: impl Into<String>, origin_state: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            origin_state: origin_state.into(),
            origin_municipality: None,
            origin_label: None,
        }
    }

    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.origin_municipality = Some(municipality.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.origin_label = Some(label.into());
        self
    }
}

// --- Registry ---

/// A CNAE code with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub code: String,
    pub description: String,
}

/// Company data as returned by the registry, flattened to the fields the
/// report carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub activity_code: Option<String>,
    pub activity_description: Option<String>,
    pub secondary_activities: Vec<Activity>,
    pub legal_nature: Option<String>,
    pub status_code: Option<String>,
    pub status_date: Option<String>,
    /// Registry status label, e.g. `ATIVA`, `BAIXADA`.
    pub raw_status: Option<String>,
}

// --- Enrichment ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Complete,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Complete => "COMPLETE",
            RecordStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metropolitan regions tracked by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetroRegion {
    #[serde(rename = "RM_SAOPAULO")]
    SaoPaulo,
    #[serde(rename = "RM_RIODEJANEIRO")]
    RioDeJaneiro,
    #[serde(rename = "RM_BELOHORIZONTE")]
    BeloHorizonte,
    #[serde(rename = "RM_SALVADOR")]
    Salvador,
    #[serde(rename = "RM_RECIFE")]
    Recife,
    #[serde(rename = "RM_VALEDOITAJAI")]
    ValeDoItajai,
    #[serde(rename = "RM_PORTOALEGRE")]
    PortoAlegre,
    #[serde(rename = "RM_CURITIBA")]
    Curitiba,
}

impl MetroRegion {
    pub const ALL: [MetroRegion; 8] = [
        MetroRegion::SaoPaulo,
        MetroRegion::RioDeJaneiro,
        MetroRegion::BeloHorizonte,
        MetroRegion::Salvador,
        MetroRegion::Recife,
        MetroRegion::ValeDoItajai,
        MetroRegion::PortoAlegre,
        MetroRegion::Curitiba,
    ];

    /// Stable tag used in reports.
    pub fn tag(&self) -> &'static str {
        match self {
            MetroRegion::SaoPaulo => "RM_SAOPAULO",
            MetroRegion::RioDeJaneiro => "RM_RIODEJANEIRO",
            MetroRegion::BeloHorizonte => "RM_BELOHORIZONTE",
            MetroRegion::Salvador => "RM_SALVADOR",
            MetroRegion::Recife => "RM_RECIFE",
            MetroRegion::ValeDoItajai => "RM_VALEDOITAJAI",
            MetroRegion::PortoAlegre => "RM_PORTOALEGRE",
            MetroRegion::Curitiba => "RM_CURITIBA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetroRegion::SaoPaulo => "Região Metropolitana de São Paulo",
            MetroRegion::RioDeJaneiro => "Região Metropolitana do Rio de Janeiro",
            MetroRegion::BeloHorizonte => "Região Metropolitana de Belo Horizonte",
            MetroRegion::Salvador => "Região Metropolitana de Salvador",
            MetroRegion::Recife => "Região Metropolitana do Recife",
            MetroRegion::ValeDoItajai => "Região Metropolitana do Vale do Itajaí",
            MetroRegion::PortoAlegre => "Região Metropolitana de Porto Alegre",
            MetroRegion::Curitiba => "Região Metropolitana de Curitiba",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag() == tag)
    }
}

impl std::fmt::Display for MetroRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The outcome for one input row. Built once by the enricher, never mutated.
///
/// On `Error` every registry-derived field and validation flag is `None`.
/// `municipality_match` is also `None` when the source row had no municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub identifier: String,
    /// Digits-only CNPJ, the key used for every lookup.
    pub cnpj: String,
    pub origin_state: String,
    pub origin_municipality: Option<String>,
    pub origin_label: Option<String>,

    pub registry: Option<RegistryRecord>,
    /// IBGE spelling of the registry municipality, when it could be resolved.
    pub canonical_municipality: Option<String>,

    pub municipality_valid: Option<bool>,
    pub state_match: Option<bool>,
    pub municipality_match: Option<bool>,
    pub metro_region: Option<MetroRegion>,

    pub status: RecordStatus,
    pub error_reason: Option<String>,
    pub queried_at: DateTime<Utc>,
}

impl EnrichedRecord {
    /// A record for a row whose registry lookup failed (or never happened).
    pub fn failed(row: &InputRow, cnpj: String, reason: impl Into<String>) -> Self {
        Self {
            identifier: row.identifier.clone(),
            cnpj,
            origin_state: row.origin_state.clone(),
            origin_municipality: row.origin_municipality.clone(),
            origin_label: row.origin_label.clone(),
            registry: None,
            canonical_municipality: None,
            municipality_valid: None,
            state_match: None,
            municipality_match: None,
            metro_region: None,
            status: RecordStatus::Error,
            error_reason: Some(reason.into()),
            queried_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == RecordStatus::Error
    }

    /// The municipality the report should show: IBGE spelling first, raw registry value second.
    pub fn resolved_municipality(&self) -> Option<&str> {
        self.canonical_municipality.as_deref().or_else(|| {
            self.registry
                .as_ref()
                .and_then(|r| r.municipality.as_deref())
        })
    }

    pub fn registry_state(&self) -> Option<&str> {
        self.registry.as_ref().and_then(|r| r.state.as_deref())
    }
}
