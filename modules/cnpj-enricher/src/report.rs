use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use cnpj_common::{format_cnpj, EnrichError, EnrichedRecord};

/// One CSV line. Column order is the report's public contract.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    cnpj: String,
    origin_label: Option<&'a str>,
    origin_state: &'a str,
    origin_municipality: Option<&'a str>,
    legal_name: Option<&'a str>,
    trade_name: Option<&'a str>,
    street: Option<&'a str>,
    number: Option<&'a str>,
    district: Option<&'a str>,
    postal_code: Option<&'a str>,
    municipality: Option<&'a str>,
    canonical_municipality: Option<&'a str>,
    state: Option<&'a str>,
    activity_code: Option<&'a str>,
    activity_description: Option<&'a str>,
    secondary_activities: Option<String>,
    legal_nature: Option<&'a str>,
    status_code: Option<&'a str>,
    status_date: Option<&'a str>,
    raw_status: Option<&'a str>,
    municipality_valid: Option<bool>,
    state_match: Option<bool>,
    municipality_match: Option<bool>,
    metro_region: Option<&'static str>,
    status: &'static str,
    error_reason: Option<&'a str>,
    queried_at: String,
}

impl<'a> From<&'a EnrichedRecord> for ReportRow<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        let registry = record.registry.as_ref();
        let secondary_activities = registry
            .filter(|r| !r.secondary_activities.is_empty())
            .map(|r| {
                r.secondary_activities
                    .iter()
                    .map(|a| format!("{} {}", a.code, a.description))
                    .collect::<Vec<_>>()
                    .join(" | ")
            });

        ReportRow {
            cnpj: if record.cnpj.is_empty() {
                record.identifier.clone()
            } else {
                format_cnpj(&record.cnpj)
            },
            origin_label: record.origin_label.as_deref(),
            origin_state: &record.origin_state,
            origin_municipality: record.origin_municipality.as_deref(),
            legal_name: registry.map(|r| r.legal_name.as_str()),
            trade_name: registry.and_then(|r| r.trade_name.as_deref()),
            street: registry.and_then(|r| r.street.as_deref()),
            number: registry.and_then(|r| r.number.as_deref()),
            district: registry.and_then(|r| r.district.as_deref()),
            postal_code: registry.and_then(|r| r.postal_code.as_deref()),
            municipality: registry.and_then(|r| r.municipality.as_deref()),
            canonical_municipality: record.canonical_municipality.as_deref(),
            state: registry.and_then(|r| r.state.as_deref()),
            activity_code: registry.and_then(|r| r.activity_code.as_deref()),
            activity_description: registry.and_then(|r| r.activity_description.as_deref()),
            secondary_activities,
            legal_nature: registry.and_then(|r| r.legal_nature.as_deref()),
            status_code: registry.and_then(|r| r.status_code.as_deref()),
            status_date: registry.and_then(|r| r.status_date.as_deref()),
            raw_status: registry.and_then(|r| r.raw_status.as_deref()),
            municipality_valid: record.municipality_valid,
            state_match: record.state_match,
            municipality_match: record.municipality_match,
            metro_region: record.metro_region.map(|r| r.tag()),
            status: record.status.as_str(),
            error_reason: record.error_reason.as_deref(),
            queried_at: record.queried_at.to_rfc3339(),
        }
    }
}

/// Write one CSV row per record, with a header line.
pub fn write_records<W: Write>(
    writer: W,
    records: &[EnrichedRecord],
    delimiter: char,
) -> Result<(), EnrichError> {
    if !delimiter.is_ascii() {
        return Err(EnrichError::Config(format!(
            "report delimiter must be a single ASCII character, got '{delimiter}'"
        )));
    }

    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(writer);

    for record in records {
        csv.serialize(ReportRow::from(record))
            .map_err(|e| EnrichError::Report(e.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_report(
    path: &Path,
    records: &[EnrichedRecord],
    delimiter: char,
) -> Result<(), EnrichError> {
    let file = File::create(path)
        .map_err(|e| EnrichError::Report(format!("cannot create {}: {e}", path.display())))?;
    write_records(file, records, delimiter)?;
    info!(path = %path.display(), rows = records.len(), "Report written");
    Ok(())
}
