use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use cnpj_common::{format_cnpj, EnrichedRecord};

/// Bucket for records without a metropolitan region (errors included).
pub const NO_METRO_REGION: &str = "none";

/// How many origin/registry state mismatches the summary keeps as examples.
const DISCREPANCY_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateDiscrepancy {
    pub cnpj: String,
    pub origin_state: String,
    pub registry_state: String,
}

/// Aggregates over one run, folded once from the finished records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub complete: usize,
    pub errors: usize,
    pub municipalities_validated: usize,
    pub state_matches: usize,
    pub municipality_matches: usize,
    /// Records that carried an origin municipality to compare against.
    pub municipalities_compared: usize,
    /// Metro tag → count; `none` holds everything else, so the values sum to `total`.
    pub metro_distribution: BTreeMap<String, usize>,
    pub top_activities: Vec<(String, usize)>,
    pub top_municipalities: Vec<(String, usize)>,
    pub states: Vec<(String, usize)>,
    pub statuses: Vec<(String, usize)>,
    pub state_discrepancies: Vec<StateDiscrepancy>,
}

impl RunSummary {
    pub fn from_records(records: &[EnrichedRecord], top_n: usize) -> Self {
        let mut summary = RunSummary {
            total: records.len(),
            ..Default::default()
        };
        summary
            .metro_distribution
            .insert(NO_METRO_REGION.to_string(), 0);

        let mut activities: HashMap<String, usize> = HashMap::new();
        let mut municipalities: HashMap<String, usize> = HashMap::new();
        let mut states: HashMap<String, usize> = HashMap::new();
        let mut statuses: HashMap<String, usize> = HashMap::new();

        for record in records {
            let metro = record
                .metro_region
                .map(|r| r.tag().to_string())
                .unwrap_or_else(|| NO_METRO_REGION.to_string());
            *summary.metro_distribution.entry(metro).or_default() += 1;

            if record.is_error() {
                summary.errors += 1;
                *statuses.entry(record.status.to_string()).or_default() += 1;
                continue;
            }
            summary.complete += 1;

            if record.municipality_valid == Some(true) {
                summary.municipalities_validated += 1;
            }
            if record.state_match == Some(true) {
                summary.state_matches += 1;
            }
            if let Some(matched) = record.municipality_match {
                summary.municipalities_compared += 1;
                if matched {
                    summary.municipality_matches += 1;
                }
            }

            if let Some(registry) = &record.registry {
                if let Some(activity) = &registry.activity_description {
                    *activities.entry(activity.clone()).or_default() += 1;
                }
                let status = registry
                    .raw_status
                    .clone()
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                *statuses.entry(status).or_default() += 1;
            }
            if let Some(municipality) = record.resolved_municipality() {
                *municipalities.entry(municipality.to_string()).or_default() += 1;
            }
            if let Some(state) = record.registry_state() {
                *states.entry(state.to_string()).or_default() += 1;
            }

            if record.state_match == Some(false)
                && summary.state_discrepancies.len() < DISCREPANCY_SAMPLES
            {
                summary.state_discrepancies.push(StateDiscrepancy {
                    cnpj: format_cnpj(&record.cnpj),
                    origin_state: record.origin_state.clone(),
                    registry_state: record.registry_state().unwrap_or_default().to_string(),
                });
            }
        }

        summary.top_activities = ranked(activities, Some(top_n));
        summary.top_municipalities = ranked(municipalities, Some(top_n));
        summary.states = ranked(states, None);
        summary.statuses = ranked(statuses, None);
        summary
    }

    /// `count` as a percentage of all records; 0 for an empty run.
    pub fn rate(&self, count: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        count as f64 / self.total as f64 * 100.0
    }

    pub fn validation_rate(&self) -> f64 {
        self.rate(self.municipalities_validated)
    }

    pub fn state_match_rate(&self) -> f64 {
        self.rate(self.state_matches)
    }

    pub fn municipality_match_rate(&self) -> f64 {
        self.rate(self.municipality_matches)
    }
}

/// Highest count first, ties alphabetical.
fn ranked(counts: HashMap<String, usize>, limit: Option<usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== CNPJ Enrichment Complete ===")?;
        writeln!(f, "Records:              {}", self.total)?;
        writeln!(f, "Complete:             {}", self.complete)?;
        writeln!(
            f,
            "Errors:               {} ({:.1}%)",
            self.errors,
            self.rate(self.errors)
        )?;
        writeln!(
            f,
            "Municipality valid:   {} ({:.1}%)",
            self.municipalities_validated,
            self.validation_rate()
        )?;
        writeln!(
            f,
            "State match:          {} ({:.1}%)",
            self.state_matches,
            self.state_match_rate()
        )?;
        writeln!(
            f,
            "Municipality match:   {} ({:.1}%)",
            self.municipality_matches,
            self.municipality_match_rate()
        )?;
        writeln!(f, "Municipality compared: {}", self.municipalities_compared)?;

        writeln!(f, "\nMetropolitan regions:")?;
        for (tag, count) in &self.metro_distribution {
            writeln!(f, "  {:<18} {:>6} ({:.1}%)", tag, count, self.rate(*count))?;
        }

        if !self.states.is_empty() {
            writeln!(f, "\nStates (registry):")?;
            for (state, count) in &self.states {
                writeln!(f, "  {:<4} {}", state, count)?;
            }
        }

        if !self.top_municipalities.is_empty() {
            writeln!(f, "\nTop municipalities:")?;
            for (municipality, count) in &self.top_municipalities {
                writeln!(f, "  {}: {}", municipality, count)?;
            }
        }

        if !self.top_activities.is_empty() {
            writeln!(f, "\nTop activities:")?;
            for (activity, count) in &self.top_activities {
                writeln!(f, "  {}: {}", activity, count)?;
            }
        }

        if !self.statuses.is_empty() {
            writeln!(f, "\nRegistry status:")?;
            for (status, count) in &self.statuses {
                writeln!(f, "  {}: {} ({:.1}%)", status, count, self.rate(*count))?;
            }
        }

        if !self.state_discrepancies.is_empty() {
            writeln!(f, "\nFirst state discrepancies (origin vs registry):")?;
            for d in &self.state_discrepancies {
                writeln!(f, "  {}: {} vs {}", d.cnpj, d.origin_state, d.registry_state)?;
            }
        }
        Ok(())
    }
}
