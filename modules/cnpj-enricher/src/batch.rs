use tracing::{info, warn};

use cnpj_common::{EnrichedRecord, InputRow};

use crate::enricher::RecordEnricher;
use crate::stats::RunSummary;

/// Receives one callback per finished row. `index` is 1-based.
pub trait ProgressObserver {
    fn on_record(&self, index: usize, total: usize, record: &EnrichedRecord);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, &EnrichedRecord),
{
    fn on_record(&self, index: usize, total: usize, record: &EnrichedRecord) {
        self(index, total, record)
    }
}

/// Observer that ignores progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_record(&self, _index: usize, _total: usize, _record: &EnrichedRecord) {}
}

#[derive(Debug)]
pub struct BatchOutput {
    /// One record per input row, in input order.
    pub records: Vec<EnrichedRecord>,
    pub summary: RunSummary,
}

/// Drives the enricher over a whole input, one row at a time.
pub struct BatchRunner {
    enricher: RecordEnricher,
    top_n: usize,
}

impl BatchRunner {
    pub fn new(enricher: RecordEnricher, top_n: usize) -> Self {
        Self { enricher, top_n }
    }

    pub fn enricher(&self) -> &RecordEnricher {
        &self.enricher
    }

    pub async fn run(&self, rows: &[InputRow], observer: &dyn ProgressObserver) -> BatchOutput {
        let total = rows.len();
        info!(total, "Starting batch");

        let mut records = Vec::with_capacity(total);
        for (i, row) in rows.iter().enumerate() {
            let record = self.enricher.enrich(row).await;
            if let Some(reason) = record.error_reason.as_deref() {
                warn!(index = i + 1, total, cnpj = %record.cnpj, reason, "Row failed");
            }
            observer.on_record(i + 1, total, &record);
            records.push(record);
        }

        let summary = RunSummary::from_records(&records, self.top_n);
        info!(
            total = summary.total,
            errors = summary.errors,
            registry_calls = self.enricher.registry().network_calls(),
            registry_cache_hits = self.enricher.registry().cache_hits(),
            states_loaded = self.enricher.geo().loaded_states(),
            "Batch complete"
        );

        BatchOutput { records, summary }
    }
}
