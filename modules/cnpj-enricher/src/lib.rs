pub mod batch;
pub mod enricher;
pub mod geo;
pub mod input;
pub mod metro;
pub mod registry;
pub mod report;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use batch::{BatchOutput, BatchRunner, NoProgress, ProgressObserver};
pub use enricher::RecordEnricher;
pub use geo::{GeoReference, GeoResolution};
pub use metro::MetroClassifier;
pub use registry::{FetchOutcome, LookupFailure, RegistryClient};
pub use stats::RunSummary;
