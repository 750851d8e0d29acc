//! End-to-end pipeline behaviour against the in-memory registry and IBGE mocks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cnpj_common::{EnrichedRecord, InputRow, MetroRegion, RecordStatus};
use cnpj_enricher::testing::{registry_record, MockGeo, MockRegistry};
use cnpj_enricher::{
    BatchRunner, GeoReference, MetroClassifier, NoProgress, RecordEnricher, RegistryClient,
};

const SAO_PAULO_CNPJ: &str = "11222333000181";
const RIO_CNPJ: &str = "44555666000199";
const FAILING_CNPJ: &str = "99888777000166";

fn sao_paulo_geo() -> MockGeo {
    MockGeo::new()
        .on_state("SP", &["São Paulo", "Guarulhos", "Campinas"])
        .on_state("RJ", &["Rio de Janeiro", "Niterói", "Mesquita"])
}

fn enricher(registry: Arc<MockRegistry>, geo: Arc<MockGeo>) -> RecordEnricher {
    RecordEnricher::new(
        RegistryClient::new(registry, Duration::ZERO),
        GeoReference::new(geo),
        MetroClassifier::new(),
    )
}

#[tokio::test]
async fn accent_free_registry_spelling_resolves_to_canonical_municipality() {
    let registry = Arc::new(
        MockRegistry::new().on_company(SAO_PAULO_CNPJ, registry_record("SP", "SAO PAULO")),
    );
    let geo = Arc::new(sao_paulo_geo());
    let enricher = enricher(registry.clone(), geo);

    let row = InputRow::new("11.222.333/0001-81", "SP").with_municipality("São Paulo");
    let record = enricher.enrich(&row).await;

    assert_eq!(record.status, RecordStatus::Complete);
    assert_eq!(record.cnpj, SAO_PAULO_CNPJ);
    assert_eq!(record.canonical_municipality.as_deref(), Some("São Paulo"));
    assert_eq!(record.municipality_valid, Some(true));
    assert_eq!(record.state_match, Some(true));
    assert_eq!(record.municipality_match, Some(true));
    assert_eq!(record.metro_region, Some(MetroRegion::SaoPaulo));
    assert_eq!(registry.calls(), vec![SAO_PAULO_CNPJ.to_string()]);
}

#[tokio::test]
async fn registry_failure_becomes_error_record_and_is_not_retried() {
    let registry = Arc::new(
        MockRegistry::new().on_failure(FAILING_CNPJ, "API error (status 500): upstream down"),
    );
    let geo = Arc::new(sao_paulo_geo());
    let enricher = enricher(registry.clone(), geo.clone());

    let row = InputRow::new(FAILING_CNPJ, "SP");
    let first = enricher.enrich(&row).await;
    let second = enricher.enrich(&row).await;

    for record in [&first, &second] {
        assert_eq!(record.status, RecordStatus::Error);
        assert!(record.registry.is_none());
        assert!(record.metro_region.is_none());
        assert!(record
            .error_reason
            .as_deref()
            .is_some_and(|reason| reason.contains("500")));
    }
    assert_eq!(registry.call_count(), 1);
    assert_eq!(geo.total_calls(), 0);
}

#[tokio::test]
async fn unreachable_state_is_loaded_once_and_resolves_invalid() {
    let registry = Arc::new(
        MockRegistry::new()
            .on_company("11111111000111", registry_record("XX", "Lugar Nenhum"))
            .on_company("22222222000122", registry_record("XX", "Outro Lugar")),
    );
    let geo = Arc::new(MockGeo::new().failing("XX"));
    let enricher = enricher(registry, geo.clone());

    let first = enricher.enrich(&InputRow::new("11111111000111", "XX")).await;
    let second = enricher.enrich(&InputRow::new("22222222000122", "XX")).await;

    for record in [&first, &second] {
        assert_eq!(record.status, RecordStatus::Complete);
        assert_eq!(record.municipality_valid, Some(false));
        assert!(record.canonical_municipality.is_none());
    }
    assert_eq!(geo.calls_for("XX"), 1);
}

#[tokio::test]
async fn malformed_rows_fail_without_network() {
    let registry = Arc::new(MockRegistry::new());
    let geo = Arc::new(MockGeo::new());
    let enricher = enricher(registry.clone(), geo.clone());

    let no_digits = enricher.enrich(&InputRow::new("n/a", "SP")).await;
    let no_state = enricher.enrich(&InputRow::new(SAO_PAULO_CNPJ, "  ")).await;

    assert_eq!(no_digits.status, RecordStatus::Error);
    assert_eq!(no_state.status, RecordStatus::Error);
    assert_eq!(registry.call_count(), 0);
    assert_eq!(geo.total_calls(), 0);
}

#[tokio::test]
async fn missing_origin_municipality_leaves_comparison_unset() {
    let registry =
        Arc::new(MockRegistry::new().on_company(RIO_CNPJ, registry_record("RJ", "Niterói")));
    let enricher = enricher(registry, Arc::new(sao_paulo_geo()));

    let record = enricher.enrich(&InputRow::new(RIO_CNPJ, "sp")).await;

    assert_eq!(record.status, RecordStatus::Complete);
    assert_eq!(record.municipality_match, None);
    assert_eq!(record.state_match, Some(false));
    assert_eq!(record.metro_region, Some(MetroRegion::RioDeJaneiro));
}

#[tokio::test]
async fn batch_keeps_input_order_and_summarises_every_row() {
    let registry = Arc::new(
        MockRegistry::new()
            .on_company(SAO_PAULO_CNPJ, registry_record("SP", "SAO PAULO"))
            .on_company(RIO_CNPJ, registry_record("RJ", "Niteroi"))
            .on_failure(FAILING_CNPJ, "API error (status 500): upstream down"),
    );
    let runner = BatchRunner::new(enricher(registry, Arc::new(sao_paulo_geo())), 10);

    let rows = vec![
        InputRow::new(SAO_PAULO_CNPJ, "SP").with_municipality("Sao Paulo"),
        InputRow::new(FAILING_CNPJ, "MG"),
        InputRow::new(RIO_CNPJ, "SP").with_municipality("Niterói"),
    ];

    let seen = Mutex::new(Vec::new());
    let observer = |index: usize, total: usize, record: &EnrichedRecord| {
        seen.lock().unwrap().push((index, total, record.cnpj.clone()));
    };
    let output = runner.run(&rows, &observer).await;

    let cnpjs: Vec<&str> = output.records.iter().map(|r| r.cnpj.as_str()).collect();
    assert_eq!(cnpjs, vec![SAO_PAULO_CNPJ, FAILING_CNPJ, RIO_CNPJ]);
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![
            (1, 3, SAO_PAULO_CNPJ.to_string()),
            (2, 3, FAILING_CNPJ.to_string()),
            (3, 3, RIO_CNPJ.to_string()),
        ]
    );

    let summary = &output.summary;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.complete + summary.errors, summary.total);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.municipalities_validated, 2);
    assert_eq!(summary.state_matches, 1);
    assert_eq!(summary.municipality_matches, 2);
    assert_eq!(summary.metro_distribution.values().sum::<usize>(), summary.total);
    assert_eq!(summary.metro_distribution.get("none"), Some(&1));
    assert_eq!(summary.state_discrepancies.len(), 1);
    assert_eq!(summary.state_discrepancies[0].registry_state, "RJ");
}

#[tokio::test]
async fn empty_batch_produces_empty_summary() {
    let runner = BatchRunner::new(
        enricher(Arc::new(MockRegistry::new()), Arc::new(MockGeo::new())),
        10,
    );

    let output = runner.run(&[], &NoProgress).await;

    assert!(output.records.is_empty());
    assert_eq!(output.summary.total, 0);
    assert_eq!(output.summary.validation_rate(), 0.0);
}
