// Trait abstractions for the two upstream APIs.
//
// RegistrySource sits in front of BrasilAPI, GeoSource in front of IBGE.
// The caching components only see these traits, so tests swap in the
// counting mocks from `testing.rs`: no network, no sleeps.

use anyhow::Result;
use async_trait::async_trait;

use brasilapi_client::{BrasilApiClient, CnpjResponse};
use cnpj_common::{Activity, RegistryRecord};
use ibge_client::IbgeClient;

// ---------------------------------------------------------------------------
// RegistrySource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Look up one company by digits-only CNPJ. One call is one upstream request.
    async fn company(&self, cnpj: &str) -> Result<RegistryRecord>;
}

#[async_trait]
impl RegistrySource for BrasilApiClient {
    async fn company(&self, cnpj: &str) -> Result<RegistryRecord> {
        let response = self.cnpj(cnpj).await?;
        Ok(registry_record(response))
    }
}

/// Flatten a BrasilAPI payload. Blank strings count as absent.
pub fn registry_record(resp: CnpjResponse) -> RegistryRecord {
    let secondary_activities = resp
        .cnaes_secundarios
        .unwrap_or_default()
        .into_iter()
        .filter(|a| !a.is_placeholder())
        .map(|a| Activity {
            code: a.codigo.unwrap_or_default(),
            description: a.descricao.unwrap_or_default(),
        })
        .collect();

    RegistryRecord {
        legal_name: resp.razao_social.trim().to_string(),
        trade_name: non_blank(resp.nome_fantasia),
        street: non_blank(resp.logradouro),
        number: non_blank(resp.numero),
        district: non_blank(resp.bairro),
        postal_code: non_blank(resp.cep),
        municipality: non_blank(resp.municipio),
        state: non_blank(resp.uf),
        activity_code: non_blank(resp.cnae_fiscal),
        activity_description: non_blank(resp.cnae_fiscal_descricao),
        secondary_activities,
        legal_nature: non_blank(resp.natureza_juridica),
        status_code: non_blank(resp.situacao_cadastral),
        status_date: non_blank(resp.data_situacao_cadastral),
        raw_status: non_blank(resp.descricao_situacao_cadastral),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// GeoSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GeoSource: Send + Sync {
    /// Every municipality name of one state, in upstream order.
    async fn municipality_names(&self, uf: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl GeoSource for IbgeClient {
    async fn municipality_names(&self, uf: &str) -> Result<Vec<String>> {
        let municipalities = self.municipalities(uf).await?;
        Ok(municipalities.into_iter().map(|m| m.name).collect())
    }
}
