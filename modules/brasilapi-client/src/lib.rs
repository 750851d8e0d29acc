pub mod error;
pub mod types;

pub use error::{BrasilApiError, Result};
pub use types::{CnpjResponse, SecondaryActivity};

use std::time::Duration;

const BASE_URL: &str = "https://brasilapi.com.br/api";

pub struct BrasilApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl BrasilApiClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, timeout)
    }

    /// Point the client at another deployment (or a local mock server).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cnpj-enricher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one company by its digits-only CNPJ.
    ///
    /// Any status other than 200 is an `Api` error, a body that is not a company
    /// record is a `Parse` error.
    pub async fn cnpj(&self, cnpj: &str) -> Result<CnpjResponse> {
        let url = format!("{}/cnpj/v1/{}", self.base_url, cnpj);
        tracing::debug!(cnpj, "Requesting BrasilAPI");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrasilApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let company: CnpjResponse = serde_json::from_str(&body)?;
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> BrasilApiClient {
        BrasilApiClient::with_base_url(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_parses_company() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/cnpj/v1/11222333000181");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "cnpj": "11222333000181",
                        "razao_social": "EMPRESA TESTE LTDA",
                        "nome_fantasia": "TESTE",
                        "municipio": "SAO PAULO",
                        "uf": "SP",
                        "cnae_fiscal": 4751201,
                        "cnae_fiscal_descricao": "Comercio varejista",
                        "situacao_cadastral": 2,
                        "descricao_situacao_cadastral": "ATIVA"
                    }));
            })
            .await;

        let company = client(&server).cnpj("11222333000181").await.unwrap();

        mock.assert_async().await;
        assert_eq!(company.razao_social, "EMPRESA TESTE LTDA");
        assert_eq!(company.municipio.as_deref(), Some("SAO PAULO"));
        assert_eq!(company.cnae_fiscal.as_deref(), Some("4751201"));
        assert_eq!(company.situacao_cadastral.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cnpj/v1/00000000000000");
                then.status(404).body(r#"{"message":"CNPJ 00000000000000 não encontrado."}"#);
            })
            .await;

        let err = client(&server).cnpj("00000000000000").await.unwrap_err();
        match err {
            BrasilApiError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("não encontrado"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_success_statuses_are_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cnpj/v1/11222333000181");
                then.status(204);
            })
            .await;

        let err = client(&server).cnpj("11222333000181").await.unwrap_err();
        assert!(matches!(err, BrasilApiError::Api { status: 204, .. }));
    }

    #[tokio::test]
    async fn slow_upstream_is_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cnpj/v1/11222333000181");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(serde_json::json!({ "razao_social": "LENTA LTDA" }));
            })
            .await;

        let client =
            BrasilApiClient::with_base_url(&server.base_url(), Duration::from_millis(200)).unwrap();
        let err = client.cnpj("11222333000181").await.unwrap_err();

        assert!(matches!(err, BrasilApiError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cnpj/v1/11222333000181");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = client(&server).cnpj("11222333000181").await.unwrap_err();
        assert!(matches!(err, BrasilApiError::Parse(_)));
    }
}
