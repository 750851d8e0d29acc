use serde::{Deserialize, Deserializer};

/// Company record returned by `GET /cnpj/v1/{cnpj}`.
///
/// Only `razao_social` is required. Every other field is optional upstream and
/// some of them flip between JSON numbers and strings depending on the data
/// source BrasilAPI proxies to.
#[derive(Debug, Clone, Deserialize)]
pub struct CnpjResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub cnpj: Option<String>,
    pub razao_social: String,
    #[serde(default)]
    pub nome_fantasia: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub numero: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cep: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cnae_fiscal: Option<String>,
    #[serde(default)]
    pub cnae_fiscal_descricao: Option<String>,
    #[serde(default)]
    pub natureza_juridica: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub situacao_cadastral: Option<String>,
    #[serde(default)]
    pub descricao_situacao_cadastral: Option<String>,
    #[serde(default)]
    pub data_situacao_cadastral: Option<String>,
    #[serde(default)]
    pub cnaes_secundarios: Option<Vec<SecondaryActivity>>,
}

/// One entry of `cnaes_secundarios`. BrasilAPI sends `{"codigo": 0, "descricao": ""}`
/// when a company has no secondary activity.
#[derive(Debug, Clone, Deserialize)]
pub struct SecondaryActivity {
    #[serde(default, deserialize_with = "string_or_number")]
    pub codigo: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
}

impl SecondaryActivity {
    pub fn is_placeholder(&self) -> bool {
        let no_code = self
            .codigo
            .as_deref()
            .map_or(true, |c| c.trim().is_empty() || c.trim() == "0");
        let no_description = self
            .descricao
            .as_deref()
            .map_or(true, |d| d.trim().is_empty());
        no_code && no_description
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_accept_numbers_and_strings() {
        let json = r#"{
            "razao_social": "ACME LTDA",
            "cnae_fiscal": 4751201,
            "situacao_cadastral": "2",
            "cep": "01311902"
        }"#;
        let resp: CnpjResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.cnae_fiscal.as_deref(), Some("4751201"));
        assert_eq!(resp.situacao_cadastral.as_deref(), Some("2"));
        assert_eq!(resp.cep.as_deref(), Some("01311902"));
        assert!(resp.nome_fantasia.is_none());
        assert!(resp.cnaes_secundarios.is_none());
    }

    #[test]
    fn null_fields_are_absent() {
        let json = r#"{"razao_social": "ACME", "numero": null, "nome_fantasia": null}"#;
        let resp: CnpjResponse = serde_json::from_str(json).unwrap();
        assert!(resp.numero.is_none());
        assert!(resp.nome_fantasia.is_none());
    }

    #[test]
    fn missing_legal_name_is_rejected() {
        let json = r#"{"uf": "SP", "municipio": "SAO PAULO"}"#;
        assert!(serde_json::from_str::<CnpjResponse>(json).is_err());
    }

    #[test]
    fn zero_secondary_activity_is_placeholder() {
        let json = r#"{"codigo": 0, "descricao": ""}"#;
        let activity: SecondaryActivity = serde_json::from_str(json).unwrap();
        assert!(activity.is_placeholder());
    }
}
