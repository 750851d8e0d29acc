use serde::Deserialize;

/// A municipality from `/estados/{uf}/municipios`. The nested
/// microrregiao/regiao-imediata blocks are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Municipality {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
}

/// A federative unit from `/estados`.
#[derive(Debug, Clone, Deserialize)]
pub struct State {
    pub id: u64,
    #[serde(rename = "sigla")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
}
