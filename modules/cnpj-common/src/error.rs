use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Report error: {0}")]
    Report(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
