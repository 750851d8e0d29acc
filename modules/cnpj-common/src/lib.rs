pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::{Config, FileConfig};
pub use error::EnrichError;
pub use normalize::{format_cnpj, name_key, normalize_cnpj, Cnpj};
pub use types::*;
