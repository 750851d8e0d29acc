//! Identifier and place-name normalization.
//!
//! Every cache in the pipeline is keyed by one of these two functions, so they
//! must stay idempotent.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A digits-only CNPJ. The only way to build one is through normalization,
/// so any value of this type is already a valid cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cnpj(String);

impl Cnpj {
    pub fn normalize(raw: &str) -> Self {
        Cnpj(normalize_cnpj(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn formatted(&self) -> String {
        format_cnpj(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Cnpj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip everything that is not an ASCII digit: `"11.222.333/0001-81"` → `"11222333000181"`.
pub fn normalize_cnpj(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Display form `XX.XXX.XXX/XXXX-XX`. Anything that is not 14 digits after
/// normalization is returned as given.
pub fn format_cnpj(raw: &str) -> String {
    let digits = normalize_cnpj(raw);
    if digits.len() != 14 {
        return raw.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    )
}

/// Comparison key for municipality names: accents removed, lowercased,
/// whitespace collapsed. `"  São   PAULO "` → `"sao paulo"`.
pub fn name_key(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
