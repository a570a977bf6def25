//! Default identifiers for codes that have no curated mapping yet.

use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_STOPWORDS: [&str; 5] = ["A", "DE", "POR", "PARA", "EN"];

/// Descriptions at least this long are abbreviated token by token.
const ABBREVIATE_FROM: usize = 15;
const TOKEN_LEN: usize = 4;

/// Replacements applied in order, after abbreviation.
const SYMBOLS: [(&str, &str); 14] = [
    ("%", "PCT"),
    ("€", "EUR"),
    ("(", ""),
    (")", ""),
    (">=", "GE"),
    (">", "GT"),
    ("<=", "LT"),
    ("<", "LE"),
    ("/", ""),
    ("\"", ""),
    (":", ""),
    (",", ""),
    ("+", "MAS"),
    (".", ""),
];

/// Derive an identifier from a free-text description.
///
/// The description is uppercased with spaces turned into underscores. Long
/// results drop stopword tokens and keep at most four characters of every
/// other token. Symbols are then spelled out or removed and diacritics
/// stripped, leaving plain ASCII. `None` stays `None`.
///
/// ```
/// use badea_map::{DEFAULT_STOPWORDS, default_identifier};
///
/// let stopwords: Vec<String> = DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect();
/// assert_eq!(
///     default_identifier(Some("Tasa de paro"), &stopwords).as_deref(),
///     Some("TASA_DE_PARO")
/// );
/// ```
pub fn default_identifier(description: Option<&str>, stopwords: &[String]) -> Option<String> {
    let description = description?;
    let mut identifier = description.to_uppercase().replace(' ', "_");

    if identifier.chars().count() >= ABBREVIATE_FROM {
        identifier = identifier
            .split('_')
            .filter(|token| !stopwords.iter().any(|word| word == token))
            .map(|token| token.chars().take(TOKEN_LEN).collect::<String>())
            .collect::<Vec<_>>()
            .join("_");
    }

    for (symbol, replacement) in SYMBOLS {
        identifier = identifier.replace(symbol, replacement);
    }

    Some(identifier.nfd().filter(char::is_ascii).collect())
}
