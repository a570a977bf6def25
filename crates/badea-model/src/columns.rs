//! Well-known column names and sentinel values.

pub const INDICATOR: &str = "INDICATOR";
pub const OBS_VALUE: &str = "OBS_VALUE";
pub const OBS_STATUS: &str = "OBS_STATUS";
pub const FREQ: &str = "FREQ";
pub const TIME_PERIOD: &str = "TIME_PERIOD";

/// Code used for "not applicable" members and padded dimensions.
pub const NOT_APPLICABLE: &str = "_Z";
pub const NOT_APPLICABLE_LABEL: &str = "No aplica";

pub const ID: &str = "ID";
pub const COD: &str = "COD";
pub const NAME: &str = "NAME";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const PARENTCODE: &str = "PARENTCODE";
pub const ORDER: &str = "ORDER";

/// Columns of a hierarchy code list once `COD` has been dropped.
pub const CODELIST_COLUMNS: [&str; 5] = [ID, NAME, DESCRIPTION, PARENTCODE, ORDER];

const COLUMN_PREFIX: &str = "D_";
const COLUMN_SUFFIX: &str = "_0";

/// Remove the API's `D_` prefix and `_0` suffix from a column alias.
pub fn strip_column_affixes(name: &str) -> String {
    let name = name.strip_prefix(COLUMN_PREFIX).unwrap_or(name);
    let name = name.strip_suffix(COLUMN_SUFFIX).unwrap_or(name);
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_affixes() {
        assert_eq!(strip_column_affixes("D_SEXO_0"), "SEXO");
        assert_eq!(strip_column_affixes("D_TEMPORAL_0"), "TEMPORAL");
    }

    #[test]
    fn leaves_plain_names_alone() {
        assert_eq!(strip_column_affixes("OBS_VALUE"), "OBS_VALUE");
        assert_eq!(strip_column_affixes("INDICATOR"), "INDICATOR");
        assert_eq!(strip_column_affixes("D_EDAD"), "EDAD");
    }
}
