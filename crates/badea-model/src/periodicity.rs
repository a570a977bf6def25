//! Periodicity labels and their SDMX frequency codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const MONTHLY_INE: &str = "Mensual  Fuente: Instituto Nacional de Estadística";

/// Periodicities whose temporal codes are `YYYYMM`-style and need a separator.
const SUB_ANNUAL: &[&str] = &["Mensual", "Trimestral", MONTHLY_INE, "Monthly", "Quarterly"];

const FREQUENCIES: &[(&str, Frequency)] = &[
    ("Mensual", Frequency::Monthly),
    (MONTHLY_INE, Frequency::Monthly),
    ("Monthly", Frequency::Monthly),
    ("", Frequency::Monthly),
    ("Trimestral", Frequency::Quarterly),
    ("Quarterly", Frequency::Quarterly),
    ("Anual", Frequency::Annual),
    ("Anual. Datos a 31 de diciembre", Frequency::Annual),
    ("Annual", Frequency::Annual),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    /// Look up the frequency for a periodicity label. Labels are matched
    /// exactly; an unknown label is an error rather than a default.
    pub fn from_periodicity(label: &str) -> Result<Self> {
        FREQUENCIES
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, frequency)| *frequency)
            .ok_or_else(|| ModelError::UnknownPeriodicity {
                label: label.to_string(),
            })
    }

    pub fn sdmx_code(self) -> &'static str {
        match self {
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Annual => "A",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sdmx_code())
    }
}

pub fn is_sub_annual(periodicity: &str) -> bool {
    SUB_ANNUAL.contains(&periodicity)
}
