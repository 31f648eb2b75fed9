//! Compiled intel snapshot
//!
//! The intel document is produced by the upstream claim compiler and is
//! loosely shaped: the engine only needs the current rial market rate and the
//! annual inflation figure, each of which may appear under several spellings.
//! The document is kept as a `serde_json::Value` and navigated on demand.

use crate::economy::ClassificationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candidate fields for the rial rate under `rial_usd_rate`, in preference order
pub const RIAL_RATE_CANDIDATES: [&str; 4] = ["market", "open_market", "free_market", "value"];

/// Candidate fields for inflation under `inflation`, in preference order
pub const INFLATION_CANDIDATES: [&str; 3] = [
    "official_annual_percent",
    "annual_percent",
    "unofficial_annual_percent",
];

/// Economic inputs extracted from the intel snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicInputs {
    /// Market rate, IRR per USD
    pub rial_usd_rate: f64,
    /// Annual inflation, percent
    pub inflation_annual_percent: f64,
}

/// Compiled intel document
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledIntel {
    document: Value,
}

impl CompiledIntel {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// `current_state.economic_conditions`, falling back to a top-level
    /// `economic_conditions` object
    fn economic_conditions(&self) -> Option<&Value> {
        self.document
            .pointer("/current_state/economic_conditions")
            .or_else(|| self.document.get("economic_conditions"))
            .filter(|v| !v.is_null())
    }

    /// Extract the rial rate and inflation figure.
    ///
    /// # Errors
    ///
    /// Names the missing path: `economic_conditions`, `rial_usd_rate` or
    /// `inflation`, or lists the candidate fields when all of them are null.
    pub fn economic_inputs(&self) -> Result<EconomicInputs, ClassificationError> {
        let conditions = self
            .economic_conditions()
            .ok_or(ClassificationError::MissingEconomicConditions)?;

        let rial = conditions
            .get("rial_usd_rate")
            .filter(|v| !v.is_null())
            .ok_or(ClassificationError::MissingField {
                field: "rial_usd_rate",
            })?;
        let inflation = conditions
            .get("inflation")
            .filter(|v| !v.is_null())
            .ok_or(ClassificationError::MissingField { field: "inflation" })?;

        let rial_usd_rate =
            first_number(rial, &RIAL_RATE_CANDIDATES).ok_or(ClassificationError::NoUsableValue {
                field: "rial_usd_rate",
                candidates: RIAL_RATE_CANDIDATES.join(", "),
            })?;
        let inflation_annual_percent = first_number(inflation, &INFLATION_CANDIDATES).ok_or(
            ClassificationError::NoUsableValue {
                field: "inflation",
                candidates: INFLATION_CANDIDATES.join(", "),
            },
        )?;

        Ok(EconomicInputs {
            rial_usd_rate,
            inflation_annual_percent,
        })
    }
}

/// A bare number, or the first non-null candidate field of an object
fn first_number(value: &Value, candidates: &[&str]) -> Option<f64> {
    if let Some(n) = as_number(value) {
        return Some(n);
    }
    candidates
        .iter()
        .filter_map(|field| value.get(*field))
        .find_map(as_number)
}

/// Numbers, or numeric strings with thousands separators ("1,500,000")
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse::<f64>().ok(),
        _ => None,
    }
}
