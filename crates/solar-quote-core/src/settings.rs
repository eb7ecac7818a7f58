use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::costs::{default_tax_table, total_tax_pct, TaxEntry};
use crate::error::QuoteError;
use crate::generation::DEFAULT_REFERENCE_CAPACITY_KWP;
use crate::project_fee::{default_fee_bands, validate_fee_bands, FeeBand};
use crate::returns::DEFAULT_HORIZON_YEARS;
use crate::types::Kwp;
use crate::QuoteCalcResult;

/// Company- and locale-level configuration shared by every quote.
///
/// Each field falls back to its default when omitted, so `{}` is a valid
/// settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSettings {
    /// Capacity yielding 1000 kWh/month at the baseline tilt in this locale
    #[serde(default = "default_reference_capacity")]
    pub reference_capacity_kwp: Kwp,
    #[serde(default = "default_fee_bands")]
    pub fee_bands: Vec<FeeBand>,
    #[serde(default = "default_tax_table")]
    pub taxes: Vec<TaxEntry>,
    /// Years covered by the proposal's cash-flow chart
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

fn default_reference_capacity() -> Kwp {
    DEFAULT_REFERENCE_CAPACITY_KWP
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_YEARS
}

impl Default for QuoteSettings {
    fn default() -> Self {
        QuoteSettings {
            reference_capacity_kwp: DEFAULT_REFERENCE_CAPACITY_KWP,
            fee_bands: default_fee_bands(),
            taxes: default_tax_table(),
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl QuoteSettings {
    pub fn from_json(json: &str) -> QuoteCalcResult<Self> {
        let settings: QuoteSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make every quote fail.
    pub fn validate(&self) -> QuoteCalcResult<()> {
        if self.reference_capacity_kwp <= Decimal::ZERO {
            return Err(QuoteError::config(
                "reference_capacity_kwp",
                "Reference capacity must be positive",
            ));
        }
        validate_fee_bands(&self.fee_bands)?;
        total_tax_pct(&self.taxes)?;
        if self.horizon_years == 0 {
            return Err(QuoteError::config(
                "horizon_years",
                "Cash-flow horizon must be at least one year",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = QuoteSettings::from_json("{}").unwrap();
        assert_eq!(settings, QuoteSettings::default());
        assert_eq!(settings.reference_capacity_kwp, dec!(7.8));
        assert_eq!(settings.fee_bands.len(), 11);
    }

    #[test]
    fn test_partial_override() {
        let settings =
            QuoteSettings::from_json(r#"{"reference_capacity_kwp": "8.2", "horizon_years": 20}"#)
                .unwrap();
        assert_eq!(settings.reference_capacity_kwp, dec!(8.2));
        assert_eq!(settings.horizon_years, 20);
        assert_eq!(settings.taxes, default_tax_table());
    }

    #[test]
    fn test_bad_tax_table_rejected() {
        let json = r#"{"taxes": [{"name": "ISS", "rate_pct": "100"}]}"#;
        assert!(matches!(
            QuoteSettings::from_json(json).unwrap_err(),
            QuoteError::Configuration { .. }
        ));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            QuoteSettings::from_json("{not json").unwrap_err(),
            QuoteError::SerializationError(_)
        ));
    }
}
