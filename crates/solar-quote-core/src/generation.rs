use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Kwh, Kwp, Percent};
use crate::QuoteCalcResult;

/// Monthly yield of the reference capacity at the baseline tilt.
pub const REFERENCE_MONTHLY_YIELD_KWH: Decimal = dec!(1000);

/// Capacity that yields 1000 kWh/month on a horizontal plane in the reference
/// location. A conservative empirical figure; override per locale in settings.
pub const DEFAULT_REFERENCE_CAPACITY_KWP: Decimal = dec!(7.8);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub installed_capacity_kwp: Kwp,
    /// Gain (positive) or loss (negative) relative to the horizontal plane
    #[serde(default)]
    pub gain_loss_pct: Percent,
    #[serde(default = "default_reference_capacity")]
    pub reference_capacity_kwp: Kwp,
}

fn default_reference_capacity() -> Kwp {
    DEFAULT_REFERENCE_CAPACITY_KWP
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub monthly_generation: Kwh,
    pub annual_generation: Kwh,
    /// Expected yield per calendar month, January first
    pub monthly_series: Vec<Kwh>,
}

/// generation = (capacity * 1000 / reference) * (1 + gain_loss / 100)
pub fn monthly_generation(
    capacity: Kwp,
    gain_loss_pct: Percent,
    reference_capacity: Kwp,
) -> QuoteCalcResult<Kwh> {
    if reference_capacity <= Decimal::ZERO {
        return Err(QuoteError::config(
            "reference_capacity_kwp",
            format!("Reference capacity must be positive, got {reference_capacity}"),
        ));
    }
    let reference_yield = checked::mul(capacity, REFERENCE_MONTHLY_YIELD_KWH, "generation")?;
    let scaled = checked::div(reference_yield, reference_capacity, "generation")?;
    checked::mul(scaled, Decimal::ONE + gain_loss_pct / dec!(100), "generation")
}

/// Estimate the monthly energy yield of an installation.
pub fn estimate_generation(
    params: &GenerationParams,
) -> QuoteCalcResult<ComputationOutput<GenerationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if params.installed_capacity_kwp <= Decimal::ZERO {
        return Err(QuoteError::invalid(
            "installed_capacity_kwp",
            "Installed capacity must be positive",
        ));
    }
    if params.gain_loss_pct <= dec!(-100) {
        return Err(QuoteError::invalid(
            "gain_loss_pct",
            "A loss of 100% or more leaves nothing to generate",
        ));
    }

    let monthly = monthly_generation(
        params.installed_capacity_kwp,
        params.gain_loss_pct,
        params.reference_capacity_kwp,
    )?;

    if params.gain_loss_pct.abs() > dec!(30) {
        warnings.push(format!(
            "Gain/loss of {}% relative to the horizontal plane is unusually large",
            params.gain_loss_pct
        ));
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!(
        "generation estimated: {} kWp -> {} kWh/month",
        params.installed_capacity_kwp,
        monthly
    );

    let output = GenerationOutput {
        monthly_generation: monthly,
        annual_generation: checked::mul(monthly, dec!(12), "annual generation")?,
        monthly_series: vec![monthly; 12],
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Reference-capacity yield scaling",
        params,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(capacity: Decimal, gain_loss: Decimal) -> GenerationParams {
        GenerationParams {
            installed_capacity_kwp: capacity,
            gain_loss_pct: gain_loss,
            reference_capacity_kwp: DEFAULT_REFERENCE_CAPACITY_KWP,
        }
    }

    #[test]
    fn test_reference_capacity_yields_one_thousand() {
        let kwh = monthly_generation(dec!(7.8), Decimal::ZERO, dec!(7.8)).unwrap();
        assert_eq!(kwh, dec!(1000));
    }

    #[test]
    fn test_gain_scales_yield() {
        // 4 * 1000 / 7.8 * 1.05 = 538.4615...
        let kwh = monthly_generation(dec!(4.0), dec!(5), dec!(7.8)).unwrap();
        assert_eq!(kwh.round_dp(2), dec!(538.46));
    }

    #[test]
    fn test_loss_reduces_yield() {
        let kwh = monthly_generation(dec!(7.8), dec!(-10), dec!(7.8)).unwrap();
        assert_eq!(kwh, dec!(900));
    }

    #[test]
    fn test_non_positive_reference_is_configuration_error() {
        for reference in [Decimal::ZERO, dec!(-7.8)] {
            match monthly_generation(dec!(4), Decimal::ZERO, reference).unwrap_err() {
                QuoteError::Configuration { field, .. } => {
                    assert_eq!(field, "reference_capacity_kwp")
                }
                e => panic!("Expected Configuration, got {e:?}"),
            }
        }
    }

    #[test]
    fn test_estimate_reports_annual_and_series() {
        let out = estimate_generation(&params(dec!(7.8), Decimal::ZERO))
            .unwrap()
            .result;
        assert_eq!(out.monthly_generation, dec!(1000));
        assert_eq!(out.annual_generation, dec!(12000));
        assert_eq!(out.monthly_series.len(), 12);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            estimate_generation(&params(Decimal::ZERO, Decimal::ZERO)).unwrap_err(),
            QuoteError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_large_gain_warning() {
        let result = estimate_generation(&params(dec!(5), dec!(40))).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("unusually large")));
    }

    #[test]
    fn test_reference_defaults_when_omitted() {
        let p: GenerationParams =
            serde_json::from_str(r#"{"installed_capacity_kwp": "4.5"}"#).unwrap();
        assert_eq!(p.reference_capacity_kwp, dec!(7.8));
        assert_eq!(p.gain_loss_pct, Decimal::ZERO);
    }
}
