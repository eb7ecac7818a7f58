use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::QuoteCalcResult;

const HUNDRED: Decimal = dec!(100);

/// Utility tariff components and the indirect taxes levied on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffInputs {
    /// ICMS (state VAT) in percentage points
    pub icms_pct: Percent,
    /// PIS in percentage points
    pub pis_pct: Percent,
    /// COFINS in percentage points
    pub cofins_pct: Percent,
    /// Distribution-system usage charge before taxes (R$/kWh)
    pub nominal_tusd: Money,
    /// Energy charge before taxes (R$/kWh)
    pub nominal_te: Money,
    /// "Fio B" distribution cost (R$), shown on the proposal only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fio_b_cost: Option<Money>,
    /// Share of generation consumed at the moment it is produced, shown on the proposal only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simultaneity_factor: Option<Decimal>,
}

/// Tax-inclusive tariff components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffOutput {
    pub effective_tusd: Money,
    pub effective_te: Money,
    /// TUSD + TE with taxes; the rate used to value generated energy
    pub effective_total: Money,
    pub nominal_total: Money,
    /// Effective over nominal, minus one, in percentage points
    pub tax_load_pct: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fio_b_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simultaneity_factor: Option<Decimal>,
}

/// Gross up a nominal tariff component for PIS/COFINS and then ICMS.
///
/// effective = nominal / (1 - pis/100 - cofins/100) / (1 - icms/100)
///
/// Tax loads of 100% or more are rejected.
pub fn effective_tariff(
    nominal: Money,
    pis_pct: Percent,
    cofins_pct: Percent,
    icms_pct: Percent,
) -> QuoteCalcResult<Money> {
    let federal = Decimal::ONE - pis_pct / HUNDRED - cofins_pct / HUNDRED;
    if federal <= Decimal::ZERO {
        return Err(QuoteError::config(
            "pis_pct + cofins_pct",
            format!(
                "PIS + COFINS must be below 100%, got {}%",
                pis_pct + cofins_pct
            ),
        ));
    }
    let state = Decimal::ONE - icms_pct / HUNDRED;
    if state <= Decimal::ZERO {
        return Err(QuoteError::config(
            "icms_pct",
            format!("ICMS must be below 100%, got {icms_pct}%"),
        ));
    }
    let after_federal = checked::div(nominal, federal, "tariff gross-up")?;
    checked::div(after_federal, state, "tariff gross-up")
}

/// Normalize both tariff components (TUSD and TE) to their tax-inclusive values.
pub fn normalize_tariff(input: &TariffInputs) -> QuoteCalcResult<ComputationOutput<TariffOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_tariff_input(input)?;

    let effective_tusd = effective_tariff(
        input.nominal_tusd,
        input.pis_pct,
        input.cofins_pct,
        input.icms_pct,
    )?;
    let effective_te = effective_tariff(
        input.nominal_te,
        input.pis_pct,
        input.cofins_pct,
        input.icms_pct,
    )?;

    let effective_total = checked::add(effective_tusd, effective_te, "effective tariff")?;
    let nominal_total = checked::add(input.nominal_tusd, input.nominal_te, "nominal tariff")?;
    let tax_load_pct = if nominal_total.is_zero() {
        Decimal::ZERO
    } else {
        let ratio = checked::div(effective_total, nominal_total, "tax load")?;
        checked::mul(ratio - Decimal::ONE, HUNDRED, "tax load")?
    };

    if nominal_total.is_zero() {
        warnings.push("Nominal tariff is zero; generated energy will have no value".into());
    } else if effective_total / dec!(2) > nominal_total {
        warnings.push(format!(
            "Effective tariff {} is more than twice the nominal {}; check tax percentages",
            effective_total.round_dp(4),
            nominal_total
        ));
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!(
        "tariff normalized: TUSD {} -> {}, TE {} -> {}",
        input.nominal_tusd,
        effective_tusd,
        input.nominal_te,
        effective_te
    );

    let output = TariffOutput {
        effective_tusd,
        effective_te,
        effective_total,
        nominal_total,
        tax_load_pct,
        fio_b_cost: input.fio_b_cost,
        simultaneity_factor: input.simultaneity_factor,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Tariff gross-up for PIS/COFINS then ICMS",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_tariff_input(input: &TariffInputs) -> QuoteCalcResult<()> {
    let percentages = [
        ("icms_pct", input.icms_pct),
        ("pis_pct", input.pis_pct),
        ("cofins_pct", input.cofins_pct),
    ];
    for (field, value) in percentages {
        if value < Decimal::ZERO {
            return Err(QuoteError::invalid(field, "Tax percentage cannot be negative"));
        }
    }
    if input.nominal_tusd < Decimal::ZERO {
        return Err(QuoteError::invalid("nominal_tusd", "Tariff cannot be negative"));
    }
    if input.nominal_te < Decimal::ZERO {
        return Err(QuoteError::invalid("nominal_te", "Tariff cannot be negative"));
    }
    if let Some(sf) = input.simultaneity_factor {
        if sf < Decimal::ZERO || sf > Decimal::ONE {
            return Err(QuoteError::invalid(
                "simultaneity_factor",
                "Simultaneity factor must be between 0 and 1",
            ));
        }
    }
    if let Some(fio_b) = input.fio_b_cost {
        if fio_b < Decimal::ZERO {
            return Err(QuoteError::invalid("fio_b_cost", "Fio B cost cannot be negative"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Typical residential tariff for a Minas Gerais distributor.
    fn sample_input() -> TariffInputs {
        TariffInputs {
            icms_pct: dec!(18),
            pis_pct: dec!(0.8),
            cofins_pct: dec!(3.7),
            nominal_tusd: dec!(0.4354),
            nominal_te: dec!(0.3136),
            fio_b_cost: None,
            simultaneity_factor: None,
        }
    }

    #[test]
    fn test_effective_tusd_reference_value() {
        // 0.4354 / (1 - 0.008 - 0.037) / (1 - 0.18) = 0.4354 / 0.955 / 0.82
        let eff = effective_tariff(dec!(0.4354), dec!(0.8), dec!(3.7), dec!(18)).unwrap();
        assert_eq!(eff.round_dp(4), dec!(0.5560));
    }

    #[test]
    fn test_no_taxes_is_identity() {
        let eff = effective_tariff(dec!(0.75), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(eff, dec!(0.75));
    }

    #[test]
    fn test_normalize_both_components() {
        let result = normalize_tariff(&sample_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.effective_tusd.round_dp(4), dec!(0.5560));
        // 0.3136 / 0.955 / 0.82 = 0.40046...
        assert_eq!(out.effective_te.round_dp(4), dec!(0.4005));
        assert_eq!(out.effective_total, out.effective_tusd + out.effective_te);
        assert_eq!(out.nominal_total, dec!(0.7490));
        assert!(out.tax_load_pct > dec!(27) && out.tax_load_pct < dec!(28));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_federal_taxes_at_hundred_rejected() {
        let result = effective_tariff(dec!(0.5), dec!(60), dec!(40), dec!(18));
        match result.unwrap_err() {
            QuoteError::Configuration { field, .. } => assert!(field.contains("pis")),
            e => panic!("Expected Configuration, got {e:?}"),
        }
    }

    #[test]
    fn test_icms_at_hundred_rejected() {
        let result = effective_tariff(dec!(0.5), dec!(0.8), dec!(3.7), dec!(100));
        match result.unwrap_err() {
            QuoteError::Configuration { field, .. } => assert_eq!(field, "icms_pct"),
            e => panic!("Expected Configuration, got {e:?}"),
        }
    }

    #[test]
    fn test_negative_percentage_rejected() {
        let mut input = sample_input();
        input.pis_pct = dec!(-1);
        assert!(matches!(
            normalize_tariff(&input).unwrap_err(),
            QuoteError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_simultaneity_factor_out_of_range_rejected() {
        let mut input = sample_input();
        input.simultaneity_factor = Some(dec!(1.2));
        assert!(normalize_tariff(&input).is_err());
    }

    #[test]
    fn test_proposal_only_fields_echoed() {
        let mut input = sample_input();
        input.fio_b_cost = Some(dec!(240.38));
        input.simultaneity_factor = Some(dec!(0.38));
        let out = normalize_tariff(&input).unwrap().result;
        assert_eq!(out.fio_b_cost, Some(dec!(240.38)));
        assert_eq!(out.simultaneity_factor, Some(dec!(0.38)));
    }

    #[test]
    fn test_heavy_tax_load_warning() {
        let mut input = sample_input();
        input.icms_pct = dec!(60);
        let result = normalize_tariff(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("twice the nominal")));
    }

    #[test]
    fn test_huge_nominal_tariff_is_overflow_error() {
        let mut input = sample_input();
        input.nominal_tusd = Decimal::MAX / dec!(1.1);
        match normalize_tariff(&input).unwrap_err() {
            QuoteError::Overflow { context } => assert_eq!(context, "tariff gross-up"),
            e => panic!("Expected Overflow, got {e:?}"),
        }
    }

    #[test]
    fn test_methodology_string() {
        let result = normalize_tariff(&sample_input()).unwrap();
        assert_eq!(result.methodology, "Tariff gross-up for PIS/COFINS then ICMS");
    }
}
