use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Kwh, Money, Payback};
use crate::QuoteCalcResult;

/// Cash-flow horizon used when the caller does not ask for one: the usual
/// module performance warranty.
pub const DEFAULT_HORIZON_YEARS: u32 = 25;

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_YEARS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnInput {
    pub monthly_generation: Kwh,
    /// Tax-inclusive tariff (R$/kWh) the generated energy displaces
    pub tariff: Money,
    pub project_total: Money,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

/// Cumulative position at the end of a year; year 0 is the up-front payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub year: u32,
    pub cumulative: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOutput {
    pub monthly_savings: Money,
    pub annual_savings: Money,
    pub payback: Payback,
    pub cash_flow: Vec<CashFlowPoint>,
}

/// payback = project_total / monthly_savings / 12, or `NotApplicable` when
/// the installation saves nothing.
pub fn payback_years(project_total: Money, monthly_savings: Money) -> QuoteCalcResult<Payback> {
    if monthly_savings <= Decimal::ZERO {
        return Ok(Payback::NotApplicable);
    }
    let months = checked::div(project_total, monthly_savings, "payback")?;
    Ok(Payback::Years(months / dec!(12)))
}

/// Undiscounted cumulative cash flow: `-project_total + 12 * n * monthly_savings`.
pub fn cumulative_cash_flow(
    project_total: Money,
    monthly_savings: Money,
    horizon_years: u32,
) -> QuoteCalcResult<Vec<CashFlowPoint>> {
    let annual = checked::mul(monthly_savings, dec!(12), "annual savings")?;
    (0..=horizon_years)
        .map(|year| {
            let earned = checked::mul(annual, Decimal::from(year), "cumulative cash flow")?;
            let cumulative = checked::sub(earned, project_total, "cumulative cash flow")?;
            Ok(CashFlowPoint { year, cumulative })
        })
        .collect()
}

/// Monthly savings and payback of an installation.
pub fn estimate_return(input: &ReturnInput) -> QuoteCalcResult<ComputationOutput<ReturnOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.tariff < Decimal::ZERO {
        return Err(QuoteError::invalid("tariff", "Tariff cannot be negative"));
    }
    if input.project_total < Decimal::ZERO {
        return Err(QuoteError::invalid(
            "project_total",
            "Project total cannot be negative",
        ));
    }

    let monthly_savings = checked::mul(input.monthly_generation, input.tariff, "monthly savings")?;
    let annual_savings = checked::mul(monthly_savings, dec!(12), "annual savings")?;
    let payback = payback_years(input.project_total, monthly_savings)?;
    let cash_flow =
        cumulative_cash_flow(input.project_total, monthly_savings, input.horizon_years)?;

    match payback {
        Payback::NotApplicable => warnings.push(
            "Installation produces no savings; payback is not applicable".into(),
        ),
        Payback::Years(y) if y > Decimal::from(input.horizon_years) => warnings.push(format!(
            "Payback of {} years exceeds the {}-year horizon",
            y.round_dp(1),
            input.horizon_years
        )),
        Payback::Years(_) => {}
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!("return estimated: savings {monthly_savings}/month, payback {payback}");

    let output = ReturnOutput {
        monthly_savings,
        annual_savings,
        payback,
        cash_flow,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Simple payback on displaced tariff",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ReturnInput {
        ReturnInput {
            monthly_generation: dec!(1000),
            tariff: dec!(0.95),
            project_total: dec!(22800),
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }

    #[test]
    fn test_savings_and_payback() {
        let out = estimate_return(&sample_input()).unwrap().result;
        assert_eq!(out.monthly_savings, dec!(950));
        assert_eq!(out.annual_savings, dec!(11400));
        // 22800 / 950 / 12 = 2 years
        assert_eq!(out.payback, Payback::Years(dec!(2)));
    }

    #[test]
    fn test_zero_savings_is_not_applicable() {
        let mut input = sample_input();
        input.tariff = Decimal::ZERO;
        let result = estimate_return(&input).unwrap();
        assert_eq!(result.result.payback, Payback::NotApplicable);
        assert!(result.result.payback.years().is_none());
        assert!(result.warnings.iter().any(|w| w.contains("not applicable")));
    }

    #[test]
    fn test_negative_savings_is_not_applicable() {
        assert_eq!(
            payback_years(dec!(1000), dec!(-5)).unwrap(),
            Payback::NotApplicable
        );
    }

    #[test]
    fn test_tiny_savings_on_large_project_is_overflow_error() {
        let input = ReturnInput {
            monthly_generation: dec!(0.0000000000001),
            tariff: dec!(0.00000000000001),
            project_total: dec!(1000000000),
            horizon_years: DEFAULT_HORIZON_YEARS,
        };
        match estimate_return(&input).unwrap_err() {
            QuoteError::Overflow { context } => assert_eq!(context, "payback"),
            e => panic!("Expected Overflow, got {e:?}"),
        }
    }

    #[test]
    fn test_cash_flow_overflow_is_error() {
        assert!(matches!(
            cumulative_cash_flow(Decimal::ZERO, Decimal::MAX / dec!(20), 25).unwrap_err(),
            QuoteError::Overflow { .. }
        ));
    }

    #[test]
    fn test_cash_flow_crosses_zero_at_payback() {
        let out = estimate_return(&sample_input()).unwrap().result;
        assert_eq!(out.cash_flow.len(), 26);
        assert_eq!(out.cash_flow[0].cumulative, dec!(-22800));
        assert_eq!(out.cash_flow[2].cumulative, Decimal::ZERO);
        assert_eq!(out.cash_flow[25].cumulative, dec!(262200));
    }

    #[test]
    fn test_long_payback_warning() {
        let mut input = sample_input();
        input.project_total = dec!(400000);
        let result = estimate_return(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn test_negative_tariff_rejected() {
        let mut input = sample_input();
        input.tariff = dec!(-0.1);
        assert!(estimate_return(&input).is_err());
    }
}
