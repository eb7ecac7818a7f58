use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::consumption::{aggregate_consumption, AggregationRule, ConsumptionInput};
use crate::costs::{
    aggregate_costs, default_line_items, CostInput, CostLineItem, CostPerWp, LineTotal,
};
use crate::generation::{estimate_generation, GenerationParams};
use crate::project_fee::{lookup_project_fee, ProjectFeeInput};
use crate::returns::{estimate_return, CashFlowPoint, ReturnInput};
use crate::settings::QuoteSettings;
use crate::tariff::{normalize_tariff, TariffInputs};
use crate::types::{with_metadata, ComputationOutput, Kwh, Kwp, Money, Payback, Percent};
use crate::QuoteCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything the quoting form collects for one proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInput {
    pub tariff: TariffInputs,
    pub consumption: ConsumptionInput,
    pub installed_capacity_kwp: Kwp,
    /// Gain or loss relative to the horizontal plane (tilt, orientation, shading)
    #[serde(default)]
    pub gain_loss_pct: Percent,
    pub equipment_kit_cost: Money,
    #[serde(default = "default_line_items")]
    pub line_items: Vec<CostLineItem>,
    #[serde(default)]
    pub project_fee_surcharge_pct: Percent,
    pub margin_pct: Percent,
    pub commission_pct: Percent,
    #[serde(default)]
    pub settings: QuoteSettings,
}

/// The computed quote. Created fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResult {
    pub invoice_total: Money,
    pub project_total: Money,
    pub monthly_generation: Kwh,
    pub monthly_savings: Money,
    pub payback: Payback,

    pub installed_capacity_kwp: Kwp,
    pub effective_tusd: Money,
    pub effective_te: Money,
    pub effective_tariff: Money,
    pub average_consumption: Kwh,
    pub consumption_rule: AggregationRule,
    /// Generation as a share of average consumption; absent when consumption is not positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_coverage_pct: Option<Percent>,

    pub line_totals: Vec<LineTotal>,
    pub line_total: Money,
    pub project_fee: Money,
    pub profit: Money,
    pub commission: Money,
    pub tax_amount: Money,
    pub equipment_kit_cost: Money,
    pub cost_per_wp: Option<CostPerWp>,

    /// Total consumption per calendar month, January first
    pub monthly_consumption: Vec<Kwh>,
    pub cash_flow: Vec<CashFlowPoint>,
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Evaluate the whole quote in dependency order:
/// tariff, consumption, generation, project fee, costs, return.
///
/// The first failing stage aborts the quote; warnings from every stage are
/// collected into the envelope.
pub fn compute_quote(input: &QuoteInput) -> QuoteCalcResult<ComputationOutput<QuoteResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.settings.validate()?;

    let tariff = normalize_tariff(&input.tariff)?;
    warnings.extend(tariff.warnings);
    let tariff = tariff.result;

    let consumption = aggregate_consumption(&input.consumption)?;
    warnings.extend(consumption.warnings);
    let consumption = consumption.result;

    let generation = estimate_generation(&GenerationParams {
        installed_capacity_kwp: input.installed_capacity_kwp,
        gain_loss_pct: input.gain_loss_pct,
        reference_capacity_kwp: input.settings.reference_capacity_kwp,
    })?;
    warnings.extend(generation.warnings);
    let generation = generation.result;

    let fee = lookup_project_fee(&ProjectFeeInput {
        installed_capacity_kwp: input.installed_capacity_kwp,
        surcharge_pct: input.project_fee_surcharge_pct,
        bands: input.settings.fee_bands.clone(),
    })?;
    warnings.extend(fee.warnings);
    let project_fee = fee.result.project_fee;

    let costs = aggregate_costs(&CostInput {
        line_items: input.line_items.clone(),
        project_fee,
        margin_pct: input.margin_pct,
        commission_pct: input.commission_pct,
        taxes: input.settings.taxes.clone(),
        equipment_kit_cost: input.equipment_kit_cost,
        installed_capacity_kwp: Some(input.installed_capacity_kwp),
    })?;
    warnings.extend(costs.warnings);
    let costs = costs.result;

    let returns = estimate_return(&ReturnInput {
        monthly_generation: generation.monthly_generation,
        tariff: tariff.effective_total,
        project_total: costs.project_total,
        horizon_years: input.settings.horizon_years,
    })?;
    warnings.extend(returns.warnings);
    let returns = returns.result;

    let average_consumption = consumption.average_monthly_consumption;
    let generation_coverage_pct = if average_consumption > Decimal::ZERO {
        let share = checked::div(
            generation.monthly_generation,
            average_consumption,
            "generation coverage",
        )?;
        Some(checked::mul(share, dec!(100), "generation coverage")?)
    } else {
        None
    };
    let coverage_warning = match generation_coverage_pct {
        Some(coverage) if coverage < dec!(80) => Some(format!(
            "Generation covers only {}% of average consumption",
            coverage.round_dp(0)
        )),
        Some(coverage) if coverage > dec!(130) => Some(format!(
            "Generation exceeds average consumption by {}%; surplus credits may expire",
            (coverage - dec!(100)).round_dp(0)
        )),
        _ => None,
    };
    if let Some(w) = coverage_warning {
        log::warn!("{w}");
        warnings.push(w);
    }

    log::info!(
        "quote computed: {} kWp, invoice {}, project {}, payback {}",
        input.installed_capacity_kwp,
        costs.invoice_total.round_dp(2),
        costs.project_total.round_dp(2),
        returns.payback
    );

    let output = QuoteResult {
        invoice_total: costs.invoice_total,
        project_total: costs.project_total,
        monthly_generation: generation.monthly_generation,
        monthly_savings: returns.monthly_savings,
        payback: returns.payback,
        installed_capacity_kwp: input.installed_capacity_kwp,
        effective_tusd: tariff.effective_tusd,
        effective_te: tariff.effective_te,
        effective_tariff: tariff.effective_total,
        average_consumption,
        consumption_rule: consumption.rule,
        generation_coverage_pct,
        line_totals: costs.line_totals,
        line_total: costs.line_total,
        project_fee,
        profit: costs.profit,
        commission: costs.commission,
        tax_amount: costs.tax_amount,
        equipment_kit_cost: costs.equipment_kit_cost,
        cost_per_wp: costs.cost_per_wp,
        monthly_consumption: consumption.monthly_totals,
        cash_flow: returns.cash_flow,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Solar quote: tariff gross-up, net consumption, reference yield, tiered fee, invoice gross-up, simple payback",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Parse a quote request from JSON and compute it.
pub fn compute_quote_json(json: &str) -> QuoteCalcResult<ComputationOutput<QuoteResult>> {
    let input: QuoteInput = serde_json::from_str(json)?;
    compute_quote(&input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
