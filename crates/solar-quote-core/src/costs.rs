use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Kwp, Money, Percent};
use crate::QuoteCalcResult;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An itemized service cost (labour, permits, travel, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
}

impl CostLineItem {
    pub fn new(description: &str, quantity: Decimal, unit_price: Money) -> Self {
        CostLineItem {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    pub fn total(&self) -> QuoteCalcResult<Money> {
        checked::mul(self.quantity, self.unit_price, "line item total")
    }
}

/// A tax levied on the service invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxEntry {
    pub name: String,
    pub rate_pct: Percent,
}

impl TaxEntry {
    pub fn new(name: &str, rate_pct: Percent) -> Self {
        TaxEntry {
            name: name.to_string(),
            rate_pct,
        }
    }
}

/// Standard service items of a small rooftop installation.
pub fn default_line_items() -> Vec<CostLineItem> {
    vec![
        CostLineItem::new("Labour", dec!(1), dec!(1000.00)),
        CostLineItem::new("ART (technical responsibility record)", dec!(1), dec!(100.00)),
        CostLineItem::new("Fuel", dec!(1.0), dec!(1.50)),
        CostLineItem::new("Vehicle rental", dec!(1), dec!(250.00)),
        CostLineItem::new("Additional equipment", dec!(1), dec!(100.00)),
    ]
}

/// Taxes on the service invoice under the simplified regime.
pub fn default_tax_table() -> Vec<TaxEntry> {
    vec![
        TaxEntry::new("ISS", dec!(6.0)),
        TaxEntry::new("PIS", dec!(0.0)),
        TaxEntry::new("COFINS", dec!(0.0)),
        TaxEntry::new("CSLL", dec!(0.0)),
        TaxEntry::new("IRPF", dec!(0.0)),
    ]
}

/// Sum of the table's rates in percentage points, rejecting loads of 100% or more.
pub fn total_tax_pct(taxes: &[TaxEntry]) -> QuoteCalcResult<Percent> {
    for tax in taxes {
        if tax.rate_pct < Decimal::ZERO {
            return Err(QuoteError::config(
                "taxes",
                format!("Tax '{}' has a negative rate", tax.name),
            ));
        }
    }
    let total: Percent = taxes.iter().map(|t| t.rate_pct).sum();
    if total >= HUNDRED {
        return Err(QuoteError::config(
            "taxes",
            format!("Tax rates must sum to less than 100%, got {total}%"),
        ));
    }
    Ok(total)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInput {
    pub line_items: Vec<CostLineItem>,
    /// Engineering/design fee from the tiered schedule
    pub project_fee: Money,
    pub margin_pct: Percent,
    pub commission_pct: Percent,
    pub taxes: Vec<TaxEntry>,
    /// Equipment kit, billed and invoiced separately by the supplier
    pub equipment_kit_cost: Money,
    /// Enables the cost-per-Wp figures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_capacity_kwp: Option<Kwp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTotal {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub total: Money,
}

/// Cost per watt-peak of installed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostPerWp {
    pub project: Money,
    pub service: Money,
    pub equipment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOutput {
    pub line_totals: Vec<LineTotal>,
    pub line_total: Money,
    pub project_fee: Money,
    /// Line items plus project fee: the company's own costs
    pub subtotal: Money,
    pub profit: Money,
    pub commission: Money,
    pub pre_tax_total: Money,
    pub tax_rate_pct: Percent,
    /// Tax carried by the invoice: invoice total minus pre-tax total
    pub tax_amount: Money,
    pub invoice_total: Money,
    pub equipment_kit_cost: Money,
    pub project_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_wp: Option<CostPerWp>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate service costs into the invoice total and the overall project total.
///
/// subtotal = sum(quantity * unit_price) + project_fee
/// pre_tax = subtotal * (1 + margin/100 + commission/100)
/// invoice = pre_tax / (1 - sum(tax)/100)
/// project = invoice + equipment kit
///
/// The gross-up makes the invoice carry its own tax: tax is levied on the
/// invoiced value, not on the pre-tax amount.
pub fn aggregate_costs(input: &CostInput) -> QuoteCalcResult<ComputationOutput<CostOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_cost_input(input)?;
    let tax_rate_pct = total_tax_pct(&input.taxes)?;

    let line_totals = input
        .line_items
        .iter()
        .map(|item| {
            Ok(LineTotal {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total()?,
            })
        })
        .collect::<QuoteCalcResult<Vec<LineTotal>>>()?;
    let line_total = checked::sum(line_totals.iter().map(|l| l.total), "line item total")?;

    let subtotal = checked::add(line_total, input.project_fee, "cost subtotal")?;
    let profit = checked::mul(input.margin_pct / HUNDRED, subtotal, "profit")?;
    let commission = checked::mul(input.commission_pct / HUNDRED, subtotal, "commission")?;
    let pre_tax_total = checked::sum([subtotal, profit, commission], "pre-tax total")?;

    let net_share = Decimal::ONE - tax_rate_pct / HUNDRED;
    let invoice_total = checked::div(pre_tax_total, net_share, "invoice tax gross-up")?;
    let tax_amount = invoice_total - pre_tax_total;
    let project_total = checked::add(invoice_total, input.equipment_kit_cost, "project total")?;

    let cost_per_wp = match input.installed_capacity_kwp {
        Some(kwp) if kwp > Decimal::ZERO => {
            let watts = checked::mul(kwp, dec!(1000), "cost per Wp")?;
            Some(CostPerWp {
                project: checked::div(project_total, watts, "cost per Wp")?,
                service: checked::div(invoice_total, watts, "cost per Wp")?,
                equipment: checked::div(input.equipment_kit_cost, watts, "cost per Wp")?,
            })
        }
        Some(_) => {
            return Err(QuoteError::invalid(
                "installed_capacity_kwp",
                "Installed capacity must be positive",
            ))
        }
        None => None,
    };

    if input.line_items.is_empty() {
        warnings.push("No service line items; invoice covers the project fee only".into());
    }
    if input.margin_pct.is_zero() {
        warnings.push("Profit margin is zero".into());
    }
    if input.equipment_kit_cost.is_zero() {
        warnings.push("Equipment kit cost is zero; project total equals the invoice".into());
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!(
        "costs aggregated: subtotal {subtotal}, pre-tax {pre_tax_total}, invoice {invoice_total}, project {project_total}"
    );

    let output = CostOutput {
        line_totals,
        line_total,
        project_fee: input.project_fee,
        subtotal,
        profit,
        commission,
        pre_tax_total,
        tax_rate_pct,
        tax_amount,
        invoice_total,
        equipment_kit_cost: input.equipment_kit_cost,
        project_total,
        cost_per_wp,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cost-plus margin and commission, grossed up for invoice taxes",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_cost_input(input: &CostInput) -> QuoteCalcResult<()> {
    for (i, item) in input.line_items.iter().enumerate() {
        if item.quantity < Decimal::ZERO {
            return Err(QuoteError::invalid(
                "line_items",
                format!("Item {i} ('{}') has a negative quantity", item.description),
            ));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(QuoteError::invalid(
                "line_items",
                format!("Item {i} ('{}') has a negative unit price", item.description),
            ));
        }
    }
    if input.project_fee < Decimal::ZERO {
        return Err(QuoteError::invalid("project_fee", "Project fee cannot be negative"));
    }
    if input.margin_pct < Decimal::ZERO {
        return Err(QuoteError::invalid("margin_pct", "Profit margin cannot be negative"));
    }
    if input.commission_pct < Decimal::ZERO {
        return Err(QuoteError::invalid(
            "commission_pct",
            "Sales commission cannot be negative",
        ));
    }
    if input.equipment_kit_cost < Decimal::ZERO {
        return Err(QuoteError::invalid(
            "equipment_kit_cost",
            "Equipment kit cost cannot be negative",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn no_tax() -> Vec<TaxEntry> {
        vec![TaxEntry::new("ISS", Decimal::ZERO)]
    }

    fn sample_input() -> CostInput {
        CostInput {
            line_items: default_line_items(),
            project_fee: dec!(1080),
            margin_pct: dec!(30),
            commission_pct: dec!(5),
            taxes: default_tax_table(),
            equipment_kit_cost: dec!(12000),
            installed_capacity_kwp: Some(dec!(4.5)),
        }
    }

    #[test]
    fn test_zero_margin_commission_and_tax_is_plain_sum() {
        let input = CostInput {
            line_items: vec![
                CostLineItem::new("Labour", dec!(2), dec!(750.25)),
                CostLineItem::new("Fuel", dec!(12.5), dec!(1.50)),
            ],
            project_fee: dec!(1180),
            margin_pct: Decimal::ZERO,
            commission_pct: Decimal::ZERO,
            taxes: no_tax(),
            equipment_kit_cost: Decimal::ZERO,
            installed_capacity_kwp: None,
        };
        let out = aggregate_costs(&input).unwrap().result;
        assert_eq!(out.line_total, dec!(1519.25));
        assert_eq!(out.invoice_total, out.line_total + dec!(1180));
        assert_eq!(out.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn test_tax_gross_up_of_nine_hundred() {
        let input = CostInput {
            line_items: vec![CostLineItem::new("Labour", dec!(1), dec!(800))],
            project_fee: dec!(100),
            margin_pct: Decimal::ZERO,
            commission_pct: Decimal::ZERO,
            taxes: vec![TaxEntry::new("ISS", dec!(6)), TaxEntry::new("PIS", dec!(4))],
            equipment_kit_cost: Decimal::ZERO,
            installed_capacity_kwp: None,
        };
        let out = aggregate_costs(&input).unwrap().result;
        assert_eq!(out.pre_tax_total, dec!(900));
        assert_eq!(out.invoice_total, dec!(1000.0));
        assert_eq!(out.tax_amount, dec!(100));
        assert_eq!(out.tax_rate_pct, dec!(10));
    }

    #[test]
    fn test_margin_and_commission_on_subtotal() {
        let out = aggregate_costs(&sample_input()).unwrap().result;
        // 1000 + 100 + 1.5 + 250 + 100 = 1451.5; + 1080 fee
        assert_eq!(out.subtotal, dec!(2531.5));
        assert_eq!(out.profit, dec!(759.45));
        assert_eq!(out.commission, dec!(126.575));
        assert_eq!(out.pre_tax_total, dec!(3417.525));
        // 3417.525 / 0.94 = 3635.66489...
        assert_eq!(out.invoice_total.round_dp(2), dec!(3635.66));
        assert_eq!(out.project_total, out.invoice_total + dec!(12000));
    }

    #[test]
    fn test_cost_per_wp() {
        let out = aggregate_costs(&sample_input()).unwrap().result;
        let per_wp = out.cost_per_wp.unwrap();
        // 12000 / 4500 W
        assert_eq!(per_wp.equipment.round_dp(4), dec!(2.6667));
        assert_eq!(per_wp.project, out.project_total / dec!(4500));
        assert_eq!(per_wp.service, out.invoice_total / dec!(4500));
    }

    #[test]
    fn test_tax_at_hundred_percent_rejected() {
        let mut input = sample_input();
        input.taxes = vec![TaxEntry::new("ISS", dec!(60)), TaxEntry::new("IRPF", dec!(40))];
        match aggregate_costs(&input).unwrap_err() {
            QuoteError::Configuration { field, .. } => assert_eq!(field, "taxes"),
            e => panic!("Expected Configuration, got {e:?}"),
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let mut input = sample_input();
        input.line_items[0].quantity = dec!(-1);
        assert!(matches!(
            aggregate_costs(&input).unwrap_err(),
            QuoteError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut input = sample_input();
        input.line_items[2].unit_price = dec!(-0.01);
        assert!(aggregate_costs(&input).is_err());
    }

    #[test]
    fn test_line_totals_preserve_order() {
        let out = aggregate_costs(&sample_input()).unwrap().result;
        let names: Vec<&str> = out.line_totals.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(names[0], "Labour");
        assert_eq!(names[4], "Additional equipment");
        assert_eq!(out.line_totals[2].total, dec!(1.50));
    }

    #[test]
    fn test_zero_margin_warning() {
        let mut input = sample_input();
        input.margin_pct = Decimal::ZERO;
        let result = aggregate_costs(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("margin")));
    }

    #[test]
    fn test_oversized_line_item_is_overflow_error() {
        let mut input = sample_input();
        input.line_items = vec![CostLineItem::new(
            "Labour",
            dec!(100000000000000000),
            dec!(100000000000000000),
        )];
        match aggregate_costs(&input).unwrap_err() {
            QuoteError::Overflow { context } => assert_eq!(context, "line item total"),
            e => panic!("Expected Overflow, got {e:?}"),
        }
    }

    #[test]
    fn test_gross_up_overflow_is_error() {
        let mut input = sample_input();
        input.line_items = vec![CostLineItem::new("Labour", Decimal::ONE, Decimal::MAX)];
        input.project_fee = Decimal::ZERO;
        assert!(matches!(
            aggregate_costs(&input).unwrap_err(),
            QuoteError::Overflow { .. }
        ));
    }

    #[test]
    fn test_default_tax_table_total() {
        assert_eq!(total_tax_pct(&default_tax_table()).unwrap(), dec!(6));
    }
}
