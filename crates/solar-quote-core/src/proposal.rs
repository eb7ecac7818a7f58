use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuoteError;
use crate::quote::{compute_quote, QuoteInput};
use crate::returns::CashFlowPoint;
use crate::types::{with_metadata, ComputationOutput, Kwh, Kwp, Money, Month, Payback};
use crate::QuoteCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub client_number: u32,
    #[serde(default = "first_version")]
    pub proposal_version: u32,
    pub proposal_year: i32,
}

fn first_version() -> u32 {
    1
}

impl ClientInfo {
    /// Proposal reference printed on every page, e.g. `355-1/2026`.
    pub fn proposal_id(&self) -> String {
        format!(
            "{}-{}/{}",
            self.client_number, self.proposal_version, self.proposal_year
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInput {
    pub client: ClientInfo,
    pub quote: QuoteInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub total: Money,
}

/// One month of the technical page's generation-vs-consumption chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyEnergy {
    pub month: Month,
    pub generation: Kwh,
    pub consumption: Kwh,
}

/// Flat, pre-rounded record handed to the PDF renderer. The renderer does no
/// arithmetic of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub proposal_id: String,
    pub client_name: String,
    pub client_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<String>,
    pub system_capacity_kwp: Kwp,
    pub line_items: Vec<ProposalLine>,
    pub equipment_cost: Money,
    pub base_installation_cost: Money,
    pub total_extras: Money,
    pub invoice_total: Money,
    pub final_total: Money,
    pub monthly_generation: Kwh,
    pub average_consumption: Kwh,
    pub monthly_savings: Money,
    pub payback: Payback,
    pub generation_vs_consumption: Vec<MonthlyEnergy>,
    pub cash_flow: Vec<CashFlowPoint>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

fn money(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn energy(value: Decimal) -> Kwh {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the quote and flatten it into the record the PDF renderer consumes.
///
/// Fails closed: a missing client name or a failing quote stage yields an
/// error, never a partially filled record.
pub fn build_proposal(
    input: &ProposalInput,
) -> QuoteCalcResult<ComputationOutput<ProposalRecord>> {
    let start = Instant::now();

    if input.client.name.trim().is_empty() {
        return Err(QuoteError::invalid("client.name", "Client name is required"));
    }
    if let Some(date) = input.issue_date {
        if date.year() != input.client.proposal_year {
            return Err(QuoteError::invalid(
                "issue_date",
                format!(
                    "Issue date {date} does not fall in proposal year {}",
                    input.client.proposal_year
                ),
            ));
        }
    }

    let quote = compute_quote(&input.quote)?;
    let warnings = quote.warnings;
    let q = quote.result;

    let line_items = q
        .line_totals
        .iter()
        .map(|l| ProposalLine {
            description: l.description.clone(),
            quantity: l.quantity,
            unit_price: money(l.unit_price),
            total: money(l.total),
        })
        .collect();

    let generation_vs_consumption = Month::ALL
        .iter()
        .map(|&month| MonthlyEnergy {
            month,
            generation: energy(q.monthly_generation),
            consumption: energy(q.monthly_consumption[month.index()]),
        })
        .collect();

    let cash_flow = q
        .cash_flow
        .iter()
        .map(|p| CashFlowPoint {
            year: p.year,
            cumulative: money(p.cumulative),
        })
        .collect();

    let payback = match q.payback {
        Payback::Years(y) => {
            Payback::Years(y.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        }
        Payback::NotApplicable => Payback::NotApplicable,
    };

    let record = ProposalRecord {
        proposal_id: input.client.proposal_id(),
        client_name: input.client.name.trim().to_string(),
        client_address: input.client.address.trim().to_string(),
        issued_on: input.issue_date.map(|d| d.format("%d/%m/%Y").to_string()),
        system_capacity_kwp: q.installed_capacity_kwp,
        line_items,
        equipment_cost: money(q.equipment_kit_cost),
        base_installation_cost: money(q.project_fee),
        total_extras: money(q.line_total),
        invoice_total: money(q.invoice_total),
        final_total: money(q.project_total),
        monthly_generation: energy(q.monthly_generation),
        average_consumption: energy(q.average_consumption),
        monthly_savings: money(q.monthly_savings),
        payback,
        generation_vs_consumption,
        cash_flow,
    };

    log::info!(
        "proposal {} built for '{}'",
        record.proposal_id,
        record.client_name
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Proposal record for PDF rendering (money to 2 dp, energy to 0 dp)",
        input,
        warnings,
        elapsed,
        record,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
