use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use solar_quote_core::costs::{self, CostInput};
use solar_quote_core::project_fee::{self, default_fee_bands, ProjectFeeInput};
use solar_quote_core::returns::{self, ReturnInput, DEFAULT_HORIZON_YEARS};

use crate::input;

/// Arguments for project-fee lookup
#[derive(Args)]
pub struct ProjectFeeArgs {
    /// Installed capacity (kWp)
    #[arg(long)]
    pub capacity: Option<Decimal>,

    /// Markup over the band's base fee, in %
    #[arg(long, default_value = "0")]
    pub surcharge: Decimal,

    /// Path to JSON input file, e.g. with a custom fee schedule (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for cost aggregation
#[derive(Args)]
pub struct CostsArgs {
    /// Path to JSON input file with line items, fee, margin, commission and taxes
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for return estimate
#[derive(Args)]
pub struct ReturnsArgs {
    /// Monthly generation (kWh)
    #[arg(long)]
    pub generation: Option<Decimal>,

    /// Tax-inclusive tariff (R$/kWh)
    #[arg(long)]
    pub tariff: Option<Decimal>,

    /// Project total (R$)
    #[arg(long)]
    pub project_total: Option<Decimal>,

    /// Cash-flow horizon in years
    #[arg(long, default_value_t = DEFAULT_HORIZON_YEARS)]
    pub horizon: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_project_fee(args: ProjectFeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fee_input: ProjectFeeInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => ProjectFeeInput {
            installed_capacity_kwp: args
                .capacity
                .ok_or("--capacity is required (or provide --input)")?,
            surcharge_pct: args.surcharge,
            bands: default_fee_bands(),
        },
    };
    let result = project_fee::lookup_project_fee(&fee_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_costs(args: CostsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cost_input: CostInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for cost aggregation")?;
    let result = costs::aggregate_costs(&cost_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let return_input: ReturnInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => ReturnInput {
            monthly_generation: args
                .generation
                .ok_or("--generation is required (or provide --input)")?,
            tariff: args.tariff.ok_or("--tariff is required (or provide --input)")?,
            project_total: args
                .project_total
                .ok_or("--project-total is required (or provide --input)")?,
            horizon_years: args.horizon,
        },
    };
    let result = returns::estimate_return(&return_input)?;
    Ok(serde_json::to_value(result)?)
}
