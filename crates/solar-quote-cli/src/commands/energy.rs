use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use solar_quote_core::consumption::{self, ConsumptionInput};
use solar_quote_core::generation::{self, GenerationParams, DEFAULT_REFERENCE_CAPACITY_KWP};
use solar_quote_core::tariff::{self, TariffInputs};

use crate::input;

/// Arguments for tariff normalization
#[derive(Args)]
pub struct TariffArgs {
    /// ICMS in percentage points (e.g. 18)
    #[arg(long)]
    pub icms: Option<Decimal>,

    /// PIS in percentage points (e.g. 0.8)
    #[arg(long)]
    pub pis: Option<Decimal>,

    /// COFINS in percentage points (e.g. 3.7)
    #[arg(long)]
    pub cofins: Option<Decimal>,

    /// TUSD before taxes (R$/kWh)
    #[arg(long)]
    pub tusd: Option<Decimal>,

    /// TE before taxes (R$/kWh)
    #[arg(long)]
    pub te: Option<Decimal>,

    /// Fio B cost (R$), echoed for the proposal
    #[arg(long)]
    pub fio_b: Option<Decimal>,

    /// Simultaneity factor between 0 and 1, echoed for the proposal
    #[arg(long)]
    pub simultaneity: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for consumption aggregation
#[derive(Args)]
pub struct ConsumptionArgs {
    /// Path to JSON input file with twelve monthly rows and availability charges
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for generation estimate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct GenerationArgs {
    /// Installed capacity (kWp)
    #[arg(long)]
    pub capacity: Option<Decimal>,

    /// Gain (positive) or loss (negative) relative to the horizontal plane, in %
    #[arg(long, default_value = "0")]
    pub gain_loss: Decimal,

    /// Capacity yielding 1000 kWh/month at the baseline tilt (kWp)
    #[arg(long)]
    pub reference: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tariff(args: TariffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tariff_input: TariffInputs = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => TariffInputs {
            icms_pct: args.icms.ok_or("--icms is required (or provide --input)")?,
            pis_pct: args.pis.ok_or("--pis is required (or provide --input)")?,
            cofins_pct: args.cofins.ok_or("--cofins is required (or provide --input)")?,
            nominal_tusd: args.tusd.ok_or("--tusd is required (or provide --input)")?,
            nominal_te: args.te.ok_or("--te is required (or provide --input)")?,
            fio_b_cost: args.fio_b,
            simultaneity_factor: args.simultaneity,
        },
    };
    let result = tariff::normalize_tariff(&tariff_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_consumption(args: ConsumptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let consumption_input: ConsumptionInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for consumption aggregation")?;
    let result = consumption::aggregate_consumption(&consumption_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_generation(args: GenerationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: GenerationParams = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => GenerationParams {
            installed_capacity_kwp: args
                .capacity
                .ok_or("--capacity is required (or provide --input)")?,
            gain_loss_pct: args.gain_loss,
            reference_capacity_kwp: args.reference.unwrap_or(DEFAULT_REFERENCE_CAPACITY_KWP),
        },
    };
    let result = generation::estimate_generation(&params)?;
    Ok(serde_json::to_value(result)?)
}
