use clap::Args;
use serde_json::Value;

use solar_quote_core::proposal::{self, ProposalInput};
use solar_quote_core::quote::{self, QuoteInput};
use solar_quote_core::settings::QuoteSettings;

use crate::input;

/// Arguments for a full quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON input file with the full quote request
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON settings file (reference capacity, fee schedule, taxes)
    #[arg(long)]
    pub settings: Option<String>,
}

/// Arguments for a proposal record
#[derive(Args)]
pub struct ProposalArgs {
    /// Path to JSON input file with client data and the quote request
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON settings file (reference capacity, fee schedule, taxes)
    #[arg(long)]
    pub settings: Option<String>,
}

/// Settings from `--settings`, validated; `None` keeps those embedded in the request.
fn load_settings(
    path: Option<&str>,
) -> Result<Option<QuoteSettings>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let settings = QuoteSettings::from_json(&input::file::read_to_string(path)?)?;
            log::info!("using settings from {path}");
            Ok(Some(settings))
        }
        None => Ok(None),
    }
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut quote_input: QuoteInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a quote")?;
    if let Some(settings) = load_settings(args.settings.as_deref())? {
        quote_input.settings = settings;
    }
    let result = quote::compute_quote(&quote_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_proposal(args: ProposalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut proposal_input: ProposalInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for a proposal")?;
    if let Some(settings) = load_settings(args.settings.as_deref())? {
        proposal_input.quote.settings = settings;
    }
    let result = proposal::build_proposal(&proposal_input)?;
    Ok(serde_json::to_value(result)?)
}
