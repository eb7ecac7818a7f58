mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::energy::{ConsumptionArgs, GenerationArgs, TariffArgs};
use commands::pricing::{CostsArgs, ProjectFeeArgs, ReturnsArgs};
use commands::quote::{ProposalArgs, QuoteArgs};

/// Solar installation quotes with decimal precision
#[derive(Parser)]
#[command(
    name = "solar-quote",
    version,
    about = "Solar installation quotes with decimal precision",
    long_about = "A CLI for pricing solar-power installations: tax-inclusive tariffs, \
                  net consumption, expected generation, tiered project fees, invoice \
                  gross-up, payback, and the flattened record used to render a proposal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace); defaults to $SOLAR_QUOTE_LOG_LEVEL or warn
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Gross up TUSD and TE for PIS/COFINS and ICMS
    Tariff(TariffArgs),
    /// Average monthly consumption net of availability charges
    Consumption(ConsumptionArgs),
    /// Expected monthly generation of an installation
    Generation(GenerationArgs),
    /// Engineering/design fee from the tiered schedule
    ProjectFee(ProjectFeeArgs),
    /// Invoice total and project total from itemized costs
    Costs(CostsArgs),
    /// Monthly savings, payback and cumulative cash flow
    Returns(ReturnsArgs),
    /// Compute a full quote
    Quote(QuoteArgs),
    /// Build the proposal record consumed by the PDF renderer
    Proposal(ProposalArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level.as_deref()) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Tariff(args) => commands::energy::run_tariff(args),
        Commands::Consumption(args) => commands::energy::run_consumption(args),
        Commands::Generation(args) => commands::energy::run_generation(args),
        Commands::ProjectFee(args) => commands::pricing::run_project_fee(args),
        Commands::Costs(args) => commands::pricing::run_costs(args),
        Commands::Returns(args) => commands::pricing::run_returns(args),
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Proposal(args) => commands::quote::run_proposal(args),
        Commands::Version => {
            println!("solar-quote {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
