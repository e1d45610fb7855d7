use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use fincalc::api::{
    ApiError, InMemoryScenarioStore, SharedStore, run_http_server, seed_if_empty, validate_buyd,
    validate_debt, validate_loan_term, validate_property,
};
use fincalc::core::{
    BuydInputs, DebtPayoffParams, PropertyAssumptions, calculate_metrics, compute_amortization,
    simulate_buyd, simulate_debt_payoff,
};

#[derive(Debug, Parser)]
#[command(
    name = "fincalc",
    about = "Property valuation, leveraged-asset and debt payoff calculators"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the calculators over HTTP
    Serve {
        #[arg(long, env = "FINCALC_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "FINCALC_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Print the payment and yearly amortization of a fixed-rate loan
    Amortize {
        #[arg(long)]
        principal: f64,
        #[arg(long, help = "Annual interest rate in percent, e.g. 6.5")]
        rate: f64,
        #[arg(long)]
        years: u32,
    },
    /// Property metrics from a JSON PropertyAssumptions document
    Property {
        #[arg(long, default_value = "-", help = "JSON input file, or - for stdin")]
        input: PathBuf,
    },
    /// Buy-borrow-die simulation from a JSON BuydInputs document
    Buyd {
        #[arg(long, default_value = "-", help = "JSON input file, or - for stdin")]
        input: PathBuf,
    },
    /// Debt payoff schedule from a JSON payoff request
    Debt {
        #[arg(long, default_value = "-", help = "JSON input file, or - for stdin")]
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(#[from] ApiError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fincalc=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { host, port } => {
            let store: SharedStore = Arc::new(InMemoryScenarioStore::new());
            if let Some(seeded) = seed_if_empty(store.as_ref())? {
                tracing::info!(id = seeded.id, title = %seeded.title, "seeded sample scenario");
            }
            run_http_server(SocketAddr::new(host, port), store).await?;
        }
        Command::Amortize {
            principal,
            rate,
            years,
        } => {
            validate_loan_term(years)?;
            print_json(&compute_amortization(principal, rate, years))?;
        }
        Command::Property { input } => {
            let assumptions: PropertyAssumptions = read_json(&input)?;
            validate_property(&assumptions)?;
            print_json(&calculate_metrics(&assumptions))?;
        }
        Command::Buyd { input } => {
            let inputs: BuydInputs = read_json(&input)?;
            validate_buyd(&inputs)?;
            print_json(&simulate_buyd(&inputs))?;
        }
        Command::Debt { input } => {
            let params: DebtPayoffParams = read_json(&input)?;
            validate_debt(&params)?;
            print_json(&simulate_debt_payoff(&params))?;
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(input: &Path) -> Result<T, CliError> {
    let label = input.display().to_string();
    let mut raw = String::new();
    let read = if input == Path::new("-") {
        std::io::stdin().read_to_string(&mut raw).map(|_| ())
    } else {
        std::fs::read_to_string(input).map(|contents| raw = contents)
    };
    read.map_err(|source| CliError::Read {
        path: label.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: label,
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
