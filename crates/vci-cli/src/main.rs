//! # vci CLI entry point
//!
//! Parses arguments, connects to the bus and dispatches to the subcommand
//! handlers. Replies are printed to stdout as pretty JSON.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use vci_bus::{BusConfig, NatsBus};
use vci_cli::issue::{code_from_offer, run_issue, IssueArgs};
use vci_cli::request::{run_request, RequestArgs};
use vci_cli::TargetArgs;

/// Developer client for the dummy-signer issuer.
#[derive(Parser, Debug)]
#[command(name = "vci", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Request a credential offer.
    Request(RequestArgs),

    /// Redeem a pre-authorized code for a signed credential.
    Issue(IssueArgs),

    /// Request an offer and redeem it right away.
    Flow {
        #[command(flatten)]
        request: RequestArgs,

        /// Holder the credential is bound to.
        #[arg(long, default_value = "test")]
        holder: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .context("failed to start runtime")
        .and_then(|rt| rt.block_on(dispatch(&cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    let config = BusConfig::from_env()?;
    let bus = NatsBus::connect(&config).await?;

    match &cli.command {
        Commands::Request(args) => print(&run_request(&bus, &cli.target, args).await?),
        Commands::Issue(args) => print(&run_issue(&bus, &cli.target, args).await?),
        Commands::Flow { request, holder } => {
            let offered = run_request(&bus, &cli.target, request).await?;
            let offer = offered.offer.context("issuer replied without an offer")?;
            let args = IssueArgs {
                code: Some(code_from_offer(&offer)?),
                holder: Some(holder.clone()),
                ..Default::default()
            };
            print(&offer)?;
            print(&run_issue(&bus, &cli.target, &args).await?)
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
