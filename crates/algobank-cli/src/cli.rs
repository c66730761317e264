use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(
    name = "algobank",
    about = "AlgoBank: double-entry ledger with routing, fraud, interest and ATM tools",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML bank configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the AlgoBank walkthrough
    Demo,
    /// Cheapest interbank route
    Route(RouteArgs),
    /// Minimum notes for a cash withdrawal
    Atm(AtmArgs),
    /// Merkle root of the given records
    Merkle(MerkleArgs),
    /// Apply interest ranges and query accrued days
    Interest(InterestArgs),
    /// Run a transfer workload and verify journal integrity
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct RouteArgs {
    pub from: String,
    pub to: String,
    /// Extra edge FROM:TO:COST, added to the configured routes
    #[arg(long = "edge", value_parser = parse_edge)]
    pub edges: Vec<Edge>,
}

#[derive(Args)]
pub struct AtmArgs {
    pub amount: u64,
    /// Override the configured denominations
    #[arg(long, value_delimiter = ',')]
    pub denominations: Option<Vec<u64>>,
    /// Override the configured note counts
    #[arg(long, value_delimiter = ',')]
    pub counts: Option<Vec<u64>>,
}

#[derive(Args)]
pub struct MerkleArgs {
    pub records: Vec<String>,
}

#[derive(Args)]
pub struct InterestArgs {
    /// Range addition FIRST:LAST:DELTA (repeatable)
    #[arg(long = "add", value_parser = parse_accrual)]
    pub additions: Vec<Accrual>,
    /// Day to query; prints every day with interest if omitted
    #[arg(long)]
    pub day: Option<usize>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Number of accounts to open
    #[arg(long, default_value = "3")]
    pub accounts: usize,
    /// Number of transfers between them
    #[arg(long, default_value = "10")]
    pub transfers: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Accrual {
    pub first: usize,
    pub last: usize,
    pub delta: Decimal,
}

fn split3(s: &str) -> Result<[&str; 3], String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(format!("expected three ':'-separated fields, got {s:?}")),
    }
}

fn parse_edge(s: &str) -> Result<Edge, String> {
    let [from, to, cost] = split3(s)?;
    Ok(Edge {
        from: from.to_string(),
        to: to.to_string(),
        cost: cost.parse().map_err(|e| format!("invalid cost {cost:?}: {e}"))?,
    })
}

fn parse_accrual(s: &str) -> Result<Accrual, String> {
    let [first, last, delta] = split3(s)?;
    Ok(Accrual {
        first: first.parse().map_err(|e| format!("invalid day {first:?}: {e}"))?,
        last: last.parse().map_err(|e| format!("invalid day {last:?}: {e}"))?,
        delta: delta.parse().map_err(|e| format!("invalid delta {delta:?}: {e}"))?,
    })
}
