use std::path::Path;

use algobank_atm::NoteInventory;
use algobank_crypto::MerkleTree;
use algobank_sdk::{AccountId, Bank, BankConfig, Decimal, NoteBundle, Route};
use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Demo => cmd_demo(config, format),
        Command::Route(args) => cmd_route(config, args, format),
        Command::Atm(args) => cmd_atm(config, args, format),
        Command::Merkle(args) => cmd_merkle(args, format),
        Command::Interest(args) => cmd_interest(config, args, format),
        Command::Verify(args) => cmd_verify(config, args, format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BankConfig> {
    let Some(path) = path else {
        return Ok(BankConfig::default());
    };
    let config = BankConfig::from_file(path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    debug!(path = %path.display(), currency = %config.currency, "config loaded");
    Ok(config)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_demo(config: BankConfig, format: OutputFormat) -> anyhow::Result<()> {
    let bank = Bank::new(config)?;
    let currency = bank.config().currency;

    // Ledger
    let acc1 = bank.open_account()?;
    let acc2 = bank.open_account()?;
    bank.transfer(&acc1, &acc2, Decimal::from(500))?;
    let (bal1, bal2) = (bank.balance(&acc1)?, bank.balance(&acc2)?);

    // Integrity
    let records = ["tx1:500EUR", "tx2:200EUR", "tx3:100EUR"];
    let tx_root = MerkleTree::from_records(&records).root();
    let journal_root = bank.journal_root()?;

    // Interest
    bank.accrue_interest(0, 4, Decimal::ONE)?;
    bank.accrue_interest(2, 3, Decimal::TWO)?;
    let day3 = bank.interest_on(3)?;

    // Fraud
    let ghost1 = bank.open_account()?;
    let ghost2 = bank.open_account()?;
    bank.link_accounts(&acc1, &ghost1)?;
    let linked = bank.accounts_linked(&acc1, &ghost1)?;
    let unlinked = bank.accounts_linked(&acc1, &ghost2)?;

    // Routing
    let route = bank.route("BankA", "BankC")?;

    // ATM
    let plan = bank.withdrawal_plan(700)?;

    bank.verify()?;

    if format == OutputFormat::Json {
        return print_json(&json!({
            "currency": currency.code(),
            "balances": { acc1.to_string(): bal1, acc2.to_string(): bal2 },
            "transactions_root": tx_root.to_hex(),
            "journal_root": journal_root.to_hex(),
            "interest_day_3": day3,
            "fraud": { "acc1_ghost1": linked, "acc1_ghost2": unlinked },
            "route": route,
            "atm_700": plan,
            "verified": true,
        }));
    }

    println!("{}\n", "AlgoBank simulation".bold());
    println!("{}", "Ledger".underline());
    println!("  Account {} balance: {} {}", acc1.short_id().cyan(), bal1, currency);
    println!("  Account {} balance: {} {}", acc2.short_id().cyan(), bal2, currency);

    println!("\n{}", "Integrity".underline());
    println!("  Merkle root for transactions: {}", tx_root.to_hex().dimmed());
    println!("  Journal root: {}", journal_root.to_hex().dimmed());

    println!("\n{}", "Interest".underline());
    println!("  Day 3 accrued interest: {}", day3.to_string().bold());

    println!("\n{}", "Fraud".underline());
    println!("  {} linked to ghost1: {}", acc1.masked(), yes_no(linked));
    println!("  {} linked to ghost2: {}", acc1.masked(), yes_no(unlinked));

    println!("\n{}", "Routing".underline());
    print_route("BankA", "BankC", &route);

    println!("\n{}", "ATM".underline());
    print_plan(700, plan.as_deref());

    println!("\n{} AlgoBank simulation complete", "✓".green().bold());
    Ok(())
}

fn cmd_route(config: BankConfig, args: RouteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bank = Bank::new(config)?;
    for edge in &args.edges {
        bank.add_route(&edge.from, &edge.to, edge.cost)?;
    }
    let route = bank.route(&args.from, &args.to)?;

    if format == OutputFormat::Json {
        return print_json(&json!({
            "from": args.from,
            "to": args.to,
            "reachable": route.is_reachable(),
            "cost": route.is_reachable().then_some(route.cost),
            "path": route.path,
        }));
    }
    print_route(&args.from, &args.to, &route);
    Ok(())
}

fn cmd_atm(config: BankConfig, args: AtmArgs, format: OutputFormat) -> anyhow::Result<()> {
    let denominations = args.denominations.unwrap_or(config.atm.denominations);
    let counts = args.counts.unwrap_or(config.atm.counts);
    let atm = NoteInventory::new(denominations, counts)?;
    let plan = atm.plan(args.amount)?;

    if format == OutputFormat::Json {
        let notes = plan.as_ref().map(|p| p.iter().map(|b| b.count).sum::<u64>());
        return print_json(&json!({
            "amount": args.amount,
            "min_notes": notes,
            "plan": plan,
        }));
    }
    print_plan(args.amount, plan.as_deref());
    Ok(())
}

fn cmd_merkle(args: MerkleArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tree = MerkleTree::from_records(&args.records);

    if format == OutputFormat::Json {
        let leaves: Vec<String> = (0..tree.leaf_count())
            .filter_map(|i| tree.leaf(i))
            .map(|d| d.to_hex())
            .collect();
        return print_json(&json!({
            "root": tree.root().to_hex(),
            "leaves": leaves,
        }));
    }

    println!("Merkle root: {}", tree.root().to_hex().bold());
    for (i, record) in args.records.iter().enumerate() {
        if let Some(leaf) = tree.leaf(i) {
            println!("  {} {}  {}", format!("#{i}").yellow(), leaf.short_hex().dimmed(), record);
        }
    }
    Ok(())
}

fn cmd_interest(
    config: BankConfig,
    args: InterestArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let bank = Bank::new(config)?;
    let additions = if args.additions.is_empty() {
        vec![
            Accrual {
                first: 0,
                last: 4,
                delta: Decimal::ONE,
            },
            Accrual {
                first: 2,
                last: 3,
                delta: Decimal::TWO,
            },
        ]
    } else {
        args.additions
    };
    for a in &additions {
        bank.accrue_interest(a.first, a.last, a.delta)?;
    }

    if let Some(day) = args.day {
        let interest = bank.interest_on(day)?;
        if format == OutputFormat::Json {
            return print_json(&json!({ "day": day, "interest": interest }));
        }
        println!("Day {day} accrued interest: {}", interest.to_string().bold());
        return Ok(());
    }

    let schedule: Vec<(usize, Decimal)> = bank
        .interest_schedule()?
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_zero())
        .collect();
    if format == OutputFormat::Json {
        let days: Vec<Value> = schedule
            .iter()
            .map(|(day, v)| json!({ "day": day, "interest": v }))
            .collect();
        return print_json(&json!({ "days": days }));
    }
    if schedule.is_empty() {
        println!("No interest accrued.");
    }
    for (day, interest) in schedule {
        println!("  day {:>3}  {}", day, interest);
    }
    Ok(())
}

fn cmd_verify(config: BankConfig, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    if args.accounts < 2 {
        bail!("need at least two accounts, got {}", args.accounts);
    }
    let bank = Bank::new(config)?;
    let accounts: Vec<AccountId> = (0..args.accounts)
        .map(|_| bank.open_account())
        .collect::<Result<_, _>>()?;
    for i in 0..args.transfers {
        let from = &accounts[i % accounts.len()];
        let to = &accounts[(i + 1) % accounts.len()];
        bank.transfer(from, to, Decimal::from(100 + i as u64))?;
    }

    let report = bank.validation_report()?;
    let converged = bank.verify().is_ok();
    let total = bank
        .all_balances()?
        .values()
        .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(*b))
        .context("balance sum overflowed")?;

    if format == OutputFormat::Json {
        return print_json(&json!({
            "entries": report.entry_count,
            "hash_chain_valid": report.hash_chain_valid,
            "sequence_monotonic": report.sequence_monotonic,
            "entries_balanced": report.entries_balanced,
            "replay_converged": converged,
            "balance_sum": total,
            "journal_root": bank.journal_root()?.to_hex(),
        }));
    }

    if report.is_valid() && converged {
        println!("{} Journal integrity verified", "✓".green().bold());
    } else {
        println!("{} Journal integrity check failed", "✗".red().bold());
        for v in &report.violations {
            println!("  seq {}: {:?} {}", v.seq, v.kind, v.description);
        }
    }
    println!("  Entries: {}", report.entry_count.to_string().bold());
    println!("  Hash chain: {}", status(report.hash_chain_valid, "valid", "broken"));
    println!("  Sequences: {}", status(report.sequence_monotonic, "monotonic", "gapped"));
    println!("  Zero-sum: {}", status(report.entries_balanced, "balanced", "unbalanced"));
    println!("  Replay: {}", status(converged, "converged", "diverged"));
    println!("  Balance sum: {}", total);
    Ok(())
}

fn print_route(from: &str, to: &str, route: &Route) {
    if route.is_reachable() {
        println!(
            "  Cheapest route from {} → {}: {} (cost {})",
            from.bold(),
            to.bold(),
            route.path.join(" → ").cyan(),
            route.cost
        );
    } else {
        println!("  No route from {} to {}", from.bold(), to.bold().red());
    }
}

fn print_plan(amount: u64, plan: Option<&[NoteBundle]>) {
    match plan {
        Some(bundles) => {
            let notes: u64 = bundles.iter().map(|b| b.count).sum();
            println!("  Min notes to withdraw {}: {}", amount, notes.to_string().bold());
            for b in bundles {
                println!("    {} × {}", b.count, b.denomination);
            }
        }
        None => println!(
            "  {} cannot be dispensed with the notes loaded",
            amount.to_string().red()
        ),
    }
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag {
        "yes".red().bold()
    } else {
        "no".green()
    }
}

fn status(ok: bool, good: &str, bad: &str) -> colored::ColoredString {
    if ok {
        good.green()
    } else {
        bad.red()
    }
}
