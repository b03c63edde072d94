use std::path::Path;

use anyhow::{bail, Context};
use chained_ledger::{Block, Ledger, ValidationReport};
use chained_store::{ChainStore, JsonFileStore};
use chained_types::Document;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;
use crate::config::CliConfig;

/// Process status for a chain that fails validation.
pub const INVALID_CHAIN: u8 = 2;

const OPERATION_NAMES: [&str; 6] = ["add", "remove", "replace", "move", "copy", "test"];

pub fn run_command(cli: Cli) -> anyhow::Result<u8> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let path = cli.store.unwrap_or_else(|| config.store_path.clone());
    let store = JsonFileStore::new(path);
    let format = cli.format;

    match cli.command {
        Command::Init(_) => cmd_init(store, &config, format),
        Command::Append(args) => cmd_append(store, &config, args, format),
        Command::Verify(_) => cmd_verify(&open_existing(store, &config)?, format),
        Command::Log(args) => cmd_log(&open_existing(store, &config)?, args, format),
        Command::Show(args) => cmd_show(&open_existing(store, &config)?, args, format),
        Command::State(args) => cmd_state(&open_existing(store, &config)?, args, format),
    }
}

fn open(store: JsonFileStore, config: &CliConfig) -> anyhow::Result<Ledger<JsonFileStore>> {
    let location = store.location();
    Ledger::load_or_init(store, config.ledger.clone())
        .with_context(|| format!("failed to load chain from {location}"))
}

fn open_existing(store: JsonFileStore, config: &CliConfig) -> anyhow::Result<Ledger<JsonFileStore>> {
    if !store.exists() {
        bail!(
            "no chain at {}; run `chained init` first",
            store.path().display()
        );
    }
    open(store, config)
}

fn cmd_init(store: JsonFileStore, config: &CliConfig, format: OutputFormat) -> anyhow::Result<u8> {
    let existed = store.exists();
    let ledger = open(store, config)?;
    if !existed {
        ledger.persist().context("failed to write genesis block")?;
    }

    match format {
        OutputFormat::Json => print_json(&json!({
            "store": ledger.store().location(),
            "created": !existed,
            "blocks": ledger.len(),
        }))?,
        OutputFormat::Text if existed => println!(
            "Chain already initialized in {} ({} blocks)",
            ledger.store().location().bold(),
            ledger.len()
        ),
        OutputFormat::Text => {
            println!(
                "{} Initialized chain in {}",
                "✓".green().bold(),
                ledger.store().location().bold()
            );
            if let Some(genesis) = ledger.head() {
                println!("  Genesis: {}", hash_text(genesis).yellow());
            }
        }
    }
    Ok(0)
}

fn cmd_append(
    store: JsonFileStore,
    config: &CliConfig,
    args: AppendArgs,
    format: OutputFormat,
) -> anyhow::Result<u8> {
    let mut ledger = open(store, config)?;
    let report = ledger.validate();
    if !report.is_valid() {
        print_report(&report, None, format)?;
        return Ok(INVALID_CHAIN);
    }

    let snapshot = read_snapshot(&args.snapshot)?;
    let difficulty = args.difficulty.unwrap_or(config.default_difficulty);
    let miner = args.mining(&config.ledger.mining).miner();
    let block = ledger
        .append_with(snapshot, difficulty, &miner)
        .context("failed to append snapshot")?
        .clone();

    let report = ledger.validate();
    if !report.is_valid() {
        print_report(&report, None, format)?;
        return Ok(INVALID_CHAIN);
    }

    match format {
        OutputFormat::Json => print_json(&block.to_record()?)?,
        OutputFormat::Text => {
            println!(
                "{} Sealed block {} at difficulty {}",
                "✓".green().bold(),
                format!("#{}", block.index()).yellow().bold(),
                block.difficulty()
            );
            println!("  Hash:  {}", hash_text(&block));
            println!("  Nonce: {}", block.nonce().unwrap_or_default());
            println!("  Patch: {}", patch_summary(&block));
        }
    }
    Ok(0)
}

fn cmd_verify(ledger: &Ledger<JsonFileStore>, format: OutputFormat) -> anyhow::Result<u8> {
    let report = ledger.validate();
    let fingerprint = ledger.state_fingerprint()?.to_hex();
    print_report(&report, Some(&fingerprint), format)?;
    Ok(if report.is_valid() { 0 } else { INVALID_CHAIN })
}

fn cmd_log(ledger: &Ledger<JsonFileStore>, args: LogArgs, format: OutputFormat) -> anyhow::Result<u8> {
    let recent = ledger.blocks().iter().rev().take(args.limit);

    if format == OutputFormat::Json {
        let records = recent.map(Block::to_record).collect::<Result<Vec<_>, _>>()?;
        print_json(&records)?;
        return Ok(0);
    }

    for block in recent {
        if args.oneline {
            println!(
                "{} {} {}",
                format!("#{}", block.index()).yellow(),
                block.hashresult().map(|d| d.short_hex()).unwrap_or_default().dimmed(),
                patch_summary(block)
            );
        } else {
            print_block(block);
            println!();
        }
    }
    Ok(0)
}

fn cmd_show(ledger: &Ledger<JsonFileStore>, args: ShowArgs, format: OutputFormat) -> anyhow::Result<u8> {
    let Some(block) = usize::try_from(args.index)
        .ok()
        .and_then(|i| ledger.blocks().get(i))
    else {
        bail!(
            "block {} does not exist (chain has {} blocks)",
            args.index,
            ledger.len()
        );
    };

    match format {
        OutputFormat::Json => print_json(&json!({
            "block": block.to_record()?,
            "patch_fingerprint": block.patch_fingerprint()?.to_hex(),
        }))?,
        OutputFormat::Text => {
            print_block(block);
            println!("  Patch id:   {}", block.patch_fingerprint()?.short_hex().dimmed());
            println!("{}", serde_json::to_string_pretty(block.patch())?);
        }
    }
    Ok(0)
}

fn cmd_state(ledger: &Ledger<JsonFileStore>, args: StateArgs, format: OutputFormat) -> anyhow::Result<u8> {
    let (index, state) = match args.at {
        Some(index) => (index, ledger.state_at(index)?),
        None => (
            ledger.head().map(Block::index).unwrap_or_default(),
            ledger.state().clone(),
        ),
    };

    match format {
        OutputFormat::Json => print_json(&json!({ "index": index, "state": state }))?,
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(0)
}

fn read_snapshot(path: &Path) -> anyhow::Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("snapshot {} is not valid JSON", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(
    report: &ValidationReport,
    fingerprint: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| {
                json!({
                    "position": v.position,
                    "index": v.index,
                    "kind": v.kind.to_string(),
                    "description": v.description,
                })
            })
            .collect();
        return print_json(&json!({
            "valid": report.is_valid(),
            "block_count": report.block_count,
            "seals_valid": report.seals_valid,
            "linkage_valid": report.linkage_valid,
            "state_fingerprint": fingerprint,
            "violations": violations,
        }));
    }

    if report.is_valid() {
        println!(
            "{} Chain verified: {} blocks",
            "✓".green().bold(),
            report.block_count
        );
    } else {
        println!(
            "{} Chain is invalid: {} violations",
            "✗".red().bold(),
            report.violations.len()
        );
    }
    println!("  Seals:   {}", status_text(report.seals_valid));
    println!("  Linkage: {}", status_text(report.linkage_valid));
    if let Some(fingerprint) = fingerprint {
        println!("  State:   {}", fingerprint.dimmed());
    }
    for v in &report.violations {
        println!(
            "  {} block #{} (position {}) [{}]: {}",
            "✗".red(),
            v.index,
            v.position,
            v.kind.to_string().yellow(),
            v.description
        );
    }
    Ok(())
}

fn print_block(block: &Block) {
    println!(
        "{}  {}",
        format!("block #{}", block.index()).yellow().bold(),
        hash_text(block).dimmed()
    );
    let previous = block.previous_hash_hex();
    println!(
        "  Previous:   {}",
        if previous.is_empty() { "(genesis)".to_string() } else { previous }
    );
    println!("  Timestamp:  {}", block.timestamp());
    println!(
        "  Difficulty: {}  Nonce: {}",
        block.difficulty(),
        block.nonce().unwrap_or_default()
    );
    println!("  Patch:      {}", patch_summary(block));
}

fn hash_text(block: &Block) -> String {
    block
        .hashresult()
        .map(|d| d.to_hex())
        .unwrap_or_else(|| "(unsealed)".into())
}

fn patch_summary(block: &Block) -> String {
    let patch = block.patch();
    if patch.is_empty() {
        return "no changes".into();
    }
    let counts: Vec<String> = OPERATION_NAMES
        .iter()
        .filter_map(|name| match patch.count(name) {
            0 => None,
            n => Some(format!("{n} {name}")),
        })
        .collect();
    format!("{} operations ({})", patch.len(), counts.join(", "))
}

fn status_text(ok: bool) -> colored::ColoredString {
    if ok { "valid".green() } else { "invalid".red() }
}
