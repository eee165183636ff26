//! CLI for the assertion migrator.

use anyhow::{Context, Result};
use assert_migrate::prelude::*;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assert-migrate")]
#[command(author, version, about = "Migrate fluent C# test assertions to xUnit calls", long_about = None)]
struct Cli {
    /// Log more (repeat for debug output)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite .Should() assertions as Assert calls
    Assertions(RunArgs),

    /// Rewrite doubled quotes in verbatim JSON literals
    Quotes(RunArgs),

    /// List the passes and rules of each migration
    Rules,
}

#[derive(Args)]
struct RunArgs {
    /// Root directory to migrate
    #[arg(default_value = ".")]
    path: PathBuf,

    /// YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File extension to visit (repeatable; replaces the configured list)
    #[arg(short, long)]
    extension: Vec<String>,

    /// Glob pattern to exclude (repeatable; added to the configured list)
    #[arg(long)]
    exclude: Vec<String>,

    /// Preview changes without writing
    #[arg(long)]
    dry_run: bool,

    /// Print a colorized diff of every change
    #[arg(long)]
    diff: bool,

    /// Keep a copy of each original with this suffix
    #[arg(long, value_name = "SUFFIX", num_args = 0..=1, default_missing_value = ".bak")]
    backup: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Assertions(args) => {
            let config = load_config(&args)?;
            cmd_run(&fluent_to_xunit(), &config, &args)
        }
        Commands::Quotes(args) => {
            let config = load_config(&args)?;
            let preset = match &config.quote_markers {
                Some(markers) => JsonQuotes::new(markers.iter().cloned()),
                None => json_quotes(),
            };
            cmd_run(&preset, &config, &args)
        }
        Commands::Rules => cmd_rules(),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

/// Reads the config file, if any, and applies command-line overrides.
fn load_config(args: &RunArgs) -> Result<MigrateConfig> {
    let mut config = match &args.config {
        Some(path) => MigrateConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MigrateConfig::default(),
    };
    if !args.extension.is_empty() {
        config.extensions = args.extension.clone();
    }
    config.exclude.extend(args.exclude.iter().cloned());
    if args.backup.is_some() {
        config.backup_suffix = args.backup.clone();
    }
    Ok(config)
}

fn cmd_run(preset: &dyn Preset, config: &MigrateConfig, args: &RunArgs) -> Result<()> {
    let pipeline = config
        .extend(preset.pipeline()?)
        .context("Invalid rule in configuration")?;

    let mut migration = Migration::new(&args.path, pipeline)
        .selecting(config.selector())
        .on_file(|outcome| match outcome {
            FileOutcome::Changed(change) if args.dry_run => {
                println!("Would fix: {}", change.path.display())
            }
            FileOutcome::Changed(change) => println!("Fixed: {}", change.path.display()),
            FileOutcome::Failed(failure) => {
                println!("Error processing {}: {}", failure.path.display(), failure.message)
            }
            FileOutcome::Unchanged(_) | FileOutcome::Skipped(_) => {}
        });
    if args.dry_run {
        migration = migration.dry_run();
    }
    if let Some(suffix) = &config.backup_suffix {
        migration = migration.backup(suffix.clone());
    }

    let log = migration
        .apply()
        .with_context(|| format!("Failed to migrate {}", args.path.display()))?;

    if args.diff && log.files_changed() > 0 {
        println!("\n{}", log.colorized_diff());
        println!("{}", log.summary);
    }
    for file in &log.unresolved {
        for case in &file.cases {
            println!(
                "Unresolved: {}:{}: {}",
                file.path.display(),
                case.line,
                case.snippet
            );
        }
    }
    println!("\n{log}");
    Ok(())
}

fn cmd_rules() -> Result<()> {
    for preset in assert_migrate::presets::all() {
        let pipeline = preset.pipeline()?;
        println!("{} - {}", pipeline.name(), preset.description());
        for pass in pipeline.passes() {
            println!("  [{}]", pass.name());
            for rule in pass.rules() {
                println!("    {:<32} {}", rule.name(), rule.describe());
            }
        }
        println!();
    }
    Ok(())
}
