mod cli_args;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::path::PathBuf;
use std::process;

use cli_args::Cli;
use maid_core::{
    AppError, ConfigResolver, GlobalScope, MarkdownWriter, aggregate, get_builtin_ignore_patterns,
};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.effective_verbosity());

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            // Printed even with --quiet; the logger is off then.
            eprintln!("{}", error_message(&e));
            exit_code_for(&e)
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<AppError>() {
        Some(AppError::ConfigParse { .. }) => 1,
        Some(AppError::ConfigRead { .. }) => 1,
        Some(AppError::PatternCompile { .. }) => 1,
        Some(AppError::RuleCompile { .. }) => 1,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::FileWrite { .. }) => 2,
        Some(AppError::Walk(_)) => 2,
        Some(AppError::InvalidArgument(_)) => 5,
        Some(_) => 1,
        None => 1,
    }
}

fn error_message(e: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), e)
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(raw);
    if expanded.trim().is_empty() {
        return Err(AppError::InvalidArgument(format!("empty path: '{}'", raw)).into());
    }
    Ok(PathBuf::from(expanded.as_ref()))
}

fn run_app(cli: Cli) -> Result<()> {
    let mut resolver = ConfigResolver::new();

    let global = if cli.ignore.no_global_config {
        log::debug!("Global configuration disabled.");
        None
    } else if let Some(raw) = &cli.ignore.config {
        let path = expand_path(raw)?;
        Some(
            resolver
                .load_explicit(&path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        )
    } else {
        resolver
            .load_global()
            .context("Failed to load global configuration")?
    };

    let builtin = if cli.ignore.no_builtin_ignore {
        Vec::new()
    } else {
        get_builtin_ignore_patterns().patterns.clone()
    };
    let scope = GlobalScope::new(builtin, global, cli.ignore.blacklist.clone())
        .context("Invalid ignore pattern")?;
    log::debug!("Global patterns: {:?}", scope.pattern_texts());

    let output_path = if cli.output.stdout {
        None
    } else {
        Some(expand_path(&cli.output.output.to_string_lossy())?)
    };
    let target = output_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("<stdout>"));

    let destination = output::open_destination(output_path.as_deref())?;
    let generator = format!("maid v{}", env!("CARGO_PKG_VERSION"));
    let mut writer = MarkdownWriter::new(destination, target, generator);

    let report = aggregate(
        &cli.paths,
        &scope,
        &mut resolver,
        &mut writer,
        output_path.as_deref(),
    )
    .context("Aggregation failed")?;
    drop(writer);

    if !cli.quiet {
        output::print_warnings(&report.errors);
        if cli.output.list_files {
            output::print_included_table(&report);
        }
        output::print_summary(&report, output_path.as_deref());
    }
    Ok(())
}
