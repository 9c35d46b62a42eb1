//! erc20-classifier CLI entry point
//!
//! Batch classification of ERC-20 tokens with a forge post-deployment suite.

use clap::Parser;
use erc20_classifier::cli::args::{Args, Command};
use erc20_classifier::cli::output::get_formatter;
use erc20_classifier::platform::forge::ForgeEngine;
use erc20_classifier::version::get_build_info;
use erc20_classifier::{list_checks, run_classification, ClassifierConfig, ClassifierError};

use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    // clap exits with status 2 on usage errors
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .format_timestamp(None)
        .init();

    match args.selected_command() {
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
        Command::List => print_check_list(&args),
        Command::Classify => run_checks(&args),
    }
}

fn print_version() {
    let info = get_build_info();
    println!("{}", info);
}

fn build_engine(args: &Args, config: &ClassifierConfig) -> ForgeEngine {
    ForgeEngine::from_config(config).with_quiet(!args.verbose)
}

fn print_check_list(args: &Args) -> ExitCode {
    let config = ClassifierConfig::from_args(args);
    let engine = build_engine(args, &config);

    match list_checks(&config, &engine) {
        Ok(catalog) => {
            for (i, name) in catalog.names().iter().enumerate() {
                println!("{:>3}  {}", i + 1, name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(3)
        }
    }
}

fn run_checks(args: &Args) -> ExitCode {
    let config = ClassifierConfig::from_args(args);
    let engine = build_engine(args, &config);

    let report = match run_classification(&config, &engine) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(3);
        }
    };

    let formatter = get_formatter(&args.format, !args.color_enabled(), args.verbose, args.quiet);
    let output = formatter.format(&report);

    if let Err(e) = write_report(args, &output) {
        eprintln!("Error: {}", e);
        return ExitCode::from(3);
    }

    if args.fail_on_skip && !report.failures.is_empty() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn write_report(args: &Args, output: &str) -> Result<(), ClassifierError> {
    match args.output {
        Some(ref path) => {
            fs::write(path, format!("{}\n", output)).map_err(|e| ClassifierError::Output {
                context: path.display().to_string(),
                message: e.to_string(),
            })?;
            log::info!("Report written to {}", path.display());
            Ok(())
        }
        None => {
            println!("{}", output);
            Ok(())
        }
    }
}
