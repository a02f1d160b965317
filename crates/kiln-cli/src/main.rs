//! Kiln form engine CLI.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use kiln_cli::commands::{run_bind, run_normalize, run_save, run_validate};
use kiln_cli::io::write_json;
use kiln_cli::logging::{LogConfig, LogFormat, init_logging};
use kiln_model::EngineOptions;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, EngineArgs, LogFormatArg, LogLevelArg};
use crate::summary::{print_save_summary, print_validation};

/// Exit code when the form has validation errors.
const EXIT_INVALID: i32 = 2;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Bind(args) => {
            let bound = run_bind(&args.definition, &args.data, args.mode.into())?;
            if args.debug_map {
                write_json(args.output.as_deref(), &bound.debug)?;
            } else {
                write_json(args.output.as_deref(), &bound.definition)?;
            }
            Ok(0)
        }
        Command::Normalize(args) => {
            let state = run_normalize(&args.definition, &args.state)?;
            write_json(args.output.as_deref(), &state)?;
            Ok(0)
        }
        Command::Validate(args) => {
            let options = engine_options(&args.engine);
            let result = run_validate(&args.input.definition, &args.input.state, &options)?;
            if args.json || args.input.output.is_some() {
                write_json(args.input.output.as_deref(), &result)?;
            } else {
                print_validation(&result);
            }
            Ok(if result.is_valid { 0 } else { EXIT_INVALID })
        }
        Command::Save(args) => {
            let options = engine_options(&args.engine);
            let outcome = run_save(
                &args.input.definition,
                &args.input.state,
                args.metadata.as_deref(),
                &options,
                !args.no_validate,
            )?;
            let Some(payload) = outcome.payload else {
                if let Some(result) = &outcome.validation {
                    print_validation(result);
                }
                return Ok(EXIT_INVALID);
            };
            write_json(args.input.output.as_deref(), &payload)?;
            if args.input.output.is_some() {
                print_save_summary(&payload);
            }
            Ok(0)
        }
    }
}

fn engine_options(args: &EngineArgs) -> EngineOptions {
    let options = EngineOptions::new().with_render_mode(args.render.into());
    match &args.default_label {
        Some(label) => options.with_default_label(label.clone()),
        None => options,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
