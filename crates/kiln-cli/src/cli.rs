//! CLI argument definitions for the Kiln form engine.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use kiln_model::{FormMode, RenderMode};

#[derive(Parser)]
#[command(
    name = "kiln",
    version,
    about = "Kiln form engine - bind, normalize, validate and save form state",
    long_about = "Drive the Kiln form engine from JSON files.\n\n\
                  Definitions, runtime state ({formState, groupState, activeGroups}),\n\
                  data maps and metadata are all read as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow field values to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bind a data map onto a definition and print the bound definition.
    Bind(BindArgs),

    /// Normalize group state against a definition and print the runtime state.
    Normalize(StateArgs),

    /// Validate every visible field and report errors.
    Validate(ValidateArgs),

    /// Build the save payload.
    Save(SaveArgs),
}

#[derive(Args)]
pub struct BindArgs {
    /// Form definition JSON.
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Flat data map JSON keyed by field id.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Form mode; read-only modes mark every field `is_read_only`.
    #[arg(long = "mode", value_enum, default_value = "edit")]
    pub mode: FormModeArg,

    /// Print the debug map of injected values instead of the definition.
    #[arg(long = "debug-map")]
    pub debug_map: bool,

    /// Write output to a file instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct StateArgs {
    /// Form definition JSON.
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Runtime state JSON.
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Write output to a file instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: StateArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Print the validation result as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct SaveArgs {
    #[command(flatten)]
    pub input: StateArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Metadata JSON object merged into the payload metadata.
    #[arg(long = "metadata", value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// Build the payload even when validation fails.
    #[arg(long = "no-validate")]
    pub no_validate: bool,
}

#[derive(Args)]
pub struct EngineArgs {
    /// Which visibility flags apply.
    #[arg(long = "render", value_enum, default_value = "web")]
    pub render: RenderModeArg,

    /// Label used in messages for fields without one.
    #[arg(long = "default-label", value_name = "LABEL")]
    pub default_label: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RenderModeArg {
    Web,
    Pdf,
}

impl From<RenderModeArg> for RenderMode {
    fn from(arg: RenderModeArg) -> Self {
        match arg {
            RenderModeArg::Web => RenderMode::Web,
            RenderModeArg::Pdf => RenderMode::Pdf,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormModeArg {
    View,
    Edit,
    Preview,
    Generate,
    #[value(name = "portalNew")]
    PortalNew,
    #[value(name = "portalEdit")]
    PortalEdit,
    #[value(name = "portalView")]
    PortalView,
}

impl From<FormModeArg> for FormMode {
    fn from(arg: FormModeArg) -> Self {
        match arg {
            FormModeArg::View => FormMode::View,
            FormModeArg::Edit => FormMode::Edit,
            FormModeArg::Preview => FormMode::Preview,
            FormModeArg::Generate => FormMode::Generate,
            FormModeArg::PortalNew => FormMode::PortalNew,
            FormModeArg::PortalEdit => FormMode::PortalEdit,
            FormModeArg::PortalView => FormMode::PortalView,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
