use clap::{Args, Parser, Subcommand, ValueEnum};
use ligopt::engine::config::Backend;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "ligopt CLI - apply pose increments and BFGS inverse-Hessian updates using device-resident optimizer state.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Device configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the compute backend from the device configuration.
    #[arg(short, long, global = true, value_enum, value_name = "BACKEND")]
    pub backend: Option<BackendArg>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Advance a pose by a scaled step and print the resulting pose.
    Step(StepArgs),
    /// Apply one BFGS update to an inverse Hessian from a step and a gradient difference.
    Bfgs(BfgsArgs),
}

/// Arguments for the `step` subcommand.
#[derive(Args, Debug)]
pub struct StepArgs {
    /// Path to a TOML file holding `[pose]` and `[step]` tables.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Write the resulting pose here instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the step factor from the input file.
    #[arg(short, long, value_name = "FLOAT")]
    pub factor: Option<f64>,
}

/// Arguments for the `bfgs` subcommand.
#[derive(Args, Debug)]
pub struct BfgsArgs {
    /// Path to a TOML file holding `p`, `y` and `alpha`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Override the line-search scale from the input file.
    #[arg(short, long, value_name = "FLOAT")]
    pub alpha: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Host,
    Cuda,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Host => Backend::Host,
            BackendArg::Cuda => Backend::Cuda,
        }
    }
}
