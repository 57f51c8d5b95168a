use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "AmberPrep CLI - Prepares AMBER topologies, coordinates and staged MD runs from one or more molecular structures, deriving parameters for unknown ligands on the way.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the AMBER topology and coordinates for the given structures and run the MD stages.
    Prepare(PrepareArgs),
    /// Report which residues are non-standard, which libraries cover them and what would need
    /// parameter derivation, without running any external program.
    Survey(SurveyArgs),
}

/// Options shared by every subcommand: the inputs and how their residues are resolved.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Structures to prepare; several are assembled into one system in the given order.
    #[arg(short, long, required = true, num_args = 1.., value_name = "PATH")]
    pub structures: Vec<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prefixes of user-provided residue libraries (`PREFIX.lib`, `.off`, `.prep`).
    /// Prefixes without files name the units derived for ligands, in order.
    #[arg(short = 'p', long = "libs", num_args = 1.., value_name = "PREFIX")]
    pub libs: Vec<PathBuf>,

    /// Force field definition to source; a leaprc name or path.
    #[arg(long = "force-field", value_name = "NAME_OR_PATH")]
    pub force_field: Option<String>,

    /// File name (without extension) of the assembled system when several structures are given.
    #[arg(short = 'n', long, value_name = "NAME")]
    pub out_name: Option<String>,

    /// Directory for every generated file. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Keep existing files and pick free names for converted inputs and ligand intermediates.
    #[arg(long)]
    pub no_overwrite: bool,

    /// Leave hydrogens untouched: skip protein normalization and ligand protonation.
    #[arg(long = "no-touch-hyd")]
    pub keep_hydrogens: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S solvent.distance=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `prepare` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Solvation and simulation options of the `prepare` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Water box distance in angstroms.
    #[arg(short = 'w', long, value_name = "FLOAT")]
    pub water_dist: Option<f64>,

    /// Water model: opc, spce, tip4, tip3p or a leaprc name.
    #[arg(long, value_name = "NAME")]
    pub water_model: Option<String>,

    /// Build the topology in vacuum.
    #[arg(long, conflicts_with_all = ["water_dist", "water_model"])]
    pub no_solvent: bool,

    /// Simulation temperature in kelvin.
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Length of the production run in nanoseconds.
    #[arg(short = 'l', long, value_name = "FLOAT")]
    pub prod_length: Option<f64>,

    /// Keep velocities from the last equilibration stage when starting production.
    #[arg(short, long)]
    pub keep_velocities: bool,

    /// Run the production stage once equilibration finishes.
    #[arg(short, long = "run-prod-md")]
    pub run_production: bool,

    /// Only generate the topology and coordinates; run no MD stage.
    #[arg(long)]
    pub parm_only: bool,

    /// Do not stop for review of the structure normalizer's messages.
    #[arg(long)]
    pub uninteractive: bool,

    /// Coordinate dump frequency of the MD stages, in steps.
    #[arg(long, value_name = "INT")]
    pub coord_dump_freq: Option<u64>,

    /// Directory holding the control deck templates (`min1.in` ... `md3.in`).
    #[arg(long, value_name = "DIR")]
    pub control_decks: Option<PathBuf>,
}

/// Arguments for the `survey` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SurveyArgs {
    #[command(flatten)]
    pub input: InputArgs,
}
