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
    version,
    about = "supermol - superposition of structural ensembles: representative-model selection, core-region detection, and rigid alignment of multi-model PDB ensembles.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Superpose an ensemble of models onto its representative, restricted to
    /// the low-variance core.
    Superpose(SuperposeArgs),
}

/// Arguments for the `superpose` subcommand.
#[derive(Args, Debug)]
pub struct SuperposeArgs {
    /// Input PDB files, one model per file, all sharing one topology.
    /// The first file defines the reference topology.
    #[arg(required = true, value_name = "FILES", num_args(1..))]
    pub files: Vec<PathBuf>,

    /// Directory for the superposed output files.
    /// Defaults to each input file's own directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Filename prefix for the superposed output models.
    #[arg(long, default_value = "sup_", value_name = "PREFIX")]
    pub prefix: String,

    /// Residues to include in the alignment.
    /// Example: "2-5,10" or "B: 2, 3; A: 5-6". '*' selects everything.
    #[arg(short = 'R', long, default_value = "*", value_name = "SELECTION")]
    pub include_residues: String,

    /// Residues to exclude from the alignment. Same syntax as --include-residues.
    #[arg(short = 'r', long, default_value = "", value_name = "SELECTION")]
    pub exclude_residues: String,

    /// Atom names to include, comma separated; a trailing '*' matches a prefix.
    #[arg(short = 'A', long, default_value = "*", value_name = "NAMES")]
    pub include_atoms: String,

    /// Atom names to exclude, comma separated; a trailing '*' matches a prefix.
    #[arg(short = 'a', long, default_value = "", value_name = "NAMES")]
    pub exclude_atoms: String,

    /// Compute and report statistics without writing any output files.
    #[arg(long)]
    pub dry_run: bool,
}
