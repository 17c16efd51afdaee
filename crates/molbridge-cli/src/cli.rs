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
    about = "Molbridge CLI - invoke cheminformatics structure endpoints (conversion, hydrogens, 3D embedding, similarity, RCSB retrieval) from the command line.",
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
    /// Run a named endpoint against a JSON request and print the response.
    Call(CallArgs),
    /// List the registered cheminformatics backends.
    Toolkits,
    /// List the available endpoint names.
    Endpoints,
}

/// Arguments for the `call` subcommand.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Endpoint name (e.g. convert, addh, make3d, chemical_similarity).
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Path to the JSON request body. Reads standard input when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub request: Option<PathBuf>,

    /// Write the JSON response to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the response on a single line rather than pretty-printed.
    #[arg(long)]
    pub compact: bool,
}
