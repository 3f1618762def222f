//! pchd, the command-line driver for precompiled header generation.
//!
//! `pchd generate` builds the global PCH and one PCH per project part,
//! `pchd includes` shows the include sets they would contain,
//! `pchd command-line` prints the compiler invocation for a part, and
//! `pchd reparse` runs a one-off background reparse of a source file.

#![warn(missing_docs)]

mod command_line;
mod generate;
mod includes;
mod pipeline;
mod reparse;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Precompiled header generator for multi-part C/C++ projects.
#[derive(Parser, Debug)]
#[command(name = "pchd", version, about = "Precompiled header generator")]
pub struct Cli {
    /// Only print errors and the requested data.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// When to color rendered diagnostics.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `pchd.toml` file, or the directory holding one.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the global PCH and every project part's PCH.
    Generate(GenerateArgs),
    /// Print the include set of the global PCH or of one project part.
    Includes(IncludesArgs),
    /// Print the PCH command line of a project part.
    CommandLine(CommandLineArgs),
    /// Reparse one source file as a background job and print its includes.
    Reparse(ReparseArgs),
}

/// Arguments for `pchd generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Output format for the generated artifacts.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `pchd includes`.
#[derive(Parser, Debug)]
pub struct IncludesArgs {
    /// Project part id. Without it, the global include set is printed.
    #[arg(short, long)]
    pub part: Option<String>,
}

/// Arguments for `pchd command-line`.
#[derive(Parser, Debug)]
pub struct CommandLineArgs {
    /// Project part id.
    #[arg(short, long)]
    pub part: String,
}

/// Arguments for `pchd reparse`.
#[derive(Parser, Debug)]
pub struct ReparseArgs {
    /// Source file to reparse.
    pub file: PathBuf,

    /// Project part whose arguments apply. Defaults to the part listing the file.
    #[arg(short, long)]
    pub part: Option<String>,

    /// Reparse the supportive translation unit instead of the primary one.
    #[arg(long)]
    pub supportive: bool,
}

/// `--color` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when `TERM` is set and `NO_COLOR` is not.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::env::var_os("TERM").is_some() && std::env::var_os("NO_COLOR").is_none(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// How `pchd generate` prints its results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One line per PCH, then each part's include set.
    Text,
    /// A single JSON document.
    Json,
}

/// The global flags, as every command sees them.
pub struct GlobalArgs {
    /// `--quiet`.
    pub quiet: bool,
    /// Resolved `--color`.
    pub color: bool,
    /// `--config`.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        color: cli.color.enabled(),
        config: cli.config,
    };

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Includes(ref args) => includes::run(args, &global),
        Command::CommandLine(ref args) => command_line::run(args, &global),
        Command::Reparse(ref args) => reparse::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_tracing(quiet: bool, verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    }
}
