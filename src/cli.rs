//! Command-line interface implementation for kiln.
//! Provides argument parsing and help text formatting using clap.

use crate::writer::{ConflictPolicy, WritePolicy};
use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for kiln.
#[derive(Parser, Debug)]
#[command(author, version, about = "kiln: rule-driven project scaffolding engine", long_about = None)]
pub struct Args {
    /// Directory holding the template sources
    #[arg(value_name = "TEMPLATES")]
    pub templates: PathBuf,

    /// Directory where the project will be generated
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Rule table file (YAML or JSON). Defaults to the built-in server rules
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Only generate the named rule group (repeatable)
    #[arg(short, long = "group", value_name = "NAME")]
    pub groups: Vec<String>,

    /// Generator context file (JSON or YAML).
    /// Without it, a persisted context is looked up in the output directory.
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Read the generator context from stdin
    #[arg(short, long)]
    pub stdin: bool,

    /// Override a context option (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Overwrite destinations whose content differs
    #[arg(short, long)]
    pub force: bool,

    /// Keep destinations whose content differs instead of failing
    #[arg(long, conflicts_with = "force")]
    pub skip_modified: bool,

    /// Resolve and report everything without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Do not remove legacy files from previous generations
    #[arg(long)]
    pub skip_cleanup: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn write_policy(&self) -> WritePolicy {
        let conflict = if self.force {
            ConflictPolicy::Force
        } else if self.skip_modified {
            ConflictPolicy::Skip
        } else {
            ConflictPolicy::Fail
        };
        WritePolicy { dry_run: self.dry_run, conflict }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
