use clap::{Args, Parser};
use maid_core::DEFAULT_OUTPUT_FILENAME;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct OutputOpts {
    #[arg(
        short,
        long,
        help = "Write the aggregated document to FILE.",
        value_name = "FILE",
        default_value = DEFAULT_OUTPUT_FILENAME,
        conflicts_with = "stdout",
        help_heading = "Output"
    )]
    pub output: PathBuf,

    #[arg(
        long,
        help = "Write the aggregated document to standard output.",
        help_heading = "Output"
    )]
    pub stdout: bool,

    #[arg(
        short,
        long,
        help = "Print a table of the included files when done.",
        help_heading = "Output"
    )]
    pub list_files: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IgnoreOpts {
    #[arg(
        short,
        long = "blacklist",
        help = "Extra ignore pattern, applied after the global configuration (repeatable).",
        value_name = "PATTERN",
        help_heading = "Filtering"
    )]
    pub blacklist: Vec<String>,

    #[arg(
        short,
        long,
        help = "Use FILE as the global configuration instead of searching for one.",
        value_name = "FILE",
        conflicts_with = "no_global_config",
        help_heading = "Filtering"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Do not load any global configuration file.",
        help_heading = "Filtering"
    )]
    pub no_global_config: bool,

    #[arg(
        long,
        help = "Disable the built-in ignore patterns (.git, node_modules, ...).",
        help_heading = "Filtering"
    )]
    pub no_builtin_ignore: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Aggregate a directory tree into one Markdown document.",
    long_about = "maid walks the given paths, skips whatever the cascading maid.json \nconfiguration ignores, strips configured line ranges from text files and \nwrites everything that is left into a single Markdown file.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  maid .\n  maid src docs -o context.md\n  maid . -b '*.lock' -b 'target/' --stdout",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(
        required = true,
        help = "Directories or files to aggregate.",
        value_name = "PATHS"
    )]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputOpts,

    #[command(flatten)]
    pub ignore: IgnoreOpts,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        help = "Silence informational messages and warnings.",
        conflicts_with = "log"
    )]
    pub quiet: bool,

    #[arg(long, help = "Log progress messages (same as -v).")]
    pub log: bool,
}

impl Cli {
    /// Verbosity after folding `--log` into the `-v` count.
    pub fn effective_verbosity(&self) -> u8 {
        if self.log {
            self.verbose.max(1)
        } else {
            self.verbose
        }
    }
}
