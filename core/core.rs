pub mod config;
pub mod context;
pub mod error;
pub mod gather;
pub mod output_formats;
pub mod pattern;
pub mod rules;

pub use config::{
    CONFIG_FILENAMES, Config, ConfigResolver, DEFAULT_OUTPUT_FILENAME, GlobalScope, LoadedConfig,
    RuleConfig,
};
pub use context::ScanContext;
pub use error::{AppError, Result};
pub use gather::{
    FileContent, IncludedFile, IncludedKind, ScanReport, Scanner, aggregate, read_file_content,
};
pub use output_formats::{BuiltinIgnores, ContentSink, MarkdownWriter, get_builtin_ignore_patterns};
pub use pattern::{Pattern, PatternSet, ScopedPattern};
pub use rules::{EndOfRange, Rule, RuleSet, Transformed};
