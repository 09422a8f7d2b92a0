use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod mapping;

const FILE_SEPARATOR: &str = "----------------------------------------";

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub patterns: Vec<String>,
}

static BUILTIN_IGNORE_PATTERNS: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

pub fn get_builtin_ignore_patterns() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORE_PATTERNS
}

/// Receives the aggregated document, one file at a time, in walk order.
pub trait ContentSink {
    fn begin(&mut self) -> Result<()>;
    fn text_file(&mut self, path: &Path, lines: &[String]) -> Result<()>;
    /// Binary files carry no content, only a marker.
    fn binary_file(&mut self, path: &Path, size: u64) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Writes the aggregated Markdown document.
pub struct MarkdownWriter<W: Write> {
    out: W,
    target: PathBuf,
    generator: String,
}

impl<W: Write> MarkdownWriter<W> {
    /// `target` names the destination in error messages; `generator` is the
    /// tool name and version printed in the header.
    pub fn new(out: W, target: impl Into<PathBuf>, generator: impl Into<String>) -> Self {
        Self {
            out,
            target: target.into(),
            generator: generator.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.out
            .write_all(s.as_bytes())
            .map_err(|e| AppError::FileWrite {
                path: self.target.clone(),
                source: e,
            })
    }
}

impl<W: Write> ContentSink for MarkdownWriter<W> {
    fn begin(&mut self) -> Result<()> {
        let header = format!(
            "# Content\n\nThis file was generated by {}\n\n",
            self.generator
        );
        self.write_str(&header)
    }

    fn text_file(&mut self, path: &Path, lines: &[String]) -> Result<()> {
        let language = mapping::language_for_path(path);
        let mut block = String::new();
        block.push_str(FILE_SEPARATOR);
        block.push_str("\n\n");
        block.push_str(&format!("## FILE: `{}`\n\n", path.display()));
        block.push_str(&format!("```{}\n", language));
        for line in lines {
            // Inner fences would close the block early.
            if language == "markdown" {
                block.push_str(&line.replace("```", "'''"));
            } else {
                block.push_str(line);
            }
            block.push('\n');
        }
        block.push_str("```\n\n");
        self.write_str(&block)
    }

    fn binary_file(&mut self, path: &Path, size: u64) -> Result<()> {
        let file_type = mapping::mime_for_path(path).unwrap_or("Unknown");
        let marker = format!(
            "{}\n## FILE: `{}` - Type: {} - Size: {} bytes\n",
            FILE_SEPARATOR,
            path.display(),
            file_type,
            size
        );
        self.write_str(&marker)
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| AppError::FileWrite {
            path: self.target.clone(),
            source: e,
        })
    }
}
