use crate::config::{ConfigResolver, GlobalScope};
use crate::context::ScanContext;
use crate::error::{AppError, Result};
use crate::output_formats::ContentSink;
use log;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Content of one file, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Text(String),
    Binary { size: u64 },
}

/// Text means valid UTF-8 without NUL bytes.
pub fn is_text(bytes: &[u8]) -> bool {
    !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok()
}

pub fn read_file_content(path: &Path) -> Result<FileContent> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let size = bytes.len() as u64;
    if bytes.contains(&0) {
        return Ok(FileContent::Binary { size });
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(FileContent::Text(text)),
        Err(_) => Ok(FileContent::Binary { size }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncludedKind {
    Text {
        lines: usize,
        removed: usize,
        rules: Vec<String>,
    },
    Binary {
        size: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncludedFile {
    pub path: PathBuf,
    pub kind: IncludedKind,
}

/// What one run did: files emitted, paths ignored, and non-fatal errors.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub included: Vec<IncludedFile>,
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<AppError>,
}

impl ScanReport {
    pub fn is_included(&self, path: &Path) -> bool {
        self.included.iter().any(|f| f.path == path)
    }
}

fn files_before_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Depth-first walker. Asks the resolver for each directory's context, the
/// context's patterns for each entry, and its rules for each text file.
pub struct Scanner<'a, S: ContentSink> {
    resolver: &'a mut ConfigResolver,
    sink: &'a mut S,
    excluded: Vec<PathBuf>,
    report: ScanReport,
}

impl<'a, S: ContentSink> Scanner<'a, S> {
    pub fn new(resolver: &'a mut ConfigResolver, sink: &'a mut S) -> Self {
        Self {
            resolver,
            sink,
            excluded: Vec::new(),
            report: ScanReport::default(),
        }
    }

    /// Never aggregate `path` (the output document itself, typically).
    pub fn exclude(mut self, path: &Path) -> Self {
        match path.canonicalize() {
            Ok(canonical) => self.excluded.push(canonical),
            Err(e) => log::debug!("Cannot canonicalize {}: {}", path.display(), e),
        }
        self
    }

    pub fn into_report(self) -> ScanReport {
        self.report
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|excluded| {
            excluded.file_name() == path.file_name()
                && path.canonicalize().is_ok_and(|p| &p == excluded)
        })
    }

    fn note_error(&mut self, error: AppError) {
        log::warn!("{}", error);
        self.report.errors.push(error);
    }

    /// Walks `root` with `base` as the context above it. Ignored directories
    /// are not entered.
    pub fn scan_directory(&mut self, root: &Path, base: &ScanContext) -> Result<()> {
        log::info!("Scanning directory: {}", root.display());
        let root_context = self.resolver.extend(base, root)?;
        let mut stack: Vec<(usize, ScanContext)> = vec![(0, root_context)];

        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(files_before_dirs)
            .into_iter();

        while let Some(entry_result) = walker.next() {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    self.note_error(AppError::from(e));
                    continue;
                }
            };
            let depth = entry.depth();
            if depth == 0 {
                continue;
            }
            while stack.len() > 1 && stack.last().is_some_and(|(d, _)| *d >= depth) {
                stack.pop();
            }
            let Some((_, context)) = stack.last() else {
                continue;
            };
            let context = context.clone();

            let path = entry.path();
            let is_dir = entry.file_type().is_dir();

            if let Some(hit) = context.patterns().last_match(path, is_dir) {
                if !hit.pattern.is_negated() {
                    log::debug!(
                        "Skipped {} {} (pattern '{}' from {})",
                        if is_dir { "directory" } else { "file" },
                        path.display(),
                        hit.pattern,
                        hit.base.display()
                    );
                    self.report.skipped.push(path.to_path_buf());
                    if is_dir {
                        walker.skip_current_dir();
                    }
                    continue;
                }
            }

            if is_dir {
                let child = self.resolver.extend(&context, path)?;
                stack.push((depth, child));
                continue;
            }

            if !entry.file_type().is_file() && !path.is_file() {
                log::debug!("Skipping non-regular entry: {}", path.display());
                continue;
            }

            let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
            self.process_file(path, &relative, &context)?;
        }
        Ok(())
    }

    /// Handles a file named directly on the command line.
    pub fn scan_file(&mut self, path: &Path, context: &ScanContext) -> Result<()> {
        if context.patterns().is_ignored(path, false) {
            log::info!("Skipped blacklisted file: {}", path.display());
            self.report.skipped.push(path.to_path_buf());
            return Ok(());
        }
        let relative = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        self.process_file(path, &relative, context)
    }

    fn process_file(&mut self, path: &Path, relative: &Path, context: &ScanContext) -> Result<()> {
        if self.is_excluded(path) {
            log::debug!("Skipping output document: {}", path.display());
            self.report.skipped.push(path.to_path_buf());
            return Ok(());
        }

        let content = match read_file_content(path) {
            Ok(content) => content,
            Err(e) => {
                self.note_error(e);
                return Ok(());
            }
        };

        let kind = match content {
            FileContent::Binary { size } => {
                log::info!("Including binary file: {} ({} bytes)", path.display(), size);
                self.sink.binary_file(path, size)?;
                IncludedKind::Binary { size }
            }
            FileContent::Text(text) => {
                log::info!("Processing file: {}", path.display());
                let lines: Vec<String> = text.lines().map(String::from).collect();
                let transformed = context.rules().transform(relative, lines);
                self.sink.text_file(path, &transformed.lines)?;
                IncludedKind::Text {
                    lines: transformed.lines.len(),
                    removed: transformed.removed,
                    rules: transformed.applied,
                }
            }
        };
        self.report.included.push(IncludedFile {
            path: path.to_path_buf(),
            kind,
        });
        Ok(())
    }
}

/// Runs a whole aggregation: header, every path in order, flush.
pub fn aggregate<S: ContentSink>(
    paths: &[PathBuf],
    scope: &GlobalScope,
    resolver: &mut ConfigResolver,
    sink: &mut S,
    exclude: Option<&Path>,
) -> Result<ScanReport> {
    sink.begin()?;
    let mut scanner = Scanner::new(resolver, sink);
    if let Some(path) = exclude {
        scanner = scanner.exclude(path);
    }

    for path in paths {
        if path.is_dir() {
            let base = scope.context_for(path)?;
            scanner.scan_directory(path, &base)?;
        } else if path.is_file() {
            let anchor = path.parent().unwrap_or_else(|| Path::new(""));
            let base = scope.context_for(anchor)?;
            scanner.scan_file(path, &base)?;
        } else {
            log::warn!("Invalid path: {}", path.display());
        }
    }

    let report = scanner.into_report();
    sink.finish()?;
    log::info!(
        "Aggregated {} files ({} skipped, {} errors)",
        report.included.len(),
        report.skipped.len(),
        report.errors.len()
    );
    Ok(report)
}
