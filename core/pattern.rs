//! Gitignore-style ignore patterns.
//!
//! A pattern is compiled once into a list of path segments and tested against
//! candidate paths made relative to the directory whose configuration declared
//! it. Within a [`PatternSet`] the last matching pattern decides the verdict.

use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Glob(GlobMatcher),
    /// Exactly one path segment, whatever its name.
    AnyOne,
    /// `**`: zero or more whole path segments.
    AnyDepth,
}

impl Segment {
    fn compile(raw: &str) -> std::result::Result<Self, globset::Error> {
        if raw == "**" {
            return Ok(Segment::AnyDepth);
        }
        if !raw.contains(['*', '?', '[', '\\']) {
            return Ok(Segment::Literal(raw.to_string()));
        }
        // Inside a segment `**` means the same as `*`. Braces are literal.
        let mut glob = String::with_capacity(raw.len() + 2);
        let mut chars = raw.chars();
        let mut after_star = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    glob.push(c);
                    if let Some(next) = chars.next() {
                        glob.push(next);
                    }
                    after_star = false;
                    continue;
                }
                '*' if after_star => continue,
                '{' | '}' => {
                    glob.push('\\');
                    glob.push(c);
                }
                _ => glob.push(c),
            }
            after_star = c == '*';
        }
        let glob = GlobBuilder::new(&glob)
            .literal_separator(true)
            .backslash_escape(true)
            .build()?;
        Ok(Segment::Glob(glob.compile_matcher()))
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == name,
            Segment::Glob(matcher) => matcher.is_match(name),
            Segment::AnyOne | Segment::AnyDepth => true,
        }
    }
}

/// Backtracking walk of pattern segments over path segments. `**` tries the
/// longest span first.
fn match_segments<S: AsRef<str>>(pattern: &[Segment], path: &[S]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).rev().any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((first, tail)) => segment.matches(first.as_ref()) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// One compiled ignore pattern. Immutable once built.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    negated: bool,
    anchored: bool,
    dir_only: bool,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles one raw pattern line. Blank lines and `#` comments yield `None`.
    /// `origin` names the configuration source for error messages.
    pub fn compile(raw: &str, origin: &str) -> Result<Option<Self>> {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (
                false,
                text.strip_prefix('\\')
                    .filter(|rest| rest.starts_with(['!', '#']))
                    .unwrap_or(text),
            ),
        };

        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let (rooted, body) = if let Some(rest) = body.strip_prefix("./") {
            (true, rest)
        } else if let Some(rest) = body.strip_prefix('/') {
            (true, rest)
        } else {
            (false, body)
        };

        if body.is_empty() {
            return Err(compile_error(text, origin, "pattern has no path segments"));
        }

        let anchored = rooted || body.contains('/');
        let mut segments = Vec::new();
        if !anchored {
            segments.push(Segment::AnyDepth);
        }
        for part in body.split('/') {
            if part.is_empty() {
                return Err(compile_error(text, origin, "empty path segment (// not allowed)"));
            }
            let segment = Segment::compile(part)
                .map_err(|e| compile_error(text, origin, &e.to_string()))?;
            if matches!(segment, Segment::AnyDepth)
                && matches!(segments.last(), Some(Segment::AnyDepth))
            {
                continue;
            }
            segments.push(segment);
        }
        // A trailing `/**` matches what is inside the directory, not the directory.
        if body.ends_with("/**") {
            segments.insert(segments.len() - 1, Segment::AnyOne);
        }

        log::trace!(
            "Compiled pattern '{}' (negated: {}, anchored: {}, dir_only: {}, segments: {})",
            text,
            negated,
            anchored,
            dir_only,
            segments.len()
        );
        Ok(Some(Self {
            text: text.to_string(),
            negated,
            anchored,
            dir_only,
            segments,
        }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Tests path segments (relative to the pattern's base). A directory-only
    /// pattern also matches when it matches an ancestor directory of the
    /// candidate; every other pattern is tested against the full path only.
    pub fn matches_segments<S: AsRef<str>>(&self, parts: &[S], is_dir: bool) -> bool {
        if parts.is_empty() {
            return false;
        }
        if self.dir_only && !self.negated {
            return (1..=parts.len()).any(|len| {
                (len < parts.len() || is_dir) && match_segments(&self.segments, &parts[..len])
            });
        }
        (is_dir || !self.dir_only) && match_segments(&self.segments, parts)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn compile_error(pattern: &str, origin: &str, reason: &str) -> AppError {
    AppError::PatternCompile {
        pattern: pattern.to_string(),
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}

/// A pattern tagged with the directory of the configuration that declared it.
#[derive(Debug, Clone)]
pub struct ScopedPattern {
    pub pattern: Pattern,
    pub base: PathBuf,
}

impl ScopedPattern {
    pub fn new(pattern: Pattern, base: impl Into<PathBuf>) -> Self {
        Self {
            pattern,
            base: base.into(),
        }
    }

    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        match relative_segments(path, &self.base) {
            Some(parts) => self.pattern.matches_segments(&parts, is_dir),
            // Outside the base only unanchored patterns apply, and only to the name.
            None if !self.pattern.is_anchored() => path
                .file_name()
                .map(|name| self.pattern.matches_segments(&[name.to_string_lossy()], is_dir))
                .unwrap_or(false),
            None => false,
        }
    }
}

fn relative_segments<'a>(path: &'a Path, base: &Path) -> Option<Vec<std::borrow::Cow<'a, str>>> {
    let relative = path.strip_prefix(base).ok()?;
    Some(
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect(),
    )
}

/// Ordered patterns; evaluation is last-match-wins.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<Rc<ScopedPattern>>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles raw pattern strings, all anchored at `base`.
    pub fn compile<I, S>(raw_patterns: I, base: &Path, origin: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for raw in raw_patterns {
            if let Some(pattern) = Pattern::compile(raw.as_ref(), origin)? {
                set.push(ScopedPattern::new(pattern, base));
            }
        }
        Ok(set)
    }

    pub fn push(&mut self, pattern: ScopedPattern) {
        self.entries.push(Rc::new(pattern));
    }

    /// A new set holding `self` followed by `later`. Patterns are shared, not copied.
    pub fn extended(&self, later: &PatternSet) -> PatternSet {
        let mut entries = Vec::with_capacity(self.entries.len() + later.entries.len());
        entries.extend(self.entries.iter().cloned());
        entries.extend(later.entries.iter().cloned());
        PatternSet { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ScopedPattern> {
        self.entries.iter().map(|p| p.as_ref())
    }

    /// The last pattern matching `path`, regardless of polarity.
    pub fn last_match(&self, path: &Path, is_dir: bool) -> Option<&ScopedPattern> {
        self.iter().rev().find(|p| p.matches(path, is_dir))
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.last_match(path, is_dir)
            .is_some_and(|p| !p.pattern.is_negated())
    }
}
