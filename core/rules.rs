use crate::config::RuleConfig;
use crate::error::{AppError, Result};
use globset::{Glob, GlobMatcher};
use regex::Regex;
use std::path::Path;
use std::rc::Rc;

pub mod engine;

pub use engine::Transformed;

pub const EMPTY_LINE_TOKEN: &str = "::empty::";
pub const SAME_LINE_TOKEN: &str = "::line::";

/// How a deletion range opened by `start` is closed.
#[derive(Debug, Clone)]
pub enum EndOfRange {
    /// Closed by the first line matching the regex (that line is dropped too).
    Pattern(Regex),
    /// Closed by the first empty or all-whitespace line.
    FirstEmptyLine,
    /// Only the start line itself is dropped.
    SameLineAsStart,
}

impl EndOfRange {
    fn parse(raw: &str) -> std::result::Result<Self, regex::Error> {
        match raw {
            EMPTY_LINE_TOKEN => Ok(EndOfRange::FirstEmptyLine),
            SAME_LINE_TOKEN => Ok(EndOfRange::SameLineAsStart),
            _ => Regex::new(raw).map(EndOfRange::Pattern),
        }
    }

    pub fn closes(&self, line: &str) -> bool {
        match self {
            EndOfRange::Pattern(re) => re.is_match(line),
            EndOfRange::FirstEmptyLine => line.trim().is_empty(),
            EndOfRange::SameLineAsStart => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    pattern: String,
    file_matcher: GlobMatcher,
    match_full_path: bool,
    start: Regex,
    end: EndOfRange,
    keep_start: bool,
}

impl Rule {
    pub fn compile(spec: &RuleConfig, origin: &str) -> Result<Self> {
        let name = spec
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| spec.pattern.clone());
        let fail = |reason: String| AppError::RuleCompile {
            rule: name.clone(),
            origin: origin.to_string(),
            reason,
        };

        let file_matcher = Glob::new(spec.pattern.trim())
            .map_err(|e| fail(format!("invalid file pattern \"{}\": {}", spec.pattern, e)))?
            .compile_matcher();
        let start = Regex::new(&spec.start)
            .map_err(|e| fail(format!("invalid start regex \"{}\": {}", spec.start, e)))?;
        let end = EndOfRange::parse(&spec.delete)
            .map_err(|e| fail(format!("invalid delete regex \"{}\": {}", spec.delete, e)))?;

        log::trace!("Compiled rule '{}' for files matching '{}'", name, spec.pattern);
        Ok(Self {
            match_full_path: spec.pattern.contains('/'),
            pattern: spec.pattern.trim().to_string(),
            name,
            file_matcher,
            start,
            end,
            keep_start: spec.keep_start,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn end(&self) -> &EndOfRange {
        &self.end
    }

    /// `relative_path` is relative to the scanned root. Patterns without a `/`
    /// are matched against the file name only.
    pub fn applies_to(&self, relative_path: &Path) -> bool {
        if self.match_full_path {
            self.file_matcher.is_match(relative_path)
        } else {
            relative_path
                .file_name()
                .is_some_and(|name| self.file_matcher.is_match(name))
        }
    }
}

/// Ordered rules; each rule's output feeds the next.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rc<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(specs: &[RuleConfig], origin: &str) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|spec| Rule::compile(spec, origin).map(Rc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// A new set holding `self` followed by `later`, sharing the compiled rules.
    pub fn extended(&self, later: &RuleSet) -> RuleSet {
        let mut rules = Vec::with_capacity(self.rules.len() + later.rules.len());
        rules.extend(self.rules.iter().cloned());
        rules.extend(later.rules.iter().cloned());
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Rules whose file pattern matches, in application order.
    pub fn applicable<'a>(&'a self, relative_path: &'a Path) -> impl Iterator<Item = &'a Rule> + 'a {
        self.iter().filter(move |rule| rule.applies_to(relative_path))
    }
}
