// Line-range deletion: a two-state scan per rule, rules chained in order.
use super::{EndOfRange, Rule, RuleSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeletionRange {
    Searching,
    InRange,
}

/// Result of running every applicable rule over one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    pub lines: Vec<String>,
    pub removed: usize,
    pub applied: Vec<String>,
}

impl Rule {
    /// Runs this rule once over `lines`. A range still open at end of input
    /// swallows the rest of the file.
    pub fn apply(&self, lines: Vec<String>) -> Vec<String> {
        let mut state = DeletionRange::Searching;
        let mut kept = Vec::with_capacity(lines.len());

        for line in lines {
            match state {
                DeletionRange::Searching => {
                    if !self.start.is_match(&line) {
                        kept.push(line);
                        continue;
                    }
                    if matches!(self.end, EndOfRange::SameLineAsStart) {
                        continue;
                    }
                    if self.keep_start {
                        kept.push(line);
                    }
                    state = DeletionRange::InRange;
                }
                DeletionRange::InRange => {
                    if self.end.closes(&line) {
                        state = DeletionRange::Searching;
                    }
                }
            }
        }

        if state == DeletionRange::InRange {
            log::debug!(
                "Rule '{}' reached end of input with an open range; remainder dropped",
                self.name
            );
        }
        kept
    }
}

impl RuleSet {
    pub fn transform(&self, relative_path: &Path, lines: Vec<String>) -> Transformed {
        let original_len = lines.len();
        let mut applied = Vec::new();
        let mut current = lines;

        for rule in self.applicable(relative_path) {
            log::info!(
                "Applying rule: {} ({}) to {}",
                rule.name(),
                rule.pattern(),
                relative_path.display()
            );
            let before = current.len();
            current = rule.apply(current);
            log::trace!(
                "Rule '{}' removed {} lines from {}",
                rule.name(),
                before - current.len(),
                relative_path.display()
            );
            applied.push(rule.name().to_string());
        }

        Transformed {
            removed: original_len - current.len(),
            lines: current,
            applied,
        }
    }
}
