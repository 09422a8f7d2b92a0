use crate::pattern::PatternSet;
use crate::rules::RuleSet;
use std::rc::Rc;

/// Effective patterns and rules visible in one directory: the global layer
/// plus every ancestor's local configuration down to this directory.
///
/// Contexts are values. Entering a directory derives a new context from the
/// parent's; leaving it just drops that value, so siblings never see each
/// other's local configuration.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    patterns: Rc<PatternSet>,
    rules: Rc<RuleSet>,
}

impl ScanContext {
    pub fn new(patterns: PatternSet, rules: RuleSet) -> Self {
        Self {
            patterns: Rc::new(patterns),
            rules: Rc::new(rules),
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Appends a directory's contribution. Empty halves are shared with `self`.
    pub fn extended(&self, patterns: &PatternSet, rules: &RuleSet) -> Self {
        Self {
            patterns: if patterns.is_empty() {
                Rc::clone(&self.patterns)
            } else {
                Rc::new(self.patterns.extended(patterns))
            },
            rules: if rules.is_empty() {
                Rc::clone(&self.rules)
            } else {
                Rc::new(self.rules.extended(rules))
            },
        }
    }

    /// True when both contexts point at the same pattern and rule sets.
    pub fn shares_state_with(&self, other: &ScanContext) -> bool {
        Rc::ptr_eq(&self.patterns, &other.patterns) && Rc::ptr_eq(&self.rules, &other.rules)
    }
}
