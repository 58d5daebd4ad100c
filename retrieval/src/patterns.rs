//! Lexical question-intent patterns.
//!
//! Every matcher takes text that the caller has already lowercased and
//! reports whether any pattern of a group occurs anywhere in it.

use std::fmt;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

const HOW_TO: &[&str] = &[
    r"how (do|can|to|would|should) (i|we|you)",
    r"what (is|are) the (step|steps|way|ways|method|methods|process|approach)",
    r"guide (for|to)",
    r"tutorial (for|on)",
    r"(steps|instructions) (for|to)",
];

const COMPARISON: &[&str] = &[
    r"(compare|comparison|versus|vs|difference|different|better)",
    r"(which|what) (is|are) (better|worse|faster|easier|more|less)",
];

const IMPLEMENTATION: &[&str] = &[
    r"(advanced|complex) (implementation|setup|configuration)",
    r"enterprise (setup|implementation)",
    r"(multi|multiple) (environment|tenant)",
    r"(custom|advanced) (tracking|integration)",
];

const TROUBLESHOOTING: &[&str] = &[
    r"(troubleshoot|debug|fix|issue|problem|error)",
    r"not (working|functioning|sending data)",
    r"data (quality|validation|inconsistency)",
];

const BEST_PRACTICES: &[&str] = &[
    r"best (practice|approach|way)",
    r"(optimal|optimized|efficient) (setup|configuration)",
    r"(recommendation|guideline)",
    r"(secure|security)",
];

const MIGRATION: &[&str] = &[
    r"(migrate|migration|transfer|move) (from|to|between)",
    r"switch(ing)? (from|to|between)",
    r"transition(ing)? (from|to|between)",
];

/// Advanced sub-intent of a how-to question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvancedKind {
    Implementation,
    Troubleshooting,
    BestPractices,
    Migration,
}

impl AdvancedKind {
    /// Priority order; the first kind with a matching pattern wins.
    pub const PRIORITY: [AdvancedKind; 4] = [
        AdvancedKind::Implementation,
        AdvancedKind::Troubleshooting,
        AdvancedKind::BestPractices,
        AdvancedKind::Migration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdvancedKind::Implementation => "implementation",
            AdvancedKind::Troubleshooting => "troubleshooting",
            AdvancedKind::BestPractices => "best-practices",
            AdvancedKind::Migration => "migration",
        }
    }
}

impl fmt::Display for AdvancedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named group of compiled patterns.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    name: String,
    patterns: Vec<Regex>,
}

impl PatternGroup {
    /// Compile a group. An invalid pattern is a configuration error.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, patterns: &[S]) -> Result<Self> {
        let name = name.into();
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    RetrievalError::Config(format!(
                        "invalid pattern {:?} in group '{name}': {e}",
                        p.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { name, patterns })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if any pattern matches anywhere in `lowered`.
    pub fn matches(&self, lowered: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(lowered))
    }
}

/// All pattern groups used for routing.
#[derive(Debug, Clone)]
pub struct PatternSet {
    how_to: PatternGroup,
    comparison: PatternGroup,
    advanced: Vec<(AdvancedKind, PatternGroup)>,
}

impl PatternSet {
    /// Assemble a set from already compiled groups.
    ///
    /// `advanced` is consulted in the order given.
    pub fn new(
        how_to: PatternGroup,
        comparison: PatternGroup,
        advanced: Vec<(AdvancedKind, PatternGroup)>,
    ) -> Self {
        Self {
            how_to,
            comparison,
            advanced,
        }
    }

    /// The reference pattern groups.
    pub fn reference() -> Result<Self> {
        let advanced = AdvancedKind::PRIORITY
            .into_iter()
            .map(|kind| {
                let patterns = match kind {
                    AdvancedKind::Implementation => IMPLEMENTATION,
                    AdvancedKind::Troubleshooting => TROUBLESHOOTING,
                    AdvancedKind::BestPractices => BEST_PRACTICES,
                    AdvancedKind::Migration => MIGRATION,
                };
                PatternGroup::new(kind.as_str(), patterns).map(|group| (kind, group))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            PatternGroup::new("how-to", HOW_TO)?,
            PatternGroup::new("comparison", COMPARISON)?,
            advanced,
        ))
    }

    pub fn is_how_to(&self, lowered: &str) -> bool {
        self.how_to.matches(lowered)
    }

    pub fn has_comparison_cue(&self, lowered: &str) -> bool {
        self.comparison.matches(lowered)
    }

    /// First advanced kind, in priority order, with any matching pattern.
    pub fn advanced_kind(&self, lowered: &str) -> Option<AdvancedKind> {
        self.advanced
            .iter()
            .find(|(_, group)| group.matches(lowered))
            .map(|(kind, _)| *kind)
    }
}
