//! Keyword heuristic that maps a task description to a strategy id.
//!
//! Rules are evaluated in order against the lower-cased description and
//! the first rule with a matching term wins. A rule whose preferred
//! strategy is not registered falls back to `direct`.

use serde::Serialize;

use crate::strategy::{DIRECT, DIVIDE_AND_CONQUER, EXAMPLE_BASED, ITERATIVE_REFINEMENT, TEST_DRIVEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionRule {
    pub name: &'static str,
    pub terms: &'static [&'static str],
    pub preferred: &'static str
}

impl SelectionRule {
    pub fn matches(&self, lowered_task: &str) -> bool {
        self.terms.iter().any(|term| lowered_task.contains(term))
    }
}

pub const DEFAULT_RULES: &[SelectionRule] = &[
    SelectionRule {
        name: "complexity",
        terms: &["complex", "system", "architecture"],
        preferred: DIVIDE_AND_CONQUER
    },
    SelectionRule {
        name: "testing",
        terms: &["test", "assert", "verify"],
        preferred: TEST_DRIVEN
    },
    SelectionRule {
        name: "example",
        terms: &["example", "similar to", "like this"],
        preferred: EXAMPLE_BASED
    },
    SelectionRule {
        name: "optimization",
        terms: &["optimize", "improve", "performance"],
        preferred: ITERATIVE_REFINEMENT
    },
];

/// Why a strategy was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTrace {
    /// Name of the rule that fired; `None` means the default path.
    pub rule: Option<&'static str>,
    /// The strategy that rule asked for.
    pub preferred: &'static str,
    /// The strategy actually chosen.
    pub selected: String,
    /// True when `preferred` was not registered and `direct` was used.
    pub fell_back: bool
}

/// Pure selection over `rules`; `is_registered` reports registry contents.
pub fn trace_selection(
    rules: &[SelectionRule],
    task: &str,
    is_registered: impl Fn(&str) -> bool
) -> SelectionTrace {
    let lowered = task.to_lowercase();
    let rule = rules.iter().find(|rule| rule.matches(&lowered));
    let preferred = rule.map_or(DIRECT, |rule| rule.preferred);

    let (selected, fell_back) = if is_registered(preferred) {
        (preferred, false)
    } else {
        (DIRECT, preferred != DIRECT)
    };

    SelectionTrace {
        rule: rule.map(|rule| rule.name),
        preferred,
        selected: selected.to_string(),
        fell_back
    }
}
