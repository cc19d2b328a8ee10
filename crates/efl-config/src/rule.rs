//! Ordered classification rules.
//!
//! Each axis is a table of `(condition, result)` pairs evaluated top to
//! bottom. The first condition that holds selects the result, so a table
//! lists its more specific rules before the general ones they refine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::predicate::{Condition, Predicates};

/// One independent classification dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    Compiler,
    Platform,
    Architecture,
    Standard,
}

impl Axis {
    /// Lower-case axis name.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::Compiler => "compiler",
            Axis::Platform => "platform",
            Axis::Architecture => "architecture",
            Axis::Standard => "standard",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single `(condition, result)` entry of a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule<T> {
    /// When this rule applies.
    pub when: Condition,
    /// What it selects.
    pub then: T,
}

impl<T> Rule<T> {
    /// Construct a rule.
    pub const fn new(when: Condition, then: T) -> Self {
        Self { when, then }
    }
}

/// Select the result of the first rule whose condition holds.
pub fn first_match<T: Copy>(rules: &[Rule<T>], predicates: &Predicates) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.when.eval(predicates))
        .map(|rule| rule.then)
}

/// Every rule whose condition holds, in table order.
///
/// The first element, if any, is what [`first_match`] selects.
pub fn matching<'a, T>(rules: &'a [Rule<T>], predicates: &Predicates) -> Vec<&'a Rule<T>> {
    rules
        .iter()
        .filter(|rule| rule.when.eval(predicates))
        .collect()
}
