//! Environment predicates and the conditions evaluated over them.
//!
//! A predicate is a macro the toolchain defines, optionally with replacement
//! text. Resolvers only ever ask whether a name is defined or compare its
//! integer value; they never validate what the toolchain reports.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The set of macros reported by a toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicates {
    defines: BTreeMap<String, Option<String>>,
}

impl Predicates {
    /// An empty predicate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the output of `cc -dM -E`.
    ///
    /// Only object-like `#define` lines are kept; function-like macros and
    /// anything else are skipped.
    pub fn parse_defines(text: &str) -> Self {
        let mut predicates = Self::new();
        for line in text.lines() {
            let Some(rest) = line.trim_start().strip_prefix('#') else {
                continue;
            };
            let Some(rest) = rest.trim_start().strip_prefix("define") else {
                continue;
            };
            if !rest.starts_with(&[' ', '\t'][..]) {
                continue;
            }
            let rest = rest.trim_start();
            let name_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if name_len == 0 || rest[name_len..].starts_with('(') {
                continue;
            }
            let (name, value) = rest.split_at(name_len);
            let value = value.trim();
            if value.is_empty() {
                predicates.define(name);
            } else {
                predicates.define_text(name, value);
            }
        }
        predicates
    }

    /// Define `name` with no replacement text.
    pub fn define(&mut self, name: impl Into<String>) -> &mut Self {
        self.defines.insert(name.into(), None);
        self
    }

    /// Define `name` as an integer value.
    pub fn define_value(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.defines.insert(name.into(), Some(value.to_string()));
        self
    }

    /// Define `name` with raw replacement text.
    pub fn define_text(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.defines.insert(name.into(), Some(text.into()));
        self
    }

    /// Remove a definition.
    pub fn undefine(&mut self, name: &str) -> &mut Self {
        self.defines.remove(name);
        self
    }

    /// Builder-style [`define`](Self::define).
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.define(name);
        self
    }

    /// Builder-style [`define_value`](Self::define_value).
    pub fn with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.define_value(name, value);
        self
    }

    /// Whether `name` is defined at all.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// Raw replacement text of `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.defines.get(name)?.as_deref()
    }

    /// Integer value of `name`, if it is defined as an integer literal.
    pub fn value(&self, name: &str) -> Option<i64> {
        parse_integer(self.text(name)?)
    }

    /// Add every definition from `other`, replacing existing entries.
    pub fn merge(&mut self, other: &Predicates) {
        for (name, value) in &other.defines {
            self.defines.insert(name.clone(), value.clone());
        }
    }

    /// Number of defined macros.
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Whether no macros are defined.
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Iterate over `(name, text)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.defines.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<S: Into<String>> FromIterator<S> for Predicates {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut predicates = Self::new();
        for name in iter {
            predicates.define(name);
        }
        predicates
    }
}

/// Parse a C integer literal, tolerating `u`/`l` suffixes and parentheses.
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = digits.trim_end_matches(&['u', 'U', 'l', 'L'][..]);
    let parsed = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -parsed } else { parsed })
}

/// A boolean expression over [`Predicates`], built from static data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Always holds.
    Always,
    /// The macro is defined.
    Defined(&'static str),
    /// The macro's integer value is strictly below the bound.
    ValueBelow(&'static str, i64),
    /// The macro's integer value is at least the bound.
    ValueAtLeast(&'static str, i64),
    /// The macro's integer value equals the operand.
    ValueEquals(&'static str, i64),
    /// At least one sub-condition holds.
    Any(&'static [Condition]),
    /// Every sub-condition holds.
    All(&'static [Condition]),
    /// The sub-condition does not hold.
    Not(&'static Condition),
}

impl Condition {
    /// Evaluate against a predicate set.
    ///
    /// Value comparisons on undefined or non-integer macros are false.
    pub fn eval(&self, predicates: &Predicates) -> bool {
        match *self {
            Condition::Always => true,
            Condition::Defined(name) => predicates.is_defined(name),
            Condition::ValueBelow(name, bound) => {
                predicates.value(name).is_some_and(|v| v < bound)
            }
            Condition::ValueAtLeast(name, bound) => {
                predicates.value(name).is_some_and(|v| v >= bound)
            }
            Condition::ValueEquals(name, operand) => predicates.value(name) == Some(operand),
            Condition::Any(conditions) => conditions.iter().any(|c| c.eval(predicates)),
            Condition::All(conditions) => conditions.iter().all(|c| c.eval(predicates)),
            Condition::Not(condition) => !condition.eval(predicates),
        }
    }

    /// Every macro name the condition reads.
    pub fn names(&self, out: &mut BTreeSet<&'static str>) {
        match *self {
            Condition::Always => {}
            Condition::Defined(name)
            | Condition::ValueBelow(name, _)
            | Condition::ValueAtLeast(name, _)
            | Condition::ValueEquals(name, _) => {
                out.insert(name);
            }
            Condition::Any(conditions) | Condition::All(conditions) => {
                for condition in conditions {
                    condition.names(out);
                }
            }
            Condition::Not(condition) => condition.names(out),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Condition::Any(c) | Condition::All(c) if c.len() > 1)
    }

    fn is_comparison(&self) -> bool {
        matches!(
            self,
            Condition::ValueBelow(..) | Condition::ValueAtLeast(..) | Condition::ValueEquals(..)
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Condition::Always => f.write_str("1"),
            Condition::Defined(name) => write!(f, "defined({name})"),
            Condition::ValueBelow(name, bound) => write!(f, "{name} < {bound}"),
            Condition::ValueAtLeast(name, bound) => write!(f, "{name} >= {bound}"),
            Condition::ValueEquals(name, operand) => write!(f, "{name} == {operand}"),
            Condition::Any(conditions) => write_joined(f, conditions, " || "),
            Condition::All(conditions) => write_joined(f, conditions, " && "),
            Condition::Not(condition) if condition.is_compound() || condition.is_comparison() => {
                write!(f, "!({condition})")
            }
            Condition::Not(condition) => write!(f, "!{condition}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    if conditions.is_empty() {
        return f.write_str(if sep.contains('&') { "1" } else { "0" });
    }
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if condition.is_compound() {
            write!(f, "({condition})")?;
        } else {
            write!(f, "{condition}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
#define __GNUC__ 13
#define __cplusplus 201703L
#define __SIZEOF_POINTER__ 8
#define __x86_64__ 1
#define __linux__ 1
#define __CHAR_BIT__ 8
#define __INT_MAX__ 0x7fffffff
#define __has_include(STR) __has_include__(STR)
#define __STDC_HOSTED__
# define __ELF__ 1
// not a define
";

    #[test]
    fn parses_compiler_dump() {
        let p = Predicates::parse_defines(DUMP);
        assert!(p.is_defined("__GNUC__"));
        assert!(p.is_defined("__STDC_HOSTED__"));
        assert!(p.is_defined("__ELF__"));
        assert!(!p.is_defined("__has_include"));
        assert_eq!(p.value("__cplusplus"), Some(201_703));
        assert_eq!(p.value("__INT_MAX__"), Some(0x7fff_ffff));
        assert_eq!(p.value("__STDC_HOSTED__"), None);
        assert_eq!(p.len(), 9);
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_integer("199711L"), Some(199_711));
        assert_eq!(parse_integer("(64)"), Some(64));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("-1"), Some(-1));
        assert_eq!(parse_integer("42ULL"), Some(42));
        assert_eq!(parse_integer("__GNUC__"), None);
    }

    #[test]
    fn condition_evaluation() {
        let p = Predicates::new().with("__clang__").with_value("__mips", 2);
        assert!(Condition::Defined("__clang__").eval(&p));
        assert!(!Condition::Defined("__GNUC__").eval(&p));
        assert!(Condition::ValueBelow("__mips", 3).eval(&p));
        assert!(!Condition::ValueAtLeast("__mips", 3).eval(&p));
        assert!(Condition::ValueEquals("__mips", 2).eval(&p));
        // Value tests never hold for undefined or valueless macros.
        assert!(!Condition::ValueBelow("__clang__", 3).eval(&p));
        assert!(!Condition::ValueBelow("__missing", 3).eval(&p));

        const EITHER: Condition =
            Condition::Any(&[Condition::Defined("__GNUC__"), Condition::Defined("__clang__")]);
        const NEITHER: Condition = Condition::Not(&EITHER);
        assert!(EITHER.eval(&p));
        assert!(!NEITHER.eval(&p));
        assert!(Condition::All(&[]).eval(&p));
        assert!(!Condition::Any(&[]).eval(&p));
    }

    #[test]
    fn condition_display() {
        const RULE: Condition = Condition::All(&[
            Condition::Defined("_M_I86"),
            Condition::Not(&Condition::Any(&[
                Condition::Defined("__386__"),
                Condition::Defined("_M_I386"),
            ])),
        ]);
        assert_eq!(
            RULE.to_string(),
            "defined(_M_I86) && !(defined(__386__) || defined(_M_I386))"
        );
        assert_eq!(Condition::ValueBelow("__mips", 3).to_string(), "__mips < 3");
    }

    #[test]
    fn negated_comparison_display() {
        const NOT_BELOW: Condition = Condition::Not(&Condition::ValueBelow("__mips", 3));
        const NOT_EQUAL: Condition = Condition::Not(&Condition::ValueEquals("__mips", 32));
        assert_eq!(NOT_BELOW.to_string(), "!(__mips < 3)");
        assert_eq!(NOT_EQUAL.to_string(), "!(__mips == 32)");
        assert_eq!(
            Condition::Not(&Condition::Defined("_DEBUG")).to_string(),
            "!defined(_DEBUG)"
        );
    }

    #[test]
    fn collects_macro_names() {
        const RULE: Condition = Condition::All(&[
            Condition::Defined("__mips__"),
            Condition::Not(&Condition::Any(&[
                Condition::ValueBelow("__mips", 3),
                Condition::Always,
            ])),
        ]);
        let mut names = BTreeSet::new();
        RULE.names(&mut names);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["__mips", "__mips__"]);
    }

    #[test]
    fn merge_overrides() {
        let mut base = Predicates::new().with_value("__SIZEOF_POINTER__", 4);
        let other = Predicates::new().with_value("__SIZEOF_POINTER__", 8).with("_WIN64");
        base.merge(&other);
        assert_eq!(base.value("__SIZEOF_POINTER__"), Some(8));
        assert!(base.is_defined("_WIN64"));
        base.undefine("_WIN64");
        assert!(!base.is_defined("_WIN64"));
    }
}
