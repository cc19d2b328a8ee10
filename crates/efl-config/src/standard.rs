//! Language-standard revisions and bucketing of reported version values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::predicate::{Condition, Predicates};

/// A C++ standard revision, ordered by publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardType {
    /// C++97/98; also the bucket for anything older.
    Cpp98,
    Cpp11,
    Cpp14,
    Cpp17,
    Cpp20,
    Cpp23,
}

impl StandardType {
    /// Every known standard, oldest first.
    pub const ALL: [StandardType; 6] = [
        StandardType::Cpp98,
        StandardType::Cpp11,
        StandardType::Cpp14,
        StandardType::Cpp17,
        StandardType::Cpp20,
        StandardType::Cpp23,
    ];

    pub const OLDEST: StandardType = StandardType::Cpp98;
    pub const NEWEST: StandardType = StandardType::Cpp23;

    /// The lowest reported version value belonging to this standard.
    pub const fn floor(self) -> u32 {
        match self {
            StandardType::Cpp98 => 199_711,
            StandardType::Cpp11 => 201_103,
            StandardType::Cpp14 => 201_402,
            StandardType::Cpp17 => 201_703,
            StandardType::Cpp20 => 202_002,
            StandardType::Cpp23 => 202_302,
        }
    }

    /// Position in revision order, starting at 0.
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// The revision following this one, if known.
    pub const fn next(self) -> Option<StandardType> {
        match self {
            StandardType::Cpp98 => Some(StandardType::Cpp11),
            StandardType::Cpp11 => Some(StandardType::Cpp14),
            StandardType::Cpp14 => Some(StandardType::Cpp17),
            StandardType::Cpp17 => Some(StandardType::Cpp20),
            StandardType::Cpp20 => Some(StandardType::Cpp23),
            StandardType::Cpp23 => None,
        }
    }

    /// Two-digit year, as in `C++XX`.
    pub const fn year(self) -> u32 {
        match self {
            StandardType::Cpp98 => 97,
            StandardType::Cpp11 => 11,
            StandardType::Cpp14 => 14,
            StandardType::Cpp17 => 17,
            StandardType::Cpp20 => 20,
            StandardType::Cpp23 => 23,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StandardType::Cpp98 => "C++98",
            StandardType::Cpp11 => "C++11",
            StandardType::Cpp14 => "C++14",
            StandardType::Cpp17 => "C++17",
            StandardType::Cpp20 => "C++20",
            StandardType::Cpp23 => "C++23",
        }
    }

    /// Look a standard up by its two-digit year. 97 and 98 are the same revision.
    pub const fn from_year(year: u32) -> Option<StandardType> {
        match year {
            97 | 98 => Some(StandardType::Cpp98),
            11 => Some(StandardType::Cpp11),
            14 => Some(StandardType::Cpp14),
            17 => Some(StandardType::Cpp17),
            20 => Some(StandardType::Cpp20),
            23 => Some(StandardType::Cpp23),
            _ => None,
        }
    }

    /// Bucket a reported version value into `[floor_N, floor_N+1)`.
    ///
    /// The scan runs newest to oldest, so a value past every known floor
    /// lands on the newest standard and a value below every floor lands on
    /// the oldest.
    pub const fn from_version(version: u32) -> StandardType {
        let mut i = Self::ALL.len();
        while i > 0 {
            i -= 1;
            if version >= Self::ALL[i].floor() {
                return Self::ALL[i];
            }
        }
        Self::OLDEST
    }
}

impl fmt::Display for StandardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The language-version value reported by the toolchain (`__cplusplus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageVersion(u32);

impl LanguageVersion {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// The standard this value buckets into.
    pub const fn standard(self) -> StandardType {
        StandardType::from_version(self.0)
    }

    /// At least `standard`.
    pub const fn at_least(self, standard: StandardType) -> bool {
        self.0 >= standard.floor()
    }

    /// No newer than `standard`: below the floor of the revision after it.
    ///
    /// Always true for the newest known standard.
    pub const fn at_most(self, standard: StandardType) -> bool {
        match standard.next() {
            Some(next) => self.0 < next.floor(),
            None => true,
        }
    }

    /// Exactly within `standard`'s range.
    pub const fn is_exactly(self, standard: StandardType) -> bool {
        self.at_least(standard) && self.at_most(standard)
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}L", self.0)
    }
}

/// Toolchains that report the active standard through `_MSVC_LANG`.
pub(crate) const MSVC_LIKE: Condition =
    Condition::Any(&[Condition::Defined("_MSC_VER"), Condition::Defined("_MSVC_LANG")]);

/// Read the reported language version.
///
/// MSVC-like toolchains report through `_MSVC_LANG` (their `__cplusplus` is
/// pinned unless `/Zc:__cplusplus` is given); everything else through
/// `__cplusplus`. A missing or zero value means the input is not C++.
pub fn resolve(predicates: &Predicates) -> Result<LanguageVersion, ResolveError> {
    let reported = if MSVC_LIKE.eval(predicates) {
        predicates
            .value("_MSVC_LANG")
            .or_else(|| predicates.value("__cplusplus"))
    } else {
        predicates.value("__cplusplus")
    };
    let value = reported
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(ResolveError::NotCpp)?;
    let version = LanguageVersion::new(value);
    tracing::debug!(value, standard = %version.standard(), "resolved language standard");
    Ok(version)
}
