//! Compiler identity and family encoding.
//!
//! Compiler tags are 10-bit patterns. The two high bits name the family
//! (`01` GNU, `10` LLVM) and the low bits tell members apart, so a family
//! query is a mask rather than a lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::predicate::{Condition, Predicates};
use crate::rule::{first_match, Axis, Rule};

/// Mask selecting the family bits of a [`CompilerType`].
pub const SUPERTYPE_MASK: u16 = 0b11_0000_0000;

/// Number of significant bits in a compiler tag.
pub const COMPILER_BIT_COUNT: u32 = 10;

/// Coarse compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub enum CompilerSuperType {
    None = 0,
    Gnu = 0b01_0000_0000,
    Llvm = 0b10_0000_0000,
}

impl CompilerSuperType {
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Map masked family bits back to a family.
    ///
    /// Returns `None` for the unassigned `0b11` pattern or for bits outside
    /// the mask.
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(CompilerSuperType::None),
            0b01_0000_0000 => Some(CompilerSuperType::Gnu),
            0b10_0000_0000 => Some(CompilerSuperType::Llvm),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CompilerSuperType::None => "NONE",
            CompilerSuperType::Gnu => "GNU",
            CompilerSuperType::Llvm => "LLVM",
        }
    }
}

impl fmt::Display for CompilerSuperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A specific compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub enum CompilerType {
    Unknown = 0,
    Gcc = 0b01_0000_0001,
    Clang = 0b10_0000_0010,
    Msvc = 0b00_0000_0100,
    Icc = 0b00_0000_1000,
    Icx = 0b10_0001_0010,
    Mingw = 0b01_0010_0001,
    Nvcpp = 0b00_0100_0000,
    /// LLVM-based; carries its own member bit on top of the LLVM family.
    Ellcc = 0b10_1000_0000,
}

impl CompilerType {
    pub const ALL: [CompilerType; 9] = [
        CompilerType::Unknown,
        CompilerType::Gcc,
        CompilerType::Clang,
        CompilerType::Msvc,
        CompilerType::Icc,
        CompilerType::Icx,
        CompilerType::Mingw,
        CompilerType::Nvcpp,
        CompilerType::Ellcc,
    ];

    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// The family, derived by masking the tag.
    pub const fn supertype(self) -> CompilerSuperType {
        match CompilerSuperType::from_bits(self.bits() & SUPERTYPE_MASK) {
            Some(supertype) => supertype,
            None => CompilerSuperType::None,
        }
    }

    pub const fn is_gnu(self) -> bool {
        matches!(self.supertype(), CompilerSuperType::Gnu)
    }

    pub const fn is_llvm(self) -> bool {
        matches!(self.supertype(), CompilerSuperType::Llvm)
    }

    pub const fn name(self) -> &'static str {
        match self {
            CompilerType::Unknown => "UNKNOWN",
            CompilerType::Gcc => "GCC",
            CompilerType::Clang => "CLANG",
            CompilerType::Msvc => "MSVC",
            CompilerType::Icc => "ICC",
            CompilerType::Icx => "ICX",
            CompilerType::Mingw => "MINGW",
            CompilerType::Nvcpp => "NVCPP",
            CompilerType::Ellcc => "ELLCC",
        }
    }
}

impl fmt::Display for CompilerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// No tag may carry both family bits.
const _: () = {
    let mut i = 0;
    while i < CompilerType::ALL.len() {
        let family = CompilerType::ALL[i].bits() & SUPERTYPE_MASK;
        assert!(CompilerSuperType::from_bits(family).is_some());
        assert!(CompilerType::ALL[i].bits() >> COMPILER_BIT_COUNT == 0);
        i += 1;
    }
};

const CLANG: Condition = Condition::Defined("__clang__");
const GNUC: Condition = Condition::Defined("__GNUC__");

/// Compiler rules, most specific first.
///
/// Clang and ICC also define `__GNUC__`, so both are tested before GCC;
/// clang-cl defines `_MSC_VER`, so MSVC comes last.
pub static RULES: &[Rule<CompilerType>] = &[
    Rule::new(
        Condition::All(&[CLANG, Condition::Defined("__ELLCC__")]),
        CompilerType::Ellcc,
    ),
    Rule::new(
        Condition::All(&[CLANG, Condition::Defined("__INTEL_LLVM_COMPILER")]),
        CompilerType::Icx,
    ),
    Rule::new(CLANG, CompilerType::Clang),
    Rule::new(Condition::Defined("__INTEL_COMPILER"), CompilerType::Icc),
    Rule::new(
        Condition::All(&[GNUC, Condition::Defined("__MINGW32__")]),
        CompilerType::Mingw,
    ),
    Rule::new(
        Condition::All(&[GNUC, Condition::Defined("__NVCOMPILER")]),
        CompilerType::Nvcpp,
    ),
    Rule::new(GNUC, CompilerType::Gcc),
    Rule::new(
        Condition::Any(&[Condition::Defined("_MSC_VER"), Condition::Defined("_MSVC_LANG")]),
        CompilerType::Msvc,
    ),
];

/// Classify the compiler.
pub fn resolve(predicates: &Predicates, strict: bool) -> Result<CompilerType, ResolveError> {
    match first_match(RULES, predicates) {
        Some(compiler) => {
            tracing::debug!(%compiler, supertype = %compiler.supertype(), "resolved compiler");
            Ok(compiler)
        }
        None if strict => Err(ResolveError::Unsupported {
            axis: Axis::Compiler,
        }),
        None => {
            tracing::warn!("no compiler rule matched; using UNKNOWN");
            Ok(CompilerType::Unknown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(names: &[&str]) -> CompilerType {
        let p: Predicates = names.iter().copied().collect();
        resolve(&p, true).unwrap()
    }

    #[test]
    fn supertype_masking() {
        for compiler in [CompilerType::Gcc, CompilerType::Mingw] {
            assert_eq!(compiler.supertype(), CompilerSuperType::Gnu);
        }
        for compiler in [CompilerType::Clang, CompilerType::Icx, CompilerType::Ellcc] {
            assert_eq!(compiler.supertype(), CompilerSuperType::Llvm);
        }
        for compiler in [
            CompilerType::Msvc,
            CompilerType::Icc,
            CompilerType::Nvcpp,
            CompilerType::Unknown,
        ] {
            assert_eq!(compiler.supertype(), CompilerSuperType::None);
        }
    }

    #[test]
    fn masking_agrees_with_raw_bits() {
        for compiler in CompilerType::ALL {
            let masked = compiler.bits() & SUPERTYPE_MASK;
            assert_eq!(compiler.supertype().bits(), masked);
        }
        assert_eq!(CompilerSuperType::from_bits(SUPERTYPE_MASK), None);
    }

    #[test]
    fn tags_are_distinct() {
        for (i, a) in CompilerType::ALL.iter().enumerate() {
            for b in &CompilerType::ALL[i + 1..] {
                assert_ne!(a.bits(), b.bits(), "{a} and {b} share a tag");
            }
        }
    }

    #[test]
    fn specific_llvm_front_ends_win() {
        assert_eq!(classify(&["__clang__", "__GNUC__"]), CompilerType::Clang);
        assert_eq!(
            classify(&["__clang__", "__GNUC__", "__INTEL_LLVM_COMPILER"]),
            CompilerType::Icx
        );
        assert_eq!(classify(&["__clang__", "__ELLCC__"]), CompilerType::Ellcc);
        // clang-cl
        assert_eq!(classify(&["__clang__", "_MSC_VER"]), CompilerType::Clang);
    }

    #[test]
    fn gnu_family() {
        assert_eq!(classify(&["__GNUC__"]), CompilerType::Gcc);
        assert_eq!(classify(&["__GNUC__", "__MINGW32__"]), CompilerType::Mingw);
        assert_eq!(classify(&["__GNUC__", "__NVCOMPILER"]), CompilerType::Nvcpp);
        assert_eq!(
            classify(&["__GNUC__", "__INTEL_COMPILER"]),
            CompilerType::Icc
        );
    }

    #[test]
    fn msvc() {
        assert_eq!(classify(&["_MSC_VER"]), CompilerType::Msvc);
        assert_eq!(classify(&["_MSVC_LANG"]), CompilerType::Msvc);
    }

    #[test]
    fn unmatched_compiler() {
        let p = Predicates::new().with("__TINYC__");
        assert_eq!(
            resolve(&p, true),
            Err(ResolveError::Unsupported {
                axis: Axis::Compiler
            })
        );
        let unknown = resolve(&p, false).unwrap();
        assert_eq!(unknown, CompilerType::Unknown);
        assert_eq!(unknown.supertype(), CompilerSuperType::None);
        assert_eq!(unknown.bits(), 0);
    }
}
