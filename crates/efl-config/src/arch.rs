//! CPU architecture classification and register-width capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::predicate::{Condition, Predicates};
use crate::rule::{first_match, Axis, Rule};

/// Register widths an architecture can operate at.
///
/// A flag set rather than a single width: ARM Thumb and M68k run both
/// 16- and 32-bit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterWidths(u8);

impl RegisterWidths {
    pub const NONE: RegisterWidths = RegisterWidths(0);
    pub const REG8: RegisterWidths = RegisterWidths(0b0001);
    pub const REG16: RegisterWidths = RegisterWidths(0b0010);
    pub const REG32: RegisterWidths = RegisterWidths(0b0100);
    pub const REG64: RegisterWidths = RegisterWidths(0b1000);

    const WIDTHS: [(RegisterWidths, u32); 4] = [
        (RegisterWidths::REG64, 64),
        (RegisterWidths::REG32, 32),
        (RegisterWidths::REG16, 16),
        (RegisterWidths::REG8, 8),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: RegisterWidths) -> RegisterWidths {
        RegisterWidths(self.0 | other.0)
    }

    pub const fn contains(self, other: RegisterWidths) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Widest register in bits; `None` when no width is set.
    pub const fn max_bits(self) -> Option<u32> {
        let mut i = 0;
        while i < Self::WIDTHS.len() {
            let (flag, bits) = Self::WIDTHS[i];
            if self.0 & flag.0 != 0 {
                return Some(bits);
            }
            i += 1;
        }
        None
    }
}

impl fmt::Display for RegisterWidths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, bits) in Self::WIDTHS.iter().rev() {
            if self.contains(*flag) {
                if !first {
                    f.write_str("|")?;
                }
                write!(f, "{bits}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The targeted CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchType {
    Unknown,
    Arm64,
    Arm,
    ArmThumb,
    Amd32,
    Amd64,
    X86_16,
    X86_32,
    Itanium,
    M68k,
    Mips32,
    Mips64,
}

impl ArchType {
    pub const ALL: [ArchType; 12] = [
        ArchType::Unknown,
        ArchType::Arm64,
        ArchType::Arm,
        ArchType::ArmThumb,
        ArchType::Amd32,
        ArchType::Amd64,
        ArchType::X86_16,
        ArchType::X86_32,
        ArchType::Itanium,
        ArchType::M68k,
        ArchType::Mips32,
        ArchType::Mips64,
    ];

    /// Register widths the architecture supports.
    pub const fn registers(self) -> RegisterWidths {
        match self {
            ArchType::Unknown => RegisterWidths::NONE,
            ArchType::X86_16 => RegisterWidths::REG16,
            ArchType::ArmThumb | ArchType::M68k => {
                RegisterWidths::REG16.union(RegisterWidths::REG32)
            }
            ArchType::Arm | ArchType::Amd32 | ArchType::X86_32 | ArchType::Mips32 => {
                RegisterWidths::REG32
            }
            ArchType::Arm64 | ArchType::Amd64 | ArchType::Itanium | ArchType::Mips64 => {
                RegisterWidths::REG64
            }
        }
    }

    /// Widest register in bits.
    pub const fn register_max(self) -> Option<u32> {
        self.registers().max_bits()
    }

    pub const fn name(self) -> &'static str {
        match self {
            ArchType::Unknown => "UNKNOWN",
            ArchType::Arm64 => "ARM64",
            ArchType::Arm => "ARM",
            ArchType::ArmThumb => "ARM_THUMB",
            ArchType::Amd32 => "AMD32",
            ArchType::Amd64 => "AMD64",
            ArchType::X86_16 => "x86_16",
            ArchType::X86_32 => "x86_32",
            ArchType::Itanium => "ITANIUM",
            ArchType::M68k => "M68k",
            ArchType::Mips32 => "MIPS32",
            ArchType::Mips64 => "MIPS64",
        }
    }

    /// Family name shared by related variants.
    pub const fn family(self) -> &'static str {
        match self {
            ArchType::Arm | ArchType::ArmThumb => "ARM",
            ArchType::Amd32 | ArchType::Amd64 => "AMD",
            ArchType::X86_16 | ArchType::X86_32 => "x86",
            ArchType::Mips32 | ArchType::Mips64 => "MIPS",
            other => other.name(),
        }
    }
}

impl fmt::Display for ArchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ARM: Condition = Condition::Any(&[
    Condition::Defined("__arm__"),
    Condition::Defined("__thumb__"),
    Condition::Defined("_ARM"),
    Condition::Defined("_M_ARM"),
    Condition::Defined("_M_ARMT"),
]);
const AMD: Condition = Condition::Any(&[
    Condition::Defined("__amd64__"),
    Condition::Defined("__x86_64__"),
    Condition::Defined("_M_AMD64"),
    Condition::Defined("_M_X64"),
]);
const X86: Condition = Condition::Any(&[
    Condition::Defined("i386"),
    Condition::Defined("__i386"),
    Condition::Defined("__i386__"),
    Condition::Defined("__IA32__"),
    Condition::Defined("_M_I86"),
    Condition::Defined("_M_IX86"),
    Condition::Defined("_X86_"),
    Condition::Defined("__I86__"),
]);
const MIPS: Condition = Condition::Any(&[
    Condition::Defined("mips"),
    Condition::Defined("__mips"),
    Condition::Defined("__mips__"),
]);

/// Evidence of a 64-bit MIPS ISA (level 3 or later).
const MIPS64_ISA: Condition = Condition::Any(&[
    Condition::Defined("__mips64"),
    Condition::Defined("__MIPS_ISA3__"),
    Condition::Defined("__MIPS_ISA4__"),
    Condition::ValueEquals("__mips", 3),
    Condition::ValueEquals("__mips", 4),
    Condition::ValueEquals("__mips", 64),
]);

/// Evidence of a 32-bit-only MIPS ISA, which overrides any 64-bit marker.
const MIPS32_ISA: Condition = Condition::Any(&[
    Condition::ValueBelow("__mips", 3),
    Condition::ValueEquals("__mips", 32),
]);

/// Architecture rules, most specific first.
pub static RULES: &[Rule<ArchType>] = &[
    Rule::new(
        Condition::Any(&[
            Condition::Defined("__aarch64__"),
            Condition::Defined("__aarch64"),
            Condition::Defined("_M_ARM64"),
        ]),
        ArchType::Arm64,
    ),
    Rule::new(
        Condition::All(&[
            ARM,
            Condition::Any(&[Condition::Defined("__thumb__"), Condition::Defined("_M_ARMT")]),
        ]),
        ArchType::ArmThumb,
    ),
    Rule::new(ARM, ArchType::Arm),
    Rule::new(
        Condition::All(&[
            AMD,
            Condition::Any(&[
                Condition::Defined("_LP32"),
                Condition::Defined("__LP32__"),
                Condition::Defined("__ILP32__"),
            ]),
        ]),
        ArchType::Amd32,
    ),
    Rule::new(AMD, ArchType::Amd64),
    Rule::new(
        Condition::All(&[
            X86,
            Condition::Defined("_M_I86"),
            Condition::Not(&Condition::Any(&[
                Condition::Defined("__386__"),
                Condition::Defined("_M_I386"),
            ])),
        ]),
        ArchType::X86_16,
    ),
    Rule::new(X86, ArchType::X86_32),
    Rule::new(
        Condition::Any(&[
            Condition::Defined("__ia64__"),
            Condition::Defined("_IA64"),
            Condition::Defined("__IA64__"),
            Condition::Defined("__ia64"),
            Condition::Defined("_M_IA64"),
            Condition::Defined("__itanium__"),
        ]),
        ArchType::Itanium,
    ),
    Rule::new(
        Condition::Any(&[
            Condition::Defined("__m68k__"),
            Condition::Defined("M68000"),
            Condition::Defined("__MC68K__"),
        ]),
        ArchType::M68k,
    ),
    Rule::new(
        Condition::All(&[MIPS, MIPS64_ISA, Condition::Not(&MIPS32_ISA)]),
        ArchType::Mips64,
    ),
    Rule::new(MIPS, ArchType::Mips32),
];

/// Classify the architecture.
pub fn resolve(predicates: &Predicates, strict: bool) -> Result<ArchType, ResolveError> {
    match first_match(RULES, predicates) {
        Some(arch) => {
            tracing::debug!(%arch, registers = %arch.registers(), "resolved architecture");
            Ok(arch)
        }
        None if strict => Err(ResolveError::Unsupported {
            axis: Axis::Architecture,
        }),
        None => {
            tracing::warn!("no architecture rule matched; using UNKNOWN");
            Ok(ArchType::Unknown)
        }
    }
}
