//! Operating-system platform classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::predicate::{Condition, Predicates};
use crate::rule::{first_match, Axis, Rule};

/// Low bit shared by every Windows variant.
pub const WINDOWS_BIT: u16 = 0b00_0000_0001;

/// High bits selecting the Windows word-size subtype.
pub const WINDOWS_SUBTYPE_MASK: u16 = 0b11_0000_0000;

/// Word-size variant of a Windows platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowsSubtype {
    Bits16,
    Bits32,
    Bits64,
}

impl WindowsSubtype {
    pub const fn bits(self) -> u32 {
        match self {
            WindowsSubtype::Bits16 => 16,
            WindowsSubtype::Bits32 => 32,
            WindowsSubtype::Bits64 => 64,
        }
    }
}

/// The targeted operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub enum PlatformType {
    Unknown = 0,
    Win16 = 0b01_0000_0001,
    Win32 = 0b10_0000_0001,
    Win64 = 0b11_0000_0001,
    Linux = 0b00_0000_0010,
    Android = 0b00_0000_0100,
    MacOs = 0b00_0000_1000,
    Ios = 0b00_0001_0000,
    Haiku = 0b00_0010_0000,
    Solaris = 0b00_0100_0000,
    SunOs = 0b00_1000_0000,
}

impl PlatformType {
    pub const ALL: [PlatformType; 11] = [
        PlatformType::Unknown,
        PlatformType::Win16,
        PlatformType::Win32,
        PlatformType::Win64,
        PlatformType::Linux,
        PlatformType::Android,
        PlatformType::MacOs,
        PlatformType::Ios,
        PlatformType::Haiku,
        PlatformType::Solaris,
        PlatformType::SunOs,
    ];

    pub const fn bits(self) -> u16 {
        self as u16
    }

    pub const fn is_windows(self) -> bool {
        self.bits() & WINDOWS_BIT != 0
    }

    pub const fn is_apple(self) -> bool {
        matches!(self, PlatformType::MacOs | PlatformType::Ios)
    }

    /// The Windows word-size variant; `None` off Windows.
    pub const fn windows_subtype(self) -> Option<WindowsSubtype> {
        if !self.is_windows() {
            return None;
        }
        match (self.bits() & WINDOWS_SUBTYPE_MASK) >> 8 {
            0b01 => Some(WindowsSubtype::Bits16),
            0b10 => Some(WindowsSubtype::Bits32),
            0b11 => Some(WindowsSubtype::Bits64),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PlatformType::Unknown => "UNKNOWN",
            PlatformType::Win16 => "WIN_16",
            PlatformType::Win32 => "WIN_32",
            PlatformType::Win64 => "WIN_64",
            PlatformType::Linux => "LINUX",
            PlatformType::Android => "ANDROID",
            PlatformType::MacOs => "MACOS",
            PlatformType::Ios => "IOS",
            PlatformType::Haiku => "HAIKU",
            PlatformType::Solaris => "SOLARIS",
            PlatformType::SunOs => "SUNOS",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const WINDOWS: Condition = Condition::Any(&[
    Condition::Defined("_WIN32"),
    Condition::Defined("__WIN32__"),
    Condition::Defined("__WINDOWS__"),
]);
const APPLE: Condition = Condition::Defined("__APPLE__");
const SUN: Condition = Condition::Any(&[Condition::Defined("sun"), Condition::Defined("__sun")]);

/// Platform rules, most specific first.
///
/// Android also defines `__linux__` and must be tested before it.
pub static RULES: &[Rule<PlatformType>] = &[
    Rule::new(
        Condition::All(&[
            WINDOWS,
            Condition::Any(&[Condition::Defined("_WIN16"), Condition::Defined("__WINDOWS__")]),
        ]),
        PlatformType::Win16,
    ),
    Rule::new(
        Condition::All(&[WINDOWS, Condition::Defined("_WIN64")]),
        PlatformType::Win64,
    ),
    Rule::new(WINDOWS, PlatformType::Win32),
    Rule::new(
        Condition::All(&[APPLE, Condition::Defined("__MACH__")]),
        PlatformType::MacOs,
    ),
    Rule::new(APPLE, PlatformType::Ios),
    Rule::new(Condition::Defined("__HAIKU__"), PlatformType::Haiku),
    Rule::new(Condition::Defined("__ANDROID__"), PlatformType::Android),
    Rule::new(Condition::Defined("__linux__"), PlatformType::Linux),
    Rule::new(
        Condition::All(&[
            SUN,
            Condition::Any(&[Condition::Defined("__SVR4"), Condition::Defined("__svr4__")]),
        ]),
        PlatformType::Solaris,
    ),
    Rule::new(SUN, PlatformType::SunOs),
];

/// Classify the platform.
pub fn resolve(predicates: &Predicates, strict: bool) -> Result<PlatformType, ResolveError> {
    match first_match(RULES, predicates) {
        Some(platform) => {
            tracing::debug!(%platform, "resolved platform");
            Ok(platform)
        }
        None if strict => Err(ResolveError::Unsupported {
            axis: Axis::Platform,
        }),
        None => {
            tracing::warn!("no platform rule matched; using UNKNOWN");
            Ok(PlatformType::Unknown)
        }
    }
}
