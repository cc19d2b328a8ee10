//! The assembled configuration descriptor.
//!
//! Resolution is a one-way fold: predicates are classified per axis, the
//! results are assembled into one immutable [`ConfigDescriptor`], and the
//! cross-axis register/pointer invariant is checked. Nothing is mutated
//! afterwards.

use serde::Serialize;

use crate::arch::{self, ArchType, RegisterWidths};
use crate::compiler::{self, CompilerSuperType, CompilerType};
use crate::error::ResolveError;
use crate::platform::{self, PlatformType};
use crate::predicate::{Condition, Predicates};
use crate::rule::{first_match, Axis, Rule};
use crate::settings::ResolveSettings;
use crate::standard::{self, LanguageVersion, StandardType};

/// Bits per addressable unit when the toolchain does not say.
pub const DEFAULT_BITS_PER_UNIT: u32 = 8;

/// Storage geometry of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Layout {
    /// Native pointer size in addressable units (`sizeof(void*)`).
    pub pointer_size: u32,
    /// Bits per addressable unit (`CHAR_BIT`).
    pub bits_per_unit: u32,
}

impl Layout {
    pub const fn new(pointer_size: u32, bits_per_unit: u32) -> Self {
        Self {
            pointer_size,
            bits_per_unit,
        }
    }
}

/// Immutable description of the build environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDescriptor {
    compiler: CompilerType,
    language: LanguageVersion,
    platform: PlatformType,
    arch: ArchType,
    layout: Layout,
    debug: bool,
    strict: bool,
}

impl ConfigDescriptor {
    /// Combine resolved axes and check that the widest register spans
    /// exactly one pointer.
    pub const fn assemble(
        compiler: CompilerType,
        language: LanguageVersion,
        platform: PlatformType,
        arch: ArchType,
        layout: Layout,
    ) -> Result<Self, ResolveError> {
        let register_max = match arch.register_max() {
            Some(bits) => bits,
            None => return Err(ResolveError::RegisterWidthUndetermined),
        };
        if layout.bits_per_unit == 0 {
            return Err(ResolveError::InvalidBitsPerUnit);
        }
        if register_max / layout.bits_per_unit != layout.pointer_size {
            return Err(ResolveError::RegisterWidthMismatch {
                register_max,
                bits_per_unit: layout.bits_per_unit,
                pointer_size: layout.pointer_size,
            });
        }
        Ok(Self {
            compiler,
            language,
            platform,
            arch,
            layout,
            debug: true,
            strict: false,
        })
    }

    /// [`assemble`](Self::assemble) for constant contexts.
    ///
    /// Panics on failure, which inside a `const` item stops compilation.
    pub const fn checked(
        compiler: CompilerType,
        language: LanguageVersion,
        platform: PlatformType,
        arch: ArchType,
        layout: Layout,
    ) -> Self {
        match Self::assemble(compiler, language, platform, arch, layout) {
            Ok(descriptor) => descriptor,
            Err(ResolveError::RegisterWidthUndetermined) => {
                panic!("could not determine register width")
            }
            Err(ResolveError::InvalidBitsPerUnit) => {
                panic!("bits per addressable unit must be non-zero")
            }
            Err(_) => panic!("uneven register width: widest register does not span one pointer"),
        }
    }

    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub const fn compiler(&self) -> CompilerType {
        self.compiler
    }

    pub const fn supertype(&self) -> CompilerSuperType {
        self.compiler.supertype()
    }

    pub const fn language(&self) -> LanguageVersion {
        self.language
    }

    pub const fn standard(&self) -> StandardType {
        self.language.standard()
    }

    pub const fn platform(&self) -> PlatformType {
        self.platform
    }

    pub const fn arch(&self) -> ArchType {
        self.arch
    }

    pub const fn registers(&self) -> RegisterWidths {
        self.arch.registers()
    }

    /// Widest register in bits. Assembly guarantees it exists.
    pub const fn register_max(&self) -> u32 {
        match self.arch.register_max() {
            Some(bits) => bits,
            None => 0,
        }
    }

    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Pointer size in addressable units.
    pub const fn pointer_size(&self) -> u32 {
        self.layout.pointer_size
    }

    pub const fn bits_per_unit(&self) -> u32 {
        self.layout.bits_per_unit
    }

    pub const fn pointer_bits(&self) -> u32 {
        self.layout.pointer_size * self.layout.bits_per_unit
    }

    /// Whether debug-only behavior is enabled.
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Whether unresolved axes were fatal when this was resolved.
    pub const fn strict(&self) -> bool {
        self.strict
    }

    /// Width of `T` in bits.
    pub const fn bitsizeof<T>(&self) -> usize {
        std::mem::size_of::<T>() * self.layout.bits_per_unit as usize
    }

    pub const fn compiler_name(&self) -> &'static str {
        self.compiler.name()
    }

    pub const fn platform_name(&self) -> &'static str {
        self.platform.name()
    }

    pub const fn arch_name(&self) -> &'static str {
        self.arch.name()
    }
}

/// Toolchains that default to strict conformance.
pub static STRICT_BY_DEFAULT: Condition = Condition::Any(&[
    Condition::Defined("__INTEL_COMPILER"),
    Condition::All(&[
        Condition::Defined("_MSC_VER"),
        Condition::Defined("_MSVC_TRADITIONAL"),
    ]),
]);

/// Release builds: `NDEBUG`, or MSVC without `_DEBUG`.
pub static RELEASE_BUILD: Condition = Condition::Any(&[
    Condition::Defined("NDEBUG"),
    Condition::All(&[
        Condition::Defined("_MSC_VER"),
        Condition::Not(&Condition::Defined("_DEBUG")),
    ]),
]);

/// Requests to substitute a classification axis.
pub static CUSTOM_AXES: &[Rule<Axis>] = &[
    Rule::new(Condition::Defined("COMPILER_CUSTOM"), Axis::Compiler),
    Rule::new(Condition::Defined("PLATFORM_CUSTOM"), Axis::Platform),
    Rule::new(Condition::Defined("ARCH_CUSTOM"), Axis::Architecture),
];

fn positive(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

/// Resolve every axis and assemble the descriptor.
///
/// Settings take precedence over what the toolchain reports. The result
/// depends only on the inputs, so resolving twice gives identical values.
pub fn resolve(
    predicates: &Predicates,
    settings: &ResolveSettings,
) -> Result<ConfigDescriptor, ResolveError> {
    if let Some(axis) = first_match(CUSTOM_AXES, predicates) {
        return Err(ResolveError::CustomAxis { axis });
    }
    let strict = settings
        .strict
        .unwrap_or_else(|| STRICT_BY_DEFAULT.eval(predicates));

    let compiler = compiler::resolve(predicates, strict)?;
    let language = standard::resolve(predicates)?;
    let platform = platform::resolve(predicates, strict)?;
    let arch = arch::resolve(predicates, strict)?;

    let bits_per_unit = settings
        .bits_per_unit
        .or_else(|| positive(predicates.value("__CHAR_BIT__")))
        .unwrap_or(DEFAULT_BITS_PER_UNIT);
    let pointer_size = settings
        .pointer_size
        .or_else(|| positive(predicates.value("__SIZEOF_POINTER__")))
        .ok_or(ResolveError::UnknownPointerSize)?;
    let debug = settings
        .debug
        .unwrap_or_else(|| !RELEASE_BUILD.eval(predicates));

    let descriptor = ConfigDescriptor::assemble(
        compiler,
        language,
        platform,
        arch,
        Layout::new(pointer_size, bits_per_unit),
    )?
    .with_debug(debug)
    .with_strict(strict);

    tracing::info!(
        compiler = %descriptor.compiler(),
        standard = %descriptor.standard(),
        platform = %descriptor.platform(),
        arch = %descriptor.arch(),
        register_max = descriptor.register_max(),
        "assembled configuration descriptor"
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_clang() -> Predicates {
        Predicates::new()
            .with("__clang__")
            .with_value("__GNUC__", 4)
            .with_value("__cplusplus", 202_002)
            .with("__linux__")
            .with("__x86_64__")
            .with_value("__SIZEOF_POINTER__", 8)
            .with_value("__CHAR_BIT__", 8)
    }

    #[test]
    fn assemble_checks_register_width_against_pointer() {
        let ok = ConfigDescriptor::assemble(
            CompilerType::Gcc,
            LanguageVersion::new(201_703),
            PlatformType::Linux,
            ArchType::Amd64,
            Layout::new(8, 8),
        );
        assert!(ok.is_ok());

        let mismatch = ConfigDescriptor::assemble(
            CompilerType::Gcc,
            LanguageVersion::new(201_703),
            PlatformType::Linux,
            ArchType::Amd64,
            Layout::new(4, 8),
        );
        assert_eq!(
            mismatch,
            Err(ResolveError::RegisterWidthMismatch {
                register_max: 64,
                bits_per_unit: 8,
                pointer_size: 4,
            })
        );
    }

    #[test]
    fn assemble_rejects_unknown_register_width() {
        let result = ConfigDescriptor::assemble(
            CompilerType::Unknown,
            LanguageVersion::new(201_703),
            PlatformType::Unknown,
            ArchType::Unknown,
            Layout::new(8, 8),
        );
        assert_eq!(result, Err(ResolveError::RegisterWidthUndetermined));
    }

    #[test]
    fn assemble_rejects_zero_bits_per_unit() {
        let result = ConfigDescriptor::assemble(
            CompilerType::Gcc,
            LanguageVersion::new(201_703),
            PlatformType::Linux,
            ArchType::Amd64,
            Layout::new(8, 0),
        );
        assert_eq!(result, Err(ResolveError::InvalidBitsPerUnit));
    }

    #[test]
    fn dual_width_uses_widest_register() {
        let thumb = ConfigDescriptor::assemble(
            CompilerType::Gcc,
            LanguageVersion::new(201_103),
            PlatformType::Linux,
            ArchType::ArmThumb,
            Layout::new(4, 8),
        )
        .unwrap();
        assert_eq!(thumb.register_max(), 32);
        assert_eq!(thumb.pointer_bits(), 32);
    }

    #[test]
    fn word_addressed_layout() {
        // 16-bit units: a 64-bit register spans four of them.
        let dsp = ConfigDescriptor::assemble(
            CompilerType::Unknown,
            LanguageVersion::new(201_103),
            PlatformType::Unknown,
            ArchType::Amd64,
            Layout::new(4, 16),
        )
        .unwrap();
        assert_eq!(dsp.bitsizeof::<u32>(), 64);
    }

    #[test]
    fn checked_in_const_context() {
        const CONFIG: ConfigDescriptor = ConfigDescriptor::checked(
            CompilerType::Clang,
            LanguageVersion::new(202_002),
            PlatformType::Linux,
            ArchType::Amd64,
            Layout::new(8, 8),
        )
        .with_debug(false);
        assert_eq!(CONFIG.standard(), StandardType::Cpp20);
        assert!(!CONFIG.debug());
        assert_eq!(CONFIG.bitsizeof::<u64>(), 64);
        assert_eq!(CONFIG.bitsizeof::<u8>(), 8);
    }

    #[test]
    #[should_panic(expected = "uneven register width")]
    fn checked_panics_on_mismatch() {
        ConfigDescriptor::checked(
            CompilerType::Gcc,
            LanguageVersion::new(201_703),
            PlatformType::Linux,
            ArchType::Amd64,
            Layout::new(4, 8),
        );
    }

    #[test]
    fn resolve_linux_clang() {
        let d = resolve(&linux_clang(), &ResolveSettings::default()).unwrap();
        assert_eq!(d.compiler(), CompilerType::Clang);
        assert_eq!(d.supertype(), CompilerSuperType::Llvm);
        assert_eq!(d.platform(), PlatformType::Linux);
        assert_eq!(d.arch(), ArchType::Amd64);
        assert_eq!(d.register_max(), 64);
        assert_eq!(d.standard(), StandardType::Cpp20);
        assert!(d.debug());
        assert!(!d.strict());
    }

    #[test]
    fn resolve_is_idempotent() {
        let p = linux_clang();
        let settings = ResolveSettings::default();
        assert_eq!(resolve(&p, &settings), resolve(&p, &settings));
    }

    #[test]
    fn settings_override_predicates() {
        let settings = ResolveSettings {
            debug: Some(false),
            strict: Some(true),
            ..ResolveSettings::default()
        };
        let d = resolve(&linux_clang(), &settings).unwrap();
        assert!(!d.debug());
        assert!(d.strict());

        let narrow = ResolveSettings {
            pointer_size: Some(4),
            ..ResolveSettings::default()
        };
        assert!(matches!(
            resolve(&linux_clang(), &narrow),
            Err(ResolveError::RegisterWidthMismatch { .. })
        ));
    }

    #[test]
    fn ndebug_disables_debug() {
        let d = resolve(&linux_clang().with("NDEBUG"), &ResolveSettings::default()).unwrap();
        assert!(!d.debug());
    }

    #[test]
    fn msvc_release_without_debug_macro() {
        let p = Predicates::new()
            .with_value("_MSC_VER", 1939)
            .with_value("_MSVC_LANG", 202_002)
            .with("_WIN32")
            .with("_WIN64")
            .with("_M_X64");
        let settings = ResolveSettings {
            pointer_size: Some(8),
            ..ResolveSettings::default()
        };
        assert!(!resolve(&p, &settings).unwrap().debug());
        assert!(resolve(&p.with("_DEBUG"), &settings).unwrap().debug());
    }

    #[test]
    fn intel_classic_defaults_to_strict() {
        let mut p = linux_clang().with("__INTEL_COMPILER").with("__riscv");
        p.undefine("__x86_64__");
        p.undefine("__clang__");
        assert_eq!(
            resolve(&p, &ResolveSettings::default()),
            Err(ResolveError::Unsupported {
                axis: Axis::Architecture
            })
        );
    }

    #[test]
    fn custom_axes_are_rejected() {
        let p = linux_clang().with("PLATFORM_CUSTOM");
        assert_eq!(
            resolve(&p, &ResolveSettings::default()),
            Err(ResolveError::CustomAxis {
                axis: Axis::Platform
            })
        );
    }

    #[test]
    fn missing_pointer_size() {
        let mut p = linux_clang();
        p.undefine("__SIZEOF_POINTER__");
        assert_eq!(
            resolve(&p, &ResolveSettings::default()),
            Err(ResolveError::UnknownPointerSize)
        );
    }

    #[test]
    fn lenient_unknown_arch_fails_on_register_width() {
        let mut p = linux_clang();
        p.undefine("__x86_64__");
        let settings = ResolveSettings {
            strict: Some(false),
            ..ResolveSettings::default()
        };
        assert_eq!(
            resolve(&p, &settings),
            Err(ResolveError::RegisterWidthUndetermined)
        );
    }
}
