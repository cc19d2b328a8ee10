//! Build-environment classification for C++ toolchains.
//!
//! Raw toolchain predicates (the macros a compiler predefines) are
//! classified along four closed axes: compiler, platform, architecture and
//! language standard. Each axis is an ordered rule table evaluated
//! first-match-wins. The results are folded into one immutable
//! [`ConfigDescriptor`] whose register/pointer invariant is checked on
//! assembly, at compile time when built through
//! [`ConfigDescriptor::checked`].
//!
//! Compiler families are encoded in the high bits of each [`CompilerType`]
//! tag and recovered by masking, so the family can never disagree with the
//! specific compiler.
//!
//! A build script typically runs [`Configure`] and the crate then uses
//! [`include_config!`] together with the emitted `efl_*` cfgs.

pub mod arch;
pub mod codegen;
pub mod compiler;
pub mod configure;
pub mod descriptor;
pub mod error;
pub mod platform;
pub mod predicate;
pub mod probe;
pub mod rule;
pub mod settings;
pub mod standard;

pub use arch::{ArchType, RegisterWidths};
pub use codegen::{cfg_directives, render_module};
pub use compiler::{CompilerSuperType, CompilerType, SUPERTYPE_MASK};
pub use configure::Configure;
pub use descriptor::{resolve, ConfigDescriptor, Layout};
pub use error::{ConfigError, ResolveError, Result};
pub use platform::{PlatformType, WindowsSubtype};
pub use predicate::{Condition, Predicates};
pub use probe::{probe_compiler, CargoTarget};
pub use rule::{Axis, Rule};
pub use settings::{ResolveSettings, Settings};
pub use standard::{LanguageVersion, StandardType};

/// Include the module written by [`Configure::run`], defining
/// `pub const CONFIG: ConfigDescriptor`.
#[macro_export]
macro_rules! include_config {
    () => {
        include!(concat!(env!("OUT_DIR"), "/efl_config.rs"));
    };
}
