//! Error types for configuration resolution.

use std::path::PathBuf;

use crate::rule::Axis;

/// Errors that stop a descriptor from being resolved.
///
/// Every variant is `Copy` so the assembler can return it from a `const fn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No rule on the axis matched under strict conformance.
    #[error("unsupported {axis}")]
    Unsupported {
        /// The axis that could not be classified.
        axis: Axis,
    },

    /// A user-substituted axis was requested.
    #[error("custom {axis} settings are currently unsupported")]
    CustomAxis {
        /// The axis the substitution targeted.
        axis: Axis,
    },

    /// The toolchain reported no language version.
    #[error("this must be compiled with C++")]
    NotCpp,

    /// The architecture carries no register width capability.
    #[error("could not determine register width")]
    RegisterWidthUndetermined,

    /// The widest register does not span exactly one pointer.
    #[error(
        "register width {register_max} / {bits_per_unit} bits per unit does not match pointer size {pointer_size}"
    )]
    RegisterWidthMismatch {
        /// Widest register in bits.
        register_max: u32,
        /// Bits per addressable unit.
        bits_per_unit: u32,
        /// Native pointer size in addressable units.
        pointer_size: u32,
    },

    /// Bits per addressable unit was configured as zero.
    #[error("bits per addressable unit must be non-zero")]
    InvalidBitsPerUnit,

    /// Neither the settings nor the toolchain supplied a pointer size.
    #[error("pointer size is unknown (set `pointer-size` or report __SIZEOF_POINTER__)")]
    UnknownPointerSize,
}

/// Errors from loading settings, probing toolchains or writing outputs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading settings or writing generated files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file not found.
    #[error("settings file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A setting carried a value that could not be interpreted.
    #[error("invalid value '{value}' for {key}")]
    InvalidSetting {
        /// Setting or environment variable name.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// The compiler probe failed.
    #[error("probing `{compiler}` failed: {detail}")]
    Probe {
        /// Compiler command that was run.
        compiler: String,
        /// Captured diagnostic.
        detail: String,
    },

    /// A required build-script environment variable is missing.
    #[error("environment variable {name} is not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },

    /// Resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
