//! Predicate sources: live compiler probes and Cargo target configuration.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{ConfigError, Result};
use crate::predicate::Predicates;

/// Split a `CXX`-style command line into the program and its leading arguments.
///
/// Returns `None` for an empty command.
pub fn split_command(command: &str) -> Option<(PathBuf, Vec<String>)> {
    let mut parts = command.split_whitespace();
    let program = PathBuf::from(parts.next()?);
    Some((program, parts.map(str::to_string).collect()))
}

/// Ask a GNU-compatible C++ compiler for its predefined macros.
///
/// Runs `<compiler> [args] -x c++ -dM -E -` on empty input.
pub fn probe_compiler(compiler: &Path, args: &[String]) -> Result<Predicates> {
    let probe_error = |detail: String| ConfigError::Probe {
        compiler: compiler.display().to_string(),
        detail,
    };

    let mut command = Command::new(compiler);
    command
        .args(args)
        .args(["-x", "c++", "-dM", "-E", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    tracing::debug!(?command, "probing compiler macros");

    let output = command.output().map_err(|e| probe_error(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first_line = stderr.lines().next().unwrap_or("(no diagnostic)");
        return Err(probe_error(format!("{}: {first_line}", output.status)));
    }

    let predicates = Predicates::parse_defines(&String::from_utf8_lossy(&output.stdout));
    if predicates.is_empty() {
        return Err(probe_error("no macros reported".into()));
    }
    tracing::debug!(count = predicates.len(), "compiler reported macros");
    Ok(predicates)
}

/// The Rust target a build script is compiling for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoTarget {
    /// `CARGO_CFG_TARGET_OS`
    pub os: String,
    /// `CARGO_CFG_TARGET_ARCH`
    pub arch: String,
    /// `CARGO_CFG_TARGET_POINTER_WIDTH`, in bits.
    pub pointer_width: u32,
    /// `CARGO_CFG_TARGET_ENV`; may be empty.
    pub env: String,
    /// `CARGO_CFG_TARGET_FEATURE`, split on commas.
    pub features: Vec<String>,
}

impl CargoTarget {
    /// Read the target from build-script environment variables.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnv { name });
        let width = require("CARGO_CFG_TARGET_POINTER_WIDTH")?;
        let pointer_width = width
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidSetting {
                key: "CARGO_CFG_TARGET_POINTER_WIDTH".into(),
                value: width.clone(),
            })?;
        Ok(Self {
            os: require("CARGO_CFG_TARGET_OS")?,
            arch: require("CARGO_CFG_TARGET_ARCH")?,
            pointer_width,
            env: lookup("CARGO_CFG_TARGET_ENV").unwrap_or_default(),
            features: lookup("CARGO_CFG_TARGET_FEATURE")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Whether rustc enables `feature` for this target.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// The macros a C++ compiler for this target would predefine for the
    /// platform and architecture axes.
    ///
    /// Compiler identity and language version are not derivable from the
    /// Rust target and are left out.
    pub fn predicates(&self) -> Predicates {
        let mut p = Predicates::new();
        let wide = self.pointer_width == 64;

        match self.os.as_str() {
            "windows" => {
                p.define("_WIN32");
                if wide {
                    p.define("_WIN64");
                }
            }
            "linux" => {
                p.define("__linux__");
            }
            "android" => {
                p.define("__linux__").define("__ANDROID__");
            }
            "macos" => {
                p.define("__APPLE__").define("__MACH__");
            }
            "ios" => {
                p.define("__APPLE__");
            }
            "haiku" => {
                p.define("__HAIKU__");
            }
            "solaris" | "illumos" => {
                p.define("__sun").define("__SVR4");
            }
            _ => {}
        }

        match self.arch.as_str() {
            "x86_64" => {
                p.define("__x86_64__").define("__amd64__");
                if !wide {
                    p.define("__ILP32__");
                }
            }
            "aarch64" | "arm64ec" => {
                p.define("__aarch64__");
            }
            "arm" => {
                p.define("__arm__");
                if self.has_feature("thumb-mode") {
                    p.define("__thumb__");
                }
            }
            "x86" => {
                p.define("__i386__");
            }
            "m68k" => {
                p.define("__m68k__");
            }
            "mips" | "mips32r6" => {
                p.define("__mips__").define_value("__mips", 32);
            }
            "mips64" | "mips64r6" => {
                p.define("__mips__")
                    .define("__mips64")
                    .define_value("__mips", 64);
            }
            _ => {}
        }

        if self.env == "gnu" && self.os == "windows" {
            p.define("__MINGW32__");
        }
        p.define_value("__SIZEOF_POINTER__", i64::from(self.pointer_width / 8));
        p.define_value("__CHAR_BIT__", 8);
        p
    }
}
