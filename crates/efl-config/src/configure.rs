//! Build-script driver.
//!
//! ```no_run
//! // build.rs
//! fn main() {
//!     efl_config::Configure::new().run().unwrap();
//! }
//! ```
//!
//! The crate then pulls the descriptor in with
//! [`include_config!`](crate::include_config) and may gate code on the
//! emitted `efl_*` cfgs.
//!
//! Platform, architecture and layout always come from the Cargo target.
//! A compiler probe contributes only what the target cannot say: compiler
//! identity, language version and build flavor. This keeps cross builds
//! correct even when the probed compiler is built for the host.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::arch;
use crate::codegen::{cfg_directives, render_module};
use crate::descriptor::{self, ConfigDescriptor};
use crate::error::{ConfigError, Result};
use crate::platform;
use crate::predicate::Predicates;
use crate::probe::{probe_compiler, split_command, CargoTarget};
use crate::settings::{ResolveSettings, Settings, ENV_VARS};
use crate::standard::LanguageVersion;

/// File written into `OUT_DIR`.
pub const OUTPUT_FILE: &str = "efl_config.rs";

const DEFAULT_COMPILER: &str = "c++";

/// Macros owned by the Cargo target: everything the platform and
/// architecture rules read, plus the storage layout.
pub fn target_macros() -> BTreeSet<&'static str> {
    let mut names = BTreeSet::from(["__SIZEOF_POINTER__", "__CHAR_BIT__"]);
    for rule in platform::RULES {
        rule.when.names(&mut names);
    }
    for rule in arch::RULES {
        rule.when.names(&mut names);
    }
    names
}

/// Environment variables naming the C++ compiler, most specific first.
///
/// Follows the `cc` crate convention: `CXX_<target>` (as given, then with
/// `-` replaced by `_`), then `TARGET_CXX` or `HOST_CXX`, then `CXX`.
fn compiler_vars(lookup: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut vars = Vec::new();
    let target = lookup("TARGET");
    if let Some(triple) = &target {
        vars.push(format!("CXX_{triple}"));
        vars.push(format!("CXX_{}", triple.replace('-', "_")));
    }
    let cross = match (&target, lookup("HOST")) {
        (Some(target), Some(host)) => *target != host,
        _ => false,
    };
    vars.push(if cross { "TARGET_CXX" } else { "HOST_CXX" }.to_string());
    vars.push("CXX".to_string());
    vars
}

/// Resolves the configuration for the crate being built.
#[derive(Debug, Clone)]
pub struct Configure {
    compiler: Option<PathBuf>,
    compiler_args: Vec<String>,
    settings: ResolveSettings,
    language: Option<LanguageVersion>,
    defines: Predicates,
    probe: bool,
}

impl Configure {
    pub fn new() -> Self {
        Self {
            compiler: None,
            compiler_args: Vec::new(),
            settings: ResolveSettings::default(),
            language: None,
            defines: Predicates::new(),
            probe: true,
        }
    }

    /// Probe this compiler instead of the one named by the environment.
    pub fn compiler(mut self, path: impl Into<PathBuf>) -> Self {
        self.compiler = Some(path.into());
        self
    }

    /// Extra arguments passed to the compiler before the probe flags.
    pub fn compiler_arg(mut self, arg: impl Into<String>) -> Self {
        self.compiler_args.push(arg.into());
        self
    }

    /// Overrides applied above `efl.toml` and below the environment.
    pub fn settings(mut self, settings: ResolveSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Language version assumed when no compiler reports `__cplusplus`.
    pub fn language(mut self, version: LanguageVersion) -> Self {
        self.language = Some(version);
        self
    }

    /// Predicates applied last, over both the target and the probe.
    ///
    /// Supplies a compiler identity when probing is disabled.
    pub fn defines(mut self, defines: Predicates) -> Self {
        self.defines.merge(&defines);
        self
    }

    /// Skip the compiler probe and classify from the Cargo target alone.
    pub fn without_probe(mut self) -> Self {
        self.probe = false;
        self
    }

    /// Run inside a build script: resolve, write `$OUT_DIR/efl_config.rs`
    /// and print Cargo directives to stdout.
    pub fn run(self) -> Result<ConfigDescriptor> {
        let stdout = std::io::stdout();
        self.run_with(|key| std::env::var(key).ok(), &mut stdout.lock())
    }

    /// [`run`](Self::run) with an explicit environment and directive sink.
    pub fn run_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
        out: &mut impl Write,
    ) -> Result<ConfigDescriptor> {
        let out_dir = lookup("OUT_DIR")
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingEnv { name: "OUT_DIR" })?;

        let target = CargoTarget::from_env(&lookup)?;
        tracing::debug!(os = %target.os, arch = %target.arch, width = target.pointer_width, "cargo target");
        let mut predicates = target.predicates();

        if self.probe {
            self.probe_into(&lookup, &mut predicates);
        }
        if !predicates.is_defined("__cplusplus") {
            if let Some(version) = self.language {
                predicates.define_value("__cplusplus", i64::from(version.value()));
            }
        }
        predicates.merge(&self.defines);

        let mut settings = ResolveSettings::default();
        if let Some(dir) = lookup("CARGO_MANIFEST_DIR") {
            if let Some((file, path)) = Settings::find_and_load(Path::new(&dir))? {
                out.write_all(format!("cargo:rerun-if-changed={}\n", path.display()).as_bytes())?;
                settings = file.resolve;
            }
        }
        settings.overlay(&self.settings);
        settings.apply_env(&lookup)?;

        let descriptor = descriptor::resolve(&predicates, &settings)?;

        let path = out_dir.join(OUTPUT_FILE);
        std::fs::write(&path, render_module(&descriptor))?;
        tracing::debug!(path = %path.display(), "wrote configuration module");

        let mut directives = String::new();
        let watched = ENV_VARS
            .iter()
            .map(|name| name.to_string())
            .chain(compiler_vars(&lookup));
        for name in watched {
            directives.push_str(&format!("cargo:rerun-if-env-changed={name}\n"));
        }
        for line in cfg_directives(&descriptor) {
            directives.push_str(&line);
            directives.push('\n');
        }
        out.write_all(directives.as_bytes())?;
        Ok(descriptor)
    }

    fn compiler_command(&self, lookup: &impl Fn(&str) -> Option<String>) -> (PathBuf, Vec<String>) {
        let (program, mut args) = match &self.compiler {
            Some(path) => (path.clone(), Vec::new()),
            None => compiler_vars(lookup)
                .iter()
                .find_map(|var| lookup(var.as_str()).as_deref().and_then(split_command))
                .unwrap_or_else(|| (PathBuf::from(DEFAULT_COMPILER), Vec::new())),
        };
        args.extend(self.compiler_args.iter().cloned());
        (program, args)
    }

    fn probe_into(&self, lookup: &impl Fn(&str) -> Option<String>, predicates: &mut Predicates) {
        let (program, args) = self.compiler_command(lookup);
        match probe_compiler(&program, &args) {
            Ok(mut reported) => {
                for name in target_macros() {
                    reported.undefine(name);
                }
                predicates.merge(&reported);
            }
            Err(e) => tracing::warn!(error = %e, "compiler probe failed; using target defaults"),
        }
    }
}

impl Default for Configure {
    fn default() -> Self {
        Self::new()
    }
}
