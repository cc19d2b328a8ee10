//! CLI command implementations.

pub mod emit;
pub mod explain;
pub mod resolve;
pub mod rules;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use efl_config::probe::split_command;
use efl_config::{probe_compiler, Predicates, ResolveSettings, Settings};

/// Where predicates and overrides come from, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub defines: Option<PathBuf>,
    pub probe: Option<String>,
    pub strict: Option<bool>,
    pub pointer_size: Option<u32>,
    pub bits_per_unit: Option<u32>,
    pub config: Option<PathBuf>,
}

impl Inputs {
    /// Read the predicates: a defines file, else a compiler probe.
    pub fn predicates(&self, lookup: &impl Fn(&str) -> Option<String>) -> Result<Predicates> {
        if let Some(path) = &self.defines {
            let text = if path.as_os_str() == "-" {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("reading defines from stdin")?;
                text
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?
            };
            return Ok(Predicates::parse_defines(&text));
        }

        let command = self
            .probe
            .clone()
            .or_else(|| lookup("CXX"))
            .unwrap_or_else(|| "c++".to_string());
        let (program, args) = split_command(&command)
            .with_context(|| format!("invalid compiler command '{command}'"))?;
        Ok(probe_compiler(&program, &args)?)
    }

    /// Layer settings: `efl.toml`, then environment, then flags.
    pub fn settings(
        &self,
        cwd: &Path,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<ResolveSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                Settings::load(path)
                    .with_context(|| format!("loading {}", path.display()))?
                    .resolve
            }
            None => match Settings::find_and_load(cwd)? {
                Some((file, path)) => {
                    tracing::debug!(path = %path.display(), "using settings file");
                    file.resolve
                }
                None => ResolveSettings::default(),
            },
        };
        settings.apply_env(lookup)?;
        settings.overlay(&ResolveSettings {
            strict: self.strict,
            debug: None,
            bits_per_unit: self.bits_per_unit,
            pointer_size: self.pointer_size,
        });
        Ok(settings)
    }
}

/// Process environment lookup.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
