//! `efl resolve`: print the resolved descriptor.

use std::path::Path;

use anyhow::{Context, Result};
use efl_config::{
    ArchType, CompilerSuperType, CompilerType, ConfigDescriptor, LanguageVersion, PlatformType,
    StandardType,
};
use serde::Serialize;

use super::{process_env, Inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
    Toml,
}

/// Flattened view of a descriptor for machine-readable output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Report {
    compiler: CompilerType,
    compiler_family: CompilerSuperType,
    language: LanguageVersion,
    standard: StandardType,
    platform: PlatformType,
    arch: ArchType,
    registers: String,
    register_max: u32,
    pointer_size: u32,
    bits_per_unit: u32,
    debug: bool,
    strict: bool,
}

impl From<&ConfigDescriptor> for Report {
    fn from(d: &ConfigDescriptor) -> Self {
        Self {
            compiler: d.compiler(),
            compiler_family: d.supertype(),
            language: d.language(),
            standard: d.standard(),
            platform: d.platform(),
            arch: d.arch(),
            registers: d.registers().to_string(),
            register_max: d.register_max(),
            pointer_size: d.pointer_size(),
            bits_per_unit: d.bits_per_unit(),
            debug: d.debug(),
            strict: d.strict(),
        }
    }
}

/// Resolve from the given inputs.
pub fn descriptor(
    inputs: &Inputs,
    cwd: &Path,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ConfigDescriptor> {
    let predicates = inputs.predicates(lookup)?;
    let settings = inputs.settings(cwd, lookup)?;
    efl_config::resolve(&predicates, &settings).context("resolving configuration")
}

/// Render a descriptor in the requested format.
pub fn render(d: &ConfigDescriptor, format: Format) -> Result<String> {
    let report = Report::from(d);
    match format {
        Format::Human => Ok(human(d)),
        Format::Json => Ok(serde_json::to_string_pretty(&report)? + "\n"),
        Format::Toml => Ok(toml::to_string(&report)?),
    }
}

fn human(d: &ConfigDescriptor) -> String {
    let mut out = String::new();
    out.push_str(&format!("compiler:  {} ({})\n", d.compiler(), d.supertype()));
    out.push_str(&format!("standard:  {} ({})\n", d.standard(), d.language()));
    out.push_str(&format!("platform:  {}\n", d.platform()));
    out.push_str(&format!(
        "arch:      {} (registers {}, max {} bits)\n",
        d.arch(),
        d.registers(),
        d.register_max()
    ));
    out.push_str(&format!(
        "pointer:   {} units x {} bits\n",
        d.pointer_size(),
        d.bits_per_unit()
    ));
    out.push_str(&format!("debug:     {}\n", d.debug()));
    out.push_str(&format!("strict:    {}\n", d.strict()));
    out
}

pub fn run(inputs: &Inputs, cwd: &Path, format: Format) -> Result<()> {
    let d = descriptor(inputs, cwd, &process_env)?;
    print!("{}", render(&d, format)?);
    Ok(())
}
