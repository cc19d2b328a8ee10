//! `efl explain`: show which rules match on each axis.

use std::fmt::Display;
use std::path::Path;

use anyhow::Result;
use efl_config::rule::matching;
use efl_config::{arch, compiler, platform, standard, Axis, Predicates, ResolveSettings, Rule};

use super::{process_env, Inputs};

fn explain_axis<T: Copy + Display>(
    out: &mut String,
    axis: Axis,
    rules: &[Rule<T>],
    predicates: &Predicates,
    strict: bool,
) {
    let matches = matching(rules, predicates);
    match matches.first() {
        Some(winner) => {
            out.push_str(&format!("{axis}: {}\n", winner.then));
        }
        None if strict => {
            out.push_str(&format!("{axis}: no rule matched (fatal under strict conformance)\n"));
        }
        None => {
            out.push_str(&format!("{axis}: no rule matched, UNKNOWN\n"));
        }
    }
    for (i, rule) in matches.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        out.push_str(&format!("  {marker} {:<10} {}\n", rule.then.to_string(), rule.when));
    }
}

/// Render the per-axis explanation followed by the assembly outcome.
pub fn render(predicates: &Predicates, settings: &ResolveSettings) -> String {
    let strict = settings
        .strict
        .unwrap_or_else(|| efl_config::descriptor::STRICT_BY_DEFAULT.eval(predicates));
    let mut out = String::new();
    out.push_str(&format!(
        "strict conformance: {}\n",
        if strict { "on" } else { "off" }
    ));
    out.push('\n');

    explain_axis(&mut out, Axis::Compiler, compiler::RULES, predicates, strict);
    explain_axis(&mut out, Axis::Platform, platform::RULES, predicates, strict);
    explain_axis(&mut out, Axis::Architecture, arch::RULES, predicates, strict);

    match standard::resolve(predicates) {
        Ok(version) => {
            let standard = version.standard();
            out.push_str(&format!("{}: {standard}\n", Axis::Standard));
            out.push_str(&format!(
                "  * {:<10} {version} >= {}\n",
                standard.to_string(),
                standard.floor()
            ));
        }
        Err(e) => {
            out.push_str(&format!("{}: {e}\n", Axis::Standard));
        }
    }
    out.push('\n');

    match efl_config::resolve(predicates, settings) {
        Ok(d) => {
            out.push_str(&format!(
                "descriptor: ok ({} registers / {} bits per unit = {} units per pointer)\n",
                d.register_max(),
                d.bits_per_unit(),
                d.pointer_size()
            ));
        }
        Err(e) => {
            out.push_str(&format!("descriptor: {e}\n"));
        }
    }
    out
}

pub fn run(inputs: &Inputs, cwd: &Path) -> Result<()> {
    let predicates = inputs.predicates(&process_env)?;
    let settings = inputs.settings(cwd, &process_env)?;
    print!("{}", render(&predicates, &settings));
    Ok(())
}
