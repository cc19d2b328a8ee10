//! `efl rules`: list the classification tables in evaluation order.

use std::fmt::Display;

use anyhow::Result;
use efl_config::{arch, compiler, platform, Axis, Rule, StandardType};

fn table<T: Display>(out: &mut String, axis: Axis, rules: &[Rule<T>]) {
    out.push_str(&format!("{axis}:\n"));
    for (i, rule) in rules.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {:<10} {}\n", i + 1, rule.then.to_string(), rule.when));
    }
}

fn standards(out: &mut String) {
    out.push_str(&format!("{}:\n", Axis::Standard));
    for (i, standard) in StandardType::ALL.iter().rev().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<10} __cplusplus >= {}\n",
            i + 1,
            standard.to_string(),
            standard.floor()
        ));
    }
}

/// Render one table, or all of them separated by blank lines.
pub fn render(axis: Option<Axis>) -> String {
    let mut out = String::new();
    let axes = match axis {
        Some(axis) => vec![axis],
        None => vec![
            Axis::Compiler,
            Axis::Platform,
            Axis::Architecture,
            Axis::Standard,
        ],
    };
    for (i, axis) in axes.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match axis {
            Axis::Compiler => table(&mut out, axis, compiler::RULES),
            Axis::Platform => table(&mut out, axis, platform::RULES),
            Axis::Architecture => table(&mut out, axis, arch::RULES),
            Axis::Standard => standards(&mut out),
        }
    }
    out
}

pub fn run(axis: Option<Axis>) -> Result<()> {
    print!("{}", render(axis));
    Ok(())
}
