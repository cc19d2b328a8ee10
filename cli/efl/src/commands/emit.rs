//! `efl emit`: print what a build script would generate.

use std::path::Path;

use anyhow::Result;
use efl_config::{cfg_directives, render_module, ConfigDescriptor};

use super::{process_env, Inputs};

pub fn render(d: &ConfigDescriptor, cfg: bool) -> String {
    if cfg {
        let mut out = cfg_directives(d).join("\n");
        out.push('\n');
        out
    } else {
        render_module(d)
    }
}

pub fn run(inputs: &Inputs, cwd: &Path, cfg: bool) -> Result<()> {
    let d = super::resolve::descriptor(inputs, cwd, &process_env)?;
    print!("{}", render(&d, cfg));
    Ok(())
}
