//! Rendering a descriptor as Rust source and Cargo directives.
//!
//! The generated module rebuilds the descriptor through
//! [`ConfigDescriptor::checked`], so the register/pointer invariant is
//! re-checked by the compiler of the consuming crate.

use crate::arch::ArchType;
use crate::compiler::{CompilerSuperType, CompilerType};
use crate::descriptor::ConfigDescriptor;
use crate::platform::PlatformType;
use crate::standard::StandardType;

/// Name of the constant defined by [`render_module`].
pub const CONST_NAME: &str = "CONFIG";

/// Render a Rust module defining `pub const CONFIG`.
pub fn render_module(descriptor: &ConfigDescriptor) -> String {
    let mut out = String::new();
    out.push_str("// Generated by efl-config. Do not edit.\n\n");
    out.push_str("/// Build configuration resolved for this target.\n");
    out.push_str(&format!(
        "pub const {CONST_NAME}: ::efl_config::ConfigDescriptor = ::efl_config::ConfigDescriptor::checked(\n"
    ));
    out.push_str(&format!(
        "    ::efl_config::CompilerType::{:?},\n",
        descriptor.compiler()
    ));
    out.push_str(&format!(
        "    ::efl_config::LanguageVersion::new({}),\n",
        descriptor.language().value()
    ));
    out.push_str(&format!(
        "    ::efl_config::PlatformType::{:?},\n",
        descriptor.platform()
    ));
    out.push_str(&format!("    ::efl_config::ArchType::{:?},\n", descriptor.arch()));
    out.push_str(&format!(
        "    ::efl_config::Layout::new({}, {}),\n",
        descriptor.pointer_size(),
        descriptor.bits_per_unit()
    ));
    out.push_str(")\n");
    out.push_str(&format!(".with_debug({})\n", descriptor.debug()));
    out.push_str(&format!(".with_strict({});\n", descriptor.strict()));
    out.push('\n');
    out.push_str("const _: () = assert!(\n");
    out.push_str(&format!(
        "    {CONST_NAME}.pointer_bits() as usize == ::core::mem::size_of::<*const ()>() * 8,\n"
    ));
    out.push_str("    \"resolved pointer size does not match the compilation target\"\n");
    out.push_str(");\n");
    out
}

fn cfg_value(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn check_cfg(key: &str, values: impl IntoIterator<Item = String>) -> String {
    let values: Vec<String> = values.into_iter().map(|v| format!("\"{v}\"")).collect();
    format!("cargo:rustc-check-cfg=cfg({key}, values({}))", values.join(", "))
}

/// `cargo:rustc-cfg` and `cargo:rustc-check-cfg` lines exposing the
/// descriptor to `#[cfg(..)]`.
///
/// `efl_cpp_at_least` is set once for every standard up to the active one,
/// so `#[cfg(efl_cpp_at_least = "17")]` gates on C++17 or later.
pub fn cfg_directives(descriptor: &ConfigDescriptor) -> Vec<String> {
    let standards = || StandardType::ALL.iter().map(|s| s.year().to_string());
    let mut lines = vec![
        check_cfg(
            "efl_compiler",
            CompilerType::ALL.iter().map(|c| cfg_value(c.name())),
        ),
        check_cfg(
            "efl_compiler_family",
            [
                CompilerSuperType::None,
                CompilerSuperType::Gnu,
                CompilerSuperType::Llvm,
            ]
            .iter()
            .map(|s| cfg_value(s.name())),
        ),
        check_cfg(
            "efl_platform",
            PlatformType::ALL.iter().map(|p| cfg_value(p.name())),
        ),
        check_cfg("efl_arch", ArchType::ALL.iter().map(|a| cfg_value(a.name()))),
        check_cfg("efl_cpp", standards()),
        check_cfg("efl_cpp_at_least", standards()),
        "cargo:rustc-check-cfg=cfg(efl_debug)".to_string(),
    ];

    lines.push(format!(
        "cargo:rustc-cfg=efl_compiler=\"{}\"",
        cfg_value(descriptor.compiler_name())
    ));
    lines.push(format!(
        "cargo:rustc-cfg=efl_compiler_family=\"{}\"",
        cfg_value(descriptor.supertype().name())
    ));
    lines.push(format!(
        "cargo:rustc-cfg=efl_platform=\"{}\"",
        cfg_value(descriptor.platform_name())
    ));
    lines.push(format!(
        "cargo:rustc-cfg=efl_arch=\"{}\"",
        cfg_value(descriptor.arch_name())
    ));
    lines.push(format!(
        "cargo:rustc-cfg=efl_cpp=\"{}\"",
        descriptor.standard().year()
    ));
    for standard in StandardType::ALL {
        if descriptor.language().at_least(standard) {
            lines.push(format!(
                "cargo:rustc-cfg=efl_cpp_at_least=\"{}\"",
                standard.year()
            ));
        }
    }
    if descriptor.debug() {
        lines.push("cargo:rustc-cfg=efl_debug".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Layout;
    use crate::standard::LanguageVersion;

    fn sample() -> ConfigDescriptor {
        ConfigDescriptor::assemble(
            CompilerType::Clang,
            LanguageVersion::new(201_703),
            PlatformType::Win64,
            ArchType::ArmThumb,
            Layout::new(4, 8),
        )
        .unwrap()
        .with_debug(false)
    }

    #[test]
    fn module_rebuilds_descriptor() {
        let source = render_module(&sample());
        assert!(source.contains("pub const CONFIG: ::efl_config::ConfigDescriptor"));
        assert!(source.contains("::efl_config::CompilerType::Clang,"));
        assert!(source.contains("::efl_config::LanguageVersion::new(201703),"));
        assert!(source.contains("::efl_config::PlatformType::Win64,"));
        assert!(source.contains("::efl_config::ArchType::ArmThumb,"));
        assert!(source.contains("::efl_config::Layout::new(4, 8),"));
        assert!(source.contains(".with_debug(false)"));
        assert!(source.contains(".with_strict(false);"));
        assert!(source.contains("size_of::<*const ()>()"));
    }

    #[test]
    fn cfg_lines() {
        let lines = cfg_directives(&sample());
        assert!(lines.contains(&"cargo:rustc-cfg=efl_compiler=\"clang\"".to_string()));
        assert!(lines.contains(&"cargo:rustc-cfg=efl_compiler_family=\"llvm\"".to_string()));
        assert!(lines.contains(&"cargo:rustc-cfg=efl_platform=\"win_64\"".to_string()));
        assert!(lines.contains(&"cargo:rustc-cfg=efl_arch=\"arm_thumb\"".to_string()));
        assert!(lines.contains(&"cargo:rustc-cfg=efl_cpp=\"17\"".to_string()));
        assert!(!lines.iter().any(|l| l == "cargo:rustc-cfg=efl_debug"));
    }

    #[test]
    fn cpp_at_least_covers_older_standards() {
        let at_least: Vec<String> = cfg_directives(&sample())
            .into_iter()
            .filter_map(|l| {
                l.strip_prefix("cargo:rustc-cfg=efl_cpp_at_least=")
                    .map(str::to_string)
            })
            .collect();
        assert_eq!(at_least, vec!["\"97\"", "\"11\"", "\"14\"", "\"17\""]);
    }

    #[test]
    fn check_cfg_lists_every_value() {
        let lines = cfg_directives(&sample());
        let compilers = lines
            .iter()
            .find(|l| l.starts_with("cargo:rustc-check-cfg=cfg(efl_compiler,"))
            .unwrap();
        for compiler in CompilerType::ALL {
            assert!(compilers.contains(&format!("\"{}\"", cfg_value(compiler.name()))));
        }
    }
}
