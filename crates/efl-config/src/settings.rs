//! `efl.toml` settings and environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// File name searched for by [`Settings::find_and_load`].
pub const SETTINGS_FILE: &str = "efl.toml";

/// Environment variables read by [`ResolveSettings::apply_env`].
pub const ENV_VARS: &[&str] = &[
    "EFL_STRICT_CONFORMANCE",
    "COMPILER_STRICT_CONFORMANCE",
    "EFL_DEBUG",
    "EFL_BITS_PER_UNIT",
    "EFL_POINTER_SIZE",
];

/// Overrides applied on top of what the toolchain reports.
///
/// `None` leaves the decision to the predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolveSettings {
    /// Make an unresolved axis fatal.
    pub strict: Option<bool>,
    /// Enable debug-only behavior.
    pub debug: Option<bool>,
    /// Bits per addressable unit.
    pub bits_per_unit: Option<u32>,
    /// Pointer size in addressable units.
    pub pointer_size: Option<u32>,
}

impl ResolveSettings {
    /// Replace fields with every value `other` sets.
    pub fn overlay(&mut self, other: &ResolveSettings) {
        self.strict = other.strict.or(self.strict);
        self.debug = other.debug.or(self.debug);
        self.bits_per_unit = other.bits_per_unit.or(self.bits_per_unit);
        self.pointer_size = other.pointer_size.or(self.pointer_size);
    }

    /// Apply overrides from environment variables.
    ///
    /// `EFL_STRICT_CONFORMANCE` wins over `COMPILER_STRICT_CONFORMANCE`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        for key in ["COMPILER_STRICT_CONFORMANCE", "EFL_STRICT_CONFORMANCE"] {
            if let Some(value) = lookup(key) {
                self.strict = Some(parse_bool(key, &value)?);
            }
        }
        if let Some(value) = lookup("EFL_DEBUG") {
            self.debug = Some(parse_bool("EFL_DEBUG", &value)?);
        }
        if let Some(value) = lookup("EFL_BITS_PER_UNIT") {
            self.bits_per_unit = Some(parse_count("EFL_BITS_PER_UNIT", &value)?);
        }
        if let Some(value) = lookup("EFL_POINTER_SIZE") {
            self.pointer_size = Some(parse_count("EFL_POINTER_SIZE", &value)?);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Contents of an `efl.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Resolution overrides.
    #[serde(default)]
    pub resolve: ResolveSettings,
}

impl Settings {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(toml_str)?;
        if settings.resolve.bits_per_unit == Some(0) {
            return Err(invalid("bits-per-unit", "0"));
        }
        if settings.resolve.pointer_size == Some(0) {
            return Err(invalid("pointer-size", "0"));
        }
        Ok(settings)
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Search upward from `start_dir` for an `efl.toml`, returning the
    /// settings and the file they came from.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(SETTINGS_FILE);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading settings");
                let settings = Self::load(&candidate)?;
                return Ok(Some((settings, candidate)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_full_file() {
        let settings = Settings::from_toml_str(
            r#"
[resolve]
strict = true
debug = false
bits-per-unit = 8
pointer-size = 8
"#,
        )
        .unwrap();
        assert_eq!(settings.resolve.strict, Some(true));
        assert_eq!(settings.resolve.debug, Some(false));
        assert_eq!(settings.resolve.bits_per_unit, Some(8));
        assert_eq!(settings.resolve.pointer_size, Some(8));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Settings::from_toml_str("[resolve]\nplatform = \"linux\"\n").is_err());
        assert!(Settings::from_toml_str("[compiler]\n").is_err());
    }

    #[test]
    fn zero_sizes_rejected() {
        let err = Settings::from_toml_str("[resolve]\npointer-size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn env_overrides() {
        let mut s = ResolveSettings::default();
        s.apply_env(env(&[
            ("COMPILER_STRICT_CONFORMANCE", "0"),
            ("EFL_STRICT_CONFORMANCE", "on"),
            ("EFL_DEBUG", "false"),
            ("EFL_POINTER_SIZE", "4"),
        ]))
        .unwrap();
        assert_eq!(s.strict, Some(true));
        assert_eq!(s.debug, Some(false));
        assert_eq!(s.pointer_size, Some(4));
        assert_eq!(s.bits_per_unit, None);
    }

    #[test]
    fn env_legacy_strict_name() {
        let mut s = ResolveSettings::default();
        s.apply_env(env(&[("COMPILER_STRICT_CONFORMANCE", "1")])).unwrap();
        assert_eq!(s.strict, Some(true));
    }

    #[test]
    fn env_bad_values() {
        let mut s = ResolveSettings::default();
        let err = s.apply_env(env(&[("EFL_DEBUG", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("EFL_DEBUG"));
        assert!(s.apply_env(env(&[("EFL_BITS_PER_UNIT", "0")])).is_err());
        assert!(s.apply_env(env(&[("EFL_POINTER_SIZE", "eight")])).is_err());
    }

    #[test]
    fn overlay_prefers_set_values() {
        let mut base = ResolveSettings {
            strict: Some(false),
            pointer_size: Some(8),
            ..ResolveSettings::default()
        };
        base.overlay(&ResolveSettings {
            strict: Some(true),
            ..ResolveSettings::default()
        });
        assert_eq!(base.strict, Some(true));
        assert_eq!(base.pointer_size, Some(8));
    }

    #[test]
    fn find_and_load_searches_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "[resolve]\nstrict = true\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (settings, path) = Settings::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(settings.resolve.strict, Some(true));
        assert_eq!(path, dir.path().join(SETTINGS_FILE));
    }

    #[test]
    fn load_not_found() {
        let result = Settings::load(Path::new("/nonexistent/efl.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound { .. }));
    }
}
