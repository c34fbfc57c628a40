use std::path::{Path, PathBuf};

use serde::Deserialize;

use xf::ParserOptions;
use xf::call_graph::DEFAULT_ENTRY_NAMES;
use xf::parser::{DEFAULT_MAX_DIAGNOSTICS, DEFAULT_MAX_SOURCE_BYTES};

use crate::error::CliError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "xfc.toml";

/// Settings from `xfc.toml`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `*.xfmod` rule files.
    pub mods_dir: PathBuf,
    pub max_source_bytes: usize,
    pub max_diagnostics: usize,
    /// Source lines shown before and after each diagnostic.
    pub context_lines: usize,
    /// Write the C emitted for a program that had statement-level errors.
    pub keep_partial_output: bool,
    pub cc: String,
    pub cc_args: Vec<String>,
    pub entry_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mods_dir: PathBuf::from("mods"),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_diagnostics: DEFAULT_MAX_DIAGNOSTICS,
            context_lines: 2,
            keep_partial_output: true,
            cc: "gcc".to_string(),
            cc_args: vec!["-std=c11".to_string(), "-O2".to_string()],
            entry_names: DEFAULT_ENTRY_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load `explicit`, or `xfc.toml` if it exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|e| CliError::io(&path, e))?;
        Config::from_toml(&text).map_err(|message| CliError::Config { path, message })
    }

    pub fn from_toml(text: &str) -> Result<Config, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Parser limits, with `entry_names` replaced by `entry_override` when non-empty.
    pub fn parser_options(&self, entry_override: &[String]) -> ParserOptions {
        let entry_names = if entry_override.is_empty() {
            self.entry_names.clone()
        } else {
            entry_override.to_vec()
        };
        ParserOptions {
            max_source_bytes: self.max_source_bytes,
            max_diagnostics: self.max_diagnostics,
            entry_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.cc, "gcc");
        assert_eq!(config.context_lines, 2);
        assert_eq!(config.max_source_bytes, 65536);
        assert_eq!(config.entry_names.len(), 4);
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_toml(
            "cc = \"clang\"\nmods_dir = \"rules\"\nentry_names = [\"start\"]\nkeep_partial_output = false\n",
        )
        .unwrap();
        assert_eq!(config.cc, "clang");
        assert_eq!(config.mods_dir, PathBuf::from("rules"));
        assert!(!config.keep_partial_output);
        assert_eq!(config.parser_options(&[]).entry_names, ["start"]);
        assert_eq!(
            config.parser_options(&["go".to_string()]).entry_names,
            ["go"]
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("colour = true").is_err());
    }
}
