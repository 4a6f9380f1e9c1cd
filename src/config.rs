//! Recompiler configuration, loaded from a TOML file.
//!
//! The file names the input executable and output directory and carries
//! the per-title tuning knobs: functions to skip or stub, instruction
//! word patches, and the addresses of loads/stores that must go through
//! the runtime's MMIO handlers.
//!
//! ```toml
//! [input]
//! path = "game.elf"
//! ghidra_map = "functions.map"
//!
//! [output]
//! path = "generated"
//! single_file = true
//!
//! [functions]
//! skip = ["DebugDraw@0x1f0100"]
//! stub = ["printf", "0x2044f0"]
//!
//! [patches]
//! apply_syscalls = true
//! words = { "0x100008" = "0x00000000" }
//!
//! [mmio]
//! "0x1000a4" = "0x10003000"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML or has an unknown shape
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    /// An address key or patch value was not a valid integer literal
    #[error("invalid integer literal {0:?}")]
    InvalidLiteral(String),
}

/// The loaded recompiler configuration.
#[derive(Debug, Clone, Default)]
pub struct RecompilerConfig {
    /// Path of the input ELF executable.
    pub input_path: PathBuf,
    /// Directory the generated sources are written to.
    pub output_path: PathBuf,
    /// Optional Ghidra function-map overlay.
    pub ghidra_map_path: Option<PathBuf>,
    /// Emit one combined translation unit instead of one per function.
    pub single_file_output: bool,
    /// Selectors for functions replaced by TODO wrappers.
    pub skip_functions: Vec<String>,
    /// Selectors for functions dispatched to runtime stub handlers.
    pub stub_implementations: Vec<String>,
    /// Instruction word replacements, keyed by guest address.
    pub patches: HashMap<u32, u32>,
    /// Allow patches on SYSCALL instructions.
    pub patch_syscalls: bool,
    /// Allow patches on COP0 instructions.
    pub patch_cop0: bool,
    /// Allow patches on CACHE instructions.
    pub patch_cache: bool,
    /// Loads/stores routed through the runtime, keyed by the address of
    /// the instruction; the value is the guest MMIO address it touches.
    pub mmio_by_instruction_address: HashMap<u32, u32>,
}

impl RecompilerConfig {
    /// Loads and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let mut patches = HashMap::new();
        for (address, word) in raw.patches.words {
            patches.insert(parse_literal(&address)?, parse_literal(&word)?);
        }

        let mut mmio = HashMap::new();
        for (address, target) in raw.mmio {
            mmio.insert(parse_literal(&address)?, parse_literal(&target)?);
        }

        Ok(Self {
            input_path: raw.input.path,
            output_path: raw.output.path,
            ghidra_map_path: raw.input.ghidra_map,
            single_file_output: raw.output.single_file,
            skip_functions: raw.functions.skip,
            stub_implementations: raw.functions.stub,
            patches,
            patch_syscalls: raw.patches.apply_syscalls,
            patch_cop0: raw.patches.apply_cop0,
            patch_cache: raw.patches.apply_cache,
            mmio_by_instruction_address: mmio,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    input: RawInput,
    output: RawOutput,
    #[serde(default)]
    functions: RawFunctions,
    #[serde(default)]
    patches: RawPatches,
    #[serde(default)]
    mmio: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInput {
    path: PathBuf,
    #[serde(default)]
    ghidra_map: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    path: PathBuf,
    #[serde(default)]
    single_file: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunctions {
    #[serde(default)]
    skip: Vec<String>,
    #[serde(default)]
    stub: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPatches {
    #[serde(default)]
    apply_syscalls: bool,
    #[serde(default)]
    apply_cop0: bool,
    #[serde(default)]
    apply_cache: bool,
    #[serde(default)]
    words: HashMap<String, String>,
}

/// A parsed skip/stub selector: `name`, `name@0xADDR` or a bare address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSelector {
    /// Symbol name, when the selector names one.
    pub name: Option<String>,
    /// Start address, when the selector pins one.
    pub start: Option<u32>,
}

/// Parses one selector. An unparsable address part falls back to
/// treating the whole selector as a name.
pub fn parse_selector(raw: &str) -> FunctionSelector {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FunctionSelector::default();
    }

    if let Some(at) = trimmed.rfind('@') {
        let name = trimmed[..at].trim();
        let address = trimmed[at + 1..].trim();
        if let Ok(start) = parse_literal(address) {
            return FunctionSelector {
                name: (!name.is_empty()).then(|| name.to_string()),
                start: Some(start),
            };
        }
        return FunctionSelector {
            name: Some(trimmed.to_string()),
            start: None,
        };
    }

    if let Ok(start) = parse_literal(trimmed) {
        return FunctionSelector {
            name: None,
            start: Some(start),
        };
    }

    FunctionSelector {
        name: Some(trimmed.to_string()),
        start: None,
    }
}

// Integer literal in any of the strtoul(_, _, 0) bases: 0x hex, leading
// 0 octal, otherwise decimal.
fn parse_literal(text: &str) -> Result<u32, ConfigError> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        u32::from_str_radix(&text[1..], 8)
    } else {
        text.parse()
    };
    parsed.map_err(|_| ConfigError::InvalidLiteral(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = RecompilerConfig::from_toml(
            r#"
            [input]
            path = "game.elf"
            ghidra_map = "functions.map"

            [output]
            path = "generated"
            single_file = true

            [functions]
            skip = ["DebugDraw@0x1f0100"]
            stub = ["printf"]

            [patches]
            apply_syscalls = true
            words = { "0x100008" = "0" }

            [mmio]
            "0x1000a4" = "0x10003000"
            "#,
        )
        .unwrap();

        assert!(config.single_file_output);
        assert!(config.patch_syscalls);
        assert!(!config.patch_cop0);
        assert_eq!(config.patches[&0x100008], 0);
        assert_eq!(config.mmio_by_instruction_address[&0x1000a4], 0x1000_3000);
        assert_eq!(config.ghidra_map_path.as_deref().unwrap().to_str(), Some("functions.map"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = RecompilerConfig::from_toml(
            r#"
            [input]
            path = "game.elf"
            typo = 1

            [output]
            path = "out"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn selector_grammar() {
        assert_eq!(
            parse_selector("memcpy"),
            FunctionSelector { name: Some("memcpy".into()), start: None }
        );
        assert_eq!(
            parse_selector("memcpy@0x2000"),
            FunctionSelector { name: Some("memcpy".into()), start: Some(0x2000) }
        );
        assert_eq!(
            parse_selector("0x2000"),
            FunctionSelector { name: None, start: Some(0x2000) }
        );
        // A broken address part keeps the whole selector as a name.
        assert_eq!(
            parse_selector("weird@name"),
            FunctionSelector { name: Some("weird@name".into()), start: None }
        );
    }

    #[test]
    fn literal_bases() {
        assert_eq!(parse_literal("0x10").unwrap(), 16);
        assert_eq!(parse_literal("010").unwrap(), 8);
        assert_eq!(parse_literal("10").unwrap(), 10);
        assert!(parse_literal("ten").is_err());
    }
}
