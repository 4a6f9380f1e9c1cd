//! ps2recomp is a static recompiler for PlayStation 2 executables.
//!
//! Given a PS2 ELF file containing MIPS R5900 machine code, it emits
//! C++ source that executes the guest program on the host CPU when
//! compiled against a small runtime. Translation happens ahead of time,
//! per function: the [`decoder`] lifts each instruction word into an
//! annotated record, the [`codegen`] module lowers a function's records
//! into host statements over a guest context and RAM buffer, and the
//! [`recompiler`] orchestrates classification, entry-point discovery
//! and output emission.
//!
//! # Examples
//!
//! ```no_run
//! let config = ps2recomp::RecompilerConfig::load("game.toml")?;
//! let mut recompiler = ps2recomp::Recompiler::new(config)?;
//! recompiler.recompile()?;
//! recompiler.generate_output()?;
//! # Ok::<(), ps2recomp::RecompileError>(())
//! ```

#![warn(missing_docs)]

pub mod codegen;
pub mod config;
mod consts;
pub mod decoder;
pub mod elf;
pub mod recompiler;

pub use flagset;

#[doc(inline)]
pub use codegen::{sanitize_function_name, BootstrapInfo, CodeGenerator};
pub use config::{ConfigError, RecompilerConfig};
#[doc(inline)]
pub use decoder::{decode, Instruction};
pub use elf::{ElfImage, ParseError, Section, Symbol};
#[doc(inline)]
pub use recompiler::{Function, RecompileError, RecompileSummary, Recompiler};
