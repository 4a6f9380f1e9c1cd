//! The function-boundary orchestrator.
//!
//! This is the only component with ordering obligations: it loads the
//! configuration and the ELF image, classifies every function (normal /
//! stub / skipped), decodes per function with patches and MMIO tags
//! applied, discovers extra entry points inside existing functions,
//! reslices the synthetic entries, computes collision-free host names
//! and finally writes the generated sources, the registration table and
//! the two declaration headers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use log::{info, warn};
use thiserror::Error;

use crate::codegen::{sanitize_function_name, BootstrapInfo, CodeGenerator};
use crate::config::{parse_selector, ConfigError, RecompilerConfig};
use crate::consts::*;
use crate::decoder::{decode, Instruction};
use crate::elf::{ElfImage, ParseError, Relocation, Section, Symbol};

/// One guest function known to the recompiler.
///
/// Exactly one of the three classification flags is set once the
/// orchestrator finishes; all three stay false for a function that was
/// never processed.
#[derive(Debug, Clone, Default)]
pub struct Function {
    /// Original ELF or Ghidra symbol name.
    pub name: String,
    /// Start address (inclusive).
    pub start: u32,
    /// End address (exclusive).
    pub end: u32,
    /// Decoded and translated to host code.
    pub is_recompiled: bool,
    /// Body replaced by a named runtime handler.
    pub is_stub: bool,
    /// Body replaced by a TODO wrapper.
    pub is_skipped: bool,
}

/// Errors surfaced to the CLI.
#[derive(Debug, Error)]
pub enum RecompileError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The input executable could not be parsed
    #[error(transparent)]
    Elf(#[from] ParseError),
    /// Output files could not be written
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// Path of the file being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The executable carries no usable function boundaries
    #[error("no functions found in the input executable")]
    NoFunctions,
}

/// End-of-run statistics, for the CLI report.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecompileSummary {
    /// Functions fully recompiled.
    pub recompiled: usize,
    /// Functions dispatched to runtime handlers.
    pub stubs: usize,
    /// Functions replaced by TODO wrappers.
    pub skipped: usize,
    /// Functions whose decode was truncated or failed.
    pub decode_failures: usize,
    /// Synthetic entry points discovered inside existing functions.
    pub entries_discovered: usize,
    /// Entry functions whose slice changed after discovery.
    pub entries_resliced: usize,
}

/// Drives one recompilation from configuration to generated output.
pub struct Recompiler {
    config: RecompilerConfig,
    image: ElfImage,
    functions: Vec<Function>,
    symbols: Vec<Symbol>,
    sections: Vec<Section>,
    relocations: Vec<Relocation>,
    decoded: HashMap<u32, Vec<Instruction>>,
    skip_names: HashSet<String>,
    skip_starts: HashSet<u32>,
    stub_names: HashSet<String>,
    stub_starts: HashSet<u32>,
    stub_bindings: HashMap<u32, String>,
    renames: HashMap<u32, String>,
    generated_stubs: BTreeMap<u32, String>,
    generator: CodeGenerator,
    bootstrap: BootstrapInfo,
    summary: RecompileSummary,
}

impl Recompiler {
    /// Loads the configuration, parses the executable and prepares the
    /// classification indices.
    pub fn new(config: RecompilerConfig) -> Result<Self, RecompileError> {
        let mut image = ElfImage::open(&config.input_path)?;
        if let Some(map_path) = &config.ghidra_map_path {
            let loaded = image.load_ghidra_map(map_path)?;
            info!("loaded {loaded} function(s) from the Ghidra map");
        }

        let functions: Vec<Function> = image
            .functions()
            .into_iter()
            .map(|(name, start, end)| Function {
                name,
                start,
                end,
                ..Function::default()
            })
            .collect();
        if functions.is_empty() {
            return Err(RecompileError::NoFunctions);
        }

        let symbols = image.symbols();
        let sections = image.sections().to_vec();
        let relocations = image.relocations();
        info!(
            "extracted {} function(s), {} symbol(s), {} section(s), {} relocation(s)",
            functions.len(),
            symbols.len(),
            sections.len(),
            relocations.len()
        );

        let mut relocation_names: HashMap<u32, &str> = HashMap::new();
        for relocation in &relocations {
            if relocation.symbol_name.is_empty() {
                continue;
            }
            if let Some(previous) =
                relocation_names.insert(relocation.offset, &relocation.symbol_name)
            {
                if previous != relocation.symbol_name {
                    warn!(
                        "multiple relocation symbols at 0x{:x} (keeping {:?}, ignoring {:?})",
                        relocation.offset, relocation.symbol_name, previous
                    );
                }
            }
        }

        let mut skip_names = HashSet::new();
        let mut skip_starts = HashSet::new();
        for selector in &config.skip_functions {
            let selector = parse_selector(selector);
            if let Some(name) = selector.name {
                skip_names.insert(name);
            }
            if let Some(start) = selector.start {
                skip_starts.insert(start);
            }
        }

        let mut stub_names = HashSet::new();
        let mut stub_starts = HashSet::new();
        let mut stub_bindings: HashMap<u32, String> = HashMap::new();
        for selector in &config.stub_implementations {
            let selector = parse_selector(selector);
            if let Some(start) = selector.start {
                stub_starts.insert(start);
                if let Some(name) = &selector.name {
                    if let Some(previous) = stub_bindings.insert(start, name.clone()) {
                        if &previous != name {
                            warn!(
                                "multiple stub handler bindings for 0x{start:x} \
                                 (keeping {name:?}, dropping {previous:?})"
                            );
                        }
                    }
                }
            } else if let Some(name) = selector.name {
                stub_names.insert(name);
            }
        }

        let bootstrap = build_bootstrap_info(&image, &sections, &symbols);
        let mut generator = CodeGenerator::new(&symbols);
        generator.set_bootstrap_info(bootstrap.clone());

        Ok(Self {
            config,
            image,
            functions,
            symbols,
            sections,
            relocations,
            decoded: HashMap::new(),
            skip_names,
            skip_starts,
            stub_names,
            stub_starts,
            stub_bindings,
            renames: HashMap::new(),
            generated_stubs: BTreeMap::new(),
            generator,
            bootstrap,
            summary: RecompileSummary::default(),
        })
    }

    /// The extracted symbol table.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The extracted relocations.
    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    /// Classifies and decodes every function, then runs entry discovery
    /// and reslicing until fixed point.
    pub fn recompile(&mut self) -> Result<RecompileSummary, RecompileError> {
        info!("recompiling {} function(s)", self.functions.len());

        for index in 0..self.functions.len() {
            let function = &self.functions[index];

            if self.is_stub_function(function) {
                let function = &mut self.functions[index];
                function.is_stub = true;
                continue;
            }
            if self.should_skip_function(function) {
                info!("skipping function (TODO wrapper): {}", function.name);
                let function = &mut self.functions[index];
                function.is_skipped = true;
                continue;
            }

            let function = &mut self.functions[index];
            match decode_function(&self.image, &self.config, function) {
                Some(instructions) => {
                    self.decoded.insert(function.start, instructions);
                    function.is_recompiled = true;
                }
                None => {
                    warn!("decode failed, skipping function: {}", function.name);
                    function.is_skipped = true;
                    self.summary.decode_failures += 1;
                }
            }
        }

        let image = &self.image;
        let config = &self.config;
        let discovered = discover_entry_points(
            &mut self.functions,
            &mut self.decoded,
            &self.sections,
            &mut |function| {
                decode_function(image, config, function).map(|instructions| {
                    (function.end, instructions)
                })
            },
        );
        if discovered > 0 {
            info!("discovered {discovered} additional entry point(s)");
        }

        let resliced = reslice_entry_functions(&mut self.functions, &mut self.decoded);
        if resliced > 0 {
            info!("resliced {resliced} entry function(s) after discovery");
        }

        self.summary.entries_discovered = discovered;
        self.summary.entries_resliced = resliced;
        self.summary.recompiled = self.functions.iter().filter(|f| f.is_recompiled).count();
        self.summary.stubs = self.functions.iter().filter(|f| f.is_stub).count();
        self.summary.skipped = self.functions.iter().filter(|f| f.is_skipped).count();

        Ok(self.summary)
    }

    /// Computes host names, builds the stub wrappers and writes every
    /// output file.
    pub fn generate_output(&mut self) -> Result<(), RecompileError> {
        self.compute_renames();
        self.build_stub_wrappers();

        std::fs::create_dir_all(&self.config.output_path).map_err(|source| {
            RecompileError::Output {
                path: self.config.output_path.clone(),
                source,
            }
        })?;

        if self.config.single_file_output {
            let mut combined = String::new();
            combined.push_str("#include \"ps2_recompiled_functions.h\"\n\n");
            combined.push_str("#include \"ps2_runtime_macros.h\"\n");
            combined.push_str("#include \"ps2_runtime.h\"\n");
            combined.push_str("#include \"ps2_recompiled_stubs.h\"\n");
            combined.push_str("#include \"ps2_syscalls.h\"\n");
            combined.push_str("#include \"ps2_stubs.h\"\n\n");

            for function in &self.functions {
                if !generates_code(function) {
                    continue;
                }
                if function.is_stub || function.is_skipped {
                    if let Some(stub) = self.generated_stubs.get(&function.start) {
                        combined.push_str(stub);
                        combined.push_str("\n\n");
                    }
                } else if let Some(instructions) = self.decoded.get(&function.start) {
                    combined.push_str(&self.generator.generate_function(
                        function,
                        instructions,
                        false,
                    ));
                    combined.push_str("\n\n");
                }
            }

            let path = self.config.output_path.join("ps2_recompiled_functions.cpp");
            self.write_file(&path, &combined)?;
            info!("wrote combined output to {}", path.display());
        } else {
            for index in 0..self.functions.len() {
                let function = &self.functions[index];
                if !generates_code(function) {
                    continue;
                }

                let code = if function.is_stub || function.is_skipped {
                    let Some(stub) = self.generated_stubs.get(&function.start) else {
                        continue;
                    };
                    let mut out = String::new();
                    out.push_str("#include \"ps2_runtime.h\"\n");
                    out.push_str("#include \"ps2_syscalls.h\"\n");
                    out.push_str("#include \"ps2_stubs.h\"\n\n");
                    out.push_str(stub);
                    out.push('\n');
                    out
                } else {
                    match self.decoded.get(&function.start) {
                        Some(instructions) => {
                            self.generator.generate_function(function, instructions, true)
                        }
                        None => continue,
                    }
                };

                let path = self.output_path_for(function);
                self.write_file(&path, &code)?;
            }
            info!(
                "wrote individual function files to {}",
                self.config.output_path.display()
            );
        }

        let registration = self.generator.generate_registration(&self.functions);
        let path = self.config.output_path.join("register_functions.cpp");
        self.write_file(&path, &registration)?;

        self.write_function_header()?;
        self.write_stub_header()?;
        Ok(())
    }

    /// The per-run statistics.
    pub fn summary(&self) -> RecompileSummary {
        self.summary
    }

    fn compute_renames(&mut self) {
        self.renames.clear();

        for function in &self.functions {
            if !generates_code(function) {
                continue;
            }

            let mut sanitized = sanitize_function_name(&function.name);
            if sanitized.is_empty() {
                sanitized = "func".into();
            }

            // A synthetic entry keeps its name and is suffixed with its
            // end so reslicing shows up in the identifier; everything
            // else gets the start address to keep duplicates apart.
            let name = if sanitized == format!("entry_{:x}", function.start) {
                format!("{sanitized}_0x{:x}", function.end)
            } else {
                format!("{sanitized}_0x{:x}", function.start)
            };
            self.renames.insert(function.start, name);
        }

        self.generator.set_renamed_functions(self.renames.clone());

        if self.bootstrap.valid {
            if let Some(name) = self.renames.get(&self.bootstrap.entry) {
                self.bootstrap.entry_name = name.clone();
            }
            self.generator.set_bootstrap_info(self.bootstrap.clone());
        }
    }

    fn build_stub_wrappers(&mut self) {
        self.generated_stubs.clear();

        for function in &self.functions {
            if !function.is_stub && !function.is_skipped {
                continue;
            }
            let Some(name) = self.generator.function_name(function.start) else {
                continue;
            };

            let dispatch = if function.is_skipped {
                format!(
                    "ps2_stubs::TODO_NAMED(\"{}\", rdram, ctx, runtime);",
                    escape_c_string(&function.name)
                )
            } else {
                let handler = self
                    .stub_bindings
                    .get(&function.start)
                    .cloned()
                    .unwrap_or_else(|| function.name.clone());

                if SYSCALL_NAMES.contains(handler.as_str()) {
                    format!("ps2_syscalls::{handler}(rdram, ctx, runtime);")
                } else if STUB_NAMES.contains(handler.as_str()) {
                    format!("ps2_stubs::{handler}(rdram, ctx, runtime);")
                } else {
                    format!(
                        "ps2_stubs::TODO_NAMED(\"{}\", rdram, ctx, runtime);",
                        escape_c_string(&handler)
                    )
                }
            };

            // When the handler did not move PC, a host return must
            // continue the guest's return sequence through $ra.
            let wrapper = format!(
                "void {name}(uint8_t* rdram, R5900Context* ctx, PS2Runtime* runtime) {{\n\
                 \x20   const uint32_t entryPc = ctx->pc;\n\
                 \x20   {dispatch}\n\
                 \x20   if (ctx->pc == entryPc)\n\
                 \x20   {{\n\
                 \x20       ctx->pc = GPR_U32(ctx, 31);\n\
                 \x20   }}\n\
                 }}"
            );
            self.generated_stubs.insert(function.start, wrapper);
        }
    }

    fn write_function_header(&self) -> Result<(), RecompileError> {
        let mut out = String::new();
        out.push_str("#ifndef PS2_RECOMPILED_FUNCTIONS_H\n");
        out.push_str("#define PS2_RECOMPILED_FUNCTIONS_H\n\n");
        out.push_str("#include <cstdint>\n\n");
        out.push_str("struct R5900Context;\n");
        out.push_str("class PS2Runtime;\n\n");

        for function in &self.functions {
            if !generates_code(function) {
                continue;
            }
            if let Some(name) = self.generator.function_name(function.start) {
                out.push_str(&format!(
                    "void {name}(uint8_t* rdram, R5900Context* ctx, PS2Runtime* runtime);\n"
                ));
            }
        }

        out.push_str("\n#endif // PS2_RECOMPILED_FUNCTIONS_H\n");
        let path = self.config.output_path.join("ps2_recompiled_functions.h");
        self.write_file(&path, &out)
    }

    fn write_stub_header(&self) -> Result<(), RecompileError> {
        let mut out = String::new();
        out.push_str("#pragma once\n\n");
        out.push_str("#include <cstdint>\n");
        out.push_str("#include \"ps2_runtime.h\"\n");
        out.push_str("#include \"ps2_syscalls.h\"\n\n");

        let mut declared = HashSet::new();
        for function in &self.functions {
            if !function.is_stub && !function.is_skipped {
                continue;
            }
            let Some(name) = self.generator.function_name(function.start) else {
                continue;
            };
            if declared.insert(name.clone()) {
                out.push_str(&format!(
                    "void {name}(uint8_t* rdram, R5900Context* ctx, PS2Runtime* runtime);\n"
                ));
            }
        }

        let path = self.config.output_path.join("ps2_recompiled_stubs.h");
        self.write_file(&path, &out)
    }

    fn output_path_for(&self, function: &Function) -> PathBuf {
        let (mut safe_name, renamed) = match self.renames.get(&function.start) {
            Some(name) if !name.is_empty() => (name.clone(), true),
            _ => (sanitize_function_name(&function.name), false),
        };

        safe_name = safe_name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '$' => '_',
                other => other,
            })
            .collect();

        if safe_name.is_empty() {
            safe_name = format!("func_{:x}", function.start);
        }
        if !renamed {
            let suffix = format!("_0x{:x}", function.start);
            if !safe_name.ends_with(&suffix) {
                safe_name.push_str(&suffix);
            }
        }

        self.config.output_path.join(format!("{safe_name}.cpp"))
    }

    fn write_file(&self, path: &PathBuf, content: &str) -> Result<(), RecompileError> {
        std::fs::write(path, content).map_err(|source| RecompileError::Output {
            path: path.clone(),
            source,
        })
    }

    fn should_skip_function(&self, function: &Function) -> bool {
        self.skip_starts.contains(&function.start) || self.skip_names.contains(&function.name)
    }

    fn is_stub_function(&self, function: &Function) -> bool {
        self.stub_starts.contains(&function.start)
            || self.stub_names.contains(&function.name)
            || SYSCALL_NAMES.contains(function.name.as_str())
            || STUB_NAMES.contains(function.name.as_str())
    }
}

fn generates_code(function: &Function) -> bool {
    function.is_recompiled || function.is_stub || function.is_skipped
}

fn build_bootstrap_info(
    image: &ElfImage,
    sections: &[Section],
    symbols: &[Symbol],
) -> BootstrapInfo {
    let entry = image.entry_point();
    let mut info = BootstrapInfo::default();
    if entry == 0 {
        return info;
    }

    let mut bss_start = u32::MAX;
    let mut bss_end = 0;
    for section in sections {
        if section.is_bss() && section.size > 0 {
            bss_start = bss_start.min(section.address);
            bss_end = bss_end.max(section.address.wrapping_add(section.size));
        }
    }

    info.valid = true;
    info.entry = entry;
    if bss_start != u32::MAX && bss_end > bss_start {
        info.bss_start = bss_start;
        info.bss_end = bss_end;
    }
    info.gp = symbols
        .iter()
        .find(|s| s.name == "_gp")
        .map(|s| s.address)
        .unwrap_or(0);
    info
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchClass {
    Generic,
    Syscall,
    Cop0,
    Cache,
}

fn classify_patched_instruction(raw: u32) -> PatchClass {
    let op = opcode(raw);
    if op == OPCODE_SPECIAL && function(raw) == SPECIAL_SYSCALL {
        PatchClass::Syscall
    } else if op == OPCODE_COP0 {
        PatchClass::Cop0
    } else if op == OPCODE_CACHE {
        PatchClass::Cache
    } else {
        PatchClass::Generic
    }
}

fn patch_allowed(class: PatchClass, config: &RecompilerConfig) -> bool {
    match class {
        PatchClass::Syscall => config.patch_syscalls,
        PatchClass::Cop0 => config.patch_cop0,
        PatchClass::Cache => config.patch_cache,
        PatchClass::Generic => true,
    }
}

// Decodes one function's range; truncates at the first invalid address
// and updates the function end accordingly. None when nothing decodes.
fn decode_function(
    image: &ElfImage,
    config: &RecompilerConfig,
    function: &mut Function,
) -> Option<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut truncated = false;

    let mut address = function.start;
    while address < function.end {
        if !image.is_valid_address(address) {
            warn!(
                "invalid address 0x{address:x} in function {} (truncating decode)",
                function.name
            );
            truncated = true;
            break;
        }
        let Ok(mut raw) = image.read_word(address) else {
            truncated = true;
            break;
        };

        if let Some(patched) = config.patches.get(&address) {
            if patch_allowed(classify_patched_instruction(raw), config) {
                info!("applied patch at 0x{address:x}");
                raw = *patched;
            }
        }

        let mut inst = decode(address, raw);
        if let Some(mmio) = config.mmio_by_instruction_address.get(&address) {
            if inst.is_load || inst.is_store {
                inst.is_mmio = true;
                inst.mmio_address = *mmio;
            }
        }

        instructions.push(inst);
        address = address.wrapping_add(4);
    }

    if instructions.is_empty() {
        warn!(
            "no decodable instructions for function {} (0x{:x})",
            function.name, function.start
        );
        return None;
    }

    if truncated {
        function.end = instructions.last().map(|i| i.address + 4).unwrap_or(function.end);
    }

    Some(instructions)
}

fn static_entry_target(inst: &Instruction) -> Option<u32> {
    if inst.opcode == OPCODE_J || inst.opcode == OPCODE_JAL {
        Some(inst.jump_target())
    } else {
        None
    }
}

fn is_executable_address(sections: &[Section], address: u32) -> bool {
    sections.iter().any(|section| {
        section.is_code()
            && address >= section.address
            && address < section.address.wrapping_add(section.size)
    })
}

// The innermost recompiled function whose decoded slice holds this
// address.
fn find_containing_function<'a>(
    functions: &'a [Function],
    decoded: &HashMap<u32, Vec<Instruction>>,
    address: u32,
    allow_entries: bool,
) -> Option<&'a Function> {
    let mut best: Option<&Function> = None;
    for function in functions {
        if address < function.start || address >= function.end {
            continue;
        }
        if !function.is_recompiled || function.is_stub || function.is_skipped {
            continue;
        }
        if !allow_entries && is_entry_function_name(&function.name) {
            continue;
        }
        let Some(instructions) = decoded.get(&function.start) else {
            continue;
        };
        if !instructions.iter().any(|i| i.address == address) {
            continue;
        }
        match best {
            Some(current) if function.start <= current.start => {}
            _ => best = Some(function),
        }
    }
    best
}

fn is_entry_function_name(name: &str) -> bool {
    name.starts_with("entry_")
}

/// Scans decoded instructions for static jump/call targets landing
/// inside existing functions (or in unclaimed executable memory) and
/// materialises an `entry_<hex>` function for each. Repeats until a
/// full pass discovers nothing new; returns the number of functions
/// added.
///
/// `decode_external` supplies the slice for a target outside every
/// known function: it receives the prepared entry function (with a
/// tentative end) and returns the decoded slice plus the possibly
/// truncated end address.
pub fn discover_entry_points(
    functions: &mut Vec<Function>,
    decoded: &mut HashMap<u32, Vec<Instruction>>,
    sections: &[Section],
    decode_external: &mut dyn FnMut(&mut Function) -> Option<(u32, Vec<Instruction>)>,
) -> usize {
    let mut existing_starts: HashSet<u32> = functions.iter().map(|f| f.start).collect();
    let mut discovered = 0;

    loop {
        struct Pending {
            target: u32,
            containing_start: Option<u32>,
            containing_end: u32,
        }

        let mut pending: Vec<Pending> = Vec::new();
        let mut pending_starts = HashSet::new();

        for function in functions.iter() {
            if !function.is_recompiled || function.is_stub || function.is_skipped {
                continue;
            }
            let Some(instructions) = decoded.get(&function.start) else {
                continue;
            };

            for inst in instructions {
                let Some(target) = static_entry_target(inst) else {
                    continue;
                };
                if target & 0x3 != 0 || !is_executable_address(sections, target) {
                    continue;
                }
                if existing_starts.contains(&target) || pending_starts.contains(&target) {
                    continue;
                }

                let containing = find_containing_function(functions, decoded, target, true);
                if let Some(containing) = containing {
                    // Targets inside the same function stay labels.
                    if containing.start == function.start {
                        continue;
                    }
                }

                pending.push(Pending {
                    target,
                    containing_start: containing.map(|f| f.start),
                    containing_end: containing.map(|f| f.end).unwrap_or(0),
                });
                pending_starts.insert(target);
            }
        }

        if pending.is_empty() {
            break;
        }
        pending.sort_by_key(|p| p.target);

        let mut boundary_starts: Vec<u32> = existing_starts
            .iter()
            .chain(pending_starts.iter())
            .copied()
            .collect();
        boundary_starts.sort_unstable();
        boundary_starts.dedup();

        let next_boundary = |address: u32| -> Option<u32> {
            boundary_starts
                .iter()
                .copied()
                .find(|&start| start > address)
        };

        let mut new_entries = Vec::new();

        for item in &pending {
            let target = item.target;
            let mut entry = Function {
                name: format!("entry_{target:x}"),
                start: target,
                end: 0,
                is_recompiled: true,
                ..Function::default()
            };

            if let Some(containing_start) = item.containing_start {
                let Some(containing_instructions) = decoded.get(&containing_start) else {
                    continue;
                };
                let Some(slice_start) = containing_instructions
                    .iter()
                    .position(|i| i.address == target)
                else {
                    continue;
                };

                let mut slice_end_address = item.containing_end;
                if let Some(next) = next_boundary(target) {
                    if next < slice_end_address {
                        slice_end_address = next;
                    }
                }
                if slice_end_address <= target {
                    continue;
                }

                let slice: Vec<Instruction> = containing_instructions[slice_start..]
                    .iter()
                    .take_while(|i| i.address < slice_end_address)
                    .cloned()
                    .collect();
                if slice.is_empty() {
                    continue;
                }

                entry.end = slice_end_address;
                decoded.insert(target, slice);
            } else {
                let Some(next) = next_boundary(target) else {
                    continue;
                };
                if next <= target {
                    continue;
                }
                entry.end = next;
                let Some((end, instructions)) = decode_external(&mut entry) else {
                    continue;
                };
                entry.end = end;
                decoded.insert(target, instructions);
            }

            new_entries.push(entry);
        }

        if new_entries.is_empty() {
            break;
        }

        discovered += new_entries.len();
        for entry in &new_entries {
            existing_starts.insert(entry.start);
        }
        functions.extend(new_entries);
        functions.sort_by_key(|f| f.start);
    }

    discovered
}

/// Recomputes the slice of every `entry_*` function after discovery:
/// the end becomes the nearest boundary after its start (bounded by the
/// containing function), and the decoded slice is rebuilt from the
/// containing function's instructions. Returns how many entries
/// changed. Running this twice in a row changes nothing.
pub fn reslice_entry_functions(
    functions: &mut [Function],
    decoded: &mut HashMap<u32, Vec<Instruction>>,
) -> usize {
    let boundary_starts: Vec<u32> = {
        let mut starts: Vec<u32> = functions
            .iter()
            .filter(|f| f.is_recompiled && !f.is_stub && !f.is_skipped)
            .map(|f| f.start)
            .collect();
        starts.sort_unstable();
        starts.dedup();
        starts
    };

    let mut resliced = 0;

    for index in 0..functions.len() {
        let function = &functions[index];
        if !function.is_recompiled || function.is_stub || function.is_skipped {
            continue;
        }
        if !is_entry_function_name(&function.name) {
            continue;
        }

        let start = function.start;
        let containing =
            find_containing_function(functions, decoded, start, false).map(|f| (f.start, f.end));

        let mut slice_end = containing.map(|(_, end)| end).unwrap_or(functions[index].end);
        if let Some(next) = boundary_starts.iter().copied().find(|&s| s > start) {
            if next < slice_end {
                slice_end = next;
            }
        }
        if slice_end <= start {
            continue;
        }

        let source_key = containing.map(|(s, _)| s).unwrap_or(start);
        let Some(source) = decoded.get(&source_key) else {
            continue;
        };
        let Some(slice_start) = source.iter().position(|i| i.address == start) else {
            continue;
        };
        let slice: Vec<Instruction> = source[slice_start..]
            .iter()
            .take_while(|i| i.address < slice_end)
            .cloned()
            .collect();
        if slice.is_empty() {
            continue;
        }

        let mut changed = functions[index].end != slice_end;
        match decoded.get(&start) {
            None => changed = true,
            Some(existing) if !changed => {
                if existing.len() != slice.len() {
                    changed = true;
                } else if let (Some(a), Some(b)) = (existing.first(), slice.first()) {
                    if a.address != b.address {
                        changed = true;
                    }
                }
            }
            _ => {}
        }

        functions[index].end = slice_end;
        decoded.insert(start, slice);
        if changed {
            resliced += 1;
        }
    }

    resliced
}

fn escape_c_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_quotes_and_backslashes() {
        assert_eq!(escape_c_string("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn patch_classes_gate_on_config() {
        let syscall = (OPCODE_SPECIAL << 26) | SPECIAL_SYSCALL;
        let cache = OPCODE_CACHE << 26;
        assert_eq!(classify_patched_instruction(syscall), PatchClass::Syscall);
        assert_eq!(classify_patched_instruction(cache), PatchClass::Cache);
        assert_eq!(
            classify_patched_instruction(OPCODE_COP0 << 26),
            PatchClass::Cop0
        );
        assert_eq!(classify_patched_instruction(0), PatchClass::Generic);

        let config = RecompilerConfig::default();
        assert!(patch_allowed(PatchClass::Generic, &config));
        assert!(!patch_allowed(PatchClass::Syscall, &config));
    }
}
