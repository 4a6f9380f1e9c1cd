//! The code generator: decoded instructions in, C++ source out.
//!
//! One guest function becomes one host function with the fixed
//! signature `void name(uint8_t* rdram, R5900Context* ctx, PS2Runtime*
//! runtime)`. Within a function, intra-function control transfers become
//! labels and gotos, cross-function transfers become calls or tail
//! returns, and every instruction keeps `ctx->pc` observable so a guest
//! exception handler can re-enter at any point.
//!
//! The emitted code speaks the runtime's macro vocabulary (`GPR_*`,
//! `SET_GPR_*`, `READ*`/`WRITE*`, `FPU_*`, `PS2_*`) and calls into the
//! runtime's capability set for everything the generator does not model
//! (syscalls, traps, TLB, MMIO, VU0 microprograms).
//!
//! The scalar core, COP0 and COP1 live here; the MMI group and the VU0
//! macro group are in the `mmi` and `vu` submodules.

use std::collections::{BTreeSet, HashMap};

use crate::consts::*;
use crate::decoder::Instruction;
use crate::elf::Symbol;
use crate::recompiler::Function;

mod mmi;
mod vu;

/// Entry/bootstrap facts handed to the registration table.
#[derive(Debug, Clone, Default)]
pub struct BootstrapInfo {
    /// The ELF reported a usable entry point.
    pub valid: bool,
    /// Entry address.
    pub entry: u32,
    /// Start of the BSS range, 0 when absent.
    pub bss_start: u32,
    /// End of the BSS range, 0 when absent.
    pub bss_end: u32,
    /// Value of the `_gp` symbol, 0 when absent.
    pub gp: u32,
    /// Final host name of the entry function.
    pub entry_name: String,
}

/// Emits host source for decoded guest functions.
pub struct CodeGenerator {
    symbols: HashMap<u32, Symbol>,
    renamed: HashMap<u32, String>,
    bootstrap: BootstrapInfo,
}

impl CodeGenerator {
    /// Creates a generator resolving call targets through `symbols`.
    pub fn new(symbols: &[Symbol]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| (s.address, s.clone())).collect(),
            renamed: HashMap::new(),
            bootstrap: BootstrapInfo::default(),
        }
    }

    /// Installs the final per-address host names. Renames take priority
    /// over symbol names everywhere a call target is printed.
    pub fn set_renamed_functions(&mut self, renames: HashMap<u32, String>) {
        self.renamed = renames;
    }

    /// Installs the bootstrap facts used by the registration table.
    pub fn set_bootstrap_info(&mut self, info: BootstrapInfo) {
        self.bootstrap = info;
    }

    /// The host name for a guest address: the rename when one exists,
    /// otherwise the sanitized function symbol at that address.
    pub fn function_name(&self, address: u32) -> Option<String> {
        if let Some(name) = self.renamed.get(&address) {
            return Some(name.clone());
        }
        match self.symbols.get(&address) {
            Some(symbol) if symbol.is_function => {
                let name = sanitize_function_name(&symbol.name);
                (!name.is_empty()).then_some(name)
            }
            _ => None,
        }
    }

    /// Collects every address inside `function` that needs a label: the
    /// targets of intra-function branches and static jumps, and the
    /// return address of every internal JAL (so a later `jr $ra` can be
    /// resolved to a local goto).
    pub fn collect_internal_targets(
        function: &Function,
        instructions: &[Instruction],
    ) -> BTreeSet<u32> {
        let addresses: BTreeSet<u32> = instructions.iter().map(|i| i.address).collect();
        let mut targets = BTreeSet::new();

        let in_function = |target: u32| {
            target >= function.start && target < function.end && addresses.contains(&target)
        };

        for inst in instructions {
            if inst.is_branch && inst.opcode != OPCODE_J && inst.opcode != OPCODE_JAL {
                let target = inst.branch_target();
                if in_function(target) {
                    targets.insert(target);
                }
            } else if inst.opcode == OPCODE_J || inst.opcode == OPCODE_JAL {
                let target = inst.jump_target();
                if in_function(target) {
                    targets.insert(target);
                    if inst.opcode == OPCODE_JAL {
                        let return_addr = inst.address.wrapping_add(8);
                        if in_function(return_addr) {
                            targets.insert(return_addr);
                        }
                    }
                }
            }
        }

        targets
    }

    /// Emits the complete host function for one decoded guest function.
    pub fn generate_function(
        &self,
        function: &Function,
        instructions: &[Instruction],
        emit_headers: bool,
    ) -> String {
        let targets = Self::collect_internal_targets(function, instructions);
        let mut out = String::new();

        if emit_headers {
            out.push_str("#include \"ps2_runtime_macros.h\"\n");
            out.push_str("#include \"ps2_runtime.h\"\n");
            out.push_str("#include \"ps2_recompiled_functions.h\"\n");
            out.push_str("#include \"ps2_recompiled_stubs.h\"\n\n");
        }

        out.push_str(&format!("// Function: {}\n", function.name));
        out.push_str(&format!(
            "// Address: 0x{:x} - 0x{:x}\n",
            function.start, function.end
        ));

        let name = self
            .function_name(function.start)
            .unwrap_or_else(|| format!("func_{:x}", function.start));

        out.push_str(&format!(
            "void {name}(uint8_t* rdram, R5900Context* ctx, PS2Runtime* runtime) {{\n\n"
        ));
        out.push_str(&format!("    ctx->pc = 0x{:X}u;\n\n", function.start));

        let mut i = 0;
        while i < instructions.len() {
            let inst = &instructions[i];

            if targets.contains(&inst.address) {
                out.push_str(&format!("label_{:x}:\n", inst.address));
            }

            out.push_str(&format!("    // 0x{:x}: 0x{:x}\n", inst.address, inst.raw));

            if inst.has_delay_slot && i + 1 < instructions.len() {
                let delay = &instructions[i + 1];
                if targets.contains(&delay.address) {
                    out.push_str(&format!("label_{:x}:\n", delay.address));
                }
                out.push_str(&self.handle_branch_delay_slots(inst, delay, function, &targets));
                i += 2;
            } else {
                out.push_str(&format!("    ctx->pc = 0x{:X}u;\n", inst.address));
                out.push_str(&format!("    {}", self.translate(inst)));
                if inst.is_mmio {
                    out.push_str(&format!(" // MMIO: 0x{:x}", inst.mmio_address));
                }
                out.push('\n');
                i += 1;
            }
        }

        out.push_str("}\n");
        out
    }

    /// Lowers one branch/jump plus its delay slot into host control
    /// flow. The emitted shape preserves the architectural ordering:
    /// condition uses pre-delay register state, the link register is
    /// written before the delay slot, likely variants skip the delay
    /// slot when not taken.
    pub fn handle_branch_delay_slots(
        &self,
        branch: &Instruction,
        delay: &Instruction,
        _function: &Function,
        targets: &BTreeSet<u32>,
    ) -> String {
        let mut out = String::new();

        let has_delay_code = !delay.is_nop();
        let delay_code = if has_delay_code {
            self.translate(delay)
        } else {
            String::new()
        };

        let branch_pc = branch.address;
        let delay_pc = branch_pc.wrapping_add(4);
        let fallthrough_pc = branch_pc.wrapping_add(8);

        // A branch into the delay slot must execute only the delay slot
        // and rejoin the sequential code after the branch.
        if targets.contains(&delay_pc) {
            out.push_str(&format!("    if (ctx->pc == 0x{delay_pc:X}u) {{\n"));
            if has_delay_code {
                out.push_str(&format!("        ctx->pc = 0x{delay_pc:X}u;\n"));
                out.push_str(&format!("        {delay_code}\n"));
            }
            out.push_str(&format!("        ctx->pc = 0x{fallthrough_pc:X}u;\n"));
            if targets.contains(&fallthrough_pc) {
                out.push_str(&format!("        goto label_{fallthrough_pc:x};\n"));
            } else {
                out.push_str(&format!("        goto label_fallthrough_0x{branch_pc:x};\n"));
            }
            out.push_str("    }\n");
        }

        out.push_str(&format!("    ctx->pc = 0x{branch_pc:X}u;\n"));

        if branch.opcode == OPCODE_J || branch.opcode == OPCODE_JAL {
            // Static jump: link, delay slot, then the absolute target.
            if branch.opcode == OPCODE_JAL {
                out.push_str(&format!("    SET_GPR_U32(ctx, 31, 0x{fallthrough_pc:X}u);\n"));
            }
            if has_delay_code {
                out.push_str(&format!("    ctx->pc = 0x{delay_pc:X}u;\n"));
                out.push_str(&format!("    {delay_code}\n"));
            }

            let target = branch.jump_target();
            out.push_str(&format!("    ctx->pc = 0x{target:X}u;\n"));

            if targets.contains(&target) {
                out.push_str(&format!("    goto label_{target:x};\n"));
            } else if let Some(name) = self.function_name(target) {
                if branch.opcode == OPCODE_J {
                    out.push_str(&format!("    {name}(rdram, ctx, runtime); return;\n"));
                } else {
                    out.push_str(&format!("    {name}(rdram, ctx, runtime);\n"));
                    out.push_str(&format!(
                        "    if (ctx->pc != 0x{fallthrough_pc:X}u) {{ return; }}\n"
                    ));
                }
            } else {
                out.push_str("    {\n");
                out.push_str(&format!(
                    "        auto targetFn = runtime->lookupFunction(0x{target:X}u);\n"
                ));
                out.push_str("        targetFn(rdram, ctx, runtime);\n");
                if branch.opcode == OPCODE_J {
                    out.push_str("        return;\n");
                } else {
                    out.push_str(&format!(
                        "        if (ctx->pc != 0x{fallthrough_pc:X}u) {{ return; }}\n"
                    ));
                }
                out.push_str("    }\n");
            }
        } else if branch.opcode == OPCODE_SPECIAL
            && (branch.function == SPECIAL_JR || branch.function == SPECIAL_JALR)
        {
            // Register jump: the target is read before the delay slot
            // can clobber rs.
            out.push_str("    {\n");
            out.push_str(&format!(
                "        uint32_t jumpTarget = GPR_U32(ctx, {});\n",
                branch.rs
            ));

            if branch.function == SPECIAL_JALR && branch.rd != 0 {
                out.push_str(&format!(
                    "        SET_GPR_U32(ctx, {}, 0x{fallthrough_pc:X}u);\n",
                    branch.rd
                ));
            }
            if has_delay_code {
                out.push_str(&format!("        ctx->pc = 0x{delay_pc:X}u;\n"));
                out.push_str(&format!("        {delay_code}\n"));
            }

            out.push_str("        ctx->pc = jumpTarget;\n");

            if branch.function == SPECIAL_JR && branch.rs == 31 && !targets.is_empty() {
                // The return address of every internal JAL is a known
                // target, so a return into this function stays local.
                out.push_str("        switch (jumpTarget) {\n");
                for target in targets {
                    out.push_str(&format!(
                        "            case 0x{target:X}u: goto label_{target:x};\n"
                    ));
                }
                out.push_str("            default: break;\n");
                out.push_str("        }\n");
            }

            if branch.function == SPECIAL_JR {
                out.push_str("        return;\n");
            } else {
                out.push_str("        {\n");
                out.push_str("            auto targetFn = runtime->lookupFunction(jumpTarget);\n");
                out.push_str("            targetFn(rdram, ctx, runtime);\n");
                out.push_str(&format!(
                    "            if (ctx->pc != 0x{fallthrough_pc:X}u) {{ return; }}\n"
                ));
                out.push_str("        }\n");
            }

            out.push_str("    }\n");
        } else if branch.is_branch {
            let (condition, link) = branch_condition(branch, fallthrough_pc);
            let is_likely = is_likely_branch(branch);
            let target = branch.branch_target();
            let taken = format!("branch_taken_0x{branch_pc:x}");

            out.push_str("    {\n");
            out.push_str(&format!("        const bool {taken} = ({condition});\n"));

            if is_likely {
                // Likely variants nullify the delay slot when not taken;
                // the link still happens only on the taken path.
                out.push_str(&format!("        if ({taken}) {{\n"));
                if let Some(link) = &link {
                    out.push_str(&format!("            {link}\n"));
                }
                if has_delay_code {
                    out.push_str(&format!("            ctx->pc = 0x{delay_pc:X}u;\n"));
                    out.push_str(&format!("            {delay_code}\n"));
                }
                out.push_str(&format!("            ctx->pc = 0x{target:X}u;\n"));
                if targets.contains(&target) {
                    out.push_str(&format!("            goto label_{target:x};\n"));
                } else {
                    out.push_str("            return;\n");
                }
                out.push_str("        }\n");
            } else {
                // The architectural link is unconditional and precedes
                // the delay slot.
                if let Some(link) = &link {
                    out.push_str(&format!("        {link}\n"));
                }
                if has_delay_code {
                    out.push_str(&format!("        ctx->pc = 0x{delay_pc:X}u;\n"));
                    out.push_str(&format!("        {delay_code}\n"));
                }
                out.push_str(&format!("        if ({taken}) {{\n"));
                out.push_str(&format!("            ctx->pc = 0x{target:X}u;\n"));
                if targets.contains(&target) {
                    out.push_str(&format!("            goto label_{target:x};\n"));
                } else {
                    out.push_str("            return;\n");
                }
                out.push_str("        }\n");
            }

            out.push_str("    }\n");
        } else {
            out.push_str(&format!("    {}\n", self.translate(branch)));
            if has_delay_code {
                out.push_str(&format!("    ctx->pc = 0x{delay_pc:X}u;\n"));
                out.push_str(&format!("    {delay_code}\n"));
            }
        }

        if targets.contains(&delay_pc) && !targets.contains(&fallthrough_pc) {
            out.push_str(&format!("label_fallthrough_0x{branch_pc:x}:\n"));
        }

        out.push_str(&format!("    ctx->pc = 0x{fallthrough_pc:X}u;\n"));
        out
    }

    /// Emits the `registerAllFunctions` translation unit: one
    /// registration per generated function, the bootstrap entry first.
    pub fn generate_registration(&self, functions: &[Function]) -> String {
        let mut out = String::new();
        out.push_str("#include \"ps2_runtime.h\"\n");
        out.push_str("#include \"ps2_recompiled_functions.h\"\n");
        out.push_str("#include \"ps2_recompiled_stubs.h\"\n\n");
        out.push_str("void registerAllFunctions(PS2Runtime& runtime) {\n");

        let mut registered = BTreeSet::new();
        let mut emit = |out: &mut String, address: u32, name: &str| {
            if registered.insert(address) {
                out.push_str(&format!(
                    "    runtime.registerFunction(0x{address:x}, {name});\n"
                ));
            }
        };

        let mut normal = Vec::new();
        let mut stubs = Vec::new();
        let mut syscalls = Vec::new();
        let mut library = Vec::new();

        for function in functions {
            if !function.is_recompiled && !function.is_stub && !function.is_skipped {
                continue;
            }
            let Some(name) = self.function_name(function.start) else {
                continue;
            };

            if function.is_skipped {
                library.push((function.start, name));
            } else if function.is_stub {
                if SYSCALL_NAMES.contains(function.name.as_str()) {
                    syscalls.push((function.start, name));
                } else {
                    stubs.push((function.start, name));
                }
            } else {
                normal.push((function.start, name));
            }
        }

        if self.bootstrap.valid {
            let entry_name = if !self.bootstrap.entry_name.is_empty() {
                Some(self.bootstrap.entry_name.clone())
            } else {
                self.function_name(self.bootstrap.entry)
            };
            if let Some(entry_name) = entry_name {
                out.push_str("    // Register ELF entry function\n");
                emit(&mut out, self.bootstrap.entry, &entry_name);
                out.push('\n');
            }
        }

        out.push_str("    // Register recompiled functions\n");
        for (address, name) in &normal {
            emit(&mut out, *address, name);
        }
        out.push_str("\n    // Register stub functions\n");
        for (address, name) in &stubs {
            emit(&mut out, *address, name);
        }
        out.push_str("\n    // Register system call stubs\n");
        for (address, name) in &syscalls {
            emit(&mut out, *address, name);
        }
        out.push_str("\n    // Register library stubs\n");
        for (address, name) in &library {
            emit(&mut out, *address, name);
        }

        out.push_str("}\n");
        out
    }

    /// Translates one non-branching instruction into a host statement.
    pub fn translate(&self, inst: &Instruction) -> String {
        if inst.is_mmi {
            return mmi::translate_mmi(inst);
        }

        let rs = inst.rs;
        let rt = inst.rt;
        let simm = inst.simmediate as i32;
        let imm = inst.immediate;
        let addr = format!("ADD32(GPR_U32(ctx, {rs}), {simm})");

        match inst.opcode {
            OPCODE_SPECIAL => self.translate_special(inst),
            OPCODE_REGIMM => translate_regimm(inst),
            OPCODE_COP0 => translate_cop0(inst),
            OPCODE_COP1 => translate_fpu(inst),
            OPCODE_COP2 => vu::translate_vu(inst),

            OPCODE_ADDI => {
                if rt == 0 {
                    return "// NOP (addi to $zero)".into();
                }
                format!(
                    "{{ uint32_t tmp; bool ov; \
                     ADD32_OV(GPR_U32(ctx, {rs}), (uint32_t){simm}, tmp, ov); \
                     if (ov) runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                     else SET_GPR_S32(ctx, {rt}, (int32_t)tmp); }}"
                )
            }
            OPCODE_ADDIU => {
                if rt == 0 {
                    return "// NOP (addiu to $zero)".into();
                }
                format!("SET_GPR_S32(ctx, {rt}, ADD32(GPR_U32(ctx, {rs}), {simm}));")
            }
            OPCODE_SLTI => format!("SET_GPR_U32(ctx, {rt}, SLT32(GPR_S32(ctx, {rs}), {simm}));"),
            OPCODE_SLTIU => {
                format!("SET_GPR_U32(ctx, {rt}, SLTU32(GPR_U32(ctx, {rs}), (uint32_t){simm}));")
            }
            OPCODE_ANDI => format!("SET_GPR_U32(ctx, {rt}, AND32(GPR_U32(ctx, {rs}), {imm}));"),
            OPCODE_ORI => format!("SET_GPR_U32(ctx, {rt}, OR32(GPR_U32(ctx, {rs}), {imm}));"),
            OPCODE_XORI => format!("SET_GPR_U32(ctx, {rt}, XOR32(GPR_U32(ctx, {rs}), {imm}));"),
            OPCODE_LUI => format!("SET_GPR_U32(ctx, {rt}, ((uint32_t){imm} << 16));"),

            OPCODE_DADDI => format!(
                "{{ int64_t src = (int64_t)GPR_S64(ctx, {rs}); \
                 int64_t imm = (int64_t){simm}; \
                 int64_t res = src + imm; \
                 if (((src ^ imm) >= 0) && ((src ^ res) < 0)) \
                 runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                 else SET_GPR_S64(ctx, {rt}, res); }}"
            ),
            OPCODE_DADDIU => {
                format!("SET_GPR_S64(ctx, {rt}, (int64_t)GPR_S64(ctx, {rs}) + (int64_t){simm});")
            }

            OPCODE_LB => format!(
                "SET_GPR_S32(ctx, {rt}, (int8_t){});",
                gen_read(inst, 8, &addr)
            ),
            OPCODE_LH => format!(
                "SET_GPR_S32(ctx, {rt}, (int16_t){});",
                gen_read(inst, 16, &addr)
            ),
            OPCODE_LW => format!(
                "SET_GPR_S32(ctx, {rt}, (int32_t){});",
                gen_read(inst, 32, &addr)
            ),
            OPCODE_LBU => format!(
                "SET_GPR_U32(ctx, {rt}, (uint8_t){});",
                gen_read(inst, 8, &addr)
            ),
            OPCODE_LHU => format!(
                "SET_GPR_U32(ctx, {rt}, (uint16_t){});",
                gen_read(inst, 16, &addr)
            ),
            OPCODE_LWU => format!("SET_GPR_U64(ctx, {rt}, (uint64_t){});", gen_read(inst, 32, &addr)),
            OPCODE_LD => format!("SET_GPR_U64(ctx, {rt}, {});", gen_read(inst, 64, &addr)),
            OPCODE_LQ => format!("SET_GPR_VEC(ctx, {rt}, {});", gen_read(inst, 128, &addr)),

            OPCODE_SB => format!(
                "{};",
                gen_write(inst, 8, &addr, &format!("(uint8_t)GPR_U32(ctx, {rt})"))
            ),
            OPCODE_SH => format!(
                "{};",
                gen_write(inst, 16, &addr, &format!("(uint16_t)GPR_U32(ctx, {rt})"))
            ),
            OPCODE_SW => format!(
                "{};",
                gen_write(inst, 32, &addr, &format!("GPR_U32(ctx, {rt})"))
            ),
            OPCODE_SD => format!(
                "{};",
                gen_write(inst, 64, &addr, &format!("GPR_U64(ctx, {rt})"))
            ),
            OPCODE_SQ => format!(
                "{};",
                gen_write(inst, 128, &addr, &format!("GPR_VEC(ctx, {rt})"))
            ),

            OPCODE_LL => format!(
                "SET_GPR_S32(ctx, {rt}, (int32_t){}); // LL: link state tracked by the runtime",
                gen_read(inst, 32, &addr)
            ),
            OPCODE_LLD => format!(
                "SET_GPR_U64(ctx, {rt}, {}); // LLD: link state tracked by the runtime",
                gen_read(inst, 64, &addr)
            ),
            OPCODE_SC => format!(
                "{{ {}; SET_GPR_U32(ctx, {rt}, 1); }} // SC always succeeds",
                gen_write(inst, 32, &addr, &format!("GPR_U32(ctx, {rt})"))
            ),
            OPCODE_SCD => format!(
                "{{ {}; SET_GPR_U32(ctx, {rt}, 1); }} // SCD always succeeds",
                gen_write(inst, 64, &addr, &format!("GPR_U64(ctx, {rt})"))
            ),

            OPCODE_LWC1 => format!(
                "{{ uint32_t bits = {}; std::memcpy(&ctx->f[{rt}], &bits, sizeof(bits)); }}",
                gen_read(inst, 32, &addr)
            ),
            OPCODE_SWC1 => format!(
                "{{ uint32_t bits; std::memcpy(&bits, &ctx->f[{rt}], sizeof(bits)); {}; }}",
                gen_write(inst, 32, &addr, "bits")
            ),
            OPCODE_LDC1 => format!(
                "{{ uint64_t bits = {}; std::memcpy(&ctx->f[{rt}], &bits, sizeof(bits)); }}",
                gen_read(inst, 64, &addr)
            ),
            OPCODE_SDC1 => format!(
                "{{ uint64_t bits; std::memcpy(&bits, &ctx->f[{rt}], sizeof(bits)); {}; }}",
                gen_write(inst, 64, &addr, "bits")
            ),

            OPCODE_LWC2 | OPCODE_LDC2 => format!(
                "ctx->vu0_vf[{rt}] = _mm_castsi128_ps({});",
                gen_read(inst, 128, &addr)
            ),
            OPCODE_SWC2 | OPCODE_SDC2 => format!(
                "{};",
                gen_write(
                    inst,
                    128,
                    &addr,
                    &format!("_mm_castps_si128(ctx->vu0_vf[{rt}])")
                )
            ),

            OPCODE_LWL => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (3 - (addr & 3)) << 3; \
                 uint32_t mask = 0xFFFFFFFF << shift; \
                 uint32_t aligned_word = {}; \
                 SET_GPR_U32(ctx, {rt}, (GPR_U32(ctx, {rt}) & ~mask) | ((aligned_word << shift) & mask)); }}",
                gen_read(inst, 32, "addr & ~3u")
            ),
            OPCODE_LWR => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (addr & 3) << 3; \
                 uint32_t mask = 0xFFFFFFFF >> shift; \
                 uint32_t aligned_word = {}; \
                 SET_GPR_U32(ctx, {rt}, (GPR_U32(ctx, {rt}) & ~mask) | ((aligned_word >> shift) & mask)); }}",
                gen_read(inst, 32, "addr & ~3u")
            ),
            OPCODE_LDL => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (7 - (addr & 7)) << 3; \
                 uint64_t mask = 0xFFFFFFFFFFFFFFFFULL << shift; \
                 uint64_t aligned_data = {}; \
                 SET_GPR_U64(ctx, {rt}, (GPR_U64(ctx, {rt}) & ~mask) | ((aligned_data << shift) & mask)); }}",
                gen_read(inst, 64, "addr & ~7u")
            ),
            OPCODE_LDR => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (addr & 7) << 3; \
                 uint64_t mask = 0xFFFFFFFFFFFFFFFFULL >> shift; \
                 uint64_t aligned_data = {}; \
                 SET_GPR_U64(ctx, {rt}, (GPR_U64(ctx, {rt}) & ~mask) | ((aligned_data >> shift) & mask)); }}",
                gen_read(inst, 64, "addr & ~7u")
            ),
            OPCODE_SWL => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (3 - (addr & 3)) << 3; \
                 uint32_t mask = 0xFFFFFFFF >> shift; \
                 uint32_t aligned_addr = addr & ~3u; \
                 uint32_t old_data = {}; \
                 uint32_t new_data = (old_data & ~mask) | ((GPR_U32(ctx, {rt}) >> shift) & mask); \
                 {}; }}",
                gen_read(inst, 32, "aligned_addr"),
                gen_write(inst, 32, "aligned_addr", "new_data")
            ),
            OPCODE_SWR => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (addr & 3) << 3; \
                 uint32_t mask = 0xFFFFFFFF << shift; \
                 uint32_t aligned_addr = addr & ~3u; \
                 uint32_t old_data = {}; \
                 uint32_t new_data = (old_data & ~mask) | ((GPR_U32(ctx, {rt}) << shift) & mask); \
                 {}; }}",
                gen_read(inst, 32, "aligned_addr"),
                gen_write(inst, 32, "aligned_addr", "new_data")
            ),
            OPCODE_SDL => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (7 - (addr & 7)) << 3; \
                 uint64_t mask = 0xFFFFFFFFFFFFFFFFULL >> shift; \
                 uint32_t aligned_addr = addr & ~7u; \
                 uint64_t old_data = {}; \
                 uint64_t new_data = (old_data & ~mask) | ((GPR_U64(ctx, {rt}) >> shift) & mask); \
                 {}; }}",
                gen_read(inst, 64, "aligned_addr"),
                gen_write(inst, 64, "aligned_addr", "new_data")
            ),
            OPCODE_SDR => format!(
                "{{ uint32_t addr = {addr}; \
                 uint32_t shift = (addr & 7) << 3; \
                 uint64_t mask = 0xFFFFFFFFFFFFFFFFULL << shift; \
                 uint32_t aligned_addr = addr & ~7u; \
                 uint64_t old_data = {}; \
                 uint64_t new_data = (old_data & ~mask) | ((GPR_U64(ctx, {rt}) << shift) & mask); \
                 {}; }}",
                gen_read(inst, 64, "aligned_addr"),
                gen_write(inst, 64, "aligned_addr", "new_data")
            ),

            OPCODE_J => format!(
                "// J 0x{:X} - Handled by branch logic",
                inst.jump_target()
            ),
            OPCODE_JAL => format!(
                "// JAL 0x{:X} - Handled by branch logic",
                inst.jump_target()
            ),
            OPCODE_BEQ | OPCODE_BNE | OPCODE_BLEZ | OPCODE_BGTZ | OPCODE_BEQL | OPCODE_BNEL
            | OPCODE_BLEZL | OPCODE_BGTZL => format!(
                "// Branch instruction at 0x{:x} - Handled by branch logic",
                inst.address
            ),

            OPCODE_CACHE => "// CACHE instruction (ignored)".into(),
            OPCODE_PREF => "// PREF instruction (ignored)".into(),

            _ => format!("// Unhandled opcode: 0x{:X}", inst.opcode),
        }
    }

    fn translate_special(&self, inst: &Instruction) -> String {
        let rs = inst.rs;
        let rt = inst.rt;
        let rd = inst.rd;
        let sa = inst.sa;

        match inst.function {
            SPECIAL_SLL => {
                if inst.is_nop() {
                    return "// NOP".into();
                }
                if rd == 0 {
                    return String::new();
                }
                format!("SET_GPR_U32(ctx, {rd}, SLL32(GPR_U32(ctx, {rt}), {sa}));")
            }
            SPECIAL_SRL => format!("SET_GPR_U32(ctx, {rd}, SRL32(GPR_U32(ctx, {rt}), {sa}));"),
            SPECIAL_SRA => format!("SET_GPR_S32(ctx, {rd}, SRA32(GPR_S32(ctx, {rt}), {sa}));"),
            SPECIAL_SLLV => format!(
                "SET_GPR_U32(ctx, {rd}, SLL32(GPR_U32(ctx, {rt}), GPR_U32(ctx, {rs}) & 0x1F));"
            ),
            SPECIAL_SRLV => format!(
                "SET_GPR_U32(ctx, {rd}, SRL32(GPR_U32(ctx, {rt}), GPR_U32(ctx, {rs}) & 0x1F));"
            ),
            SPECIAL_SRAV => format!(
                "SET_GPR_S32(ctx, {rd}, SRA32(GPR_S32(ctx, {rt}), GPR_U32(ctx, {rs}) & 0x1F));"
            ),

            SPECIAL_JR => format!("// JR ${rs} - Handled by branch logic"),
            SPECIAL_JALR => format!("// JALR ${rd}, ${rs} - Handled by branch logic"),

            SPECIAL_SYSCALL => format!(
                "runtime->handleSyscall(rdram, ctx, 0x{:X}u);",
                (inst.raw >> 6) & 0xFFFFF
            ),
            SPECIAL_BREAK => "runtime->handleBreak(rdram, ctx);".into(),
            SPECIAL_SYNC => "// SYNC (memory ordering handled by the host)".into(),

            SPECIAL_MFHI => format!("SET_GPR_U32(ctx, {rd}, ctx->hi);"),
            SPECIAL_MTHI => format!("ctx->hi = GPR_U32(ctx, {rs});"),
            SPECIAL_MFLO => format!("SET_GPR_U32(ctx, {rd}, ctx->lo);"),
            SPECIAL_MTLO => format!("ctx->lo = GPR_U32(ctx, {rs});"),
            SPECIAL_MFSA => format!("SET_GPR_U32(ctx, {rd}, ctx->sa);"),
            SPECIAL_MTSA => format!("ctx->sa = GPR_U32(ctx, {rs}) & 0x1F;"),

            SPECIAL_MULT => {
                let rd_write = (rd != 0)
                    .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->lo);"))
                    .unwrap_or_default();
                format!(
                    "{{ int64_t result = (int64_t)GPR_S32(ctx, {rs}) * (int64_t)GPR_S32(ctx, {rt}); \
                     ctx->lo = (uint32_t)result; ctx->hi = (uint32_t)(result >> 32);{rd_write} }}"
                )
            }
            SPECIAL_MULTU => {
                let rd_write = (rd != 0)
                    .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->lo);"))
                    .unwrap_or_default();
                format!(
                    "{{ uint64_t result = (uint64_t)GPR_U32(ctx, {rs}) * (uint64_t)GPR_U32(ctx, {rt}); \
                     ctx->lo = (uint32_t)result; ctx->hi = (uint32_t)(result >> 32);{rd_write} }}"
                )
            }
            SPECIAL_DIV => format!(
                "{{ int32_t divisor = GPR_S32(ctx, {rt}); \
                 int32_t dividend = GPR_S32(ctx, {rs}); \
                 if (divisor != 0) {{ \
                 if (divisor == -1 && dividend == INT32_MIN) {{ ctx->lo = INT32_MIN; ctx->hi = 0; }} \
                 else {{ ctx->lo = (uint32_t)(dividend / divisor); ctx->hi = (uint32_t)(dividend % divisor); }} \
                 }} else {{ ctx->lo = (dividend < 0) ? 1 : -1; ctx->hi = (uint32_t)dividend; }} }}"
            ),
            SPECIAL_DIVU => format!(
                "{{ uint32_t divisor = GPR_U32(ctx, {rt}); \
                 if (divisor != 0) {{ ctx->lo = GPR_U32(ctx, {rs}) / divisor; ctx->hi = GPR_U32(ctx, {rs}) % divisor; }} \
                 else {{ ctx->lo = 0xFFFFFFFF; ctx->hi = GPR_U32(ctx, {rs}); }} }}"
            ),

            SPECIAL_ADD => format!(
                "{{ uint32_t tmp; bool ov; \
                 ADD32_OV(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt}), tmp, ov); \
                 if (ov) runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                 else SET_GPR_S32(ctx, {rd}, (int32_t)tmp); }}"
            ),
            SPECIAL_ADDU => {
                format!("SET_GPR_U32(ctx, {rd}, ADD32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_SUB => format!(
                "{{ uint32_t tmp; bool ov; \
                 SUB32_OV(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt}), tmp, ov); \
                 if (ov) runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                 else SET_GPR_S32(ctx, {rd}, (int32_t)tmp); }}"
            ),
            SPECIAL_SUBU => {
                format!("SET_GPR_U32(ctx, {rd}, SUB32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_AND => {
                format!("SET_GPR_U32(ctx, {rd}, AND32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_OR => {
                format!("SET_GPR_U32(ctx, {rd}, OR32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_XOR => {
                format!("SET_GPR_U32(ctx, {rd}, XOR32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_NOR => {
                format!("SET_GPR_U32(ctx, {rd}, NOR32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_SLT => {
                format!("SET_GPR_U32(ctx, {rd}, SLT32(GPR_S32(ctx, {rs}), GPR_S32(ctx, {rt})));")
            }
            SPECIAL_SLTU => {
                format!("SET_GPR_U32(ctx, {rd}, SLTU32(GPR_U32(ctx, {rs}), GPR_U32(ctx, {rt})));")
            }
            SPECIAL_MOVZ => format!(
                "if (GPR_U32(ctx, {rt}) == 0) SET_GPR_U32(ctx, {rd}, GPR_U32(ctx, {rs}));"
            ),
            SPECIAL_MOVN => format!(
                "if (GPR_U32(ctx, {rt}) != 0) SET_GPR_U32(ctx, {rd}, GPR_U32(ctx, {rs}));"
            ),

            SPECIAL_DADD => format!(
                "{{ int64_t a = (int64_t)GPR_S64(ctx, {rs}); \
                 int64_t b = (int64_t)GPR_S64(ctx, {rt}); \
                 int64_t r = a + b; \
                 if (((a ^ b) >= 0) && ((a ^ r) < 0)) runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                 else SET_GPR_S64(ctx, {rd}, r); }}"
            ),
            SPECIAL_DADDU => format!(
                "SET_GPR_U64(ctx, {rd}, (uint64_t)GPR_U64(ctx, {rs}) + (uint64_t)GPR_U64(ctx, {rt}));"
            ),
            SPECIAL_DSUB => format!(
                "{{ int64_t a = (int64_t)GPR_S64(ctx, {rs}); \
                 int64_t b = (int64_t)GPR_S64(ctx, {rt}); \
                 int64_t r = a - b; \
                 if (((a ^ b) < 0) && ((a ^ r) < 0)) runtime->SignalException(ctx, EXCEPTION_INTEGER_OVERFLOW); \
                 else SET_GPR_S64(ctx, {rd}, r); }}"
            ),
            SPECIAL_DSUBU => {
                format!("SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rs}) - GPR_U64(ctx, {rt}));")
            }
            SPECIAL_DSLL => format!("SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) << {sa});"),
            SPECIAL_DSRL => format!("SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) >> {sa});"),
            SPECIAL_DSRA => format!("SET_GPR_S64(ctx, {rd}, GPR_S64(ctx, {rt}) >> {sa});"),
            SPECIAL_DSLL32 => {
                format!("SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) << (32 + {sa}));")
            }
            SPECIAL_DSRL32 => {
                format!("SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) >> (32 + {sa}));")
            }
            SPECIAL_DSRA32 => {
                format!("SET_GPR_S64(ctx, {rd}, GPR_S64(ctx, {rt}) >> (32 + {sa}));")
            }
            SPECIAL_DSLLV => format!(
                "SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) << (GPR_U32(ctx, {rs}) & 0x3F));"
            ),
            SPECIAL_DSRLV => format!(
                "SET_GPR_U64(ctx, {rd}, GPR_U64(ctx, {rt}) >> (GPR_U32(ctx, {rs}) & 0x3F));"
            ),
            SPECIAL_DSRAV => format!(
                "SET_GPR_S64(ctx, {rd}, GPR_S64(ctx, {rt}) >> (GPR_U32(ctx, {rs}) & 0x3F));"
            ),

            SPECIAL_TGE => format!(
                "if (GPR_S32(ctx, {rs}) >= GPR_S32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),
            SPECIAL_TGEU => format!(
                "if (GPR_U32(ctx, {rs}) >= GPR_U32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),
            SPECIAL_TLT => format!(
                "if (GPR_S32(ctx, {rs}) < GPR_S32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),
            SPECIAL_TLTU => format!(
                "if (GPR_U32(ctx, {rs}) < GPR_U32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),
            SPECIAL_TEQ => format!(
                "if (GPR_U32(ctx, {rs}) == GPR_U32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),
            SPECIAL_TNE => format!(
                "if (GPR_U32(ctx, {rs}) != GPR_U32(ctx, {rt})) {{ runtime->handleTrap(rdram, ctx); }}"
            ),

            _ => format!("// Unhandled SPECIAL instruction: 0x{:X}", inst.function),
        }
    }
}

fn translate_regimm(inst: &Instruction) -> String {
    let rs = inst.rs;
    let simm = inst.simmediate as i32;

    match inst.rt {
        REGIMM_BLTZ | REGIMM_BGEZ | REGIMM_BLTZL | REGIMM_BGEZL | REGIMM_BLTZAL
        | REGIMM_BGEZAL | REGIMM_BLTZALL | REGIMM_BGEZALL => format!(
            "// REGIMM branch to 0x{:X} - Handled by branch logic",
            inst.branch_target()
        ),
        REGIMM_MTSAB => format!("ctx->sa = (GPR_U32(ctx, {rs}) + {simm}) & 0xF;"),
        REGIMM_MTSAH => format!("ctx->sa = ((GPR_U32(ctx, {rs}) + {simm}) & 0x7) << 1;"),
        REGIMM_TGEI => {
            format!("if (GPR_S32(ctx, {rs}) >= {simm}) {{ runtime->handleTrap(rdram, ctx); }}")
        }
        REGIMM_TGEIU => format!(
            "if (GPR_U32(ctx, {rs}) >= (uint32_t){simm}) {{ runtime->handleTrap(rdram, ctx); }}"
        ),
        REGIMM_TLTI => {
            format!("if (GPR_S32(ctx, {rs}) < {simm}) {{ runtime->handleTrap(rdram, ctx); }}")
        }
        REGIMM_TLTIU => format!(
            "if (GPR_U32(ctx, {rs}) < (uint32_t){simm}) {{ runtime->handleTrap(rdram, ctx); }}"
        ),
        REGIMM_TEQI => {
            format!("if (GPR_S32(ctx, {rs}) == {simm}) {{ runtime->handleTrap(rdram, ctx); }}")
        }
        REGIMM_TNEI => {
            format!("if (GPR_S32(ctx, {rs}) != {simm}) {{ runtime->handleTrap(rdram, ctx); }}")
        }
        _ => format!("// Unhandled REGIMM instruction: 0x{:X}", inst.rt),
    }
}

fn translate_cop0(inst: &Instruction) -> String {
    let rt = inst.rt;
    let rd = inst.rd;

    match inst.rs {
        COP0_MF => match rd {
            COP0_REG_INDEX => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_index);"),
            COP0_REG_RANDOM => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_random);"),
            COP0_REG_ENTRYLO0 => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_entrylo0);"),
            COP0_REG_ENTRYLO1 => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_entrylo1);"),
            COP0_REG_CONTEXT => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_context);"),
            COP0_REG_PAGEMASK => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_pagemask);"),
            COP0_REG_WIRED => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_wired);"),
            COP0_REG_BADVADDR => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_badvaddr);"),
            COP0_REG_COUNT => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_count);"),
            COP0_REG_ENTRYHI => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_entryhi);"),
            COP0_REG_COMPARE => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_compare);"),
            COP0_REG_STATUS => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_status);"),
            COP0_REG_CAUSE => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_cause);"),
            COP0_REG_EPC => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_epc);"),
            COP0_REG_PRID => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_prid);"),
            COP0_REG_CONFIG => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_config);"),
            COP0_REG_BADPADDR => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_badpaddr);"),
            COP0_REG_DEBUG => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_debug);"),
            COP0_REG_PERF => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_perf);"),
            COP0_REG_TAGLO => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_taglo);"),
            COP0_REG_TAGHI => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_taghi);"),
            COP0_REG_ERROREPC => format!("SET_GPR_U32(ctx, {rt}, ctx->cop0_errorepc);"),
            _ => format!("SET_GPR_U32(ctx, {rt}, 0); // Unimplemented COP0 register {rd}"),
        },
        COP0_MT => match rd {
            COP0_REG_INDEX => format!("ctx->cop0_index = GPR_U32(ctx, {rt}) & 0x3F;"),
            COP0_REG_RANDOM => "// MTC0 to Random ignored (read-only)".into(),
            COP0_REG_ENTRYLO0 => format!("ctx->cop0_entrylo0 = GPR_U32(ctx, {rt}) & 0x3FFFFFFF;"),
            COP0_REG_ENTRYLO1 => format!("ctx->cop0_entrylo1 = GPR_U32(ctx, {rt}) & 0x3FFFFFFF;"),
            COP0_REG_CONTEXT => format!(
                "ctx->cop0_context = (ctx->cop0_context & 0xFF800000) | (GPR_U32(ctx, {rt}) & 0x7FFFFF);"
            ),
            COP0_REG_PAGEMASK => format!("ctx->cop0_pagemask = GPR_U32(ctx, {rt}) & 0x01FFE000;"),
            COP0_REG_WIRED => {
                format!("ctx->cop0_wired = GPR_U32(ctx, {rt}) & 0x3F; ctx->cop0_random = 47;")
            }
            COP0_REG_BADVADDR => "// MTC0 to BadVAddr ignored (read-only)".into(),
            COP0_REG_COUNT => format!("ctx->cop0_count = GPR_U32(ctx, {rt});"),
            COP0_REG_ENTRYHI => format!("ctx->cop0_entryhi = GPR_U32(ctx, {rt}) & 0xC00000FF;"),
            COP0_REG_COMPARE => format!(
                "ctx->cop0_compare = GPR_U32(ctx, {rt}); ctx->cop0_cause &= ~0x8000;"
            ),
            COP0_REG_STATUS => format!("ctx->cop0_status = GPR_U32(ctx, {rt}) & 0xFF57FFFF;"),
            COP0_REG_CAUSE => format!(
                "ctx->cop0_cause = (ctx->cop0_cause & ~0x00000300) | (GPR_U32(ctx, {rt}) & 0x00000300);"
            ),
            COP0_REG_EPC => format!("ctx->cop0_epc = GPR_U32(ctx, {rt});"),
            COP0_REG_PRID => "// MTC0 to PRId ignored (read-only)".into(),
            COP0_REG_CONFIG => format!(
                "ctx->cop0_config = (ctx->cop0_config & ~0x7) | (GPR_U32(ctx, {rt}) & 0x7);"
            ),
            COP0_REG_BADPADDR => "// MTC0 to BadPAddr ignored (read-only)".into(),
            COP0_REG_DEBUG => format!("ctx->cop0_debug = GPR_U32(ctx, {rt});"),
            COP0_REG_PERF => format!("ctx->cop0_perf = GPR_U32(ctx, {rt});"),
            COP0_REG_TAGLO => format!("ctx->cop0_taglo = GPR_U32(ctx, {rt});"),
            COP0_REG_TAGHI => format!("ctx->cop0_taghi = GPR_U32(ctx, {rt});"),
            COP0_REG_ERROREPC => format!("ctx->cop0_errorepc = GPR_U32(ctx, {rt});"),
            _ => format!(
                "// Unimplemented MTC0 to COP0 register {} ({rd})",
                COP0_REG_NAMES.get(&rd).unwrap_or(&"?")
            ),
        },
        COP0_BC => format!("// BC0 (condition 0x{rt:X}) - Handled by branch logic"),
        COP0_CO => match inst.function {
            COP0_CO_TLBR => "runtime->handleTLBR(rdram, ctx);".into(),
            COP0_CO_TLBWI => "runtime->handleTLBWI(rdram, ctx);".into(),
            COP0_CO_TLBWR => "runtime->handleTLBWR(rdram, ctx);".into(),
            COP0_CO_TLBP => "runtime->handleTLBP(rdram, ctx);".into(),
            COP0_CO_ERET => "if (ctx->cop0_status & 0x4) { \n\
                 \x20   ctx->pc = ctx->cop0_errorepc; \n\
                 \x20   ctx->cop0_status &= ~0x4; \n\
                 } else { \n\
                 \x20   ctx->pc = ctx->cop0_epc; \n\
                 \x20   ctx->cop0_status &= ~0x2; \n\
                 } \n\
                 runtime->clearLLBit(ctx); \n\
                 return;"
                .into(),
            COP0_CO_EI => "ctx->cop0_status |= 0x1; // Enable interrupts".into(),
            COP0_CO_DI => "ctx->cop0_status &= ~0x1; // Disable interrupts".into(),
            _ => format!("// Unhandled COP0 CO-OP: 0x{:X}", inst.function),
        },
        _ => format!("// Unhandled COP0 instruction format: 0x{:X}", inst.rs),
    }
}

fn translate_fpu(inst: &Instruction) -> String {
    let ft = inst.rt;
    let fs = inst.rd;
    let fd = inst.sa;

    let compare = |name: &str| {
        format!(
            "ctx->fcr31 = (FPU_C_{name}_S(ctx->f[{fs}], ctx->f[{ft}])) ? \
             (ctx->fcr31 | 0x800000) : (ctx->fcr31 & ~0x800000);"
        )
    };

    match inst.rs {
        COP1_MF => format!("SET_GPR_U32(ctx, {ft}, *(uint32_t*)&ctx->f[{fs}]);"),
        COP1_MT => format!("*(uint32_t*)&ctx->f[{fs}] = GPR_U32(ctx, {ft});"),
        COP1_CF => match fs {
            31 => format!("SET_GPR_U32(ctx, {ft}, ctx->fcr31);"),
            0 => format!("SET_GPR_U32(ctx, {ft}, 0x00000000);"),
            _ => format!("SET_GPR_U32(ctx, {ft}, 0); // Unimplemented FCR{fs}"),
        },
        COP1_CT => {
            if fs == 31 {
                format!("ctx->fcr31 = GPR_U32(ctx, {ft}) & 0x0183FFFF;")
            } else {
                format!("// CTC1 to FCR{fs} ignored")
            }
        }
        COP1_BC => "// FPU branch - Handled by branch logic".into(),
        COP1_S => match inst.function {
            COP1_S_ADD => format!("ctx->f[{fd}] = FPU_ADD_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_SUB => format!("ctx->f[{fd}] = FPU_SUB_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_MUL => format!("ctx->f[{fd}] = FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_DIV => format!(
                "if (ctx->f[{ft}] == 0.0f) {{ ctx->fcr31 |= 0x100000; \
                 ctx->f[{fd}] = copysignf(INFINITY, ctx->f[{fs}] * 0.0f); }} \
                 else ctx->f[{fd}] = ctx->f[{fs}] / ctx->f[{ft}];"
            ),
            COP1_S_SQRT => format!("ctx->f[{fd}] = FPU_SQRT_S(ctx->f[{fs}]);"),
            COP1_S_ABS => format!("ctx->f[{fd}] = FPU_ABS_S(ctx->f[{fs}]);"),
            COP1_S_MOV => format!("ctx->f[{fd}] = FPU_MOV_S(ctx->f[{fs}]);"),
            COP1_S_NEG => format!("ctx->f[{fd}] = FPU_NEG_S(ctx->f[{fs}]);"),
            COP1_S_RSQRT => format!("ctx->f[{fd}] = 1.0f / sqrtf(ctx->f[{fs}]);"),
            COP1_S_ROUND_W => {
                format!("*(int32_t*)&ctx->f[{fd}] = FPU_ROUND_W_S(ctx->f[{fs}]);")
            }
            COP1_S_TRUNC_W => {
                format!("*(int32_t*)&ctx->f[{fd}] = FPU_TRUNC_W_S(ctx->f[{fs}]);")
            }
            COP1_S_CEIL_W => format!("*(int32_t*)&ctx->f[{fd}] = FPU_CEIL_W_S(ctx->f[{fs}]);"),
            COP1_S_FLOOR_W => {
                format!("*(int32_t*)&ctx->f[{fd}] = FPU_FLOOR_W_S(ctx->f[{fs}]);")
            }
            COP1_S_CVT_W => format!("*(int32_t*)&ctx->f[{fd}] = FPU_CVT_W_S(ctx->f[{fs}]);"),
            COP1_S_ADDA => format!("ctx->f[31] = FPU_ADD_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_SUBA => format!("ctx->f[31] = FPU_SUB_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_MULA => format!("ctx->f[31] = FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_MADD => format!(
                "ctx->f[{fd}] = FPU_ADD_S(ctx->f[31], FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]));"
            ),
            COP1_S_MSUB => format!(
                "ctx->f[{fd}] = FPU_SUB_S(ctx->f[31], FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]));"
            ),
            COP1_S_MADDA => format!(
                "ctx->f[31] = FPU_ADD_S(ctx->f[31], FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]));"
            ),
            COP1_S_MSUBA => format!(
                "ctx->f[31] = FPU_SUB_S(ctx->f[31], FPU_MUL_S(ctx->f[{fs}], ctx->f[{ft}]));"
            ),
            COP1_S_MAX => format!("ctx->f[{fd}] = std::max(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_MIN => format!("ctx->f[{fd}] = std::min(ctx->f[{fs}], ctx->f[{ft}]);"),
            COP1_S_C_F | COP1_S_C_SF => "ctx->fcr31 &= ~0x800000;".into(),
            COP1_S_C_UN => compare("UN"),
            COP1_S_C_EQ => compare("EQ"),
            COP1_S_C_UEQ => compare("UEQ"),
            COP1_S_C_OLT => compare("OLT"),
            COP1_S_C_ULT => compare("ULT"),
            COP1_S_C_OLE => compare("OLE"),
            COP1_S_C_ULE => compare("ULE"),
            COP1_S_C_NGLE => compare("NGLE"),
            COP1_S_C_SEQ => compare("SEQ"),
            COP1_S_C_NGL => compare("NGL"),
            COP1_S_C_LT => compare("LT"),
            COP1_S_C_NGE => compare("NGE"),
            COP1_S_C_LE => compare("LE"),
            COP1_S_C_NGT => compare("NGT"),
            _ => format!("// Unhandled FPU.S instruction: function 0x{:X}", inst.function),
        },
        COP1_W => match inst.function {
            COP1_W_CVT_S => format!("ctx->f[{fd}] = FPU_CVT_S_W(*(int32_t*)&ctx->f[{fs}]);"),
            _ => format!("// Unhandled FPU.W instruction: function 0x{:X}", inst.function),
        },
        _ => format!(
            "// Unhandled FPU instruction: format 0x{:X}, function 0x{:X}",
            inst.rs, inst.function
        ),
    }
}

fn branch_condition(inst: &Instruction, fallthrough_pc: u32) -> (String, Option<String>) {
    let rs = inst.rs;
    let rt = inst.rt;
    let mut link = None;

    let condition = match inst.opcode {
        OPCODE_BEQ | OPCODE_BEQL => {
            format!("GPR_U32(ctx, {rs}) == GPR_U32(ctx, {rt})")
        }
        OPCODE_BNE | OPCODE_BNEL => {
            format!("GPR_U32(ctx, {rs}) != GPR_U32(ctx, {rt})")
        }
        OPCODE_BLEZ | OPCODE_BLEZL => format!("GPR_S32(ctx, {rs}) <= 0"),
        OPCODE_BGTZ | OPCODE_BGTZL => format!("GPR_S32(ctx, {rs}) > 0"),
        OPCODE_REGIMM => {
            if matches!(
                inst.rt,
                REGIMM_BLTZAL | REGIMM_BGEZAL | REGIMM_BLTZALL | REGIMM_BGEZALL
            ) {
                link = Some(format!("SET_GPR_U32(ctx, 31, 0x{fallthrough_pc:X}u);"));
            }
            match inst.rt {
                REGIMM_BLTZ | REGIMM_BLTZL | REGIMM_BLTZAL | REGIMM_BLTZALL => {
                    format!("GPR_S32(ctx, {rs}) < 0")
                }
                REGIMM_BGEZ | REGIMM_BGEZL | REGIMM_BGEZAL | REGIMM_BGEZALL => {
                    format!("GPR_S32(ctx, {rs}) >= 0")
                }
                _ => "false".into(),
            }
        }
        OPCODE_COP1 if inst.rs == COP1_BC => {
            if inst.rt == COP1_BC_BCF || inst.rt == COP1_BC_BCFL {
                "!(ctx->fcr31 & 0x800000)".into()
            } else {
                "(ctx->fcr31 & 0x800000)".into()
            }
        }
        OPCODE_COP2 if inst.rs == COP2_BC => {
            if inst.rt == COP2_BC_BCF || inst.rt == COP2_BC_BCFL {
                "!(ctx->vu0_status & 0x1)".into()
            } else {
                "(ctx->vu0_status & 0x1)".into()
            }
        }
        _ => "false".into(),
    };

    (condition, link)
}

fn is_likely_branch(inst: &Instruction) -> bool {
    match inst.opcode {
        OPCODE_BEQL | OPCODE_BNEL | OPCODE_BLEZL | OPCODE_BGTZL => true,
        OPCODE_REGIMM => matches!(
            inst.rt,
            REGIMM_BLTZL | REGIMM_BGEZL | REGIMM_BLTZALL | REGIMM_BGEZALL
        ),
        OPCODE_COP1 => {
            inst.rs == COP1_BC && matches!(inst.rt, COP1_BC_BCFL | COP1_BC_BCTL)
        }
        OPCODE_COP2 => {
            inst.rs == COP2_BC && matches!(inst.rt, COP2_BC_BCFL | COP2_BC_BCTL)
        }
        _ => false,
    }
}

pub(crate) fn gen_read(inst: &Instruction, width: u32, addr: &str) -> String {
    if inst.is_mmio {
        format!("runtime->Load{width}(rdram, ctx, {addr})")
    } else {
        format!("READ{width}({addr})")
    }
}

pub(crate) fn gen_write(inst: &Instruction, width: u32, addr: &str, value: &str) -> String {
    if inst.is_mmio {
        format!("runtime->Store{width}(rdram, ctx, {addr}, {value})")
    } else {
        format!("WRITE{width}({addr}, {value})")
    }
}

fn sanitize_identifier_body(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if let Some(first) = sanitized.chars().next() {
        if !(first.is_ascii_alphabetic() || first == '_') {
            sanitized.insert(0, '_');
        }
    }

    sanitized
}

fn is_reserved_cxx_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'_' && bytes[1] == b'_' {
        return true;
    }
    if bytes.len() >= 2 && bytes[0] == b'_' && bytes[1].is_ascii_uppercase() {
        return true;
    }
    false
}

/// Rewrites a guest symbol into a host identifier that cannot collide
/// with C++ keywords, reserved spellings or the host's own `main`.
pub fn sanitize_function_name(name: &str) -> String {
    let sanitized = sanitize_identifier_body(name);
    if sanitized.is_empty() {
        return sanitized;
    }
    if sanitized == "main" {
        return "ps2_main".into();
    }
    if CXX_KEYWORDS.contains(sanitized.as_str()) {
        return format!("ps2_{sanitized}");
    }
    if sanitized.starts_with('_') {
        return format!("ps2{sanitized}");
    }
    if is_reserved_cxx_identifier(&sanitized) {
        return format!("ps2_{sanitized}");
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    #[test]
    fn sanitizes_reserved_identifiers() {
        assert_eq!(sanitize_function_name("main"), "ps2_main");
        assert_eq!(sanitize_function_name("__is_pointer"), "ps2___is_pointer");
        assert_eq!(sanitize_function_name("_Exit"), "ps2__Exit");
        assert_eq!(sanitize_function_name("operator"), "ps2_operator");
        assert_eq!(sanitize_function_name("draw-thing"), "draw_thing");
        assert_eq!(sanitize_function_name("4cc"), "ps2_4cc");
    }

    #[test]
    fn zero_register_writes_are_dropped() {
        // addiu $zero, $v0, 1
        let raw = (OPCODE_ADDIU << 26) | (2 << 21) | 1;
        let generator = CodeGenerator::new(&[]);
        let out = generator.translate(&decode(0x1000, raw));
        assert!(out.starts_with("//"));
    }

    #[test]
    fn internal_targets_include_jal_return_addresses() {
        let function = Function {
            name: "f".into(),
            start: 0x1300,
            end: 0x1320,
            ..Function::default()
        };
        // jal 0x1310; nop; ...; the return address 0x1308 must be a target.
        let instructions: Vec<_> = (0..8)
            .map(|i| {
                let address = 0x1300 + i * 4;
                let raw = if i == 0 {
                    (OPCODE_JAL << 26) | (0x1310 >> 2)
                } else {
                    0
                };
                decode(address, raw)
            })
            .collect();

        let targets = CodeGenerator::collect_internal_targets(&function, &instructions);
        assert!(targets.contains(&0x1310));
        assert!(targets.contains(&0x1308));
    }

    #[test]
    fn mmio_tagged_loads_use_runtime_helpers() {
        let raw = (OPCODE_LW << 26) | (4 << 21) | (2 << 16) | 0x10;
        let mut inst = decode(0x1000, raw);
        inst.is_mmio = true;
        inst.mmio_address = 0x1000_3000;

        let generator = CodeGenerator::new(&[]);
        let out = generator.translate(&inst);
        assert!(out.contains("runtime->Load32(rdram, ctx,"));
        assert!(!out.contains("READ32"));
    }
}
