use ps2recomp::{decode, CodeGenerator, Function, Instruction, Symbol};

const OPCODE_J: u32 = 0x02;
const OPCODE_JAL: u32 = 0x03;
const OPCODE_BEQ: u32 = 0x04;
const OPCODE_BNEL: u32 = 0x15;
const OPCODE_ADDIU: u32 = 0x09;
const OPCODE_LW: u32 = 0x23;
const OPCODE_SW: u32 = 0x2B;
const OPCODE_SPECIAL: u32 = 0x00;
const OPCODE_MMI: u32 = 0x1C;
const OPCODE_COP2: u32 = 0x12;
const SPECIAL_JR: u32 = 0x08;

const NOP: u32 = 0;

fn function(name: &str, start: u32, end: u32) -> Function {
    Function {
        name: name.into(),
        start,
        end,
        is_recompiled: true,
        ..Function::default()
    }
}

fn symbol(name: &str, address: u32) -> Symbol {
    Symbol {
        name: name.into(),
        address,
        size: 0x20,
        is_function: true,
        is_imported: false,
        is_exported: true,
    }
}

fn decode_words(start: u32, words: &[u32]) -> Vec<Instruction> {
    words
        .iter()
        .enumerate()
        .map(|(i, &raw)| decode(start + (i as u32) * 4, raw))
        .collect()
}

fn jal(target: u32) -> u32 {
    (OPCODE_JAL << 26) | (target >> 2)
}

fn jr_ra() -> u32 {
    (OPCODE_SPECIAL << 26) | (31 << 21) | SPECIAL_JR
}

#[test]
fn internal_jump_becomes_goto() {
    let fun = function("loop_fn", 0x1000, 0x1020);
    let words = [(OPCODE_J << 26) | (0x1008 >> 2), NOP, NOP, NOP];
    let instructions = decode_words(0x1000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("label_1008:"), "missing label:\n{out}");
    assert!(out.contains("ctx->pc = 0x1008u;"), "missing pc write:\n{out}");
    assert!(out.contains("goto label_1008;"), "missing goto:\n{out}");
    assert!(
        !out.contains("runtime->lookupFunction"),
        "internal jump must not go through the dispatcher:\n{out}"
    );
}

#[test]
fn every_goto_has_a_matching_label() {
    // A function with forward and backward branches plus an internal
    // call; whatever the generator emits, its gotos must resolve.
    let fun = function("branchy", 0x1000, 0x1028);
    let words = [
        (OPCODE_BEQ << 26) | (1 << 21) | (2 << 16) | 0x0003, // beq -> 0x1014
        NOP,
        jal(0x1018),
        NOP,
        NOP,
        (OPCODE_BEQ << 26) | (3 << 16) | 0xFFFB, // beq -> 0x1004
        NOP,
        jr_ra(),
        NOP,
    ];
    let instructions = decode_words(0x1000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    for line in out.lines() {
        let Some(index) = line.find("goto label_") else {
            continue;
        };
        let target: String = line[index + "goto ".len()..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        assert!(
            out.contains(&format!("{target}:")),
            "unresolved {target} in:\n{out}"
        );
    }
}

#[test]
fn jal_to_known_symbol_calls_by_name() {
    let fun = function("caller", 0x4000, 0x4018);
    let words = [jal(0x5000), NOP, jr_ra(), NOP];
    let instructions = decode_words(0x4000, &words);

    let generator = CodeGenerator::new(&[symbol("target_func", 0x5000)]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(
        out.contains("SET_GPR_U32(ctx, 31, 0x4008u);"),
        "link register write missing:\n{out}"
    );
    assert!(
        out.contains("target_func(rdram, ctx, runtime);"),
        "named call missing:\n{out}"
    );
    assert!(
        out.contains("if (ctx->pc != 0x4008u) { return; }"),
        "post-call pc check missing:\n{out}"
    );
}

#[test]
fn jump_to_unknown_target_uses_the_dispatcher() {
    let fun = function("caller", 0x4000, 0x4010);
    let words = [jal(0x7000), NOP, jr_ra(), NOP];
    let instructions = decode_words(0x4000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("runtime->lookupFunction(0x7000u)"), "{out}");
    assert!(out.contains("ctx->pc = 0x7000u;"), "{out}");
}

#[test]
fn jr_ra_emits_switch_over_known_return_addresses() {
    let fun = function("caller", 0x1300, 0x1320);
    let words = [
        jal(0x1310),  // 0x1300: return address 0x1308 becomes a target
        NOP,          // 0x1304
        NOP,          // 0x1308
        NOP,          // 0x130c
        NOP,          // 0x1310
        jr_ra(),      // 0x1314
        NOP,          // 0x1318
        NOP,          // 0x131c
    ];
    let instructions = decode_words(0x1300, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("switch (jumpTarget)"), "{out}");
    assert!(out.contains("case 0x1308u: goto label_1308;"), "{out}");
    assert!(out.contains("default: break;"), "{out}");
    assert!(out.contains("return;"), "{out}");
}

#[test]
fn renamed_functions_are_used_at_definition_and_call_sites() {
    let target = symbol("__is_pointer", 0x5000);
    let fun = function("caller", 0x4000, 0x4010);
    let words = [jal(0x5000), NOP, jr_ra(), NOP];
    let instructions = decode_words(0x4000, &words);

    let generator = CodeGenerator::new(&[target.clone()]);
    let out = generator.generate_function(&fun, &instructions, false);
    assert!(
        out.contains("ps2___is_pointer(rdram, ctx, runtime);"),
        "call site not sanitized:\n{out}"
    );

    let target_fun = function("__is_pointer", 0x5000, 0x5008);
    let target_instructions = decode_words(0x5000, &[jr_ra(), NOP]);
    let out = generator.generate_function(&target_fun, &target_instructions, false);
    assert!(
        out.contains("void ps2___is_pointer(uint8_t* rdram"),
        "definition not sanitized:\n{out}"
    );
}

#[test]
fn backward_branch_emits_label_before_the_branch() {
    let fun = function("back", 0x2088, 0x20a8);
    // beq at 0x2098 with offset -4 words lands on 0x208c.
    let words = [
        NOP,
        NOP,
        NOP,
        NOP,
        (OPCODE_BEQ << 26) | (1 << 21) | (2 << 16) | 0xFFFC,
        NOP,
        jr_ra(),
        NOP,
    ];
    let instructions = decode_words(0x2088, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("label_208c:"), "{out}");
    assert!(out.contains("goto label_208c;"), "{out}");
    let label_at = out.find("label_208c:").unwrap();
    let goto_at = out.find("goto label_208c;").unwrap();
    assert!(label_at < goto_at);
}

#[test]
fn likely_branch_nullifies_delay_slot_on_fallthrough() {
    let fun = function("likely", 0x3000, 0x3018);
    let delay = (OPCODE_ADDIU << 26) | (4 << 21) | (4 << 16) | 1; // addiu $a0, $a0, 1
    let words = [
        (OPCODE_BNEL << 26) | (1 << 21) | (2 << 16) | 0x0002, // -> 0x300c
        delay,
        NOP,
        jr_ra(),
        NOP,
        NOP,
    ];
    let instructions = decode_words(0x3000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    // The delay-slot statement must sit inside the taken block.
    let taken = out.find("if (branch_taken_0x3000)").expect("taken guard");
    let delay_stmt = out.find("SET_GPR_S32(ctx, 4, ADD32(GPR_U32(ctx, 4), 1));");
    let delay_at = delay_stmt.expect("delay slot translated");
    let close = out[taken..].find("}").map(|i| taken + i).unwrap();
    assert!(
        taken < delay_at && delay_at < close,
        "likely delay slot leaked out of the taken path:\n{out}"
    );
}

#[test]
fn non_likely_branch_executes_delay_slot_unconditionally() {
    let fun = function("plain", 0x3000, 0x3018);
    let delay = (OPCODE_ADDIU << 26) | (4 << 21) | (4 << 16) | 1;
    let words = [
        (OPCODE_BEQ << 26) | (1 << 21) | (2 << 16) | 0x0002,
        delay,
        NOP,
        jr_ra(),
        NOP,
        NOP,
    ];
    let instructions = decode_words(0x3000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    let delay_at = out
        .find("SET_GPR_S32(ctx, 4, ADD32(GPR_U32(ctx, 4), 1));")
        .expect("delay slot translated");
    let guard_at = out.find("if (branch_taken_0x3000)").expect("guard");
    assert!(
        delay_at < guard_at,
        "non-likely delay slot must run before the branch test:\n{out}"
    );
}

#[test]
fn branch_into_delay_slot_gets_a_fallthrough_label() {
    let fun = function("weird", 0x5000, 0x5020);
    let words = [
        (OPCODE_BEQ << 26) | (1 << 21) | (1 << 16) | 0x0000, // always taken -> 0x5004 (delay slot!)
        (OPCODE_ADDIU << 26) | (4 << 21) | (4 << 16) | 1,
        NOP,
        jr_ra(),
        NOP,
        NOP,
        NOP,
        NOP,
    ];
    let instructions = decode_words(0x5000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("if (ctx->pc == 0x5004u)"), "{out}");
    assert!(out.contains("label_fallthrough_0x5000:"), "{out}");
    assert!(out.contains("goto label_fallthrough_0x5000;"), "{out}");
}

#[test]
fn generated_pc_writes_track_every_instruction() {
    let fun = function("straight", 0x1000, 0x1010);
    let words = [
        (OPCODE_ADDIU << 26) | (4 << 21) | (4 << 16) | 1,
        (OPCODE_LW << 26) | (4 << 21) | (2 << 16) | 0x10,
        (OPCODE_SW << 26) | (4 << 21) | (2 << 16) | 0x14,
        NOP,
    ];
    let instructions = decode_words(0x1000, &words);

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    for address in [0x1000u32, 0x1004, 0x1008, 0x100c] {
        assert!(
            out.contains(&format!("ctx->pc = 0x{address:X}u;")),
            "pc write for {address:#x} missing:\n{out}"
        );
    }
}

#[test]
fn mmio_tagged_access_routes_through_the_runtime() {
    let fun = function("mmio", 0x1000, 0x1008);
    let mut instructions = decode_words(
        0x1000,
        &[
            (OPCODE_LW << 26) | (4 << 21) | (2 << 16) | 0x10,
            (OPCODE_SW << 26) | (4 << 21) | (2 << 16) | 0x14,
        ],
    );
    for inst in &mut instructions {
        inst.is_mmio = true;
        inst.mmio_address = 0x1000_3000;
    }

    let generator = CodeGenerator::new(&[]);
    let out = generator.generate_function(&fun, &instructions, false);

    assert!(out.contains("runtime->Load32(rdram, ctx,"), "{out}");
    assert!(out.contains("runtime->Store32(rdram, ctx,"), "{out}");
    assert!(!out.contains("READ32("), "{out}");
    assert!(!out.contains("WRITE32("), "{out}");
    assert!(out.contains("// MMIO: 0x10003000"), "{out}");
}

#[test]
fn translation_is_deterministic() {
    let generator = CodeGenerator::new(&[]);
    let inst = decode(0x1000, (OPCODE_ADDIU << 26) | (4 << 21) | (4 << 16) | 1);
    assert_eq!(generator.translate(&inst), generator.translate(&inst));
}

#[test]
fn mmi_ops_translate_to_vector_macros() {
    let generator = CodeGenerator::new(&[]);

    // PADDW: MMI function 0x08 (MMI0), sa 0x00.
    let paddw = decode(0, (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | 0x08);
    let out = generator.translate(&paddw);
    assert!(
        out.contains("PS2_PADDW(GPR_VEC(ctx, 1), GPR_VEC(ctx, 2))"),
        "{out}"
    );
    assert!(out.contains("SET_GPR_VEC(ctx, 3,"), "{out}");

    // QFSRV: MMI1 (function 0x28), sa 0x1B; shifts by the SA register.
    let qfsrv = decode(
        0,
        (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | (0x1B << 6) | 0x28,
    );
    let out = generator.translate(&qfsrv);
    assert!(out.contains("ctx->sa & 0x7F"), "{out}");

    // PMFHL.LW: function 0x30, sa 0.
    let pmfhl = decode(0, (OPCODE_MMI << 26) | (3 << 11) | 0x30);
    let out = generator.translate(&pmfhl);
    assert!(out.contains("PS2_PMFHL_LW(ctx->hi, ctx->lo)"), "{out}");
}

#[test]
fn pmaddw_accumulates_into_hi_lo_and_rd() {
    let generator = CodeGenerator::new(&[]);
    // PMADDW: MMI2 (function 0x09), sa 0x00.
    let inst = decode(0, (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | 0x09);
    let out = generator.translate(&inst);

    assert!(out.contains("((uint64_t)ctx->hi << 32) | ctx->lo"), "{out}");
    assert!(out.contains("SET_GPR_U64(ctx, 3, acc);"), "{out}");
}

#[test]
fn vu_add_applies_destination_mask() {
    let generator = CodeGenerator::new(&[]);
    // vadd.xy vf1, vf2, vf3: dest mask 0xC in bits 24..21.
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (0xC << 21) | (3 << 16) | (2 << 11) | (1 << 6) | 0x28;
    let inst = decode(0, raw);
    let out = generator.translate(&inst);

    assert!(out.contains("PS2_VADD(ctx->vu0_vf[2], ctx->vu0_vf[3])"), "{out}");
    assert!(out.contains("_mm_set_epi32(-1, -1, 0, 0)"), "{out}");
    assert!(out.contains("PS2_VBLEND(ctx->vu0_vf[1]"), "{out}");
}

#[test]
fn vdiv_writes_the_q_register() {
    let generator = CodeGenerator::new(&[]);
    // VDIV: Special2 code 0x38, function field 0x3C.
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (2 << 16) | (1 << 11) | (0xE << 6) | 0x3C;
    let inst = decode(0, raw);
    let out = generator.translate(&inst);

    assert!(out.contains("ctx->vu0_q ="), "{out}");
    assert!(out.contains("ft != 0.0f"), "{out}");
}

#[test]
fn vcallms_scales_the_instruction_index_to_bytes() {
    let generator = CodeGenerator::new(&[]);
    // VCALLMS with immediate index 0x20 -> byte address 0x100.
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (0x20 << 6) | 0x38;
    let inst = decode(0, raw);
    let out = generator.translate(&inst);

    assert!(
        out.contains("runtime->executeVU0Microprogram(rdram, ctx, 0x100);"),
        "{out}"
    );
}

#[test]
fn vclip_shifts_the_clip_register() {
    let generator = CodeGenerator::new(&[]);
    // VCLIPw: Special2 code 0x1F = (0x7 << 2) | 3.
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (2 << 16) | (1 << 11) | (0x7 << 6) | 0x3F;
    let inst = decode(0, raw);
    assert_eq!(inst.vu_function, 0x1F);
    let out = generator.translate(&inst);

    assert!(
        out.contains("((ctx->vu0_clip_flags << 6) | (flags & 0x3F)) & 0xFFFFFF"),
        "{out}"
    );
}

#[test]
fn vlqi_increments_its_pointer_register() {
    let generator = CodeGenerator::new(&[]);
    // VLQI: Special2 code 0x34 = (0xD << 2) | 0.
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (2 << 16) | (1 << 11) | (0xD << 6) | 0x3C;
    let inst = decode(0, raw);
    assert_eq!(inst.vu_function, 0x34);
    let out = generator.translate(&inst);

    assert!(out.contains("ctx->vi[1] = (ctx->vi[1] + 1) & 0x3FF;"), "{out}");
    assert!(out.contains("READ128("), "{out}");
}

#[test]
fn division_by_zero_follows_the_mips_convention() {
    let generator = CodeGenerator::new(&[]);
    let div = decode(0, (OPCODE_SPECIAL << 26) | (4 << 21) | (5 << 16) | 0x1A);
    let out = generator.translate(&div);
    assert!(out.contains("ctx->lo = (dividend < 0) ? 1 : -1;"), "{out}");
    assert!(out.contains("ctx->hi = (uint32_t)dividend;"), "{out}");
    assert!(out.contains("INT32_MIN"), "{out}");

    let divu = decode(0, (OPCODE_SPECIAL << 26) | (4 << 21) | (5 << 16) | 0x1B);
    let out = generator.translate(&divu);
    assert!(out.contains("ctx->lo = 0xFFFFFFFF;"), "{out}");
}

#[test]
fn registration_table_registers_the_entry_first() {
    let mut generator = CodeGenerator::new(&[symbol("game_main", 0x2000)]);
    generator.set_bootstrap_info(ps2recomp::BootstrapInfo {
        valid: true,
        entry: 0x2000,
        bss_start: 0,
        bss_end: 0,
        gp: 0,
        entry_name: String::new(),
    });

    let functions = vec![
        function("helper", 0x1000, 0x1010),
        function("game_main", 0x2000, 0x2020),
    ];
    let mut renames = std::collections::HashMap::new();
    renames.insert(0x1000, "helper_0x1000".to_string());
    renames.insert(0x2000, "game_main_0x2000".to_string());
    generator.set_renamed_functions(renames);

    let out = generator.generate_registration(&functions);
    let entry_at = out.find("registerFunction(0x2000, game_main_0x2000)").unwrap();
    let helper_at = out.find("registerFunction(0x1000, helper_0x1000)").unwrap();
    assert!(entry_at < helper_at, "entry must register first:\n{out}");
}

#[test]
fn eret_restores_pc_and_clears_the_ll_bit() {
    let generator = CodeGenerator::new(&[]);
    let raw = (0x10u32 << 26) | (0x10 << 21) | 0x18;
    let out = generator.translate(&decode(0, raw));

    assert!(out.contains("ctx->pc = ctx->cop0_errorepc;"), "{out}");
    assert!(out.contains("ctx->pc = ctx->cop0_epc;"), "{out}");
    assert!(out.contains("runtime->clearLLBit(ctx);"), "{out}");
    assert!(out.contains("return;"), "{out}");
}

#[test]
fn cop0_status_write_masks_valid_bits() {
    let generator = CodeGenerator::new(&[]);
    // mtc0 $t0, Status
    let raw = (0x10u32 << 26) | (0x04 << 21) | (8 << 16) | (12 << 11);
    let out = generator.translate(&decode(0, raw));
    assert!(out.contains("& 0xFF57FFFF"), "{out}");
}
