use ps2recomp::decode;

const OPCODE_SPECIAL: u32 = 0x00;
const OPCODE_J: u32 = 0x02;
const OPCODE_JAL: u32 = 0x03;
const OPCODE_BEQ: u32 = 0x04;
const OPCODE_BNE: u32 = 0x05;
const OPCODE_BNEL: u32 = 0x15;
const OPCODE_REGIMM: u32 = 0x01;
const OPCODE_MMI: u32 = 0x1C;
const OPCODE_COP2: u32 = 0x12;
const OPCODE_LW: u32 = 0x23;
const OPCODE_SW: u32 = 0x2B;
const OPCODE_LQ: u32 = 0x1E;
const OPCODE_SQ: u32 = 0x1F;

const SPECIAL_JR: u32 = 0x08;
const SPECIAL_JALR: u32 = 0x09;
const SPECIAL_MULT: u32 = 0x18;
const SPECIAL_DIV: u32 = 0x1A;

#[test]
fn jal_decodes_as_linked_jump_with_target() {
    // jal 0x00400000 at 0x1000 => 0x0C100000
    let inst = decode(0x1000, 0x0C10_0000);

    assert!(inst.is_jump, "jal should be marked as jump");
    assert!(inst.is_call, "jal should be marked as call");
    assert!(inst.has_delay_slot, "jal has a delay slot");
    assert!(inst.modifies.modifies_gpr, "jal writes $ra");
    assert_eq!(inst.jump_target(), 0x0040_0000);
}

#[test]
fn j_target_takes_upper_bits_from_the_delay_slot_pc() {
    // At 0x8FFFFFFC the delay slot PC crosses into the 0x90000000
    // segment, and the target must follow it there.
    let raw = (OPCODE_J << 26) | 0x0123456;
    let inst = decode(0x8FFF_FFFC, raw);

    assert_eq!(inst.jump_target(), 0x9000_0000 | (0x0123456 << 2));
    assert_eq!(inst.jump_target(), 0x9048_D158);
}

#[test]
fn register_jumps_have_no_static_target() {
    let jr = decode(0x1200, (OPCODE_SPECIAL << 26) | (2 << 21) | SPECIAL_JR);
    let jalr = decode(
        0x1204,
        (OPCODE_SPECIAL << 26) | (3 << 21) | (31 << 11) | SPECIAL_JALR,
    );

    assert_eq!(jr.jump_target(), 0);
    assert_eq!(jalr.jump_target(), 0);
}

#[test]
fn beq_sets_branch_flags_and_target() {
    let raw = (OPCODE_BEQ << 26) | (1 << 21) | (2 << 16) | 0x0004;
    let inst = decode(0x2000, raw);

    assert!(inst.is_branch);
    assert!(inst.has_delay_slot);
    assert_eq!(inst.branch_target(), 0x2000 + 4 + (4 << 2));
}

#[test]
fn branch_target_sign_extends_negative_offsets() {
    let raw = (OPCODE_BNE << 26) | (1 << 21) | (2 << 16) | 0xFFFC;
    let inst = decode(0x2100, raw);

    assert_eq!(inst.branch_target(), 0x2094);
}

#[test]
fn branch_target_is_zero_for_non_branches() {
    let inst = decode(0x2000, (OPCODE_LW << 26) | (1 << 21) | (2 << 16) | 0x10);
    assert_eq!(inst.branch_target(), 0);
}

#[test]
fn load_store_classification() {
    let lw = decode(0x3000, (OPCODE_LW << 26) | (1 << 21) | (2 << 16) | 0x10);
    let sw = decode(0x3004, (OPCODE_SW << 26) | (3 << 21) | (4 << 16) | 0x20);

    assert!(lw.is_load && !lw.is_store);
    assert!(lw.modifies.modifies_gpr);
    assert!(sw.is_store && !sw.is_load);
    assert!(sw.modifies.modifies_memory);
    assert!(!sw.modifies.modifies_gpr);
}

#[test]
fn quadword_memory_ops_are_multimedia() {
    let lq = decode(0x3000, (OPCODE_LQ << 26) | (1 << 21) | (2 << 16));
    let sq = decode(0x3004, (OPCODE_SQ << 26) | (1 << 21) | (2 << 16));

    assert!(lq.is_load && lq.is_multimedia);
    assert!(sq.is_store && sq.is_multimedia);
}

#[test]
fn jr_ra_is_a_return() {
    let inst = decode(0x4000, (OPCODE_SPECIAL << 26) | (31 << 21) | SPECIAL_JR);
    assert!(inst.is_jump && inst.is_return && inst.has_delay_slot);

    // jr through any other register is an indirect jump, not a return.
    let other = decode(0x4000, (OPCODE_SPECIAL << 26) | (8 << 21) | SPECIAL_JR);
    assert!(other.is_jump && !other.is_return);
}

#[test]
fn jalr_is_a_call_and_writes_its_link_register() {
    let raw = (OPCODE_SPECIAL << 26) | (2 << 21) | (5 << 11) | SPECIAL_JALR;
    let inst = decode(0x5000, raw);

    assert!(inst.is_jump && inst.is_call && inst.has_delay_slot);
    assert!(inst.modifies.modifies_gpr);

    // jalr $zero, $rs behaves like jr $rs for the register file.
    let zero_rd = decode(0x5000, (OPCODE_SPECIAL << 26) | (2 << 21) | SPECIAL_JALR);
    assert!(!zero_rd.modifies.modifies_gpr);
}

#[test]
fn regimm_branch_and_link_is_branch_and_call() {
    // bgezal $s0, +8
    let raw = (OPCODE_REGIMM << 26) | (16 << 21) | (0x11 << 16) | 0x0002;
    let inst = decode(0x6000, raw);

    assert!(inst.is_branch && inst.is_call && inst.has_delay_slot);
    assert!(inst.modifies.modifies_gpr);
}

#[test]
fn likely_branches_still_have_delay_slots() {
    let raw = (OPCODE_BNEL << 26) | (1 << 21) | (2 << 16) | 0x0004;
    let inst = decode(0x6000, raw);
    assert!(inst.is_branch && inst.has_delay_slot);
}

#[test]
fn mult_div_gpr_write_contract() {
    // The R5900 three-operand MULT/DIV forms write rd when rd != 0.
    for func in [SPECIAL_MULT, SPECIAL_DIV] {
        let with_rd = (OPCODE_SPECIAL << 26) | (1 << 21) | (2 << 16) | (3 << 11) | func;
        let without_rd = (OPCODE_SPECIAL << 26) | (1 << 21) | (2 << 16) | func;

        assert!(decode(0, with_rd).modifies.modifies_gpr, "func {func:#x}");
        assert!(!decode(0, without_rd).modifies.modifies_gpr, "func {func:#x}");
        assert!(decode(0, without_rd).modifies.modifies_control);
    }

    // MMI MULT1 follows the same contract in the second MAC unit.
    let mult1 = (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | 0x18;
    assert!(decode(0, mult1).modifies.modifies_gpr);
}

#[test]
fn mmi_groups_record_their_sub_table() {
    // MMI0 PADDW: function 0x08, sa 0x00
    let paddw = (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | 0x08;
    let inst = decode(0, paddw);
    assert!(inst.is_mmi && inst.is_multimedia);
    assert_eq!(inst.mmi_type, 0);
    assert_eq!(inst.mmi_function, 0);

    // MMI3 POR: function 0x29, sa 0x12
    let por = (OPCODE_MMI << 26) | (1 << 21) | (2 << 16) | (3 << 11) | (0x12 << 6) | 0x29;
    let inst = decode(0, por);
    assert_eq!(inst.mmi_type, 3);
    assert_eq!(inst.mmi_function, 0x12);
}

#[test]
fn pmfhl_records_its_variation() {
    // PMFHL.UW: function 0x30, sa 0x01
    let raw = (OPCODE_MMI << 26) | (3 << 11) | (1 << 6) | 0x30;
    let inst = decode(0, raw);
    assert_eq!(inst.pmfhl_variation, 1);
}

#[test]
fn cop2_co_ops_are_vector_ops() {
    // vadd.xyzw vf1, vf2, vf3
    let raw = (OPCODE_COP2 << 26) | (0x1F << 21) | (3 << 16) | (2 << 11) | (1 << 6) | 0x28;
    let inst = decode(0, raw);

    assert!(inst.is_vu && inst.is_multimedia);
    assert!(inst.vector.is_vector);
    assert_eq!(inst.vector.vector_field, 0xF);
    assert_eq!(inst.vu_function, 0x28);
}

#[test]
fn vcallms_modifies_control_but_is_not_a_guest_call() {
    let raw = (OPCODE_COP2 << 26) | (0x10 << 21) | (0x20 << 6) | 0x38;
    let inst = decode(0, raw);
    assert!(inst.modifies.modifies_control);
    assert!(!inst.is_call && !inst.is_jump);
}

#[test]
fn eret_is_a_return_without_delay_slot() {
    let raw = (0x10 << 26) | (0x10 << 21) | 0x18;
    let inst = decode(0x7000, raw);
    assert!(inst.is_return);
    assert!(!inst.has_delay_slot);
}

#[test]
fn delay_slot_invariant_over_random_words() {
    // A decoded word with a delay slot must be a branch or a jump, for
    // any encoding. Use a simple deterministic sweep instead of RNG.
    let mut word = 0x9E37_79B9u32;
    for _ in 0..4096 {
        word = word.wrapping_mul(0x0019_660D).wrapping_add(0x3C6E_F35F);
        let inst = decode(0x1_0000, word);
        if inst.has_delay_slot {
            assert!(inst.is_branch || inst.is_jump, "word {word:#010x}");
        }
    }
}

#[test]
fn decoding_is_deterministic() {
    let raw = (OPCODE_BEQ << 26) | (1 << 21) | (2 << 16) | 0xFFFC;
    assert_eq!(decode(0x2100, raw), decode(0x2100, raw));
}
