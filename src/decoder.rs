//! The R5900 instruction decoder.
//!
//! [`decode`] lifts one 32-bit instruction word into an [`Instruction`]
//! record carrying the operand fields plus everything downstream stages
//! dispatch on: branch/jump/call/return classification, delay-slot
//! status, load/store direction, the MMI sub-table coordinates and the
//! VU0 macro-mode metadata. Decoding is pure and never fails; a word the
//! decoder does not recognise still produces a record, and the code
//! generator turns it into a diagnostic comment.
//!
//! # Examples
//!
//! ```
//! let inst = ps2recomp::decode(0x1000, 0x0C10_0000); // jal 0x00400000
//! assert!(inst.is_jump && inst.is_call && inst.has_delay_slot);
//! assert_eq!(inst.jump_target(), 0x0040_0000);
//! ```

use crate::consts::*;

/// VU0 macro-mode metadata attached to COP2 instructions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorInfo {
    /// True for COP2 operations that touch the vector register file.
    pub is_vector: bool,
    /// The operation reads the Q register.
    pub uses_q_reg: bool,
    /// The operation reads the P register.
    pub uses_p_reg: bool,
    /// The operation updates the MAC flags.
    pub modifies_mac: bool,
    /// Destination mask, one bit per lane; 0xF selects all of xyzw.
    pub vector_field: u8,
    /// Lane select for the FS register (bits 11..10).
    pub fsf: u8,
    /// Lane select for the FT register (bits 9..8).
    pub ftf: u8,
}

/// Which architectural state an instruction writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModificationInfo {
    /// Writes a general purpose register other than `$zero`.
    pub modifies_gpr: bool,
    /// Writes a COP1 float register.
    pub modifies_fpr: bool,
    /// Writes a VU0 vector float register.
    pub modifies_vfr: bool,
    /// Writes a VU0 integer register.
    pub modifies_vir: bool,
    /// Writes a VU0 control register.
    pub modifies_vic: bool,
    /// Writes guest memory.
    pub modifies_memory: bool,
    /// Writes control state (PC, HI/LO, SA, COP0, FCR31, VU flags).
    pub modifies_control: bool,
}

/// One decoded R5900 instruction.
///
/// The operand fields are the raw bitfield extractions; the flags are
/// the decoder's classification. A record is immutable once the code
/// generator starts consuming its function, except for the MMIO tag the
/// orchestrator applies from configuration between decode and code
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    /// Guest PC of this word.
    pub address: u32,
    /// Original encoding, after patching.
    pub raw: u32,
    /// Primary opcode, bits 31..26.
    pub opcode: u32,
    /// Source register field, bits 25..21.
    pub rs: u32,
    /// Target register field, bits 20..16.
    pub rt: u32,
    /// Destination register field, bits 15..11.
    pub rd: u32,
    /// Shift amount field, bits 10..6.
    pub sa: u32,
    /// Function field, bits 5..0.
    pub function: u32,
    /// Zero-extended 16-bit immediate.
    pub immediate: u32,
    /// Sign-extended 16-bit immediate, stored as a u32 bit pattern.
    pub simmediate: u32,
    /// 26-bit jump index field.
    pub target: u32,

    /// Belongs to the MMI group (opcode 0x1C).
    pub is_mmi: bool,
    /// Belongs to COP2 or one of the VU load/store opcodes.
    pub is_vu: bool,
    /// PC-relative conditional branch.
    pub is_branch: bool,
    /// Absolute or register jump.
    pub is_jump: bool,
    /// Links a return address (JAL/JALR, branch-and-link, VCALLMS).
    pub is_call: bool,
    /// Ends the guest function (JR $ra, ERET).
    pub is_return: bool,
    /// The following word executes before the transfer completes.
    pub has_delay_slot: bool,
    /// 128-bit or VU operation.
    pub is_multimedia: bool,
    /// Reads guest memory into a register.
    pub is_load: bool,
    /// Writes a register to guest memory.
    pub is_store: bool,

    /// MMI sub-table: 0..3 for MMI0..MMI3.
    pub mmi_type: u8,
    /// Function code within the MMI sub-table (the sa field).
    pub mmi_function: u8,
    /// PMFHL/PMTHL variation (the sa field).
    pub pmfhl_variation: u8,
    /// VU0 macro-mode function code (Special1 or reconstructed Special2).
    pub vu_function: u8,

    /// VU0 metadata.
    pub vector: VectorInfo,
    /// Side-effect classification.
    pub modifies: ModificationInfo,

    /// The orchestrator tagged this load/store as MMIO from config.
    pub is_mmio: bool,
    /// Guest address the MMIO tag refers to.
    pub mmio_address: u32,
}

impl Instruction {
    /// Absolute target of a conditional branch: `address + 4` plus the
    /// sign-extended immediate in words. Zero when the instruction is
    /// not a branch.
    pub fn branch_target(&self) -> u32 {
        if !self.is_branch {
            return 0;
        }
        let offset = (self.simmediate as i32) << 2;
        (self.address.wrapping_add(4) as i64 + offset as i64) as u32
    }

    /// Absolute target of a static J/JAL: the 26-bit index shifted into
    /// the 256 MiB segment of the delay-slot PC. Zero for register jumps
    /// (their target is dynamic).
    pub fn jump_target(&self) -> u32 {
        if self.opcode == OPCODE_J || self.opcode == OPCODE_JAL {
            (self.address.wrapping_add(4) & 0xF000_0000) | (self.target << 2)
        } else {
            0
        }
    }

    /// True for the canonical NOP encoding, `sll $zero, $zero, 0`.
    pub fn is_nop(&self) -> bool {
        self.opcode == OPCODE_SPECIAL
            && self.function == SPECIAL_SLL
            && self.rd == 0
            && self.rt == 0
            && self.sa == 0
    }
}

/// Decodes one instruction word. Pure: same inputs, same record.
pub fn decode(address: u32, raw: u32) -> Instruction {
    let mut inst = Instruction {
        address,
        raw,
        opcode: opcode(raw),
        rs: rs(raw),
        rt: rt(raw),
        rd: rd(raw),
        sa: sa(raw),
        function: function(raw),
        immediate: immediate(raw),
        simmediate: simmediate(raw),
        target: jump_index(raw),
        ..Instruction::default()
    };
    inst.vector.vector_field = 0xF;

    match inst.opcode {
        OPCODE_SPECIAL => decode_special(&mut inst),
        OPCODE_REGIMM => decode_regimm(&mut inst),

        OPCODE_J => {
            inst.is_jump = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_control = true;
        }
        OPCODE_JAL => {
            inst.is_jump = true;
            inst.is_call = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_gpr = true; // $ra
            inst.modifies.modifies_control = true;
        }

        OPCODE_BEQ | OPCODE_BNE | OPCODE_BLEZ | OPCODE_BGTZ | OPCODE_BEQL | OPCODE_BNEL
        | OPCODE_BLEZL | OPCODE_BGTZL => {
            inst.is_branch = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_control = true;
        }

        OPCODE_ADDI | OPCODE_ADDIU | OPCODE_SLTI | OPCODE_SLTIU | OPCODE_ANDI | OPCODE_ORI
        | OPCODE_XORI | OPCODE_LUI | OPCODE_DADDI | OPCODE_DADDIU => {
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }

        OPCODE_MMI => decode_mmi(&mut inst),

        OPCODE_LQ => {
            inst.is_load = true;
            inst.is_multimedia = true;
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        OPCODE_SQ => {
            inst.is_store = true;
            inst.is_multimedia = true;
            inst.modifies.modifies_memory = true;
        }

        OPCODE_LB | OPCODE_LH | OPCODE_LWL | OPCODE_LW | OPCODE_LBU | OPCODE_LHU | OPCODE_LWR
        | OPCODE_LWU | OPCODE_LD | OPCODE_LDL | OPCODE_LDR => {
            inst.is_load = true;
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }

        OPCODE_LL | OPCODE_LLD => {
            // Sets the LL bit alongside the register write.
            inst.is_load = true;
            inst.modifies.modifies_control = true;
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }

        OPCODE_SB | OPCODE_SH | OPCODE_SWL | OPCODE_SW | OPCODE_SWR | OPCODE_SD | OPCODE_SDL
        | OPCODE_SDR => {
            inst.is_store = true;
            inst.modifies.modifies_memory = true;
        }

        OPCODE_SC | OPCODE_SCD => {
            // The success flag lands in rt.
            inst.is_store = true;
            inst.modifies.modifies_memory = true;
            inst.modifies.modifies_control = true;
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }

        OPCODE_LWC1 | OPCODE_LDC1 => {
            inst.is_load = true;
            inst.modifies.modifies_fpr = true;
        }
        OPCODE_SWC1 | OPCODE_SDC1 => {
            inst.is_store = true;
            inst.modifies.modifies_memory = true;
        }

        OPCODE_LWC2 | OPCODE_LDC2 => {
            inst.is_load = true;
            inst.is_vu = true;
            inst.is_multimedia = true;
            inst.vector.is_vector = true;
            inst.modifies.modifies_vfr = true;
        }
        OPCODE_SWC2 | OPCODE_SDC2 => {
            inst.is_store = true;
            inst.is_vu = true;
            inst.is_multimedia = true;
            inst.vector.is_vector = true;
            inst.modifies.modifies_memory = true;
        }

        OPCODE_CACHE => {
            inst.modifies.modifies_control = true;
        }
        OPCODE_PREF => {}

        OPCODE_COP0 => decode_cop0(&mut inst),
        OPCODE_COP1 => decode_cop1(&mut inst),
        OPCODE_COP2 => decode_cop2(&mut inst),

        _ => {}
    }

    inst
}

fn decode_special(inst: &mut Instruction) {
    match inst.function {
        SPECIAL_JR => {
            inst.is_jump = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_control = true;
            if inst.rs == 31 {
                inst.is_return = true;
            }
        }
        SPECIAL_JALR => {
            inst.is_jump = true;
            inst.is_call = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_control = true;
            if inst.rd != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        SPECIAL_SYSCALL | SPECIAL_BREAK => {
            inst.modifies.modifies_control = true;
        }
        SPECIAL_MFHI | SPECIAL_MFLO | SPECIAL_MFSA => {
            if inst.rd != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        SPECIAL_MTHI | SPECIAL_MTLO | SPECIAL_MTSA => {
            inst.modifies.modifies_control = true;
        }
        SPECIAL_MULT | SPECIAL_MULTU | SPECIAL_DIV | SPECIAL_DIVU => {
            // The R5900 three-operand forms also write rd.
            inst.modifies.modifies_control = true;
            if inst.rd != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        SPECIAL_SLL | SPECIAL_SRL | SPECIAL_SRA | SPECIAL_SLLV | SPECIAL_SRLV | SPECIAL_SRAV
        | SPECIAL_MOVZ | SPECIAL_MOVN | SPECIAL_ADD | SPECIAL_ADDU | SPECIAL_SUB | SPECIAL_SUBU
        | SPECIAL_AND | SPECIAL_OR | SPECIAL_XOR | SPECIAL_NOR | SPECIAL_SLT | SPECIAL_SLTU
        | SPECIAL_DADD | SPECIAL_DADDU | SPECIAL_DSUB | SPECIAL_DSUBU | SPECIAL_DSLL
        | SPECIAL_DSRL | SPECIAL_DSRA | SPECIAL_DSLL32 | SPECIAL_DSRL32 | SPECIAL_DSRA32
        | SPECIAL_DSLLV | SPECIAL_DSRLV | SPECIAL_DSRAV => {
            if inst.rd != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        SPECIAL_TGE | SPECIAL_TGEU | SPECIAL_TLT | SPECIAL_TLTU | SPECIAL_TEQ | SPECIAL_TNE => {
            inst.modifies.modifies_control = true;
        }
        SPECIAL_SYNC => {
            inst.modifies.modifies_control = true;
        }
        _ => {}
    }
}

fn decode_regimm(inst: &mut Instruction) {
    match inst.rt {
        REGIMM_BLTZ | REGIMM_BGEZ | REGIMM_BLTZL | REGIMM_BGEZL => {
            inst.is_branch = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_control = true;
        }
        REGIMM_BLTZAL | REGIMM_BGEZAL | REGIMM_BLTZALL | REGIMM_BGEZALL => {
            inst.is_branch = true;
            inst.is_call = true;
            inst.has_delay_slot = true;
            inst.modifies.modifies_gpr = true; // $ra
            inst.modifies.modifies_control = true;
        }
        REGIMM_TGEI | REGIMM_TGEIU | REGIMM_TLTI | REGIMM_TLTIU | REGIMM_TEQI | REGIMM_TNEI => {
            inst.modifies.modifies_control = true;
        }
        REGIMM_MTSAB | REGIMM_MTSAH => {
            inst.is_multimedia = true;
            inst.modifies.modifies_control = true; // SA
        }
        _ => {}
    }
}

fn decode_mmi(inst: &mut Instruction) {
    inst.is_mmi = true;
    inst.is_multimedia = true;
    if inst.rd != 0 {
        inst.modifies.modifies_gpr = true;
    }

    match inst.function {
        MMI_MADD | MMI_MADDU | MMI_MSUB | MMI_MSUBU | MMI_MADD1 | MMI_MADDU1 => {
            inst.modifies.modifies_control = true; // HI/LO or HI1/LO1
        }
        MMI_MULT1 | MMI_MULTU1 | MMI_DIV1 | MMI_DIVU1 => {
            inst.modifies.modifies_control = true;
        }
        MMI_MFHI1 | MMI_MFLO1 | MMI_PLZCW => {}
        MMI_MTHI1 | MMI_MTLO1 => {
            inst.modifies.modifies_gpr = false;
            inst.modifies.modifies_control = true;
        }
        MMI_MMI0 => {
            inst.mmi_type = 0;
            inst.mmi_function = inst.sa as u8;
        }
        MMI_MMI1 => {
            inst.mmi_type = 1;
            inst.mmi_function = inst.sa as u8;
        }
        MMI_MMI2 => {
            inst.mmi_type = 2;
            inst.mmi_function = inst.sa as u8;
            match inst.sa {
                MMI2_PMADDW | MMI2_PMSUBW | MMI2_PMULTW | MMI2_PDIVW | MMI2_PDIVBW
                | MMI2_PMADDH | MMI2_PHMADH | MMI2_PMSUBH | MMI2_PHMSBH | MMI2_PMULTH => {
                    inst.modifies.modifies_control = true;
                }
                _ => {}
            }
        }
        MMI_MMI3 => {
            inst.mmi_type = 3;
            inst.mmi_function = inst.sa as u8;
            match inst.sa {
                MMI3_PMADDUW | MMI3_PMULTUW | MMI3_PDIVUW => {
                    inst.modifies.modifies_control = true;
                }
                MMI3_PMTHI | MMI3_PMTLO => {
                    inst.modifies.modifies_gpr = false;
                    inst.modifies.modifies_control = true;
                }
                _ => {}
            }
        }
        MMI_PMFHL => {
            inst.pmfhl_variation = inst.sa as u8;
        }
        MMI_PMTHL => {
            inst.pmfhl_variation = inst.sa as u8;
            inst.modifies.modifies_gpr = false;
            inst.modifies.modifies_control = true;
        }
        MMI_PSLLH | MMI_PSRLH | MMI_PSRAH | MMI_PSLLW | MMI_PSRLW | MMI_PSRAW => {}
        _ => {}
    }
}

fn decode_cop0(inst: &mut Instruction) {
    inst.modifies.modifies_control = true;

    match inst.rs {
        COP0_MF => {
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        COP0_MT => {}
        COP0_BC => {
            inst.is_branch = true;
            inst.has_delay_slot = true;
        }
        COP0_CO => match inst.function {
            COP0_CO_ERET => {
                // ERET transfers directly, without a delay slot.
                inst.is_return = true;
                inst.has_delay_slot = false;
            }
            COP0_CO_TLBR | COP0_CO_TLBWI | COP0_CO_TLBWR | COP0_CO_TLBP => {}
            COP0_CO_EI | COP0_CO_DI => {}
            _ => {}
        },
        _ => {}
    }
}

fn decode_cop1(inst: &mut Instruction) {
    match inst.rs {
        COP1_MF | COP1_CF => {
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        COP1_MT => {
            inst.modifies.modifies_fpr = true;
        }
        COP1_CT => {
            inst.modifies.modifies_control = true; // FCR31
        }
        COP1_BC => {
            if matches!(
                inst.rt,
                COP1_BC_BCF | COP1_BC_BCT | COP1_BC_BCFL | COP1_BC_BCTL
            ) {
                inst.is_branch = true;
                inst.has_delay_slot = true;
                inst.modifies.modifies_control = true;
            }
        }
        COP1_S | COP1_W | COP1_L => {
            if inst.function >= COP1_S_C_F {
                inst.modifies.modifies_control = true; // FCR31 condition bit
            } else {
                inst.modifies.modifies_fpr = true;
            }
        }
        _ => {}
    }
}

fn decode_cop2(inst: &mut Instruction) {
    inst.is_vu = true;
    inst.is_multimedia = true;
    inst.vector.is_vector = true;

    match inst.rs {
        COP2_QMFC2 | COP2_CFC2 => {
            if inst.rt != 0 {
                inst.modifies.modifies_gpr = true;
            }
        }
        COP2_QMTC2 => {
            inst.modifies.modifies_vfr = true;
        }
        COP2_CTC2 => {
            inst.modifies.modifies_vic = true;
            inst.modifies.modifies_control = true;
        }
        COP2_BC => {
            if matches!(
                inst.rt,
                COP2_BC_BCF | COP2_BC_BCT | COP2_BC_BCFL | COP2_BC_BCTL
            ) {
                inst.is_branch = true;
                inst.has_delay_slot = true;
                inst.modifies.modifies_control = true;
            }
        }
        rs if rs >= COP2_CO => decode_cop2_co(inst),
        _ => {}
    }
}

fn decode_cop2_co(inst: &mut Instruction) {
    inst.vector.vector_field = ((inst.raw >> 21) & 0xF) as u8;

    if inst.function >= 0x3C {
        // Special2: the function code is split across bits 10..6 and 1..0.
        let vu_func = (((inst.raw >> 6) & 0x1F) << 2) | (inst.raw & 0x3);
        inst.vu_function = vu_func as u8;
        decode_vu_special2(inst, vu_func);
    } else {
        inst.vu_function = inst.function as u8;
        decode_vu_special1(inst, inst.function);
    }
}

fn decode_vu_special1(inst: &mut Instruction, func: u32) {
    match func {
        VU0_S1_VADDX..=VU0_S1_VMSUBW
        | VU0_S1_VMULX..=VU0_S1_VMULW
        | VU0_S1_VADD
        | VU0_S1_VMADD
        | VU0_S1_VMUL
        | VU0_S1_VSUB
        | VU0_S1_VMSUB
        | VU0_S1_VOPMSUB => {
            inst.modifies.modifies_vfr = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S1_VMAXX..=VU0_S1_VMINIW | VU0_S1_VMAX | VU0_S1_VMINI | VU0_S1_VMAXI
        | VU0_S1_VMINII => {
            inst.modifies.modifies_vfr = true;
        }
        VU0_S1_VMULQ | VU0_S1_VADDQ | VU0_S1_VMADDQ | VU0_S1_VSUBQ | VU0_S1_VMSUBQ => {
            inst.vector.uses_q_reg = true;
            inst.modifies.modifies_vfr = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S1_VMULI | VU0_S1_VADDI | VU0_S1_VMADDI | VU0_S1_VSUBI | VU0_S1_VMSUBI => {
            inst.modifies.modifies_vfr = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S1_VIADD | VU0_S1_VISUB | VU0_S1_VIADDI | VU0_S1_VIAND | VU0_S1_VIOR => {
            inst.modifies.modifies_vir = true;
        }
        VU0_S1_VCALLMS | VU0_S1_VCALLMSR => {
            // Launches a microprogram through the runtime; not a guest
            // call, so the call flag stays clear.
            inst.modifies.modifies_control = true;
        }
        _ => {}
    }
}

fn decode_vu_special2(inst: &mut Instruction, func: u32) {
    match func {
        VU0_S2_VADDAX..=VU0_S2_VMSUBAW
        | VU0_S2_VMULAX..=VU0_S2_VMULAW
        | VU0_S2_VADDA
        | VU0_S2_VMADDA
        | VU0_S2_VMULA
        | VU0_S2_VSUBA
        | VU0_S2_VMSUBA
        | VU0_S2_VOPMULA => {
            // Accumulator results only.
            inst.modifies.modifies_control = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S2_VMULAQ | VU0_S2_VADDAQ | VU0_S2_VMADDAQ | VU0_S2_VSUBAQ | VU0_S2_VMSUBAQ => {
            inst.vector.uses_q_reg = true;
            inst.modifies.modifies_control = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S2_VMULAI | VU0_S2_VADDAI | VU0_S2_VMADDAI | VU0_S2_VSUBAI | VU0_S2_VMSUBAI => {
            inst.modifies.modifies_control = true;
            inst.vector.modifies_mac = true;
        }
        VU0_S2_VITOF0 | VU0_S2_VITOF4 | VU0_S2_VITOF12 | VU0_S2_VITOF15 | VU0_S2_VFTOI0
        | VU0_S2_VFTOI4 | VU0_S2_VFTOI12 | VU0_S2_VFTOI15 => {
            inst.modifies.modifies_vfr = true;
        }
        VU0_S2_VABS | VU0_S2_VMOVE | VU0_S2_VMR32 => {
            inst.modifies.modifies_vfr = true;
        }
        VU0_S2_VNOP | VU0_S2_VWAITQ => {}
        VU0_S2_VLQI | VU0_S2_VLQD => {
            // Auto-inc/dec pointer in vi[is] alongside the vector load.
            inst.is_load = true;
            inst.modifies.modifies_vfr = true;
            inst.modifies.modifies_vir = true;
        }
        VU0_S2_VSQI | VU0_S2_VSQD => {
            inst.is_store = true;
            inst.modifies.modifies_memory = true;
            inst.modifies.modifies_vir = true;
        }
        VU0_S2_VDIV | VU0_S2_VSQRT | VU0_S2_VRSQRT => {
            inst.vector.uses_q_reg = true;
            inst.vector.fsf = ((inst.raw >> 10) & 0x3) as u8;
            inst.vector.ftf = ((inst.raw >> 8) & 0x3) as u8;
            inst.modifies.modifies_control = true; // Q
        }
        VU0_S2_VMTIR => {
            inst.vector.fsf = ((inst.raw >> 10) & 0x3) as u8;
            inst.modifies.modifies_vir = true;
        }
        VU0_S2_VMFIR => {
            inst.modifies.modifies_vfr = true;
        }
        VU0_S2_VILWR => {
            inst.is_load = true;
            inst.modifies.modifies_vir = true;
        }
        VU0_S2_VISWR => {
            inst.is_store = true;
            inst.modifies.modifies_memory = true;
        }
        VU0_S2_VRNEXT | VU0_S2_VRGET => {
            inst.modifies.modifies_vfr = true;
            inst.modifies.modifies_control = true; // R
        }
        VU0_S2_VRINIT | VU0_S2_VRXOR => {
            inst.vector.fsf = ((inst.raw >> 10) & 0x3) as u8;
            inst.modifies.modifies_control = true; // R
        }
        VU0_S2_VCLIPW => {
            // Only the CLIP shift register changes.
            inst.vector.fsf = ((inst.raw >> 10) & 0x3) as u8;
            inst.modifies.modifies_control = true;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_is_recognised() {
        let inst = decode(0x1000, 0);
        assert!(inst.is_nop());
        assert!(!inst.modifies.modifies_gpr);
    }

    #[test]
    fn delay_slot_implies_branch_or_jump() {
        // Sweep the primary opcodes with representative encodings.
        for op in 0u32..64 {
            let raw = op << 26;
            let inst = decode(0x1000, raw);
            if inst.has_delay_slot {
                assert!(
                    inst.is_branch || inst.is_jump,
                    "opcode {op:#x} has a delay slot but is neither branch nor jump"
                );
            }
        }
    }

    #[test]
    fn eret_returns_without_delay_slot() {
        let raw = (OPCODE_COP0 << 26) | (COP0_CO << 21) | COP0_CO_ERET;
        let inst = decode(0x1000, raw);
        assert!(inst.is_return);
        assert!(!inst.has_delay_slot);
        assert!(inst.modifies.modifies_control);
    }

    #[test]
    fn jr_ra_is_return_with_delay_slot() {
        let raw = (OPCODE_SPECIAL << 26) | (31 << 21) | SPECIAL_JR;
        let inst = decode(0x4000, raw);
        assert!(inst.is_jump && inst.is_return && inst.has_delay_slot);
        assert!(!inst.modifies.modifies_gpr);
    }

    #[test]
    fn mult_marks_rd_write_when_rd_nonzero() {
        let with_rd = (OPCODE_SPECIAL << 26) | (1 << 21) | (2 << 16) | (3 << 11) | SPECIAL_MULT;
        let without_rd = (OPCODE_SPECIAL << 26) | (1 << 21) | (2 << 16) | SPECIAL_MULT;
        assert!(decode(0, with_rd).modifies.modifies_gpr);
        assert!(!decode(0, without_rd).modifies.modifies_gpr);
        assert!(decode(0, without_rd).modifies.modifies_control);
    }

    #[test]
    fn special2_function_reconstruction() {
        // VRNEXT: Special2 code 0x40 = bits 10..6 = 0x10, bits 1..0 = 0.
        let raw = (OPCODE_COP2 << 26) | (COP2_CO << 21) | (0x10 << 6) | 0x3C;
        let inst = decode(0, raw);
        assert_eq!(inst.vu_function, VU0_S2_VRNEXT as u8);
    }

    #[test]
    fn vdiv_extracts_lane_selects() {
        // VDIV is Special2 code 0x38 = (0xE << 2) | 0, which pins bits
        // 9..8, so ftf reads back as 3; fsf takes bit 11 as its high bit.
        let raw = (OPCODE_COP2 << 26) | (COP2_CO << 21) | (1 << 11) | (0xE << 6) | 0x3C;
        let inst = decode(0, raw);
        assert_eq!(inst.vu_function, VU0_S2_VDIV as u8);
        assert_eq!(inst.vector.fsf, 2);
        assert_eq!(inst.vector.ftf, 3);
        assert!(inst.vector.uses_q_reg);
    }

    #[test]
    fn vector_field_mask_extraction() {
        // VADD.xy (dest mask 0b1100 in bits 24..21).
        let raw = (OPCODE_COP2 << 26) | (COP2_CO << 21) | (0xC << 21) | VU0_S1_VADD;
        let inst = decode(0, raw);
        assert_eq!(inst.vector.vector_field, 0xC);
    }
}
