use phf::{phf_map, phf_set};

// Instruction word field extraction. Every field is taken from the same
// 32-bit word; the decoder stores them all so later stages never re-shift.

pub(crate) fn opcode(raw: u32) -> u32 {
    (raw >> 26) & 0x3F
}

pub(crate) fn rs(raw: u32) -> u32 {
    (raw >> 21) & 0x1F
}

pub(crate) fn rt(raw: u32) -> u32 {
    (raw >> 16) & 0x1F
}

pub(crate) fn rd(raw: u32) -> u32 {
    (raw >> 11) & 0x1F
}

pub(crate) fn sa(raw: u32) -> u32 {
    (raw >> 6) & 0x1F
}

pub(crate) fn function(raw: u32) -> u32 {
    raw & 0x3F
}

pub(crate) fn immediate(raw: u32) -> u32 {
    raw & 0xFFFF
}

pub(crate) fn simmediate(raw: u32) -> u32 {
    (raw & 0xFFFF) as u16 as i16 as i32 as u32
}

pub(crate) fn jump_index(raw: u32) -> u32 {
    raw & 0x03FF_FFFF
}

// Primary opcode table (bits 31..26).

pub(crate) const OPCODE_SPECIAL: u32 = 0x00;
pub(crate) const OPCODE_REGIMM: u32 = 0x01;
pub(crate) const OPCODE_J: u32 = 0x02;
pub(crate) const OPCODE_JAL: u32 = 0x03;
pub(crate) const OPCODE_BEQ: u32 = 0x04;
pub(crate) const OPCODE_BNE: u32 = 0x05;
pub(crate) const OPCODE_BLEZ: u32 = 0x06;
pub(crate) const OPCODE_BGTZ: u32 = 0x07;
pub(crate) const OPCODE_ADDI: u32 = 0x08;
pub(crate) const OPCODE_ADDIU: u32 = 0x09;
pub(crate) const OPCODE_SLTI: u32 = 0x0A;
pub(crate) const OPCODE_SLTIU: u32 = 0x0B;
pub(crate) const OPCODE_ANDI: u32 = 0x0C;
pub(crate) const OPCODE_ORI: u32 = 0x0D;
pub(crate) const OPCODE_XORI: u32 = 0x0E;
pub(crate) const OPCODE_LUI: u32 = 0x0F;
pub(crate) const OPCODE_COP0: u32 = 0x10;
pub(crate) const OPCODE_COP1: u32 = 0x11;
pub(crate) const OPCODE_COP2: u32 = 0x12;
pub(crate) const OPCODE_BEQL: u32 = 0x14;
pub(crate) const OPCODE_BNEL: u32 = 0x15;
pub(crate) const OPCODE_BLEZL: u32 = 0x16;
pub(crate) const OPCODE_BGTZL: u32 = 0x17;
pub(crate) const OPCODE_DADDI: u32 = 0x18;
pub(crate) const OPCODE_DADDIU: u32 = 0x19;
pub(crate) const OPCODE_LDL: u32 = 0x1A;
pub(crate) const OPCODE_LDR: u32 = 0x1B;
pub(crate) const OPCODE_MMI: u32 = 0x1C;
pub(crate) const OPCODE_LQ: u32 = 0x1E;
pub(crate) const OPCODE_SQ: u32 = 0x1F;
pub(crate) const OPCODE_LB: u32 = 0x20;
pub(crate) const OPCODE_LH: u32 = 0x21;
pub(crate) const OPCODE_LWL: u32 = 0x22;
pub(crate) const OPCODE_LW: u32 = 0x23;
pub(crate) const OPCODE_LBU: u32 = 0x24;
pub(crate) const OPCODE_LHU: u32 = 0x25;
pub(crate) const OPCODE_LWR: u32 = 0x26;
pub(crate) const OPCODE_LWU: u32 = 0x27;
pub(crate) const OPCODE_SB: u32 = 0x28;
pub(crate) const OPCODE_SH: u32 = 0x29;
pub(crate) const OPCODE_SWL: u32 = 0x2A;
pub(crate) const OPCODE_SW: u32 = 0x2B;
pub(crate) const OPCODE_SDL: u32 = 0x2C;
pub(crate) const OPCODE_SDR: u32 = 0x2D;
pub(crate) const OPCODE_SWR: u32 = 0x2E;
pub(crate) const OPCODE_CACHE: u32 = 0x2F;
pub(crate) const OPCODE_LL: u32 = 0x30;
pub(crate) const OPCODE_LWC1: u32 = 0x31;
pub(crate) const OPCODE_LWC2: u32 = 0x32;
pub(crate) const OPCODE_PREF: u32 = 0x33;
pub(crate) const OPCODE_LLD: u32 = 0x34;
pub(crate) const OPCODE_LDC1: u32 = 0x35;
pub(crate) const OPCODE_LDC2: u32 = 0x36;
pub(crate) const OPCODE_LD: u32 = 0x37;
pub(crate) const OPCODE_SC: u32 = 0x38;
pub(crate) const OPCODE_SWC1: u32 = 0x39;
pub(crate) const OPCODE_SWC2: u32 = 0x3A;
pub(crate) const OPCODE_SCD: u32 = 0x3C;
pub(crate) const OPCODE_SDC1: u32 = 0x3D;
pub(crate) const OPCODE_SDC2: u32 = 0x3E;
pub(crate) const OPCODE_SD: u32 = 0x3F;

// SPECIAL group (opcode 0x00), dispatched on the function field.

pub(crate) const SPECIAL_SLL: u32 = 0x00;
pub(crate) const SPECIAL_SRL: u32 = 0x02;
pub(crate) const SPECIAL_SRA: u32 = 0x03;
pub(crate) const SPECIAL_SLLV: u32 = 0x04;
pub(crate) const SPECIAL_SRLV: u32 = 0x06;
pub(crate) const SPECIAL_SRAV: u32 = 0x07;
pub(crate) const SPECIAL_JR: u32 = 0x08;
pub(crate) const SPECIAL_JALR: u32 = 0x09;
pub(crate) const SPECIAL_MOVZ: u32 = 0x0A;
pub(crate) const SPECIAL_MOVN: u32 = 0x0B;
pub(crate) const SPECIAL_SYSCALL: u32 = 0x0C;
pub(crate) const SPECIAL_BREAK: u32 = 0x0D;
pub(crate) const SPECIAL_SYNC: u32 = 0x0F;
pub(crate) const SPECIAL_MFHI: u32 = 0x10;
pub(crate) const SPECIAL_MTHI: u32 = 0x11;
pub(crate) const SPECIAL_MFLO: u32 = 0x12;
pub(crate) const SPECIAL_MTLO: u32 = 0x13;
pub(crate) const SPECIAL_DSLLV: u32 = 0x14;
pub(crate) const SPECIAL_DSRLV: u32 = 0x16;
pub(crate) const SPECIAL_DSRAV: u32 = 0x17;
pub(crate) const SPECIAL_MULT: u32 = 0x18;
pub(crate) const SPECIAL_MULTU: u32 = 0x19;
pub(crate) const SPECIAL_DIV: u32 = 0x1A;
pub(crate) const SPECIAL_DIVU: u32 = 0x1B;
pub(crate) const SPECIAL_ADD: u32 = 0x20;
pub(crate) const SPECIAL_ADDU: u32 = 0x21;
pub(crate) const SPECIAL_SUB: u32 = 0x22;
pub(crate) const SPECIAL_SUBU: u32 = 0x23;
pub(crate) const SPECIAL_AND: u32 = 0x24;
pub(crate) const SPECIAL_OR: u32 = 0x25;
pub(crate) const SPECIAL_XOR: u32 = 0x26;
pub(crate) const SPECIAL_NOR: u32 = 0x27;
pub(crate) const SPECIAL_MFSA: u32 = 0x28;
pub(crate) const SPECIAL_MTSA: u32 = 0x29;
pub(crate) const SPECIAL_SLT: u32 = 0x2A;
pub(crate) const SPECIAL_SLTU: u32 = 0x2B;
pub(crate) const SPECIAL_DADD: u32 = 0x2C;
pub(crate) const SPECIAL_DADDU: u32 = 0x2D;
pub(crate) const SPECIAL_DSUB: u32 = 0x2E;
pub(crate) const SPECIAL_DSUBU: u32 = 0x2F;
pub(crate) const SPECIAL_TGE: u32 = 0x30;
pub(crate) const SPECIAL_TGEU: u32 = 0x31;
pub(crate) const SPECIAL_TLT: u32 = 0x32;
pub(crate) const SPECIAL_TLTU: u32 = 0x33;
pub(crate) const SPECIAL_TEQ: u32 = 0x34;
pub(crate) const SPECIAL_TNE: u32 = 0x36;
pub(crate) const SPECIAL_DSLL: u32 = 0x38;
pub(crate) const SPECIAL_DSRL: u32 = 0x3A;
pub(crate) const SPECIAL_DSRA: u32 = 0x3B;
pub(crate) const SPECIAL_DSLL32: u32 = 0x3C;
pub(crate) const SPECIAL_DSRL32: u32 = 0x3E;
pub(crate) const SPECIAL_DSRA32: u32 = 0x3F;

// REGIMM group (opcode 0x01), dispatched on the rt field.

pub(crate) const REGIMM_BLTZ: u32 = 0x00;
pub(crate) const REGIMM_BGEZ: u32 = 0x01;
pub(crate) const REGIMM_BLTZL: u32 = 0x02;
pub(crate) const REGIMM_BGEZL: u32 = 0x03;
pub(crate) const REGIMM_TGEI: u32 = 0x08;
pub(crate) const REGIMM_TGEIU: u32 = 0x09;
pub(crate) const REGIMM_TLTI: u32 = 0x0A;
pub(crate) const REGIMM_TLTIU: u32 = 0x0B;
pub(crate) const REGIMM_TEQI: u32 = 0x0C;
pub(crate) const REGIMM_TNEI: u32 = 0x0E;
pub(crate) const REGIMM_BLTZAL: u32 = 0x10;
pub(crate) const REGIMM_BGEZAL: u32 = 0x11;
pub(crate) const REGIMM_BLTZALL: u32 = 0x12;
pub(crate) const REGIMM_BGEZALL: u32 = 0x13;
pub(crate) const REGIMM_MTSAB: u32 = 0x18;
pub(crate) const REGIMM_MTSAH: u32 = 0x19;

// MMI group (opcode 0x1C), dispatched on the function field. MMI0-3 then
// sub-dispatch on the sa field.

pub(crate) const MMI_MADD: u32 = 0x00;
pub(crate) const MMI_MADDU: u32 = 0x01;
pub(crate) const MMI_MSUB: u32 = 0x02;
pub(crate) const MMI_MSUBU: u32 = 0x03;
pub(crate) const MMI_PLZCW: u32 = 0x04;
pub(crate) const MMI_MMI0: u32 = 0x08;
pub(crate) const MMI_MMI2: u32 = 0x09;
pub(crate) const MMI_MFHI1: u32 = 0x10;
pub(crate) const MMI_MTHI1: u32 = 0x11;
pub(crate) const MMI_MFLO1: u32 = 0x12;
pub(crate) const MMI_MTLO1: u32 = 0x13;
pub(crate) const MMI_MULT1: u32 = 0x18;
pub(crate) const MMI_MULTU1: u32 = 0x19;
pub(crate) const MMI_DIV1: u32 = 0x1A;
pub(crate) const MMI_DIVU1: u32 = 0x1B;
pub(crate) const MMI_MADD1: u32 = 0x20;
pub(crate) const MMI_MADDU1: u32 = 0x21;
pub(crate) const MMI_MMI1: u32 = 0x28;
pub(crate) const MMI_MMI3: u32 = 0x29;
pub(crate) const MMI_PMFHL: u32 = 0x30;
pub(crate) const MMI_PMTHL: u32 = 0x31;
pub(crate) const MMI_PSLLH: u32 = 0x34;
pub(crate) const MMI_PSRLH: u32 = 0x36;
pub(crate) const MMI_PSRAH: u32 = 0x37;
pub(crate) const MMI_PSLLW: u32 = 0x3C;
pub(crate) const MMI_PSRLW: u32 = 0x3E;
pub(crate) const MMI_PSRAW: u32 = 0x3F;

pub(crate) const MMI0_PADDW: u32 = 0x00;
pub(crate) const MMI0_PSUBW: u32 = 0x01;
pub(crate) const MMI0_PCGTW: u32 = 0x02;
pub(crate) const MMI0_PMAXW: u32 = 0x03;
pub(crate) const MMI0_PADDH: u32 = 0x04;
pub(crate) const MMI0_PSUBH: u32 = 0x05;
pub(crate) const MMI0_PCGTH: u32 = 0x06;
pub(crate) const MMI0_PMAXH: u32 = 0x07;
pub(crate) const MMI0_PADDB: u32 = 0x08;
pub(crate) const MMI0_PSUBB: u32 = 0x09;
pub(crate) const MMI0_PCGTB: u32 = 0x0A;
pub(crate) const MMI0_PADDSW: u32 = 0x10;
pub(crate) const MMI0_PSUBSW: u32 = 0x11;
pub(crate) const MMI0_PEXTLW: u32 = 0x12;
pub(crate) const MMI0_PPACW: u32 = 0x13;
pub(crate) const MMI0_PADDSH: u32 = 0x14;
pub(crate) const MMI0_PSUBSH: u32 = 0x15;
pub(crate) const MMI0_PEXTLH: u32 = 0x16;
pub(crate) const MMI0_PPACH: u32 = 0x17;
pub(crate) const MMI0_PADDSB: u32 = 0x18;
pub(crate) const MMI0_PSUBSB: u32 = 0x19;
pub(crate) const MMI0_PEXTLB: u32 = 0x1A;
pub(crate) const MMI0_PPACB: u32 = 0x1B;
pub(crate) const MMI0_PEXT5: u32 = 0x1E;
pub(crate) const MMI0_PPAC5: u32 = 0x1F;

pub(crate) const MMI1_PABSW: u32 = 0x01;
pub(crate) const MMI1_PCEQW: u32 = 0x02;
pub(crate) const MMI1_PMINW: u32 = 0x03;
pub(crate) const MMI1_PADSBH: u32 = 0x04;
pub(crate) const MMI1_PABSH: u32 = 0x05;
pub(crate) const MMI1_PCEQH: u32 = 0x06;
pub(crate) const MMI1_PMINH: u32 = 0x07;
pub(crate) const MMI1_PCEQB: u32 = 0x0A;
pub(crate) const MMI1_PADDUW: u32 = 0x10;
pub(crate) const MMI1_PSUBUW: u32 = 0x11;
pub(crate) const MMI1_PEXTUW: u32 = 0x12;
pub(crate) const MMI1_PADDUH: u32 = 0x14;
pub(crate) const MMI1_PSUBUH: u32 = 0x15;
pub(crate) const MMI1_PEXTUH: u32 = 0x16;
pub(crate) const MMI1_PADDUB: u32 = 0x18;
pub(crate) const MMI1_PSUBUB: u32 = 0x19;
pub(crate) const MMI1_PEXTUB: u32 = 0x1A;
pub(crate) const MMI1_QFSRV: u32 = 0x1B;

pub(crate) const MMI2_PMADDW: u32 = 0x00;
pub(crate) const MMI2_PSLLVW: u32 = 0x02;
pub(crate) const MMI2_PSRLVW: u32 = 0x03;
pub(crate) const MMI2_PMSUBW: u32 = 0x04;
pub(crate) const MMI2_PMFHI: u32 = 0x08;
pub(crate) const MMI2_PMFLO: u32 = 0x09;
pub(crate) const MMI2_PINTH: u32 = 0x0A;
pub(crate) const MMI2_PMULTW: u32 = 0x0C;
pub(crate) const MMI2_PDIVW: u32 = 0x0D;
pub(crate) const MMI2_PCPYLD: u32 = 0x0E;
pub(crate) const MMI2_PAND: u32 = 0x12;
pub(crate) const MMI2_PXOR: u32 = 0x13;
pub(crate) const MMI2_PMADDH: u32 = 0x14;
pub(crate) const MMI2_PHMADH: u32 = 0x15;
pub(crate) const MMI2_PMSUBH: u32 = 0x18;
pub(crate) const MMI2_PHMSBH: u32 = 0x19;
pub(crate) const MMI2_PEXEH: u32 = 0x1A;
pub(crate) const MMI2_PREVH: u32 = 0x1B;
pub(crate) const MMI2_PMULTH: u32 = 0x1C;
pub(crate) const MMI2_PDIVBW: u32 = 0x1D;
pub(crate) const MMI2_PEXEW: u32 = 0x1E;
pub(crate) const MMI2_PROT3W: u32 = 0x1F;

pub(crate) const MMI3_PMADDUW: u32 = 0x00;
pub(crate) const MMI3_PSRAVW: u32 = 0x03;
pub(crate) const MMI3_PMTHI: u32 = 0x08;
pub(crate) const MMI3_PMTLO: u32 = 0x09;
pub(crate) const MMI3_PINTEH: u32 = 0x0A;
pub(crate) const MMI3_PMULTUW: u32 = 0x0C;
pub(crate) const MMI3_PDIVUW: u32 = 0x0D;
pub(crate) const MMI3_PCPYUD: u32 = 0x0E;
pub(crate) const MMI3_POR: u32 = 0x12;
pub(crate) const MMI3_PNOR: u32 = 0x13;
pub(crate) const MMI3_PEXCH: u32 = 0x1A;
pub(crate) const MMI3_PCPYH: u32 = 0x1B;
pub(crate) const MMI3_PEXCW: u32 = 0x1E;

// PMFHL/PMTHL variations live in the sa field.

pub(crate) const PMFHL_LW: u32 = 0x00;
pub(crate) const PMFHL_UW: u32 = 0x01;
pub(crate) const PMFHL_SLW: u32 = 0x02;
pub(crate) const PMFHL_LH: u32 = 0x03;
pub(crate) const PMFHL_SH: u32 = 0x04;

// COP0 (opcode 0x10). The rs field selects the format.

pub(crate) const COP0_MF: u32 = 0x00;
pub(crate) const COP0_MT: u32 = 0x04;
pub(crate) const COP0_BC: u32 = 0x08;
pub(crate) const COP0_CO: u32 = 0x10;

pub(crate) const COP0_CO_TLBR: u32 = 0x01;
pub(crate) const COP0_CO_TLBWI: u32 = 0x02;
pub(crate) const COP0_CO_TLBWR: u32 = 0x06;
pub(crate) const COP0_CO_TLBP: u32 = 0x08;
pub(crate) const COP0_CO_ERET: u32 = 0x18;
pub(crate) const COP0_CO_EI: u32 = 0x38;
pub(crate) const COP0_CO_DI: u32 = 0x39;

pub(crate) const COP0_REG_INDEX: u32 = 0;
pub(crate) const COP0_REG_RANDOM: u32 = 1;
pub(crate) const COP0_REG_ENTRYLO0: u32 = 2;
pub(crate) const COP0_REG_ENTRYLO1: u32 = 3;
pub(crate) const COP0_REG_CONTEXT: u32 = 4;
pub(crate) const COP0_REG_PAGEMASK: u32 = 5;
pub(crate) const COP0_REG_WIRED: u32 = 6;
pub(crate) const COP0_REG_BADVADDR: u32 = 8;
pub(crate) const COP0_REG_COUNT: u32 = 9;
pub(crate) const COP0_REG_ENTRYHI: u32 = 10;
pub(crate) const COP0_REG_COMPARE: u32 = 11;
pub(crate) const COP0_REG_STATUS: u32 = 12;
pub(crate) const COP0_REG_CAUSE: u32 = 13;
pub(crate) const COP0_REG_EPC: u32 = 14;
pub(crate) const COP0_REG_PRID: u32 = 15;
pub(crate) const COP0_REG_CONFIG: u32 = 16;
pub(crate) const COP0_REG_BADPADDR: u32 = 23;
pub(crate) const COP0_REG_DEBUG: u32 = 24;
pub(crate) const COP0_REG_PERF: u32 = 25;
pub(crate) const COP0_REG_TAGLO: u32 = 28;
pub(crate) const COP0_REG_TAGHI: u32 = 29;
pub(crate) const COP0_REG_ERROREPC: u32 = 30;

// COP1 FPU (opcode 0x11). The rs field selects the format, then the
// function field picks the arithmetic op for the S/W formats.

pub(crate) const COP1_MF: u32 = 0x00;
pub(crate) const COP1_CF: u32 = 0x02;
pub(crate) const COP1_MT: u32 = 0x04;
pub(crate) const COP1_CT: u32 = 0x06;
pub(crate) const COP1_BC: u32 = 0x08;
pub(crate) const COP1_S: u32 = 0x10;
pub(crate) const COP1_W: u32 = 0x14;
pub(crate) const COP1_L: u32 = 0x15;

pub(crate) const COP1_BC_BCF: u32 = 0x00;
pub(crate) const COP1_BC_BCT: u32 = 0x01;
pub(crate) const COP1_BC_BCFL: u32 = 0x02;
pub(crate) const COP1_BC_BCTL: u32 = 0x03;

pub(crate) const COP1_S_ADD: u32 = 0x00;
pub(crate) const COP1_S_SUB: u32 = 0x01;
pub(crate) const COP1_S_MUL: u32 = 0x02;
pub(crate) const COP1_S_DIV: u32 = 0x03;
pub(crate) const COP1_S_SQRT: u32 = 0x04;
pub(crate) const COP1_S_ABS: u32 = 0x05;
pub(crate) const COP1_S_MOV: u32 = 0x06;
pub(crate) const COP1_S_NEG: u32 = 0x07;
pub(crate) const COP1_S_ROUND_W: u32 = 0x0C;
pub(crate) const COP1_S_TRUNC_W: u32 = 0x0D;
pub(crate) const COP1_S_CEIL_W: u32 = 0x0E;
pub(crate) const COP1_S_FLOOR_W: u32 = 0x0F;
pub(crate) const COP1_S_RSQRT: u32 = 0x16;
pub(crate) const COP1_S_ADDA: u32 = 0x18;
pub(crate) const COP1_S_SUBA: u32 = 0x19;
pub(crate) const COP1_S_MULA: u32 = 0x1A;
pub(crate) const COP1_S_MADD: u32 = 0x1C;
pub(crate) const COP1_S_MSUB: u32 = 0x1D;
pub(crate) const COP1_S_MADDA: u32 = 0x1E;
pub(crate) const COP1_S_MSUBA: u32 = 0x1F;
pub(crate) const COP1_S_CVT_W: u32 = 0x24;
pub(crate) const COP1_S_MAX: u32 = 0x28;
pub(crate) const COP1_S_MIN: u32 = 0x29;
pub(crate) const COP1_S_C_F: u32 = 0x30;
pub(crate) const COP1_S_C_UN: u32 = 0x31;
pub(crate) const COP1_S_C_EQ: u32 = 0x32;
pub(crate) const COP1_S_C_UEQ: u32 = 0x33;
pub(crate) const COP1_S_C_OLT: u32 = 0x34;
pub(crate) const COP1_S_C_ULT: u32 = 0x35;
pub(crate) const COP1_S_C_OLE: u32 = 0x36;
pub(crate) const COP1_S_C_ULE: u32 = 0x37;
pub(crate) const COP1_S_C_SF: u32 = 0x38;
pub(crate) const COP1_S_C_NGLE: u32 = 0x39;
pub(crate) const COP1_S_C_SEQ: u32 = 0x3A;
pub(crate) const COP1_S_C_NGL: u32 = 0x3B;
pub(crate) const COP1_S_C_LT: u32 = 0x3C;
pub(crate) const COP1_S_C_NGE: u32 = 0x3D;
pub(crate) const COP1_S_C_LE: u32 = 0x3E;
pub(crate) const COP1_S_C_NGT: u32 = 0x3F;
pub(crate) const COP1_W_CVT_S: u32 = 0x20;

// COP2 VU0 macro mode (opcode 0x12). The rs field selects the format;
// rs >= 0x10 is the CO group, decoded through the Special1/Special2
// tables on the function field.

pub(crate) const COP2_QMFC2: u32 = 0x01;
pub(crate) const COP2_CFC2: u32 = 0x02;
pub(crate) const COP2_QMTC2: u32 = 0x05;
pub(crate) const COP2_CTC2: u32 = 0x06;
pub(crate) const COP2_BC: u32 = 0x08;
pub(crate) const COP2_CO: u32 = 0x10;

pub(crate) const COP2_BC_BCF: u32 = 0x00;
pub(crate) const COP2_BC_BCT: u32 = 0x01;
pub(crate) const COP2_BC_BCFL: u32 = 0x02;
pub(crate) const COP2_BC_BCTL: u32 = 0x03;

// Special1 table (function < 0x3C). The x/y/z/w broadcast variants of
// one op occupy four consecutive codes; only the first and last are
// named here, the decoder masks with & 0x3 for the field.

pub(crate) const VU0_S1_VADDX: u32 = 0x00;
pub(crate) const VU0_S1_VADDW: u32 = 0x03;
pub(crate) const VU0_S1_VSUBX: u32 = 0x04;
pub(crate) const VU0_S1_VSUBW: u32 = 0x07;
pub(crate) const VU0_S1_VMADDX: u32 = 0x08;
pub(crate) const VU0_S1_VMADDW: u32 = 0x0B;
pub(crate) const VU0_S1_VMSUBX: u32 = 0x0C;
pub(crate) const VU0_S1_VMSUBW: u32 = 0x0F;
pub(crate) const VU0_S1_VMAXX: u32 = 0x10;
pub(crate) const VU0_S1_VMAXW: u32 = 0x13;
pub(crate) const VU0_S1_VMINIX: u32 = 0x14;
pub(crate) const VU0_S1_VMINIW: u32 = 0x17;
pub(crate) const VU0_S1_VMULX: u32 = 0x18;
pub(crate) const VU0_S1_VMULW: u32 = 0x1B;
pub(crate) const VU0_S1_VMULQ: u32 = 0x1C;
pub(crate) const VU0_S1_VMAXI: u32 = 0x1D;
pub(crate) const VU0_S1_VMULI: u32 = 0x1E;
pub(crate) const VU0_S1_VMINII: u32 = 0x1F;
pub(crate) const VU0_S1_VADDQ: u32 = 0x20;
pub(crate) const VU0_S1_VMADDQ: u32 = 0x21;
pub(crate) const VU0_S1_VADDI: u32 = 0x22;
pub(crate) const VU0_S1_VMADDI: u32 = 0x23;
pub(crate) const VU0_S1_VSUBQ: u32 = 0x24;
pub(crate) const VU0_S1_VMSUBQ: u32 = 0x25;
pub(crate) const VU0_S1_VSUBI: u32 = 0x26;
pub(crate) const VU0_S1_VMSUBI: u32 = 0x27;
pub(crate) const VU0_S1_VADD: u32 = 0x28;
pub(crate) const VU0_S1_VMADD: u32 = 0x29;
pub(crate) const VU0_S1_VMUL: u32 = 0x2A;
pub(crate) const VU0_S1_VMAX: u32 = 0x2B;
pub(crate) const VU0_S1_VSUB: u32 = 0x2C;
pub(crate) const VU0_S1_VMSUB: u32 = 0x2D;
pub(crate) const VU0_S1_VOPMSUB: u32 = 0x2E;
pub(crate) const VU0_S1_VMINI: u32 = 0x2F;
pub(crate) const VU0_S1_VIADD: u32 = 0x30;
pub(crate) const VU0_S1_VISUB: u32 = 0x31;
pub(crate) const VU0_S1_VIADDI: u32 = 0x32;
pub(crate) const VU0_S1_VIAND: u32 = 0x34;
pub(crate) const VU0_S1_VIOR: u32 = 0x35;
pub(crate) const VU0_S1_VCALLMS: u32 = 0x38;
pub(crate) const VU0_S1_VCALLMSR: u32 = 0x39;

// Special2 table (function >= 0x3C). Function codes are reconstructed as
// ((raw >> 6) & 0x1F) << 2 | (raw & 0x3).

pub(crate) const VU0_S2_VADDAX: u32 = 0x00;
pub(crate) const VU0_S2_VADDAW: u32 = 0x03;
pub(crate) const VU0_S2_VSUBAX: u32 = 0x04;
pub(crate) const VU0_S2_VSUBAW: u32 = 0x07;
pub(crate) const VU0_S2_VMADDAX: u32 = 0x08;
pub(crate) const VU0_S2_VMADDAW: u32 = 0x0B;
pub(crate) const VU0_S2_VMSUBAX: u32 = 0x0C;
pub(crate) const VU0_S2_VMSUBAW: u32 = 0x0F;
pub(crate) const VU0_S2_VITOF0: u32 = 0x10;
pub(crate) const VU0_S2_VITOF4: u32 = 0x11;
pub(crate) const VU0_S2_VITOF12: u32 = 0x12;
pub(crate) const VU0_S2_VITOF15: u32 = 0x13;
pub(crate) const VU0_S2_VFTOI0: u32 = 0x14;
pub(crate) const VU0_S2_VFTOI4: u32 = 0x15;
pub(crate) const VU0_S2_VFTOI12: u32 = 0x16;
pub(crate) const VU0_S2_VFTOI15: u32 = 0x17;
pub(crate) const VU0_S2_VMULAX: u32 = 0x18;
pub(crate) const VU0_S2_VMULAW: u32 = 0x1B;
pub(crate) const VU0_S2_VMULAQ: u32 = 0x1C;
pub(crate) const VU0_S2_VABS: u32 = 0x1D;
pub(crate) const VU0_S2_VMULAI: u32 = 0x1E;
pub(crate) const VU0_S2_VCLIPW: u32 = 0x1F;
pub(crate) const VU0_S2_VADDAQ: u32 = 0x20;
pub(crate) const VU0_S2_VMADDAQ: u32 = 0x21;
pub(crate) const VU0_S2_VADDAI: u32 = 0x22;
pub(crate) const VU0_S2_VMADDAI: u32 = 0x23;
pub(crate) const VU0_S2_VSUBAQ: u32 = 0x24;
pub(crate) const VU0_S2_VMSUBAQ: u32 = 0x25;
pub(crate) const VU0_S2_VSUBAI: u32 = 0x26;
pub(crate) const VU0_S2_VMSUBAI: u32 = 0x27;
pub(crate) const VU0_S2_VADDA: u32 = 0x28;
pub(crate) const VU0_S2_VMADDA: u32 = 0x29;
pub(crate) const VU0_S2_VMULA: u32 = 0x2A;
pub(crate) const VU0_S2_VSUBA: u32 = 0x2C;
pub(crate) const VU0_S2_VMSUBA: u32 = 0x2D;
pub(crate) const VU0_S2_VOPMULA: u32 = 0x2E;
pub(crate) const VU0_S2_VNOP: u32 = 0x2F;
pub(crate) const VU0_S2_VMOVE: u32 = 0x30;
pub(crate) const VU0_S2_VMR32: u32 = 0x31;
pub(crate) const VU0_S2_VLQI: u32 = 0x34;
pub(crate) const VU0_S2_VSQI: u32 = 0x35;
pub(crate) const VU0_S2_VLQD: u32 = 0x36;
pub(crate) const VU0_S2_VSQD: u32 = 0x37;
pub(crate) const VU0_S2_VDIV: u32 = 0x38;
pub(crate) const VU0_S2_VSQRT: u32 = 0x39;
pub(crate) const VU0_S2_VRSQRT: u32 = 0x3A;
pub(crate) const VU0_S2_VWAITQ: u32 = 0x3B;
pub(crate) const VU0_S2_VMTIR: u32 = 0x3C;
pub(crate) const VU0_S2_VMFIR: u32 = 0x3D;
pub(crate) const VU0_S2_VILWR: u32 = 0x3E;
pub(crate) const VU0_S2_VISWR: u32 = 0x3F;
pub(crate) const VU0_S2_VRNEXT: u32 = 0x40;
pub(crate) const VU0_S2_VRGET: u32 = 0x41;
pub(crate) const VU0_S2_VRINIT: u32 = 0x42;
pub(crate) const VU0_S2_VRXOR: u32 = 0x43;

// CFC2/CTC2 control register numbering. Hardware-observed indices are
// kept; every other register the transfer path must reach takes one of
// the unused slots. This table is the single source of truth for both
// transfer directions.

pub(crate) const VU0_CR_STATUS: u32 = 0;
pub(crate) const VU0_CR_MAC: u32 = 1;
pub(crate) const VU0_CR_VPU_STAT: u32 = 2;
pub(crate) const VU0_CR_R: u32 = 3;
pub(crate) const VU0_CR_I: u32 = 4;
pub(crate) const VU0_CR_CLIP: u32 = 5;
pub(crate) const VU0_CR_TPC: u32 = 6;
pub(crate) const VU0_CR_ACC: u32 = 7;
pub(crate) const VU0_CR_P: u32 = 8;
pub(crate) const VU0_CR_ITOP: u32 = 9;
pub(crate) const VU0_CR_ITOPS: u32 = 10;
pub(crate) const VU0_CR_TOPS: u32 = 11;
pub(crate) const VU0_CR_XITOP: u32 = 12;
pub(crate) const VU0_CR_CMSAR0: u32 = 13;
pub(crate) const VU0_CR_INFO: u32 = 14;
pub(crate) const VU0_CR_CLIP2: u32 = 15;
pub(crate) const VU0_CR_CMSAR1: u32 = 16;
pub(crate) const VU0_CR_FBRST2: u32 = 17;
pub(crate) const VU0_CR_FBRST: u32 = 18;
pub(crate) const VU0_CR_VPU_STAT2: u32 = 19;
pub(crate) const VU0_CR_TPC2: u32 = 20;

/// C++ keywords and alternative operator spellings. A guest symbol that
/// sanitizes to one of these must be renamed before it becomes a host
/// function name.
pub(crate) static CXX_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor",
    "bool", "break", "case", "catch", "char", "char8_t", "char16_t",
    "char32_t", "class", "compl", "concept", "const", "consteval",
    "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do",
    "double", "dynamic_cast", "else", "enum", "explicit", "export",
    "extern", "false", "float", "for", "friend", "goto", "if", "inline",
    "int", "long", "mutable", "namespace", "new", "noexcept", "not",
    "not_eq", "nullptr", "operator", "or", "or_eq", "private", "protected",
    "public", "register", "reinterpret_cast", "requires", "return",
    "short", "signed", "sizeof", "static", "static_assert", "static_cast",
    "struct", "switch", "template", "this", "thread_local", "throw",
    "true", "try", "typedef", "typeid", "typename", "union", "unsigned",
    "using", "virtual", "void", "volatile", "wchar_t", "while", "xor",
    "xor_eq",
};

/// Guest symbols whose bodies dispatch to `ps2_syscalls::<name>` handlers
/// in the runtime. The list is closed: membership decides the dispatch
/// namespace of a stub wrapper.
pub(crate) static SYSCALL_NAMES: phf::Set<&'static str> = phf_set! {
    "FlushCache", "ResetEE", "SetMemoryMode",
    "CreateThread", "DeleteThread", "StartThread", "ExitThread",
    "ExitDeleteThread", "TerminateThread", "SuspendThread", "ResumeThread",
    "GetThreadId", "ReferThreadStatus", "SleepThread", "WakeupThread",
    "iWakeupThread", "ChangeThreadPriority", "RotateThreadReadyQueue",
    "ReleaseWaitThread", "iReleaseWaitThread",
    "CreateSema", "DeleteSema", "SignalSema", "iSignalSema", "WaitSema",
    "PollSema", "iPollSema", "ReferSemaStatus", "iReferSemaStatus",
    "CreateEventFlag", "DeleteEventFlag", "SetEventFlag", "iSetEventFlag",
    "ClearEventFlag", "iClearEventFlag", "WaitEventFlag", "PollEventFlag",
    "iPollEventFlag", "ReferEventFlagStatus", "iReferEventFlagStatus",
    "SetAlarm", "iSetAlarm", "CancelAlarm", "iCancelAlarm",
    "EnableIntc", "DisableIntc", "EnableDmac", "DisableDmac",
    "SifStopModule", "SifLoadModule", "SifInitRpc", "SifBindRpc",
    "SifCallRpc", "SifRegisterRpc", "SifCheckStatRpc", "SifSetRpcQueue",
    "SifRemoveRpcQueue", "SifRemoveRpc", "sceSifCallRpc", "sceSifSendCmd",
    "_sceRpcGetPacket",
    "fioOpen", "fioClose", "fioRead", "fioWrite", "fioLseek", "fioMkdir",
    "fioChdir", "fioRmdir", "fioGetstat", "fioRemove",
    "GsSetCrt", "GsGetIMR", "GsPutIMR", "GsSetVideoMode",
    "GetOsdConfigParam", "SetOsdConfigParam", "GetRomName",
    "SifLoadElfPart", "sceSifLoadModule",
    "SetupThread", "QueryBootMode", "GetThreadTLS", "RegisterExitHandler",
};

/// Guest symbols whose bodies dispatch to `ps2_stubs::<name>` handlers
/// (libc and middleware shims).
pub(crate) static STUB_NAMES: phf::Set<&'static str> = phf_set! {
    "malloc", "free", "calloc", "realloc",
    "memcpy", "memset", "memmove", "memcmp",
    "strcpy", "strncpy", "strlen", "strcmp", "strncmp", "strcat",
    "strncat", "strchr", "strrchr", "strstr",
    "printf", "sprintf", "snprintf", "puts",
    "fopen", "fclose", "fread", "fwrite", "fprintf", "fseek", "ftell",
    "fflush",
    "sqrt", "sin", "cos", "tan", "atan2", "pow", "exp", "log", "log10",
    "ceil", "floor", "fabs",
    "sceCdRead", "sceCdSync", "sceCdGetError",
};

/// Human-readable names for the COP0 registers the generator knows, used
/// in diagnostics.
pub(crate) static COP0_REG_NAMES: phf::Map<u32, &'static str> = phf_map! {
    0u32 => "Index", 1u32 => "Random", 2u32 => "EntryLo0", 3u32 => "EntryLo1",
    4u32 => "Context", 5u32 => "PageMask", 6u32 => "Wired", 8u32 => "BadVAddr",
    9u32 => "Count", 10u32 => "EntryHi", 11u32 => "Compare", 12u32 => "Status",
    13u32 => "Cause", 14u32 => "EPC", 15u32 => "PRId", 16u32 => "Config",
    23u32 => "BadPAddr", 24u32 => "Debug", 25u32 => "Perf", 28u32 => "TagLo",
    29u32 => "TagHi", 30u32 => "ErrorEPC",
};
