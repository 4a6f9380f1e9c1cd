//! Translation of the 128-bit MMI (multimedia) group.
//!
//! MMI instructions reuse the scalar GPR file as 128-bit vectors, so
//! every operand moves through `GPR_VEC`/`SET_GPR_VEC` and the emitted
//! arithmetic is the runtime's `PS2_P*` macro vocabulary, with raw SSE2
//! intrinsics where the runtime has no macro for the operation.

use crate::consts::*;
use crate::decoder::Instruction;

pub(crate) fn translate_mmi(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;
    let sa = inst.sa;

    match inst.function {
        MMI_MFHI1 => format!("SET_GPR_U32(ctx, {rd}, ctx->hi1);"),
        MMI_MTHI1 => format!("ctx->hi1 = GPR_U32(ctx, {rs});"),
        MMI_MFLO1 => format!("SET_GPR_U32(ctx, {rd}, ctx->lo1);"),
        MMI_MTLO1 => format!("ctx->lo1 = GPR_U32(ctx, {rs});"),

        MMI_MULT1 => {
            let rd_write = (rd != 0)
                .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->lo1);"))
                .unwrap_or_default();
            format!(
                "{{ int64_t result = (int64_t)GPR_S32(ctx, {rs}) * (int64_t)GPR_S32(ctx, {rt}); \
                 ctx->lo1 = (uint32_t)result; ctx->hi1 = (uint32_t)(result >> 32);{rd_write} }}"
            )
        }
        MMI_MULTU1 => {
            let rd_write = (rd != 0)
                .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->lo1);"))
                .unwrap_or_default();
            format!(
                "{{ uint64_t result = (uint64_t)GPR_U32(ctx, {rs}) * (uint64_t)GPR_U32(ctx, {rt}); \
                 ctx->lo1 = (uint32_t)result; ctx->hi1 = (uint32_t)(result >> 32);{rd_write} }}"
            )
        }
        MMI_DIV1 => format!(
            "{{ int32_t divisor = GPR_S32(ctx, {rt}); \
             int32_t dividend = GPR_S32(ctx, {rs}); \
             if (divisor != 0) {{ \
             if (divisor == -1 && dividend == INT32_MIN) {{ ctx->lo1 = INT32_MIN; ctx->hi1 = 0; }} \
             else {{ ctx->lo1 = (uint32_t)(dividend / divisor); ctx->hi1 = (uint32_t)(dividend % divisor); }} \
             }} else {{ ctx->lo1 = (dividend < 0) ? 1 : -1; ctx->hi1 = (uint32_t)dividend; }} }}"
        ),
        MMI_DIVU1 => format!(
            "{{ uint32_t divisor = GPR_U32(ctx, {rt}); \
             if (divisor != 0) {{ ctx->lo1 = GPR_U32(ctx, {rs}) / divisor; ctx->hi1 = GPR_U32(ctx, {rs}) % divisor; }} \
             else {{ ctx->lo1 = 0xFFFFFFFF; ctx->hi1 = GPR_U32(ctx, {rs}); }} }}"
        ),

        MMI_MADD => madd("hi", "lo", rs, rt, rd, false),
        MMI_MADDU => madd_u("hi", "lo", rs, rt, rd, false),
        MMI_MSUB => madd("hi", "lo", rs, rt, rd, true),
        MMI_MSUBU => madd_u("hi", "lo", rs, rt, rd, true),
        MMI_MADD1 => madd("hi1", "lo1", rs, rt, rd, false),
        MMI_MADDU1 => madd_u("hi1", "lo1", rs, rt, rd, false),

        MMI_PLZCW => format!(
            "{{ uint64_t v = GPR_U64(ctx, {rs}); \
             uint32_t lo = (uint32_t)(v & 0xFFFFFFFFu); \
             uint32_t hi = (uint32_t)(v >> 32); \
             uint64_t out = ((uint64_t)ps2_clz32(hi) << 32) | (uint64_t)ps2_clz32(lo); \
             SET_GPR_U64(ctx, {rd}, out); }}"
        ),

        MMI_PSLLH => format!("SET_GPR_VEC(ctx, {rd}, _mm_slli_epi16(GPR_VEC(ctx, {rt}), {sa}));"),
        MMI_PSRLH => format!("SET_GPR_VEC(ctx, {rd}, _mm_srli_epi16(GPR_VEC(ctx, {rt}), {sa}));"),
        MMI_PSRAH => format!("SET_GPR_VEC(ctx, {rd}, _mm_srai_epi16(GPR_VEC(ctx, {rt}), {sa}));"),
        MMI_PSLLW => format!("SET_GPR_VEC(ctx, {rd}, _mm_slli_epi32(GPR_VEC(ctx, {rt}), {sa}));"),
        MMI_PSRLW => format!("SET_GPR_VEC(ctx, {rd}, _mm_srli_epi32(GPR_VEC(ctx, {rt}), {sa}));"),
        MMI_PSRAW => format!("SET_GPR_VEC(ctx, {rd}, _mm_srai_epi32(GPR_VEC(ctx, {rt}), {sa}));"),

        MMI_MMI0 => translate_mmi0(inst),
        MMI_MMI1 => translate_mmi1(inst),
        MMI_MMI2 => translate_mmi2(inst),
        MMI_MMI3 => translate_mmi3(inst),
        MMI_PMFHL => translate_pmfhl(inst),
        MMI_PMTHL => translate_pmthl(inst),

        _ => format!("// Unhandled MMI instruction: function 0x{:X}", inst.function),
    }
}

fn madd(hi: &str, lo: &str, rs: u32, rt: u32, rd: u32, subtract: bool) -> String {
    let op = if subtract { '-' } else { '+' };
    let rd_write = (rd != 0)
        .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->{lo});"))
        .unwrap_or_default();
    format!(
        "{{ int64_t acc = ((int64_t)ctx->{hi} << 32) | ctx->{lo}; \
         int64_t prod = (int64_t)GPR_S32(ctx, {rs}) * (int64_t)GPR_S32(ctx, {rt}); \
         int64_t result = acc {op} prod; \
         ctx->{lo} = (uint32_t)result; ctx->{hi} = (uint32_t)(result >> 32);{rd_write} }}"
    )
}

fn madd_u(hi: &str, lo: &str, rs: u32, rt: u32, rd: u32, subtract: bool) -> String {
    let op = if subtract { '-' } else { '+' };
    let rd_write = (rd != 0)
        .then(|| format!(" SET_GPR_U32(ctx, {rd}, ctx->{lo});"))
        .unwrap_or_default();
    format!(
        "{{ uint64_t acc = ((uint64_t)ctx->{hi} << 32) | ctx->{lo}; \
         uint64_t prod = (uint64_t)GPR_U32(ctx, {rs}) * (uint64_t)GPR_U32(ctx, {rt}); \
         uint64_t result = acc {op} prod; \
         ctx->{lo} = (uint32_t)result; ctx->{hi} = (uint32_t)(result >> 32);{rd_write} }}"
    )
}

fn binary_op(macro_name: &str, rd: u32, rs: u32, rt: u32) -> String {
    format!("SET_GPR_VEC(ctx, {rd}, {macro_name}(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));")
}

fn unary_op(macro_name: &str, rd: u32, rs: u32) -> String {
    format!("SET_GPR_VEC(ctx, {rd}, {macro_name}(GPR_VEC(ctx, {rs})));")
}

fn translate_mmi0(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;

    match inst.sa {
        MMI0_PADDW => binary_op("PS2_PADDW", rd, rs, rt),
        MMI0_PSUBW => binary_op("PS2_PSUBW", rd, rs, rt),
        MMI0_PCGTW => binary_op("PS2_PCGTW", rd, rs, rt),
        MMI0_PMAXW => binary_op("PS2_PMAXW", rd, rs, rt),
        MMI0_PADDH => binary_op("PS2_PADDH", rd, rs, rt),
        MMI0_PSUBH => binary_op("PS2_PSUBH", rd, rs, rt),
        MMI0_PCGTH => binary_op("PS2_PCGTH", rd, rs, rt),
        MMI0_PMAXH => binary_op("PS2_PMAXH", rd, rs, rt),
        MMI0_PADDB => binary_op("PS2_PADDB", rd, rs, rt),
        MMI0_PSUBB => binary_op("PS2_PSUBB", rd, rs, rt),
        MMI0_PCGTB => binary_op("PS2_PCGTB", rd, rs, rt),
        MMI0_PADDSW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_min_epi32(_mm_max_epi32(_mm_add_epi32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})), \
             _mm_set1_epi32(INT32_MIN)), _mm_set1_epi32(INT32_MAX)));"
        ),
        MMI0_PSUBSW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_min_epi32(_mm_max_epi32(_mm_sub_epi32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})), \
             _mm_set1_epi32(INT32_MIN)), _mm_set1_epi32(INT32_MAX)));"
        ),
        MMI0_PEXTLW => binary_op("PS2_PEXTLW", rd, rs, rt),
        MMI0_PPACW => binary_op("PS2_PPACW", rd, rs, rt),
        MMI0_PADDSH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_adds_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI0_PSUBSH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_subs_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI0_PEXTLH => binary_op("PS2_PEXTLH", rd, rs, rt),
        MMI0_PPACH => binary_op("PS2_PPACH", rd, rs, rt),
        MMI0_PADDSB => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_adds_epi8(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI0_PSUBSB => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_subs_epi8(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI0_PEXTLB => binary_op("PS2_PEXTLB", rd, rs, rt),
        MMI0_PPACB => binary_op("PS2_PPACB", rd, rs, rt),
        MMI0_PEXT5 => format!("// Unhandled PEXT5 instruction: function 0x{:X}", inst.sa),
        MMI0_PPAC5 => format!("// Unhandled PPAC5 instruction: function 0x{:X}", inst.sa),
        _ => format!("// Unhandled MMI0 instruction: function 0x{:X}", inst.sa),
    }
}

fn translate_mmi1(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;

    match inst.sa {
        MMI1_PABSW => unary_op("PS2_PABSW", rd, rs),
        MMI1_PCEQW => binary_op("PS2_PCEQW", rd, rs, rt),
        MMI1_PMINW => binary_op("PS2_PMINW", rd, rs, rt),
        MMI1_PADSBH => format!("// Unhandled PADSBH instruction: function 0x{:X}", inst.sa),
        MMI1_PABSH => unary_op("PS2_PABSH", rd, rs),
        MMI1_PCEQH => binary_op("PS2_PCEQH", rd, rs, rt),
        MMI1_PMINH => binary_op("PS2_PMINH", rd, rs, rt),
        MMI1_PCEQB => binary_op("PS2_PCEQB", rd, rs, rt),
        MMI1_PADDUW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_add_epi32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PSUBUW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_sub_epi32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PEXTUW => binary_op("PS2_PEXTUW", rd, rs, rt),
        MMI1_PADDUH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_add_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PSUBUH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_sub_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PEXTUH => binary_op("PS2_PEXTUH", rd, rs, rt),
        MMI1_PADDUB => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_adds_epu8(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PSUBUB => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_subs_epu8(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI1_PEXTUB => binary_op("PS2_PEXTUB", rd, rs, rt),
        MMI1_QFSRV => translate_qfsrv(inst),
        _ => format!("// Unhandled MMI1 instruction: function 0x{:X}", inst.sa),
    }
}

fn translate_mmi2(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;

    match inst.sa {
        MMI2_PMADDW => translate_pmaddw(inst),
        MMI2_PSLLVW => binary_op("PS2_PSLLVW", rd, rs, rt),
        MMI2_PSRLVW => binary_op("PS2_PSRLVW", rd, rs, rt),
        MMI2_PMSUBW => format!("// Unhandled PMSUBW instruction: function 0x{:X}", inst.sa),
        MMI2_PMFHI => format!("SET_GPR_U32(ctx, {rd}, ctx->hi);"),
        MMI2_PMFLO => format!("SET_GPR_U32(ctx, {rd}, ctx->lo);"),
        MMI2_PINTH => binary_op("PS2_PINTH", rd, rs, rt),
        MMI2_PMULTW => format!("// Unhandled PMULTW instruction: function 0x{:X}", inst.sa),
        MMI2_PDIVW => format!(
            "{{ int32_t rs0 = GPR_S32(ctx, {rs}); int32_t rt0 = GPR_S32(ctx, {rt}); \
             if (rt0 != 0) {{ ctx->lo = (uint32_t)(rs0 / rt0); ctx->hi = (uint32_t)(rs0 % rt0); }} \
             else {{ ctx->lo = (rs0 < 0) ? 1 : -1; ctx->hi = (uint32_t)rs0; }} \
             SET_GPR_U32(ctx, {rd}, ctx->lo); }}"
        ),
        MMI2_PCPYLD => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_unpacklo_epi64(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI2_PAND => binary_op("PS2_PAND", rd, rs, rt),
        MMI2_PXOR => binary_op("PS2_PXOR", rd, rs, rt),
        MMI2_PMADDH => format!(
            "{{ __m128i prod = _mm_madd_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})); \
             int32_t p0 = _mm_cvtsi128_si32(prod); \
             int32_t p1 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 4)); \
             int32_t p2 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 8)); \
             int32_t p3 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 12)); \
             int64_t acc = ((int64_t)ctx->hi << 32) | ctx->lo; \
             acc += (int64_t)p0 + (int64_t)p1 + (int64_t)p2 + (int64_t)p3; \
             ctx->lo = (uint32_t)acc; ctx->hi = (uint32_t)(acc >> 32); \
             SET_GPR_U64(ctx, {rd}, (uint64_t)acc); }}"
        ),
        MMI2_PHMADH => format!(
            "{{ __m128i evens = _mm_shuffle_epi32(GPR_VEC(ctx, {rs}), _MM_SHUFFLE(2,0,2,0)); \
             __m128i odds = _mm_shuffle_epi32(GPR_VEC(ctx, {rs}), _MM_SHUFFLE(3,1,3,1)); \
             __m128i prod_ev = _mm_mullo_epi16(evens, _mm_shuffle_epi32(GPR_VEC(ctx, {rt}), _MM_SHUFFLE(2,0,2,0))); \
             __m128i prod_od = _mm_mullo_epi16(odds, _mm_shuffle_epi32(GPR_VEC(ctx, {rt}), _MM_SHUFFLE(3,1,3,1))); \
             __m128i sum_pairs = _mm_add_epi16(prod_ev, prod_od); \
             int32_t h0 = _mm_extract_epi16(sum_pairs, 0) + _mm_extract_epi16(sum_pairs, 1); \
             int32_t h1 = _mm_extract_epi16(sum_pairs, 2) + _mm_extract_epi16(sum_pairs, 3); \
             int32_t h2 = _mm_extract_epi16(sum_pairs, 4) + _mm_extract_epi16(sum_pairs, 5); \
             int32_t h3 = _mm_extract_epi16(sum_pairs, 6) + _mm_extract_epi16(sum_pairs, 7); \
             int64_t acc = ((int64_t)ctx->hi << 32) | ctx->lo; \
             acc += (int64_t)h0 + (int64_t)h1 + (int64_t)h2 + (int64_t)h3; \
             ctx->lo = (uint32_t)acc; ctx->hi = (uint32_t)(acc >> 32); \
             SET_GPR_U64(ctx, {rd}, (uint64_t)acc); }}"
        ),
        MMI2_PMSUBH => format!("// Unhandled PMSUBH instruction: function 0x{:X}", inst.sa),
        MMI2_PHMSBH => format!("// Unhandled PHMSBH instruction: function 0x{:X}", inst.sa),
        MMI2_PEXEH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_shufflelo_epi16(_mm_shufflehi_epi16(GPR_VEC(ctx, {rs}), \
             _MM_SHUFFLE(2,3,0,1)), _MM_SHUFFLE(2,3,0,1)));"
        ),
        MMI2_PREVH => format!(
            "{{ __m128i mask = _mm_setr_epi8(14,15, 12,13, 10,11, 8,9, 6,7, 4,5, 2,3, 0,1); \
             SET_GPR_VEC(ctx, {rd}, PS2_SHUFFLE_EPI8(GPR_VEC(ctx, {rs}), mask)); }}"
        ),
        MMI2_PMULTH => format!(
            "{{ __m128i prod = _mm_madd_epi16(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})); \
             int32_t p0 = _mm_cvtsi128_si32(prod); \
             int32_t p1 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 4)); \
             int32_t p2 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 8)); \
             int32_t p3 = _mm_cvtsi128_si32(_mm_srli_si128(prod, 12)); \
             int64_t result = (int64_t)p0 + (int64_t)p1 + (int64_t)p2 + (int64_t)p3; \
             ctx->lo = (uint32_t)result; ctx->hi = (uint32_t)(result >> 32); \
             SET_GPR_U64(ctx, {rd}, (uint64_t)result); }}"
        ),
        MMI2_PDIVBW => format!(
            "{{ __m128i rsVec = GPR_VEC(ctx, {rs}); \
             __m128i rtVec = GPR_VEC(ctx, {rt}); \
             alignas(16) int32_t rsWords[4]; \
             alignas(16) int32_t rtWords[4]; \
             _mm_store_si128((__m128i*)rsWords, rsVec); \
             _mm_store_si128((__m128i*)rtWords, rtVec); \
             int32_t div = rtWords[0]; \
             int32_t q0 = 0, q1 = 0, q2 = 0, q3 = 0; \
             if (div != 0) {{ \
             q0 = rsWords[0] / div; ctx->lo = (uint32_t)q0; ctx->hi = (uint32_t)(rsWords[0] % div); \
             q1 = rsWords[1] / div; \
             q2 = rsWords[2] / div; \
             q3 = rsWords[3] / div; \
             }} else {{ \
             ctx->lo = (rsWords[0] < 0) ? 1 : -1; \
             ctx->hi = (uint32_t)rsWords[0]; \
             }} \
             SET_GPR_VEC(ctx, {rd}, _mm_set_epi32(q3, q2, q1, q0)); }}"
        ),
        MMI2_PEXEW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_shuffle_epi32(GPR_VEC(ctx, {rs}), _MM_SHUFFLE(1,0,3,2)));"
        ),
        MMI2_PROT3W => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_shuffle_epi32(GPR_VEC(ctx, {rs}), _MM_SHUFFLE(0,3,2,1)));"
        ),
        _ => format!("// Unhandled MMI2 instruction: function 0x{:X}", inst.sa),
    }
}

fn translate_mmi3(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;

    match inst.sa {
        MMI3_PMADDUW => format!("// Unhandled PMADDUW instruction: function 0x{:X}", inst.sa),
        MMI3_PSRAVW => binary_op("PS2_PSRAVW", rd, rs, rt),
        MMI3_PMTHI => format!("ctx->hi = GPR_U32(ctx, {rs});"),
        MMI3_PMTLO => format!("ctx->lo = GPR_U32(ctx, {rs});"),
        MMI3_PINTEH => binary_op("PS2_PINTEH", rd, rs, rt),
        MMI3_PMULTUW => format!(
            "{{ __m128i p01 = _mm_mul_epu32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})); \
             __m128i p23 = _mm_mul_epu32(_mm_srli_si128(GPR_VEC(ctx, {rs}), 8), _mm_srli_si128(GPR_VEC(ctx, {rt}), 8)); \
             uint64_t res0 = (uint64_t)_mm_cvtsi128_si64(p01); \
             uint64_t res1 = (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(p01, 8)); \
             uint64_t res2 = (uint64_t)_mm_cvtsi128_si64(p23); \
             uint64_t res3 = (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(p23, 8)); \
             ctx->lo = (uint32_t)res0; ctx->hi = (uint32_t)(res0 >> 32); \
             SET_GPR_VEC(ctx, {rd}, _mm_set_epi32((int32_t)res3, (int32_t)res2, (int32_t)res1, (int32_t)res0)); }}"
        ),
        MMI3_PDIVUW => format!(
            "{{ uint32_t rs0 = GPR_U32(ctx, {rs}); uint32_t rt0 = GPR_U32(ctx, {rt}); \
             if (rt0 != 0) {{ ctx->lo = rs0 / rt0; ctx->hi = rs0 % rt0; }} \
             else {{ ctx->lo = 0xFFFFFFFF; ctx->hi = rs0; }} \
             SET_GPR_U32(ctx, {rd}, ctx->lo); }}"
        ),
        MMI3_PCPYUD => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_unpackhi_epi64(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})));"
        ),
        MMI3_POR => binary_op("PS2_POR", rd, rs, rt),
        MMI3_PNOR => binary_op("PS2_PNOR", rd, rs, rt),
        MMI3_PEXCH => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_shufflelo_epi16(_mm_shufflehi_epi16(GPR_VEC(ctx, {rs}), \
             _MM_SHUFFLE(2,3,0,1)), _MM_SHUFFLE(2,3,0,1)));"
        ),
        MMI3_PCPYH => format!(
            "{{ __m128i src = GPR_VEC(ctx, {rs}); \
             uint16_t l = (uint16_t)_mm_extract_epi16(src, 0); \
             uint16_t h = (uint16_t)_mm_extract_epi16(src, 4); \
             SET_GPR_VEC(ctx, {rd}, _mm_set_epi16(h,h,h,h, l,l,l,l)); }}"
        ),
        MMI3_PEXCW => format!(
            "SET_GPR_VEC(ctx, {rd}, _mm_shuffle_epi32(GPR_VEC(ctx, {rs}), _MM_SHUFFLE(1,0,3,2)));"
        ),
        _ => format!("// Unhandled MMI3 instruction: function 0x{:X}", inst.sa),
    }
}

// Four unsigned 32x32 products accumulated into {HI, LO}; the 64-bit
// accumulator value also lands in rd.
fn translate_pmaddw(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;
    format!(
        "{{ __m128i p01 = _mm_mul_epu32(GPR_VEC(ctx, {rs}), GPR_VEC(ctx, {rt})); \
         __m128i p23 = _mm_mul_epu32(_mm_srli_si128(GPR_VEC(ctx, {rs}), 8), _mm_srli_si128(GPR_VEC(ctx, {rt}), 8)); \
         uint64_t acc = ((uint64_t)ctx->hi << 32) | ctx->lo; \
         acc += (uint64_t)_mm_cvtsi128_si64(p01); \
         acc += (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(p01, 8)); \
         acc += (uint64_t)_mm_cvtsi128_si64(p23); \
         acc += (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(p23, 8)); \
         ctx->lo = (uint32_t)acc; ctx->hi = (uint32_t)(acc >> 32); \
         SET_GPR_U64(ctx, {rd}, acc); }}"
    )
}

// 128-bit funnel shift of {rt, rs} by ctx->sa bits, done in 64-bit
// halves to stay within SSE2.
fn translate_qfsrv(inst: &Instruction) -> String {
    let rs = inst.rs;
    let rt = inst.rt;
    let rd = inst.rd;
    format!(
        "{{ __m128i val_rt = GPR_VEC(ctx, {rt}); \
         __m128i val_rs = GPR_VEC(ctx, {rs}); \
         uint32_t shift_amount = ctx->sa & 0x7F; \
         uint64_t rt_hi = (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(val_rt, 8)); \
         uint64_t rt_lo = (uint64_t)_mm_cvtsi128_si64(val_rt); \
         uint64_t rs_hi = (uint64_t)_mm_cvtsi128_si64(_mm_srli_si128(val_rs, 8)); \
         uint64_t rs_lo = (uint64_t)_mm_cvtsi128_si64(val_rs); \
         __m128i result; \
         if (shift_amount == 0) {{ \
         result = val_rs; \
         }} else if (shift_amount < 64) {{ \
         uint64_t res_lo = (rs_lo >> shift_amount) | (rs_hi << (64 - shift_amount)); \
         uint64_t res_hi = (rs_hi >> shift_amount) | (rt_lo << (64 - shift_amount)); \
         result = _mm_set_epi64x((int64_t)res_hi, (int64_t)res_lo); \
         }} else if (shift_amount == 64) {{ \
         result = _mm_set_epi64x((int64_t)rt_lo, (int64_t)rs_hi); \
         }} else {{ \
         uint32_t sub_shift = shift_amount - 64; \
         uint64_t res_lo = (rs_hi >> sub_shift) | (rt_lo << (64 - sub_shift)); \
         uint64_t res_hi = (rt_lo >> sub_shift) | (rt_hi << (64 - sub_shift)); \
         result = _mm_set_epi64x((int64_t)res_hi, (int64_t)res_lo); \
         }} \
         SET_GPR_VEC(ctx, {rd}, result); }}"
    )
}

fn translate_pmfhl(inst: &Instruction) -> String {
    let rd = inst.rd;
    match inst.sa {
        PMFHL_LW => format!("SET_GPR_VEC(ctx, {rd}, PS2_PMFHL_LW(ctx->hi, ctx->lo));"),
        PMFHL_UW => format!("SET_GPR_VEC(ctx, {rd}, PS2_PMFHL_UW(ctx->hi, ctx->lo));"),
        PMFHL_SLW => format!("SET_GPR_VEC(ctx, {rd}, PS2_PMFHL_SLW(ctx->hi, ctx->lo));"),
        PMFHL_LH => format!("SET_GPR_VEC(ctx, {rd}, PS2_PMFHL_LH(ctx->hi, ctx->lo));"),
        PMFHL_SH => format!("SET_GPR_VEC(ctx, {rd}, PS2_PMFHL_SH(ctx->hi, ctx->lo));"),
        _ => format!("// Unhandled PMFHL instruction: function 0x{:X}", inst.sa),
    }
}

fn translate_pmthl(inst: &Instruction) -> String {
    let rs = inst.rs;
    match inst.sa {
        PMFHL_LW => format!(
            "{{ __m128i val = GPR_VEC(ctx, {rs}); \
             ctx->lo = (uint32_t)_mm_cvtsi128_si32(val); \
             ctx->hi = (uint32_t)_mm_cvtsi128_si32(_mm_srli_si128(val, 4)); }}"
        ),
        _ => format!("// Unhandled PMTHL instruction: function 0x{:X}", inst.sa),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn mmi(rs: u32, rt: u32, rd: u32, sa: u32, function: u32) -> u32 {
        (OPCODE_MMI << 26) | (rs << 21) | (rt << 16) | (rd << 11) | (sa << 6) | function
    }

    #[test]
    fn paddw_uses_the_vector_macro() {
        let inst = decode(0, mmi(1, 2, 3, MMI0_PADDW, MMI_MMI0));
        let out = translate_mmi(&inst);
        assert_eq!(
            out,
            "SET_GPR_VEC(ctx, 3, PS2_PADDW(GPR_VEC(ctx, 1), GPR_VEC(ctx, 2)));"
        );
    }

    #[test]
    fn qfsrv_funnel_shifts_by_the_sa_register() {
        let inst = decode(0, mmi(1, 2, 3, MMI1_QFSRV, MMI_MMI1));
        let out = translate_mmi(&inst);

        assert!(out.contains("uint32_t shift_amount = ctx->sa & 0x7F;"), "{out}");
        assert!(out.contains("__m128i val_rt = GPR_VEC(ctx, 2);"), "{out}");
        assert!(out.contains("__m128i val_rs = GPR_VEC(ctx, 1);"), "{out}");
        assert!(out.contains("SET_GPR_VEC(ctx, 3, result);"), "{out}");
    }

    #[test]
    fn pmaddw_accumulates_hi_lo_and_writes_rd() {
        let inst = decode(0, mmi(4, 5, 6, MMI2_PMADDW, MMI_MMI2));
        let out = translate_mmi(&inst);

        assert!(
            out.contains("_mm_mul_epu32(GPR_VEC(ctx, 4), GPR_VEC(ctx, 5))"),
            "{out}"
        );
        assert!(out.contains("uint64_t acc = ((uint64_t)ctx->hi << 32) | ctx->lo;"), "{out}");
        assert!(out.contains("ctx->lo = (uint32_t)acc; ctx->hi = (uint32_t)(acc >> 32);"), "{out}");
        assert!(out.contains("SET_GPR_U64(ctx, 6, acc);"), "{out}");
    }

    #[test]
    fn pmfhl_variations_pick_their_macro() {
        let lw = decode(0, mmi(0, 0, 3, PMFHL_LW, MMI_PMFHL));
        assert_eq!(
            translate_mmi(&lw),
            "SET_GPR_VEC(ctx, 3, PS2_PMFHL_LW(ctx->hi, ctx->lo));"
        );

        let sh = decode(0, mmi(0, 0, 3, PMFHL_SH, MMI_PMFHL));
        assert_eq!(
            translate_mmi(&sh),
            "SET_GPR_VEC(ctx, 3, PS2_PMFHL_SH(ctx->hi, ctx->lo));"
        );
    }

    #[test]
    fn mult1_targets_the_second_mac_unit() {
        let inst = decode(0, mmi(1, 2, 3, 0, MMI_MULT1));
        let out = translate_mmi(&inst);

        assert!(out.contains("ctx->lo1 = (uint32_t)result;"), "{out}");
        assert!(out.contains("ctx->hi1 = (uint32_t)(result >> 32);"), "{out}");
        assert!(out.contains("SET_GPR_U32(ctx, 3, ctx->lo1);"), "{out}");
    }

    #[test]
    fn pdivbw_divides_every_lane_by_the_first_divisor_word() {
        let inst = decode(0, mmi(1, 2, 3, MMI2_PDIVBW, MMI_MMI2));
        let out = translate_mmi(&inst);

        assert!(out.contains("int32_t div = rtWords[0];"), "{out}");
        assert!(out.contains("q3 = rsWords[3] / div;"), "{out}");
        assert!(out.contains("ctx->lo = (rsWords[0] < 0) ? 1 : -1;"), "{out}");
        assert!(out.contains("SET_GPR_VEC(ctx, 3, _mm_set_epi32(q3, q2, q1, q0));"), "{out}");
    }
}
