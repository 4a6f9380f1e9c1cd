//! Translation of COP2 VU0 macro-mode instructions.
//!
//! The generator does not model VU0 pipelines: every macro op becomes
//! straight-line host SIMD over the context's VU state (`vu0_vf[32]`,
//! `vi[16]`, `vu0_acc`, the Q/I/R/P specials and the flag registers).
//! Broadcast lanes come from `_mm_shuffle_ps`, destination masks from a
//! `PS2_VBLEND` over a per-lane select built out of the xyzw field.

use crate::codegen::{gen_read, gen_write};
use crate::consts::*;
use crate::decoder::Instruction;

pub(crate) fn translate_vu(inst: &Instruction) -> String {
    match inst.rs {
        COP2_QMFC2 => format!(
            "SET_GPR_VEC(ctx, {}, _mm_castps_si128(ctx->vu0_vf[{}]));",
            inst.rt, inst.rd
        ),
        COP2_QMTC2 => format!(
            "ctx->vu0_vf[{}] = _mm_castsi128_ps(GPR_VEC(ctx, {}));",
            inst.rd, inst.rt
        ),
        COP2_CFC2 => translate_cfc2(inst),
        COP2_CTC2 => translate_ctc2(inst),
        COP2_BC => format!("// BC2 (condition 0x{:X}) - Handled by branch logic", inst.rt),
        rs if rs >= COP2_CO => {
            if inst.function >= 0x3C {
                translate_special2(inst)
            } else {
                translate_special1(inst)
            }
        }
        _ => format!("// Unhandled COP2 format: 0x{:X}", inst.rs),
    }
}

fn lane_mask(dest: u8) -> String {
    let bit = |b: u8| if dest & b != 0 { -1 } else { 0 };
    format!(
        "_mm_set_epi32({}, {}, {}, {})",
        bit(0x8),
        bit(0x4),
        bit(0x2),
        bit(0x1)
    )
}

fn broadcast(field: u8) -> String {
    format!("_MM_SHUFFLE({field},{field},{field},{field})")
}

// Field-broadcast source: vft with one lane splatted across xyzw.
fn vft_lane(vft: u32, field: u8) -> String {
    format!(
        "_mm_shuffle_ps(ctx->vu0_vf[{vft}], ctx->vu0_vf[{vft}], {})",
        broadcast(field)
    )
}

fn scalar_lane(reg: u32, lane: u8) -> String {
    format!(
        "_mm_cvtss_f32(_mm_shuffle_ps(ctx->vu0_vf[{reg}], ctx->vu0_vf[{reg}], _MM_SHUFFLE(0,0,0,{lane})))"
    )
}

// res -> vf[vfd] under the destination mask.
fn masked_write(vfd: u32, dest: u8, res: &str) -> String {
    format!(
        "{{ __m128 res = {res}; \
         __m128i mask = {}; \
         ctx->vu0_vf[{vfd}] = PS2_VBLEND(ctx->vu0_vf[{vfd}], res, _mm_castsi128_ps(mask)); }}",
        lane_mask(dest)
    )
}

// acc +/- (vfs * operand) -> vf[vfd] under the mask, acc tracking the
// unmasked result.
fn masked_madd(vfd: u32, vfs: u32, dest: u8, operand: &str, subtract: bool) -> String {
    let combine = if subtract { "PS2_VSUB" } else { "PS2_VADD" };
    format!(
        "{{ __m128 mul_res = PS2_VMUL(ctx->vu0_vf[{vfs}], {operand}); \
         __m128 res = {combine}(ctx->vu0_acc, mul_res); \
         __m128i mask = {}; \
         ctx->vu0_vf[{vfd}] = PS2_VBLEND(ctx->vu0_vf[{vfd}], res, _mm_castsi128_ps(mask)); \
         ctx->vu0_acc = res; }}",
        lane_mask(dest)
    )
}

fn acc_madd(vfs: u32, operand: &str, subtract: bool) -> String {
    let combine = if subtract { "PS2_VSUB" } else { "PS2_VADD" };
    format!(
        "{{ __m128 mul_res = PS2_VMUL(ctx->vu0_vf[{vfs}], {operand}); \
         ctx->vu0_acc = {combine}(ctx->vu0_acc, mul_res); }}"
    )
}

fn translate_special1(inst: &Instruction) -> String {
    let vfd = inst.sa;
    let vfs = inst.rd;
    let vft = inst.rt;
    let dest = inst.vector.vector_field;
    let field = (inst.function & 0x3) as u8;
    let func = inst.vu_function as u32;

    let q = "_mm_set1_ps(ctx->vu0_q)";
    let i = "_mm_set1_ps(ctx->vu0_i)";
    let vft_full = format!("ctx->vu0_vf[{vft}]");

    match func {
        VU0_S1_VADDX..=VU0_S1_VADDW => masked_write(
            vfd,
            dest,
            &format!("PS2_VADD(ctx->vu0_vf[{vfs}], {})", vft_lane(vft, field)),
        ),
        VU0_S1_VSUBX..=VU0_S1_VSUBW => masked_write(
            vfd,
            dest,
            &format!("PS2_VSUB(ctx->vu0_vf[{vfs}], {})", vft_lane(vft, field)),
        ),
        VU0_S1_VMADDX..=VU0_S1_VMADDW => {
            masked_madd(vfd, vfs, dest, &vft_lane(vft, field), false)
        }
        VU0_S1_VMSUBX..=VU0_S1_VMSUBW => {
            masked_madd(vfd, vfs, dest, &vft_lane(vft, field), true)
        }
        VU0_S1_VMAXX..=VU0_S1_VMAXW => masked_write(
            vfd,
            dest,
            &format!("_mm_max_ps(ctx->vu0_vf[{vfs}], {})", vft_lane(vft, field)),
        ),
        VU0_S1_VMINIX..=VU0_S1_VMINIW => masked_write(
            vfd,
            dest,
            &format!("_mm_min_ps(ctx->vu0_vf[{vfs}], {})", vft_lane(vft, field)),
        ),
        VU0_S1_VMULX..=VU0_S1_VMULW => masked_write(
            vfd,
            dest,
            &format!("PS2_VMUL(ctx->vu0_vf[{vfs}], {})", vft_lane(vft, field)),
        ),

        VU0_S1_VMULQ => masked_write(vfd, dest, &format!("PS2_VMUL(ctx->vu0_vf[{vfs}], {q})")),
        VU0_S1_VMAXI => masked_write(vfd, dest, &format!("_mm_max_ps(ctx->vu0_vf[{vfs}], {i})")),
        VU0_S1_VMULI => masked_write(vfd, dest, &format!("PS2_VMUL(ctx->vu0_vf[{vfs}], {i})")),
        VU0_S1_VMINII => masked_write(vfd, dest, &format!("_mm_min_ps(ctx->vu0_vf[{vfs}], {i})")),
        VU0_S1_VADDQ => masked_write(vfd, dest, &format!("PS2_VADD(ctx->vu0_vf[{vfs}], {q})")),
        VU0_S1_VMADDQ => masked_madd(vfd, vfs, dest, q, false),
        VU0_S1_VADDI => masked_write(vfd, dest, &format!("PS2_VADD(ctx->vu0_vf[{vfs}], {i})")),
        VU0_S1_VMADDI => masked_madd(vfd, vfs, dest, i, false),
        VU0_S1_VSUBQ => masked_write(vfd, dest, &format!("PS2_VSUB(ctx->vu0_vf[{vfs}], {q})")),
        VU0_S1_VMSUBQ => masked_madd(vfd, vfs, dest, q, true),
        VU0_S1_VSUBI => masked_write(vfd, dest, &format!("PS2_VSUB(ctx->vu0_vf[{vfs}], {i})")),
        VU0_S1_VMSUBI => masked_madd(vfd, vfs, dest, i, true),

        VU0_S1_VADD => masked_write(
            vfd,
            dest,
            &format!("PS2_VADD(ctx->vu0_vf[{vfs}], {vft_full})"),
        ),
        VU0_S1_VMADD => masked_madd(vfd, vfs, dest, &vft_full, false),
        VU0_S1_VMUL => masked_write(
            vfd,
            dest,
            &format!("PS2_VMUL(ctx->vu0_vf[{vfs}], {vft_full})"),
        ),
        VU0_S1_VMAX => masked_write(
            vfd,
            dest,
            &format!("_mm_max_ps(ctx->vu0_vf[{vfs}], {vft_full})"),
        ),
        VU0_S1_VSUB => masked_write(
            vfd,
            dest,
            &format!("PS2_VSUB(ctx->vu0_vf[{vfs}], {vft_full})"),
        ),
        VU0_S1_VMSUB => masked_madd(vfd, vfs, dest, &vft_full, true),
        VU0_S1_VOPMSUB => masked_madd(vfd, vfs, dest, &vft_full, true),
        VU0_S1_VMINI => masked_write(
            vfd,
            dest,
            &format!("_mm_min_ps(ctx->vu0_vf[{vfs}], {vft_full})"),
        ),

        VU0_S1_VIADD => format!("ctx->vi[{vfd}] = ctx->vi[{vfs}] + ctx->vi[{vft}];"),
        VU0_S1_VISUB => format!("ctx->vi[{vfd}] = ctx->vi[{vfs}] - ctx->vi[{vft}];"),
        VU0_S1_VIADDI => {
            // 5-bit signed immediate in the sa field.
            let imm5 = if inst.sa & 0x10 != 0 {
                (inst.sa | !0x1Fu32) as i32
            } else {
                inst.sa as i32
            };
            format!("ctx->vi[{vft}] = ctx->vi[{vfs}] + {imm5};")
        }
        VU0_S1_VIAND => format!("ctx->vi[{vfd}] = ctx->vi[{vfs}] & ctx->vi[{vft}];"),
        VU0_S1_VIOR => format!("ctx->vi[{vfd}] = ctx->vi[{vfs}] | ctx->vi[{vft}];"),

        VU0_S1_VCALLMS => {
            // VU0 micro memory holds 512 8-byte instructions; the
            // immediate is an instruction index.
            let index = (inst.raw >> 6) & 0x1FF;
            let byte_addr = index << 3;
            format!(
                "{{ ctx->vu0_tpc = 0x{byte_addr:X}; \
                 runtime->executeVU0Microprogram(rdram, ctx, 0x{byte_addr:X}); }}"
            )
        }
        VU0_S1_VCALLMSR => format!(
            "{{ uint16_t instr_index = ctx->vi[{vfs}] & 0x1FF; \
             uint32_t target_byte_addr = (uint32_t)instr_index << 3; \
             ctx->vu0_tpc = target_byte_addr; \
             runtime->vu0StartMicroProgram(rdram, ctx, target_byte_addr); }}"
        ),

        _ => format!("// Unhandled VU0 Special1 function: 0x{func:X}"),
    }
}

fn translate_special2(inst: &Instruction) -> String {
    let vfs = inst.rd;
    let vft = inst.rt;
    let dest = inst.vector.vector_field;
    let field = (inst.vu_function & 0x3) as u8;
    let func = inst.vu_function as u32;

    let q = "_mm_set1_ps(ctx->vu0_q)";
    let i = "_mm_set1_ps(ctx->vu0_i)";
    let vft_full = format!("ctx->vu0_vf[{vft}]");

    match func {
        VU0_S2_VADDAX..=VU0_S2_VADDAW => format!(
            "ctx->vu0_acc = PS2_VADD(ctx->vu0_vf[{vfs}], {});",
            vft_lane(vft, field)
        ),
        VU0_S2_VSUBAX..=VU0_S2_VSUBAW => format!(
            "ctx->vu0_acc = PS2_VSUB(ctx->vu0_vf[{vfs}], {});",
            vft_lane(vft, field)
        ),
        VU0_S2_VMADDAX..=VU0_S2_VMADDAW => acc_madd(vfs, &vft_lane(vft, field), false),
        VU0_S2_VMSUBAX..=VU0_S2_VMSUBAW => acc_madd(vfs, &vft_lane(vft, field), true),
        VU0_S2_VMULAX..=VU0_S2_VMULAW => format!(
            "ctx->vu0_acc = PS2_VMUL(ctx->vu0_vf[{vfs}], {});",
            vft_lane(vft, field)
        ),

        VU0_S2_VMULAQ => format!("ctx->vu0_acc = PS2_VMUL(ctx->vu0_vf[{vfs}], {q});"),
        VU0_S2_VMULAI => format!("ctx->vu0_acc = PS2_VMUL(ctx->vu0_vf[{vfs}], {i});"),
        VU0_S2_VADDAQ => format!("ctx->vu0_acc = PS2_VADD(ctx->vu0_vf[{vfs}], {q});"),
        VU0_S2_VMADDAQ => acc_madd(vfs, q, false),
        VU0_S2_VADDAI => format!("ctx->vu0_acc = PS2_VADD(ctx->vu0_vf[{vfs}], {i});"),
        VU0_S2_VMADDAI => acc_madd(vfs, i, false),
        VU0_S2_VSUBAQ => format!("ctx->vu0_acc = PS2_VSUB(ctx->vu0_vf[{vfs}], {q});"),
        VU0_S2_VMSUBAQ => acc_madd(vfs, q, true),
        VU0_S2_VSUBAI => format!("ctx->vu0_acc = PS2_VSUB(ctx->vu0_vf[{vfs}], {i});"),
        VU0_S2_VMSUBAI => acc_madd(vfs, i, true),

        VU0_S2_VADDA => format!(
            "ctx->vu0_acc = PS2_VADD(ctx->vu0_vf[{vfs}], {vft_full});"
        ),
        VU0_S2_VMADDA => acc_madd(vfs, &vft_full, false),
        VU0_S2_VMULA => format!(
            "ctx->vu0_acc = PS2_VMUL(ctx->vu0_vf[{vfs}], {vft_full});"
        ),
        VU0_S2_VSUBA => format!(
            "ctx->vu0_acc = PS2_VSUB(ctx->vu0_vf[{vfs}], {vft_full});"
        ),
        VU0_S2_VMSUBA => acc_madd(vfs, &vft_full, true),
        VU0_S2_VOPMULA => format!(
            "ctx->vu0_acc = PS2_VMUL(ctx->vu0_vf[{vfs}], {vft_full});"
        ),

        VU0_S2_VITOF0 => vitof(inst, 0),
        VU0_S2_VITOF4 => vitof(inst, 4),
        VU0_S2_VITOF12 => vitof(inst, 12),
        VU0_S2_VITOF15 => vitof(inst, 15),
        VU0_S2_VFTOI0 => vftoi(inst, 0),
        VU0_S2_VFTOI4 => vftoi(inst, 4),
        VU0_S2_VFTOI12 => vftoi(inst, 12),
        VU0_S2_VFTOI15 => vftoi(inst, 15),

        VU0_S2_VABS => masked_write(
            vft,
            dest,
            &format!(
                "_mm_and_ps(ctx->vu0_vf[{vfs}], _mm_castsi128_ps(_mm_set1_epi32(0x7FFFFFFF)))"
            ),
        ),
        VU0_S2_VMOVE => format!("ctx->vu0_vf[{vft}] = ctx->vu0_vf[{vfs}];"),
        VU0_S2_VMR32 => format!(
            "ctx->vu0_vf[{vft}] = _mm_shuffle_ps(ctx->vu0_vf[{vfs}], ctx->vu0_vf[{vfs}], _MM_SHUFFLE(0,0,0,1));"
        ),
        VU0_S2_VNOP => "// VNOP".into(),
        VU0_S2_VWAITQ => "// VWAITQ (Q is already resolved in this model)".into(),

        VU0_S2_VLQI => format!(
            "{{ uint32_t addr = ((uint32_t)(ctx->vi[{vfs}] & 0x3FF)) << 4; \
             __m128 res = _mm_castsi128_ps({}); \
             __m128i mask = {}; \
             ctx->vu0_vf[{vft}] = PS2_VBLEND(ctx->vu0_vf[{vft}], res, _mm_castsi128_ps(mask)); \
             ctx->vi[{vfs}] = (ctx->vi[{vfs}] + 1) & 0x3FF; }}",
            gen_read(inst, 128, "addr"),
            lane_mask(dest)
        ),
        VU0_S2_VSQI => format!(
            "{{ uint32_t addr = ((uint32_t)(ctx->vi[{vft}] & 0x3FF)) << 4; \
             __m128i old_val = {}; \
             __m128 res = PS2_VBLEND(_mm_castsi128_ps(old_val), ctx->vu0_vf[{vfs}], _mm_castsi128_ps({})); \
             {}; \
             ctx->vi[{vft}] = (ctx->vi[{vft}] + 1) & 0x3FF; }}",
            gen_read(inst, 128, "addr"),
            lane_mask(dest),
            gen_write(inst, 128, "addr", "_mm_castps_si128(res)")
        ),
        VU0_S2_VLQD => format!(
            "{{ ctx->vi[{vfs}] = (ctx->vi[{vfs}] - 1) & 0x3FF; \
             uint32_t addr = ((uint32_t)(ctx->vi[{vfs}] & 0x3FF)) << 4; \
             __m128 res = _mm_castsi128_ps({}); \
             __m128i mask = {}; \
             ctx->vu0_vf[{vft}] = PS2_VBLEND(ctx->vu0_vf[{vft}], res, _mm_castsi128_ps(mask)); }}",
            gen_read(inst, 128, "addr"),
            lane_mask(dest)
        ),
        VU0_S2_VSQD => format!(
            "{{ ctx->vi[{vft}] = (ctx->vi[{vft}] - 1) & 0x3FF; \
             uint32_t addr = ((uint32_t)(ctx->vi[{vft}] & 0x3FF)) << 4; \
             __m128i old_val = {}; \
             __m128 res = PS2_VBLEND(_mm_castsi128_ps(old_val), ctx->vu0_vf[{vfs}], _mm_castsi128_ps({})); \
             {}; }}",
            gen_read(inst, 128, "addr"),
            lane_mask(dest),
            gen_write(inst, 128, "addr", "_mm_castps_si128(res)")
        ),

        VU0_S2_VDIV => format!(
            "{{ float fs = {}; float ft = {}; \
             ctx->vu0_q = (ft != 0.0f) ? (fs / ft) : 0.0f; }}",
            scalar_lane(vfs, inst.vector.fsf),
            scalar_lane(vft, inst.vector.ftf)
        ),
        VU0_S2_VSQRT => format!(
            "{{ float ft = {}; ctx->vu0_q = sqrtf(std::max(0.0f, ft)); }}",
            scalar_lane(vft, inst.vector.ftf)
        ),
        VU0_S2_VRSQRT => format!(
            "{{ float ft = {}; ctx->vu0_q = (ft > 0.0f) ? (1.0f / sqrtf(ft)) : 0.0f; }}",
            scalar_lane(vft, inst.vector.ftf)
        ),

        VU0_S2_VMTIR => format!(
            "{{ float src = {}; ctx->vi[{vft}] = (uint16_t)(int32_t)src; }}",
            scalar_lane(vfs, inst.vector.fsf)
        ),
        VU0_S2_VMFIR => format!(
            "{{ float val = (float)ctx->vi[{vfs}]; \
             __m128 res = _mm_set1_ps(val); \
             __m128i mask = {}; \
             ctx->vu0_vf[{vft}] = PS2_VBLEND(ctx->vu0_vf[{vft}], res, _mm_castsi128_ps(mask)); }}",
            lane_mask(dest)
        ),
        VU0_S2_VILWR => format!(
            "{{ uint32_t addr = (uint32_t)(ctx->vi[{vfs}] << 2) & 0x3FFC; \
             ctx->vi[{vft}] = (uint16_t){}; }}",
            gen_read(inst, 32, "addr")
        ),
        VU0_S2_VISWR => format!(
            "{{ uint32_t addr = (uint32_t)(ctx->vi[{vfs}] << 2) & 0x3FFC; \
             {}; }}",
            gen_write(inst, 32, "addr", &format!("(uint32_t)ctx->vi[{vft}]"))
        ),

        VU0_S2_VRNEXT => format!(
            "{{ uint32_t r_vals[4]; \
             _mm_storeu_si128((__m128i*)r_vals, _mm_castps_si128(ctx->vu0_r)); \
             uint32_t feedback = r_vals[0] ^ (r_vals[0] << 13) ^ (r_vals[1] >> 19) ^ (r_vals[2] << 7); \
             r_vals[0] = r_vals[1]; \
             r_vals[1] = r_vals[2]; \
             r_vals[2] = r_vals[3]; \
             r_vals[3] = feedback; \
             ctx->vu0_r = _mm_castsi128_ps(_mm_loadu_si128((__m128i*)r_vals)); \
             {} }}",
            masked_write(vft, dest, "ctx->vu0_r")
        ),
        VU0_S2_VRGET => masked_write(vft, dest, "ctx->vu0_r"),
        VU0_S2_VRINIT => format!(
            "{{ float src = {}; \
             uint32_t seed; std::memcpy(&seed, &src, sizeof(seed)); \
             if (seed == 0) seed = 1; \
             uint32_t r0 = seed; \
             uint32_t r1 = r0 * 0x41C64E6D + 0x3039; \
             uint32_t r2 = r1 * 0x41C64E6D + 0x3039; \
             uint32_t r3 = r2 * 0x41C64E6D + 0x3039; \
             ctx->vu0_r = _mm_castsi128_ps(_mm_set_epi32((int32_t)r3, (int32_t)r2, (int32_t)r1, (int32_t)r0)); }}",
            scalar_lane(vfs, inst.vector.fsf)
        ),
        VU0_S2_VRXOR => format!(
            "{{ float src = {}; \
             uint32_t src_bits; std::memcpy(&src_bits, &src, sizeof(src_bits)); \
             __m128i r_current = _mm_castps_si128(ctx->vu0_r); \
             __m128i xored = _mm_xor_si128(r_current, _mm_set1_epi32((int32_t)src_bits)); \
             __m128i mixed = _mm_xor_si128(xored, _mm_slli_epi32(xored, 7)); \
             mixed = _mm_xor_si128(mixed, _mm_srli_epi32(mixed, 9)); \
             ctx->vu0_r = _mm_castsi128_ps(mixed); }}",
            scalar_lane(vfs, inst.vector.fsf)
        ),

        VU0_S2_VCLIPW => format!(
            "{{ __m128 fs = ctx->vu0_vf[{vfs}]; \
             __m128 ft = _mm_shuffle_ps(ctx->vu0_vf[{vft}], ctx->vu0_vf[{vft}], _MM_SHUFFLE(3,3,3,3)); \
             __m128 neg_ft = _mm_xor_ps(ft, _mm_castsi128_ps(_mm_set1_epi32(0x80000000))); \
             __m128 gt = _mm_cmpgt_ps(fs, ft); \
             __m128 lt = _mm_cmplt_ps(fs, neg_ft); \
             uint32_t gt_mask = (uint32_t)_mm_movemask_ps(gt); \
             uint32_t lt_mask = (uint32_t)_mm_movemask_ps(lt); \
             uint32_t flags = ((lt_mask & 0x1) << 0) | ((gt_mask & 0x1) << 1) | \
             ((lt_mask & 0x2) << 1) | ((gt_mask & 0x2) << 2) | \
             ((lt_mask & 0x4) << 2) | ((gt_mask & 0x4) << 3); \
             ctx->vu0_clip_flags = ((ctx->vu0_clip_flags << 6) | (flags & 0x3F)) & 0xFFFFFF; }}"
        ),

        _ => format!("// Unhandled VU0 Special2 function: 0x{func:X}"),
    }
}

fn vitof(inst: &Instruction, shift: u32) -> String {
    let vfs = inst.rd;
    let vft = inst.rt;
    let dest = inst.vector.vector_field;
    let scale = 1.0f32 / (1u32 << shift) as f32;
    format!(
        "{{ __m128i src = _mm_castps_si128(ctx->vu0_vf[{vfs}]); \
         __m128 res = _mm_cvtepi32_ps(src); \
         res = _mm_mul_ps(res, _mm_set1_ps({scale:?}f)); \
         __m128i mask = {}; \
         ctx->vu0_vf[{vft}] = PS2_VBLEND(ctx->vu0_vf[{vft}], res, _mm_castsi128_ps(mask)); }}",
        lane_mask(dest)
    )
}

fn vftoi(inst: &Instruction, shift: u32) -> String {
    let vfs = inst.rd;
    let vft = inst.rt;
    let dest = inst.vector.vector_field;
    let scale = (1u32 << shift) as f32;
    format!(
        "{{ __m128 src = ctx->vu0_vf[{vfs}]; \
         src = _mm_mul_ps(src, _mm_set1_ps({scale:?}f)); \
         __m128i res_i = _mm_cvttps_epi32(src); \
         __m128 res = _mm_castsi128_ps(res_i); \
         __m128i mask = {}; \
         ctx->vu0_vf[{vft}] = PS2_VBLEND(ctx->vu0_vf[{vft}], res, _mm_castsi128_ps(mask)); }}",
        lane_mask(dest)
    )
}

fn translate_cfc2(inst: &Instruction) -> String {
    let rt = inst.rt;
    match inst.rd {
        VU0_CR_STATUS => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_status);"),
        VU0_CR_MAC => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_mac_flags);"),
        VU0_CR_VPU_STAT => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_vpu_stat);"),
        VU0_CR_R => format!("SET_GPR_VEC(ctx, {rt}, _mm_castps_si128(ctx->vu0_r));"),
        VU0_CR_I => format!(
            "{{ uint32_t bits; std::memcpy(&bits, &ctx->vu0_i, sizeof(bits)); SET_GPR_U32(ctx, {rt}, bits); }}"
        ),
        VU0_CR_CLIP => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_clip_flags);"),
        VU0_CR_TPC => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_tpc);"),
        VU0_CR_ACC => format!("SET_GPR_VEC(ctx, {rt}, _mm_castps_si128(ctx->vu0_acc));"),
        VU0_CR_P => format!(
            "{{ uint32_t bits; std::memcpy(&bits, &ctx->vu0_p, sizeof(bits)); SET_GPR_U32(ctx, {rt}, bits); }}"
        ),
        VU0_CR_ITOP => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_itop);"),
        VU0_CR_ITOPS => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_itops);"),
        VU0_CR_TOPS => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_tops);"),
        VU0_CR_XITOP => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_xitop);"),
        VU0_CR_CMSAR0 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_cmsar0);"),
        VU0_CR_INFO => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_info);"),
        VU0_CR_CLIP2 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_clip_flags2);"),
        VU0_CR_CMSAR1 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_cmsar1);"),
        VU0_CR_FBRST2 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_fbrst2);"),
        VU0_CR_FBRST => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_fbrst);"),
        VU0_CR_VPU_STAT2 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_vpu_stat2);"),
        VU0_CR_TPC2 => format!("SET_GPR_U32(ctx, {rt}, ctx->vu0_tpc2);"),
        _ => format!("// Unimplemented CFC2 VU control register: {}", inst.rd),
    }
}

fn translate_ctc2(inst: &Instruction) -> String {
    let rt = inst.rt;
    match inst.rd {
        VU0_CR_STATUS => format!("ctx->vu0_status = GPR_U32(ctx, {rt}) & 0xFFFF;"),
        VU0_CR_MAC => format!("ctx->vu0_mac_flags = GPR_U32(ctx, {rt});"),
        VU0_CR_VPU_STAT => format!("ctx->vu0_vpu_stat = GPR_U32(ctx, {rt});"),
        VU0_CR_R => format!("ctx->vu0_r = _mm_castsi128_ps(GPR_VEC(ctx, {rt}));"),
        VU0_CR_I => format!(
            "{{ uint32_t bits = GPR_U32(ctx, {rt}); std::memcpy(&ctx->vu0_i, &bits, sizeof(bits)); }}"
        ),
        VU0_CR_CLIP => format!("ctx->vu0_clip_flags = GPR_U32(ctx, {rt});"),
        VU0_CR_TPC => format!("ctx->vu0_tpc = GPR_U32(ctx, {rt});"),
        VU0_CR_ACC => format!("ctx->vu0_acc = _mm_castsi128_ps(GPR_VEC(ctx, {rt}));"),
        VU0_CR_P => format!(
            "{{ uint32_t bits = GPR_U32(ctx, {rt}); std::memcpy(&ctx->vu0_p, &bits, sizeof(bits)); }}"
        ),
        VU0_CR_ITOP => format!("ctx->vu0_itop = GPR_U32(ctx, {rt}) & 0x3FF;"),
        VU0_CR_ITOPS => format!("ctx->vu0_itops = GPR_U32(ctx, {rt}) & 0x3FF;"),
        VU0_CR_TOPS => format!("ctx->vu0_tops = GPR_U32(ctx, {rt}) & 0x3FF;"),
        VU0_CR_XITOP => format!("ctx->vu0_xitop = GPR_U32(ctx, {rt}) & 0x3FF;"),
        VU0_CR_CMSAR0 => format!("ctx->vu0_cmsar0 = GPR_U32(ctx, {rt});"),
        VU0_CR_INFO => format!("ctx->vu0_info = GPR_U32(ctx, {rt});"),
        VU0_CR_CLIP2 => format!("ctx->vu0_clip_flags2 = GPR_U32(ctx, {rt});"),
        VU0_CR_CMSAR1 => format!("ctx->vu0_cmsar1 = GPR_U32(ctx, {rt});"),
        VU0_CR_FBRST2 => format!("ctx->vu0_fbrst2 = GPR_U32(ctx, {rt});"),
        VU0_CR_FBRST => format!("ctx->vu0_fbrst = GPR_U32(ctx, {rt});"),
        VU0_CR_VPU_STAT2 => format!("ctx->vu0_vpu_stat2 = GPR_U32(ctx, {rt});"),
        VU0_CR_TPC2 => format!("ctx->vu0_tpc2 = GPR_U32(ctx, {rt});"),
        _ => format!("// Unimplemented CTC2 VU control register: {}", inst.rd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    // COP2 CO-group word with a full xyzw destination mask.
    fn co(rt: u32, rd: u32, sa: u32, function: u32) -> u32 {
        (OPCODE_COP2 << 26) | (0x1F << 21) | (rt << 16) | (rd << 11) | (sa << 6) | function
    }

    #[test]
    fn vmfir_broadcasts_the_integer_value_as_float() {
        // VMFIR: Special2 code 0x3D = (0xF << 2) | 1; vis in rd, vft in rt.
        let inst = decode(0, co(2, 3, 0xF, 0x3D));
        assert_eq!(inst.vu_function, VU0_S2_VMFIR as u8);

        let out = translate_vu(&inst);
        assert!(out.contains("float val = (float)ctx->vi[3];"), "{out}");
        assert!(out.contains("_mm_set1_ps(val)"), "{out}");
        assert!(
            out.contains("ctx->vu0_vf[2] = PS2_VBLEND(ctx->vu0_vf[2], res,"),
            "{out}"
        );
    }

    #[test]
    fn vmtir_truncates_the_selected_lane_to_integer() {
        // VMTIR: Special2 code 0x3C; rd = 5 puts its low bit in fsf.
        let inst = decode(0, (OPCODE_COP2 << 26) | (0x10 << 21) | (4 << 16) | (5 << 11) | (0xF << 6) | 0x3C);
        assert_eq!(inst.vu_function, VU0_S2_VMTIR as u8);
        assert_eq!(inst.vector.fsf, 2);

        let out = translate_vu(&inst);
        assert!(
            out.contains("_mm_shuffle_ps(ctx->vu0_vf[5], ctx->vu0_vf[5], _MM_SHUFFLE(0,0,0,2))"),
            "{out}"
        );
        assert!(out.contains("ctx->vi[4] = (uint16_t)(int32_t)src;"), "{out}");
    }

    #[test]
    fn vi_transfers_convert_numerically_in_both_directions() {
        let vmfir = translate_vu(&decode(0, co(2, 3, 0xF, 0x3D)));
        let vmtir = translate_vu(&decode(0, co(4, 5, 0xF, 0x3C)));

        assert!(vmfir.contains("(float)ctx->vi["), "{vmfir}");
        assert!(vmtir.contains("(uint16_t)(int32_t)src"), "{vmtir}");
        assert!(!vmfir.contains("memcpy"), "{vmfir}");
    }

    #[test]
    fn vmadd_tracks_the_accumulator() {
        // VMADD vf1, vf2, vf3 (Special1 code 0x29).
        let inst = decode(0, co(3, 2, 1, VU0_S1_VMADD));
        let out = translate_vu(&inst);

        assert!(
            out.contains("__m128 mul_res = PS2_VMUL(ctx->vu0_vf[2], ctx->vu0_vf[3]);"),
            "{out}"
        );
        assert!(out.contains("__m128 res = PS2_VADD(ctx->vu0_acc, mul_res);"), "{out}");
        assert!(
            out.contains("ctx->vu0_vf[1] = PS2_VBLEND(ctx->vu0_vf[1], res, _mm_castsi128_ps(mask));"),
            "{out}"
        );
        assert!(out.ends_with("ctx->vu0_acc = res; }"), "{out}");
    }

    #[test]
    fn vaddx_broadcasts_the_selected_lane() {
        // VADD.x vf1, vf2, vf3x (Special1 code 0x00, broadcast lane x).
        let inst = decode(0, co(3, 2, 1, VU0_S1_VADDX));
        let out = translate_vu(&inst);

        assert!(
            out.contains("_mm_shuffle_ps(ctx->vu0_vf[3], ctx->vu0_vf[3], _MM_SHUFFLE(0,0,0,0))"),
            "{out}"
        );
        assert!(out.contains("PS2_VADD(ctx->vu0_vf[2],"), "{out}");
    }

    #[test]
    fn qmtc2_moves_the_full_quadword() {
        let raw = (OPCODE_COP2 << 26) | (COP2_QMTC2 << 21) | (4 << 16) | (7 << 11);
        let out = translate_vu(&decode(0, raw));
        assert_eq!(out, "ctx->vu0_vf[7] = _mm_castsi128_ps(GPR_VEC(ctx, 4));");
    }
}
