//! IEEE-754 single precision carried as raw `i32` bit patterns.
//!
//! Every operation decodes its operands, computes in `f32` and re-encodes. Sign-bit operations
//! (`negate`, `abs`) and the classifiers never touch the FPU, so they are bit exact for every
//! pattern, NaN payloads included. Arithmetic results that are NaN are re-encoded as the
//! canonical quiet NaN so outputs do not depend on the host FPU's payload propagation.

use kp_contracts::{FORTH_FALSE, FORTH_TRUE, Q16_16_SCALE};

const SIGN_MASK: u32 = 0x8000_0000;
const EXP_MASK: u32 = 0xFF;
const FRAC_MASK: u32 = 0x7F_FFFF;
const CANONICAL_NAN: u32 = 0x7FC0_0000;

#[inline]
pub fn decode(bits: i32) -> f32 {
    f32::from_bits(bits as u32)
}

#[inline]
pub fn encode(x: f32) -> i32 {
    if x.is_nan() {
        CANONICAL_NAN as i32
    } else {
        x.to_bits() as i32
    }
}

#[inline]
pub fn forth_bool(cond: bool) -> i32 {
    if cond {
        FORTH_TRUE
    } else {
        FORTH_FALSE
    }
}

#[inline]
fn exp_raw(u: u32) -> u32 {
    (u >> 23) & EXP_MASK
}

#[inline]
fn frac(u: u32) -> u32 {
    u & FRAC_MASK
}

#[inline]
pub fn is_nan_u32(u: u32) -> bool {
    exp_raw(u) == EXP_MASK && frac(u) != 0
}

#[inline]
pub fn is_inf_u32(u: u32) -> bool {
    exp_raw(u) == EXP_MASK && frac(u) == 0
}

#[inline]
pub fn is_finite_u32(u: u32) -> bool {
    exp_raw(u) != EXP_MASK
}

/// Rounds half away from zero, truncating toward zero afterwards. Out-of-range values saturate
/// and NaN becomes 0.
#[inline]
pub fn round_half_away(x: f32) -> i32 {
    if x >= 0.0 {
        (x + 0.5) as i32
    } else {
        (x - 0.5) as i32
    }
}

pub fn add(a: i32, b: i32) -> i32 {
    encode(decode(a) + decode(b))
}

pub fn sub(a: i32, b: i32) -> i32 {
    encode(decode(a) - decode(b))
}

pub fn mul(a: i32, b: i32) -> i32 {
    encode(decode(a) * decode(b))
}

pub fn div(a: i32, b: i32) -> i32 {
    encode(decode(a) / decode(b))
}

pub fn negate(a: i32) -> i32 {
    ((a as u32) ^ SIGN_MASK) as i32
}

pub fn abs(a: i32) -> i32 {
    ((a as u32) & !SIGN_MASK) as i32
}

pub fn eq(a: i32, b: i32) -> i32 {
    forth_bool(decode(a) == decode(b))
}

pub fn lt(a: i32, b: i32) -> i32 {
    forth_bool(decode(a) < decode(b))
}

pub fn le(a: i32, b: i32) -> i32 {
    forth_bool(decode(a) <= decode(b))
}

/// True for both +0.0 and -0.0.
pub fn is_zero(a: i32) -> i32 {
    forth_bool((a as u32) & !SIGN_MASK == 0)
}

pub fn is_inf(a: i32) -> i32 {
    forth_bool(is_inf_u32(a as u32))
}

pub fn is_nan(a: i32) -> i32 {
    forth_bool(is_nan_u32(a as u32))
}

pub fn is_finite(a: i32) -> i32 {
    forth_bool(is_finite_u32(a as u32))
}

pub fn from_int(a: i32) -> i32 {
    encode(a as f32)
}

/// Truncates toward zero; saturates outside the `i32` range and maps NaN to 0.
pub fn to_int(a: i32) -> i32 {
    decode(a) as i32
}

pub fn from_q16_16(a: i32) -> i32 {
    encode(a as f32 / Q16_16_SCALE as f32)
}

pub fn to_q16_16(a: i32) -> i32 {
    (decode(a) * Q16_16_SCALE as f32) as i32
}

pub fn round(a: i32) -> i32 {
    round_half_away(decode(a))
}

pub fn fabs(a: i32) -> i32 {
    encode(libm::fabsf(decode(a)))
}

pub fn sqrt(a: i32) -> i32 {
    encode(libm::sqrtf(decode(a)))
}

pub fn sin(a: i32) -> i32 {
    encode(libm::sinf(decode(a)))
}

pub fn cos(a: i32) -> i32 {
    encode(libm::cosf(decode(a)))
}

pub fn pow_i32(a: i32, n: i32) -> i32 {
    encode(libm::powf(decode(a), n as f32))
}

pub fn floor(a: i32) -> i32 {
    encode(libm::floorf(decode(a)))
}

pub fn ceil(a: i32) -> i32 {
    encode(libm::ceilf(decode(a)))
}
