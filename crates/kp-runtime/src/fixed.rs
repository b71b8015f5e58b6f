//! Scaled-integer trigonometry and logarithms (scale 10000).
//!
//! Angles in and out of this family are plain integer degrees; ratios are fixed-point. Domain
//! errors produce 0 instead of infinities or NaN.

use kp_contracts::FIX_SCALE;

use crate::fbits::round_half_away;

const PI_F: f32 = std::f32::consts::PI;
const DEG2RAD_F: f32 = PI_F / 180.0;
const RAD2DEG_F: f32 = 180.0 / PI_F;
const SCALE_F: f32 = FIX_SCALE as f32;

/// Below this `|cos|` the tangent is treated as vertical and reported as 0.
const TAN_ASYMPTOTE_EPS: f32 = 1.0e-6;

#[inline]
pub fn fix_from_float(x: f32) -> i32 {
    round_half_away(x * SCALE_F)
}

#[inline]
pub fn fix_to_float(x: i32) -> f32 {
    x as f32 / SCALE_F
}

#[inline]
fn deg_to_rad(a: i32) -> f32 {
    a as f32 * DEG2RAD_F
}

#[inline]
fn rad_to_whole_deg(r: f32) -> i32 {
    round_half_away(r * RAD2DEG_F)
}

#[inline]
fn clamp_unit(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

pub fn isqrt(x: i32) -> i32 {
    if x <= 0 {
        return 0;
    }
    libm::floorf(libm::sqrtf(x as f32)) as i32
}

pub fn sin_deg(a: i32) -> i32 {
    fix_from_float(libm::sinf(deg_to_rad(a)))
}

pub fn cos_deg(a: i32) -> i32 {
    fix_from_float(libm::cosf(deg_to_rad(a)))
}

pub fn tan_deg(a: i32) -> i32 {
    let r = deg_to_rad(a);
    if libm::fabsf(libm::cosf(r)) < TAN_ASYMPTOTE_EPS {
        return 0;
    }
    fix_from_float(libm::tanf(r))
}

pub fn asin_fixed(v: i32) -> i32 {
    rad_to_whole_deg(libm::asinf(clamp_unit(fix_to_float(v))))
}

pub fn acos_fixed(v: i32) -> i32 {
    rad_to_whole_deg(libm::acosf(clamp_unit(fix_to_float(v))))
}

pub fn atan_fixed(v: i32) -> i32 {
    rad_to_whole_deg(libm::atanf(fix_to_float(v)))
}

pub fn ln(x: i32) -> i32 {
    if x <= 0 {
        return 0;
    }
    fix_from_float(libm::logf(x as f32))
}

pub fn log10(x: i32) -> i32 {
    if x <= 0 {
        return 0;
    }
    fix_from_float(libm::log10f(x as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(actual: i32, expected: i32) -> bool {
        (actual - expected).abs() <= 1
    }

    #[test]
    fn scale_conversions() {
        assert_eq!(fix_from_float(1.0), 10_000);
        assert_eq!(fix_from_float(-0.5), -5_000);
        assert_eq!(fix_from_float(0.25), 2_500);
        assert_eq!(fix_from_float(1.23456), 12_346);
        assert_eq!(fix_from_float(-1.23456), -12_346);
        assert_eq!(fix_to_float(25_000), 2.5);
    }

    #[test]
    fn integer_square_root() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(-9), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1_000_000), 1000);
    }

    #[test]
    fn sine_and_cosine() {
        assert!(near(sin_deg(90), 10_000), "{}", sin_deg(90));
        assert!(near(sin_deg(30), 5_000), "{}", sin_deg(30));
        assert!(near(sin_deg(-90), -10_000), "{}", sin_deg(-90));
        assert_eq!(cos_deg(0), 10_000);
        assert!(near(cos_deg(60), 5_000), "{}", cos_deg(60));
        assert!(near(cos_deg(180), -10_000), "{}", cos_deg(180));
    }

    #[test]
    fn tangent_guards_the_asymptote() {
        assert_eq!(tan_deg(90), 0);
        assert_eq!(tan_deg(-90), 0);
        assert_eq!(tan_deg(0), 0);
        assert!(near(tan_deg(45), 10_000), "{}", tan_deg(45));
        assert!(near(tan_deg(-45), -10_000), "{}", tan_deg(-45));
    }

    #[test]
    fn inverse_trig_returns_whole_degrees() {
        assert_eq!(asin_fixed(10_000), 90);
        assert_eq!(asin_fixed(5_000), 30);
        assert_eq!(asin_fixed(-10_000), -90);
        assert_eq!(acos_fixed(10_000), 0);
        assert_eq!(acos_fixed(0), 90);
        assert_eq!(acos_fixed(-10_000), 180);
        assert_eq!(atan_fixed(10_000), 45);
        assert_eq!(atan_fixed(-10_000), -45);
        assert_eq!(atan_fixed(0), 0);
    }

    #[test]
    fn inverse_trig_clamps_out_of_range_inputs() {
        assert_eq!(asin_fixed(20_000), 90);
        assert_eq!(asin_fixed(-20_000), -90);
        assert_eq!(acos_fixed(20_000), 0);
        assert_eq!(acos_fixed(i32::MIN), 180);
    }

    #[test]
    fn logarithms() {
        assert_eq!(ln(1), 0);
        assert!(near(ln(10), 23_026), "{}", ln(10));
        assert_eq!(log10(1), 0);
        assert!(near(log10(100), 20_000), "{}", log10(100));
        assert_eq!(ln(0), 0);
        assert_eq!(ln(-5), 0);
        assert_eq!(log10(0), 0);
        assert_eq!(log10(i32::MIN), 0);
    }
}
