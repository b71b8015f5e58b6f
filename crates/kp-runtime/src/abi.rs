//! C ABI exported to generated programs.
//!
//! Symbol names and argument orders are what the front-end declares. Each thread owns at most
//! one runtime: `kp_rt_init` creates it, `kp_rt_teardown` flushes and drops it. Primitives
//! called without a prior `kp_rt_init` get a runtime configured from the environment.
//!
//! Nothing here reports errors or unwinds into the caller: output failures are logged and
//! dropped, and a panic inside a primitive yields the neutral value.

use std::cell::RefCell;
use std::ffi::{c_char, CStr};
use std::panic::AssertUnwindSafe;

use kp_contracts::{FORTH_FALSE, FORTH_TRUE};
use kp_profiles::ProfileId;

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::runtime::StdRuntime;
use crate::{fbits, fixed};

thread_local! {
    static RUNTIME: RefCell<Option<StdRuntime>> = const { RefCell::new(None) };
}

fn with_runtime<T>(default: T, f: impl FnOnce(&mut StdRuntime) -> T) -> T {
    let run = AssertUnwindSafe(|| {
        RUNTIME.with(|slot| {
            let mut slot = slot.borrow_mut();
            let rt = slot
                .get_or_insert_with(|| StdRuntime::stdio(&RuntimeConfig::from_env_or_default()));
            f(rt)
        })
    });
    std::panic::catch_unwind(run).unwrap_or(default)
}

/// Writes, then flushes so output is visible before the next blocking read and survives a
/// foreign `main` that never runs Rust's exit hooks.
fn emit(f: impl FnOnce(&mut StdRuntime) -> Result<()>) {
    with_runtime((), |rt| {
        if let Err(err) = f(rt).and_then(|()| rt.flush()) {
            tracing::warn!(error = %err, "runtime output dropped");
        }
    })
}

fn teardown_slot() {
    let old = RUNTIME.with(|slot| slot.borrow_mut().take());
    if let Some(rt) = old {
        if let Err(err) = rt.finish() {
            tracing::warn!(error = %err, "flush on teardown failed");
        }
    }
}

// --- lifecycle ---

/// Creates this thread's runtime, replacing (and flushing) any existing one. `profile` is a
/// `ProfileId::abi_code`; any other value, including -1, selects the environment
/// configuration. Returns -1 if the requested profile was applied, 0 if it fell back.
#[no_mangle]
pub extern "C" fn kp_rt_init(profile: i32) -> i32 {
    teardown_slot();
    let (config, applied) = match ProfileId::from_abi_code(profile) {
        Some(id) => (RuntimeConfig::for_profile(id), true),
        None => (RuntimeConfig::from_env_or_default(), false),
    };
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(StdRuntime::stdio(&config)));
    if applied {
        FORTH_TRUE
    } else {
        FORTH_FALSE
    }
}

#[no_mangle]
pub extern "C" fn kp_rt_teardown() {
    let _ = std::panic::catch_unwind(teardown_slot);
}

// --- output ---

#[no_mangle]
pub extern "C" fn pwrite_i32(x: i32) {
    emit(|rt| rt.write_i32(x))
}

#[no_mangle]
pub extern "C" fn pwrite_bool(x: i32) {
    emit(|rt| rt.write_bool(x))
}

#[no_mangle]
pub extern "C" fn pwrite_char(x: i32) {
    emit(|rt| rt.write_char(x))
}

#[no_mangle]
pub extern "C" fn pwrite_hex(x: i32) {
    emit(|rt| rt.write_hex(x))
}

#[no_mangle]
pub extern "C" fn pwriteln() {
    emit(|rt| rt.write_newline())
}

/// # Safety
///
/// `s` must be null or point to a NUL-terminated string that stays valid for the call.
#[no_mangle]
pub unsafe extern "C" fn pwrite_str(s: *const c_char) {
    if s.is_null() {
        return;
    }
    let bytes = CStr::from_ptr(s).to_bytes();
    emit(|rt| rt.write_str(bytes))
}

#[no_mangle]
pub extern "C" fn pwrite_f32_bits(bits: i32) {
    emit(|rt| rt.write_f32_bits(bits))
}

// --- input ---

#[no_mangle]
pub extern "C" fn pread_i32() -> i32 {
    with_runtime(0, |rt| rt.read_i32())
}

#[no_mangle]
pub extern "C" fn pread_bool() -> i32 {
    with_runtime(0, |rt| rt.read_bool())
}

#[no_mangle]
pub extern "C" fn pread_char() -> i32 {
    with_runtime(0, |rt| rt.read_char())
}

#[no_mangle]
pub extern "C" fn pread_f32_bits() -> i32 {
    with_runtime(0, |rt| rt.read_f32_bits())
}

#[no_mangle]
pub extern "C" fn preadln() {
    with_runtime((), |rt| rt.skip_line())
}

#[no_mangle]
pub extern "C" fn pread_more() -> i32 {
    with_runtime(FORTH_FALSE, |rt| rt.has_more_input())
}

// --- memory ---

#[no_mangle]
pub extern "C" fn pvar_get(id: i32) -> i32 {
    with_runtime(0, |rt| rt.var_get(id))
}

#[no_mangle]
pub extern "C" fn pvar_set(v: i32, id: i32) {
    with_runtime((), |rt| rt.var_set(v, id))
}

#[no_mangle]
pub extern "C" fn pfield_get(obj: i32, off: i32) -> i32 {
    with_runtime(0, |rt| rt.field_get(obj, off))
}

#[no_mangle]
pub extern "C" fn pfield_set(v: i32, obj: i32, off: i32) {
    with_runtime((), |rt| rt.field_set(v, obj, off))
}

#[no_mangle]
pub extern "C" fn pbool(x: i32) -> i32 {
    fbits::forth_bool(x != 0)
}

#[no_mangle]
pub extern "C" fn rt_heap_reset(base: i32) {
    with_runtime((), |rt| rt.heap_reset(base))
}

#[no_mangle]
pub extern "C" fn rt_here() -> i32 {
    with_runtime(0, |rt| rt.here())
}

#[no_mangle]
pub extern "C" fn rt_allot(n: i32) {
    with_runtime((), |rt| rt.allot(n))
}

// --- f32 bit patterns ---

#[no_mangle]
pub extern "C" fn fadd_bits(a: i32, b: i32) -> i32 {
    fbits::add(a, b)
}

#[no_mangle]
pub extern "C" fn fsub_bits(a: i32, b: i32) -> i32 {
    fbits::sub(a, b)
}

#[no_mangle]
pub extern "C" fn fmul_bits(a: i32, b: i32) -> i32 {
    fbits::mul(a, b)
}

#[no_mangle]
pub extern "C" fn fdiv_bits(a: i32, b: i32) -> i32 {
    fbits::div(a, b)
}

#[no_mangle]
pub extern "C" fn fnegate_bits(a: i32) -> i32 {
    fbits::negate(a)
}

#[no_mangle]
pub extern "C" fn fabs_bits(a: i32) -> i32 {
    fbits::abs(a)
}

#[no_mangle]
pub extern "C" fn feq_bits(a: i32, b: i32) -> i32 {
    fbits::eq(a, b)
}

#[no_mangle]
pub extern "C" fn flt_bits(a: i32, b: i32) -> i32 {
    fbits::lt(a, b)
}

#[no_mangle]
pub extern "C" fn fle_bits(a: i32, b: i32) -> i32 {
    fbits::le(a, b)
}

#[no_mangle]
pub extern "C" fn fzero_bits(a: i32) -> i32 {
    fbits::is_zero(a)
}

#[no_mangle]
pub extern "C" fn finf_bits(a: i32) -> i32 {
    fbits::is_inf(a)
}

#[no_mangle]
pub extern "C" fn fnan_bits(a: i32) -> i32 {
    fbits::is_nan(a)
}

#[no_mangle]
pub extern "C" fn ffinite_bits(a: i32) -> i32 {
    fbits::is_finite(a)
}

#[no_mangle]
pub extern "C" fn s_to_f_bits(a: i32) -> i32 {
    fbits::from_int(a)
}

#[no_mangle]
pub extern "C" fn f_bits_to_s(a: i32) -> i32 {
    fbits::to_int(a)
}

#[no_mangle]
pub extern "C" fn q16_16_to_f_bits(a: i32) -> i32 {
    fbits::from_q16_16(a)
}

#[no_mangle]
pub extern "C" fn f_bits_to_q16_16(a: i32) -> i32 {
    fbits::to_q16_16(a)
}

#[no_mangle]
pub extern "C" fn fround_i32_bits(a: i32) -> i32 {
    fbits::round(a)
}

#[no_mangle]
pub extern "C" fn kp_fabs_f32_bits(a: i32) -> i32 {
    fbits::fabs(a)
}

#[no_mangle]
pub extern "C" fn kp_fsqrt_f32_bits(a: i32) -> i32 {
    fbits::sqrt(a)
}

#[no_mangle]
pub extern "C" fn kp_fsin_f32_bits(a: i32) -> i32 {
    fbits::sin(a)
}

#[no_mangle]
pub extern "C" fn kp_fcos_f32_bits(a: i32) -> i32 {
    fbits::cos(a)
}

#[no_mangle]
pub extern "C" fn kp_fpow_f32_i32_bits(a: i32, n: i32) -> i32 {
    fbits::pow_i32(a, n)
}

#[no_mangle]
pub extern "C" fn kp_ffloor_f32_bits(a: i32) -> i32 {
    fbits::floor(a)
}

#[no_mangle]
pub extern "C" fn kp_fceil_f32_bits(a: i32) -> i32 {
    fbits::ceil(a)
}

// --- fixed point ---

#[no_mangle]
pub extern "C" fn kp_fx_sqrt_i32(x: i32) -> i32 {
    fixed::isqrt(x)
}

#[no_mangle]
pub extern "C" fn kp_fx_sin_deg_i32(a: i32) -> i32 {
    fixed::sin_deg(a)
}

#[no_mangle]
pub extern "C" fn kp_fx_cos_deg_i32(a: i32) -> i32 {
    fixed::cos_deg(a)
}

#[no_mangle]
pub extern "C" fn kp_fx_tan_deg_i32(a: i32) -> i32 {
    fixed::tan_deg(a)
}

#[no_mangle]
pub extern "C" fn kp_fx_asin_fixed_i32(v: i32) -> i32 {
    fixed::asin_fixed(v)
}

#[no_mangle]
pub extern "C" fn kp_fx_acos_fixed_i32(v: i32) -> i32 {
    fixed::acos_fixed(v)
}

#[no_mangle]
pub extern "C" fn kp_fx_atan_fixed_i32(v: i32) -> i32 {
    fixed::atan_fixed(v)
}

#[no_mangle]
pub extern "C" fn kp_fx_ln_i32(x: i32) -> i32 {
    fixed::ln(x)
}

#[no_mangle]
pub extern "C" fn kp_fx_log_i32(x: i32) -> i32 {
    fixed::log10(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only touch state that does not read stdin.

    #[test]
    fn memory_state_lives_in_the_thread_runtime() {
        std::thread::spawn(|| {
            assert_eq!(kp_rt_init(ProfileId::Kforth.abi_code()), FORTH_TRUE);
            pvar_set(11, 64);
            pfield_set(12, 60, 8);
            assert_eq!(pvar_get(64), 11);
            assert_eq!(pfield_get(64, 4), 12);

            rt_heap_reset(100);
            rt_allot(28);
            assert_eq!(rt_here(), 128);

            // A fresh runtime starts from zeroed state.
            kp_rt_init(ProfileId::Legacy.abi_code());
            assert_eq!(pvar_get(64), 0);
            assert_eq!(rt_here(), 0);
            kp_rt_teardown();
        })
        .join()
        .expect("abi thread");
    }

    #[test]
    fn primitives_without_init_use_environment_config() {
        std::thread::spawn(|| {
            assert!(RUNTIME.with(|slot| slot.borrow().is_none()));
            pvar_set(9, 12);
            rt_allot(8);

            let profile = RUNTIME.with(|slot| slot.borrow().as_ref().map(|rt| rt.profile()));
            assert_eq!(profile, Some(RuntimeConfig::from_env_or_default().profile));
            assert_eq!(pvar_get(12), 9);
            assert_eq!(rt_here(), 8);
            kp_rt_teardown();
            assert!(RUNTIME.with(|slot| slot.borrow().is_none()));
        })
        .join()
        .expect("abi thread");
    }

    #[test]
    fn threads_do_not_share_runtimes() {
        kp_rt_init(ProfileId::Kforth.abi_code());
        pvar_set(5, 0);
        let other = std::thread::spawn(|| pvar_get(0)).join().expect("abi thread");
        assert_eq!(other, 0);
        assert_eq!(pvar_get(0), 5);
        kp_rt_teardown();
    }

    #[test]
    fn unknown_profile_code_falls_back() {
        std::thread::spawn(|| {
            assert_eq!(kp_rt_init(-1), FORTH_FALSE);
            kp_rt_teardown();
            // Teardown twice is harmless.
            kp_rt_teardown();
        })
        .join()
        .expect("abi thread");
    }

    #[test]
    fn pure_entry_points_match_library() {
        let one = fbits::encode(1.0);
        let two = fbits::encode(2.0);
        assert_eq!(fadd_bits(one, one), two);
        assert_eq!(fnegate_bits(fnegate_bits(one)), one);
        assert_eq!(pbool(3), FORTH_TRUE);
        assert_eq!(pbool(0), FORTH_FALSE);
        assert_eq!(kp_fx_cos_deg_i32(0), 10_000);
        assert_eq!(kp_fx_tan_deg_i32(90), 0);
        assert_eq!(f_bits_to_s(s_to_f_bits(5)), 5);
    }
}
