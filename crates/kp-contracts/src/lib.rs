//! Shared, version-pinned runtime constants.
//!
//! Generated code, the runtime and the tooling all agree on these values; changing one is an
//! ABI break and must bump `KP_RT_ABI_VERSION`.

/// Number of 32-bit cells in the flat memory store.
pub const MEM_CELLS: usize = 65536;

/// Size of the addressable byte space (`MEM_CELLS * 4`).
pub const MEM_BYTES: i32 = (MEM_CELLS as i32) * 4;

/// Fixed-point scale used by the `kp_fx_*` family (4 fractional decimal digits).
pub const FIX_SCALE: i32 = 10_000;

/// Scale of the 16.16 fixed-point conversions.
pub const Q16_16_SCALE: i32 = 65_536;

/// Input token buffer size, including the terminator slot. At most `TOKEN_CAP - 1` bytes of a
/// token are kept.
pub const TOKEN_CAP: usize = 256;

pub const FORTH_TRUE: i32 = -1;
pub const FORTH_FALSE: i32 = 0;

pub const KP_RT_ABI_VERSION: u32 = 1;

pub const KP_RT_CALL_REPORT_SCHEMA_VERSION: &str = "kp-rt.call.report@0.1.0";
pub const KP_RT_ABI_REPORT_SCHEMA_VERSION: &str = "kp-rt.abi.report@0.1.0";
pub const KP_RT_CONFIG_SCHEMA_VERSION: &str = "kp-rt.config@0.1.0";

pub const ENV_PROFILE: &str = "KP_RT_PROFILE";
pub const ENV_CONFIG: &str = "KP_RT_CONFIG";
