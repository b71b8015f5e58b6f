//! Fixed textual encodings for the `pwrite_*` family.

use std::io::{self, Write};

use kp_profiles::{BoolConvention, HexCase};

use crate::fbits;

pub fn write_i32<W: Write>(w: &mut W, x: i32) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    w.write_all(buf.format(x).as_bytes())
}

pub fn write_bool<W: Write>(w: &mut W, x: i32, conv: BoolConvention) -> io::Result<()> {
    let s: &[u8] = if conv.is_true(x) { b"TRUE" } else { b"FALSE" };
    w.write_all(s)
}

pub fn write_char<W: Write>(w: &mut W, x: i32) -> io::Result<()> {
    w.write_all(&[(x & 0xFF) as u8])
}

pub fn write_hex<W: Write>(w: &mut W, x: i32, case: HexCase) -> io::Result<()> {
    let u = x as u32;
    match case {
        HexCase::Upper => write!(w, "{u:08X}"),
        HexCase::Lower => write!(w, "{u:08x}"),
    }
}

pub fn write_newline<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\n")
}

pub fn write_str<W: Write>(w: &mut W, s: &[u8]) -> io::Result<()> {
    w.write_all(s)
}

/// `nan`, `inf`, `-inf`, or fixed notation with four fractional digits.
pub fn write_f32_bits<W: Write>(w: &mut W, bits: i32) -> io::Result<()> {
    let u = bits as u32;
    if fbits::is_nan_u32(u) {
        return w.write_all(b"nan");
    }
    if fbits::is_inf_u32(u) {
        let s: &[u8] = if u >> 31 != 0 { b"-inf" } else { b"inf" };
        return w.write_all(s);
    }
    write!(w, "{:.4}", fbits::decode(bits))
}
