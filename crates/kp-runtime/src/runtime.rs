use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use kp_contracts::FORTH_FALSE;
use kp_profiles::{ProfileCaps, ProfileId};

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::fbits::{self, forth_bool};
use crate::heap::Watermark;
use crate::input::{self, Token, TokenReader};
use crate::mem::CellStore;
use crate::output;

/// Runtime bound to the process's standard streams. No `StdinLock` is held between reads.
pub type StdRuntime = Runtime<BufReader<Stdin>, Stdout>;

/// All mutable state a generated program touches: the cell store, the heap watermark and the
/// input pushback byte, plus the streams they read from and write to.
///
/// Every runtime is independent; nothing is shared between two instances.
pub struct Runtime<R, W> {
    cells: CellStore,
    heap: Watermark,
    input: TokenReader<R>,
    out: W,
    profile: ProfileId,
    caps: ProfileCaps,
}

impl StdRuntime {
    pub fn stdio(config: &RuntimeConfig) -> Self {
        Runtime::new(BufReader::new(std::io::stdin()), std::io::stdout(), config)
    }
}

impl<R: BufRead, W: Write> Runtime<R, W> {
    pub fn new(input: R, out: W, config: &RuntimeConfig) -> Self {
        tracing::debug!(profile = %config.profile, "runtime created");
        Runtime {
            cells: CellStore::new(),
            heap: Watermark::new(),
            input: TokenReader::new(input),
            out,
            profile: config.profile,
            caps: config.caps(),
        }
    }

    pub fn with_profile(input: R, out: W, profile: ProfileId) -> Self {
        Self::new(input, out, &RuntimeConfig::for_profile(profile))
    }

    pub fn profile(&self) -> ProfileId {
        self.profile
    }

    pub fn caps(&self) -> ProfileCaps {
        self.caps
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    // --- memory ---

    pub fn var_get(&self, addr: i32) -> i32 {
        self.cells.get(addr)
    }

    pub fn var_set(&mut self, value: i32, addr: i32) {
        self.cells.set(addr, value);
    }

    pub fn field_get(&self, obj: i32, off: i32) -> i32 {
        self.cells.field_get(obj, off)
    }

    pub fn field_set(&mut self, value: i32, obj: i32, off: i32) {
        self.cells.field_set(value, obj, off);
    }

    pub fn heap_reset(&mut self, base: i32) {
        self.heap.reset(base);
    }

    pub fn here(&self) -> i32 {
        self.heap.here()
    }

    pub fn allot(&mut self, n: i32) {
        self.heap.allot(n);
    }

    /// Canonical boolean: any nonzero value becomes -1.
    pub fn to_bool(&self, x: i32) -> i32 {
        forth_bool(x != 0)
    }

    // --- output ---

    pub fn write_i32(&mut self, x: i32) -> Result<()> {
        Ok(output::write_i32(&mut self.out, x)?)
    }

    pub fn write_bool(&mut self, x: i32) -> Result<()> {
        Ok(output::write_bool(&mut self.out, x, self.caps.bool_convention)?)
    }

    pub fn write_char(&mut self, x: i32) -> Result<()> {
        Ok(output::write_char(&mut self.out, x)?)
    }

    pub fn write_hex(&mut self, x: i32) -> Result<()> {
        Ok(output::write_hex(&mut self.out, x, self.caps.hex_case)?)
    }

    pub fn write_newline(&mut self) -> Result<()> {
        Ok(output::write_newline(&mut self.out)?)
    }

    pub fn write_str(&mut self, s: &[u8]) -> Result<()> {
        Ok(output::write_str(&mut self.out, s)?)
    }

    pub fn write_f32_bits(&mut self, bits: i32) -> Result<()> {
        Ok(output::write_f32_bits(&mut self.out, bits)?)
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }

    // --- input ---

    /// Next whitespace-delimited token; `None` only at end of input with nothing read.
    pub fn next_token(&mut self) -> Option<Token> {
        self.input.next_token()
    }

    pub fn read_i32(&mut self) -> i32 {
        self.next_token()
            .and_then(|tok| input::parse_i32_token(tok.as_bytes()))
            .unwrap_or(0)
    }

    pub fn read_bool(&mut self) -> i32 {
        let x = self.read_i32();
        self.to_bool(x)
    }

    /// A single-byte token yields that byte; anything longer is read as a decimal code.
    pub fn read_char(&mut self) -> i32 {
        let Some(tok) = self.next_token() else {
            return 0;
        };
        match tok.as_bytes() {
            [b] => i32::from(*b),
            bytes => input::parse_i32_token(bytes).unwrap_or(0),
        }
    }

    pub fn read_f32_bits(&mut self) -> i32 {
        self.next_token()
            .and_then(|tok| input::parse_f32_token(tok.as_bytes()))
            .map(fbits::encode)
            .unwrap_or(0)
    }

    pub fn skip_line(&mut self) {
        self.input.skip_line();
    }

    /// -1 if another token is available, 0 at end of input.
    pub fn has_more_input(&mut self) -> i32 {
        if self.input.has_token() {
            forth_bool(true)
        } else {
            FORTH_FALSE
        }
    }

    // --- lifecycle ---

    /// Flushes and hands back the streams. The runtime's state is dropped.
    pub fn finish(mut self) -> Result<(R, W)> {
        self.flush()?;
        tracing::debug!(profile = %self.profile, here = self.heap.here(), "runtime finished");
        Ok((self.input.into_inner(), self.out))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    type MemRuntime = Runtime<Cursor<Vec<u8>>, Vec<u8>>;

    fn rt(input: &str) -> MemRuntime {
        Runtime::with_profile(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            ProfileId::Kforth,
        )
    }

    #[test]
    fn read_char_prefers_single_bytes() {
        let mut r = rt("A 65 7 xy");
        assert_eq!(r.read_char(), 65);
        assert_eq!(r.read_char(), 65);
        // "7" is one byte long, so it is the character '7', not code 7.
        assert_eq!(r.read_char(), i32::from(b'7'));
        assert_eq!(r.read_char(), 0);
        assert_eq!(r.read_char(), 0);
    }

    #[test]
    fn read_char_returns_unsigned_bytes() {
        let mut r = Runtime::with_profile(Cursor::new(vec![0xE9u8]), Vec::new(), ProfileId::Kforth);
        assert_eq!(r.read_char(), 0xE9);
    }

    #[test]
    fn read_bool_normalizes() {
        let mut r = rt("5 0 -1 junk");
        assert_eq!(r.read_bool(), -1);
        assert_eq!(r.read_bool(), 0);
        assert_eq!(r.read_bool(), -1);
        assert_eq!(r.read_bool(), 0);
    }

    #[test]
    fn read_f32_bits_falls_back_to_zero() {
        let mut r = rt("2.5 nope");
        assert_eq!(r.read_f32_bits(), 2.5f32.to_bits() as i32);
        assert_eq!(r.read_f32_bits(), 0);
        assert_eq!(r.read_f32_bits(), 0);
    }

    #[test]
    fn finish_flushes_and_returns_output() {
        let mut r = rt("");
        r.write_i32(12).unwrap();
        r.write_newline().unwrap();
        let (_, out) = r.finish().unwrap();
        assert_eq!(out, b"12\n");
    }
}
