//! Whitespace-delimited token reader with one byte of pushback.

use std::io::BufRead;

use kp_contracts::TOKEN_CAP;

/// C-locale `isspace`: includes vertical tab, which `u8::is_ascii_whitespace` does not.
#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// One input token, held in a fixed buffer. Bytes past `TOKEN_CAP - 1` are dropped.
#[derive(Clone)]
pub struct Token {
    buf: [u8; TOKEN_CAP],
    len: usize,
    truncated: bool,
}

impl Token {
    fn empty() -> Self {
        Token {
            buf: [0; TOKEN_CAP],
            len: 0,
            truncated: false,
        }
    }

    fn push(&mut self, b: u8) {
        if self.len + 1 < TOKEN_CAP {
            self.buf[self.len] = b;
            self.len += 1;
        } else {
            self.truncated = true;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("text", &String::from_utf8_lossy(self.as_bytes()))
            .field("truncated", &self.truncated)
            .finish()
    }
}

pub struct TokenReader<R> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(inner: R) -> Self {
        TokenReader {
            inner,
            pushback: None,
        }
    }

    /// Next byte, or `None` at end of input. Host read errors are reported once and then
    /// treated as end of input.
    pub fn getc(&mut self) -> Option<u8> {
        if let Some(b) = self.pushback.take() {
            return Some(b);
        }
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => {
                    let b = *buf.first()?;
                    self.inner.consume(1);
                    return Some(b);
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "input read failed; treating as end of input");
                    return None;
                }
            }
        }
    }

    pub fn ungetc(&mut self, b: u8) {
        self.pushback = Some(b);
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let mut c = loop {
            let b = self.getc()?;
            if !is_space(b) {
                break b;
            }
        };

        let mut tok = Token::empty();
        loop {
            tok.push(c);
            match self.getc() {
                Some(b) if is_space(b) => {
                    self.ungetc(b);
                    break;
                }
                Some(b) => c = b,
                None => break,
            }
        }
        if tok.was_truncated() {
            tracing::debug!(kept = tok.len(), "input token truncated");
        }
        Some(tok)
    }

    /// Skips whitespace and reports whether a token byte follows. The byte stays buffered.
    pub fn has_token(&mut self) -> bool {
        loop {
            match self.getc() {
                Some(b) if is_space(b) => continue,
                Some(b) => {
                    self.ungetc(b);
                    return true;
                }
                None => return false,
            }
        }
    }

    /// Consumes through the next newline (inclusive) or end of input.
    pub fn skip_line(&mut self) {
        while let Some(b) = self.getc() {
            if b == b'\n' {
                break;
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// `strtol(tok, &end, 10)` with the whole token required to be consumed. The value saturates
/// at the `i64` range (a 64-bit C `long`) and is then narrowed with two's-complement
/// truncation, as the C cast does.
pub fn parse_i32_token(tok: &[u8]) -> Option<i32> {
    let (neg, digits) = match tok.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, tok),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut acc: i64 = 0;
    for &d in digits {
        let d = i64::from(d - b'0');
        acc = if neg {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        };
    }
    Some(acc as i32)
}

/// `strtof` over a whole token. Accepts decimal literals plus `inf`, `infinity` and `nan`
/// in any case, with an optional sign.
pub fn parse_f32_token(tok: &[u8]) -> Option<f32> {
    let (neg, rest) = match tok.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, tok),
    };
    if rest.is_empty() {
        return None;
    }

    let special = if rest.eq_ignore_ascii_case(b"nan") {
        Some(f32::NAN)
    } else if rest.eq_ignore_ascii_case(b"inf") || rest.eq_ignore_ascii_case(b"infinity") {
        Some(f32::INFINITY)
    } else {
        None
    };
    if let Some(v) = special {
        return Some(if neg { -v } else { v });
    }

    // Only the unsigned tail goes to lexical so that "+-1" and "--1" stay invalid.
    if !matches!(rest.first(), Some(b'0'..=b'9' | b'.')) {
        return None;
    }
    let (value, used) = lexical_core::parse_partial::<f32>(rest).ok()?;
    if used != rest.len() {
        return None;
    }
    Some(if neg { -value } else { value })
}
