//! Primitive registry: one descriptor per runtime entry point.
//!
//! The table is the single list the C ABI, the CLI and the front-end declarations are checked
//! against. `Runtime::invoke` dispatches through it for callers that pick primitives at run
//! time.

use std::fmt;
use std::io::{BufRead, Write};

use serde::Serialize;

use crate::error::{Result, RuntimeError};
use crate::runtime::Runtime;
use crate::{fbits, fixed};

use self::ValueKind::{F32Bits as F, Fixed as X, Str as S, I32 as I};

/// Conceptual type of a value crossing the boundary. Everything except `Str` is an `i32` slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    I32,
    /// IEEE-754 single precision bit pattern.
    F32Bits,
    /// Scaled integer, real value * 10000.
    Fixed,
    /// NUL-terminated byte string (a pointer at the C ABI).
    Str,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::I32 => "i32",
            ValueKind::F32Bits => "f32-bits",
            ValueKind::Fixed => "fixed",
            ValueKind::Str => "str",
        }
    }

    pub fn llvm_type(self) -> &'static str {
        match self {
            ValueKind::Str => "i8*",
            _ => "i32",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    WriteI32,
    WriteBool,
    WriteChar,
    WriteHex,
    WriteLn,
    WriteStr,
    WriteF32,
    ReadI32,
    ReadBool,
    ReadChar,
    ReadF32,
    ReadLn,
    ReadMore,
    VarGet,
    VarSet,
    FieldGet,
    FieldSet,
    Bool,
    HeapReset,
    Here,
    Allot,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FNegate,
    FAbs,
    FEq,
    FLt,
    FLe,
    FZero,
    FInf,
    FNan,
    FFinite,
    SToF,
    FToS,
    Q16ToF,
    FToQ16,
    FRound,
    MathAbs,
    MathSqrt,
    MathSin,
    MathCos,
    MathPow,
    MathFloor,
    MathCeil,
    FxSqrt,
    FxSin,
    FxCos,
    FxTan,
    FxAsin,
    FxAcos,
    FxAtan,
    FxLn,
    FxLog,
}

#[derive(Debug, Serialize)]
pub struct PrimitiveSpec {
    #[serde(skip)]
    pub prim: Primitive,
    /// Exported C symbol.
    pub symbol: &'static str,
    /// Source-level word the front-end maps to `symbol`.
    pub word: &'static str,
    pub params: &'static [ValueKind],
    pub ret: Option<ValueKind>,
}

impl PrimitiveSpec {
    /// `declare` line for an LLVM IR module calling this primitive.
    pub fn llvm_declare(&self) -> String {
        let ret = self.ret.map(ValueKind::llvm_type).unwrap_or("void");
        let params: Vec<&str> = self.params.iter().map(|k| k.llvm_type()).collect();
        format!("declare {ret} @{}({})", self.symbol, params.join(", "))
    }
}

const fn spec(
    prim: Primitive,
    symbol: &'static str,
    word: &'static str,
    params: &'static [ValueKind],
    ret: Option<ValueKind>,
) -> PrimitiveSpec {
    PrimitiveSpec {
        prim,
        symbol,
        word,
        params,
        ret,
    }
}

pub const PRIMITIVES: &[PrimitiveSpec] = &[
    spec(Primitive::WriteI32, "pwrite_i32", "PWRITE-I32", &[I], None),
    spec(Primitive::WriteBool, "pwrite_bool", "PWRITE-BOOL", &[I], None),
    spec(Primitive::WriteChar, "pwrite_char", "PWRITE-CHAR", &[I], None),
    spec(Primitive::WriteHex, "pwrite_hex", "PWRITE-HEX", &[I], None),
    spec(Primitive::WriteLn, "pwriteln", "PWRITELN", &[], None),
    spec(Primitive::WriteStr, "pwrite_str", "PWRITE-STR", &[S], None),
    spec(Primitive::WriteF32, "pwrite_f32_bits", "PWRITE-F", &[F], None),
    spec(Primitive::ReadI32, "pread_i32", "PREAD-I32", &[], Some(I)),
    spec(Primitive::ReadBool, "pread_bool", "PREAD-BOOL", &[], Some(I)),
    spec(Primitive::ReadChar, "pread_char", "PREAD-CHAR", &[], Some(I)),
    spec(Primitive::ReadF32, "pread_f32_bits", "PREAD-F", &[], Some(F)),
    spec(Primitive::ReadLn, "preadln", "PREADLN", &[], None),
    spec(Primitive::ReadMore, "pread_more", "PREAD-MORE", &[], Some(I)),
    spec(Primitive::VarGet, "pvar_get", "PVAR@", &[I], Some(I)),
    spec(Primitive::VarSet, "pvar_set", "PVAR!", &[I, I], None),
    spec(Primitive::FieldGet, "pfield_get", "PFIELD@", &[I, I], Some(I)),
    spec(Primitive::FieldSet, "pfield_set", "PFIELD!", &[I, I, I], None),
    spec(Primitive::Bool, "pbool", "PBOOL", &[I], Some(I)),
    spec(Primitive::HeapReset, "rt_heap_reset", "HEAP-RESET", &[I], None),
    spec(Primitive::Here, "rt_here", "HERE", &[], Some(I)),
    spec(Primitive::Allot, "rt_allot", "ALLOT", &[I], None),
    spec(Primitive::FAdd, "fadd_bits", "F+", &[F, F], Some(F)),
    spec(Primitive::FSub, "fsub_bits", "F-", &[F, F], Some(F)),
    spec(Primitive::FMul, "fmul_bits", "F*", &[F, F], Some(F)),
    spec(Primitive::FDiv, "fdiv_bits", "F/", &[F, F], Some(F)),
    spec(Primitive::FNegate, "fnegate_bits", "FNEGATE", &[F], Some(F)),
    spec(Primitive::FAbs, "fabs_bits", "FABS", &[F], Some(F)),
    spec(Primitive::FEq, "feq_bits", "F=", &[F, F], Some(I)),
    spec(Primitive::FLt, "flt_bits", "F<", &[F, F], Some(I)),
    spec(Primitive::FLe, "fle_bits", "F<=", &[F, F], Some(I)),
    spec(Primitive::FZero, "fzero_bits", "F0=", &[F], Some(I)),
    spec(Primitive::FInf, "finf_bits", "FINF?", &[F], Some(I)),
    spec(Primitive::FNan, "fnan_bits", "FNAN?", &[F], Some(I)),
    spec(Primitive::FFinite, "ffinite_bits", "FFINITE?", &[F], Some(I)),
    spec(Primitive::SToF, "s_to_f_bits", "S>F", &[I], Some(F)),
    spec(Primitive::FToS, "f_bits_to_s", "F>S", &[F], Some(I)),
    spec(Primitive::Q16ToF, "q16_16_to_f_bits", "Q>F", &[I], Some(F)),
    spec(Primitive::FToQ16, "f_bits_to_q16_16", "F>Q", &[F], Some(I)),
    spec(Primitive::FRound, "fround_i32_bits", "FROUND", &[F], Some(I)),
    spec(Primitive::MathAbs, "kp_fabs_f32_bits", "KP-FABS", &[F], Some(F)),
    spec(Primitive::MathSqrt, "kp_fsqrt_f32_bits", "FSQRT", &[F], Some(F)),
    spec(Primitive::MathSin, "kp_fsin_f32_bits", "FSIN", &[F], Some(F)),
    spec(Primitive::MathCos, "kp_fcos_f32_bits", "FCOS", &[F], Some(F)),
    spec(Primitive::MathPow, "kp_fpow_f32_i32_bits", "F**", &[F, I], Some(F)),
    spec(Primitive::MathFloor, "kp_ffloor_f32_bits", "FFLOOR", &[F], Some(F)),
    spec(Primitive::MathCeil, "kp_fceil_f32_bits", "FCEIL", &[F], Some(F)),
    spec(Primitive::FxSqrt, "kp_fx_sqrt_i32", "FX-SQRT", &[I], Some(I)),
    spec(Primitive::FxSin, "kp_fx_sin_deg_i32", "FX-SIN", &[I], Some(X)),
    spec(Primitive::FxCos, "kp_fx_cos_deg_i32", "FX-COS", &[I], Some(X)),
    spec(Primitive::FxTan, "kp_fx_tan_deg_i32", "FX-TAN", &[I], Some(X)),
    spec(Primitive::FxAsin, "kp_fx_asin_fixed_i32", "FX-ASIN", &[X], Some(I)),
    spec(Primitive::FxAcos, "kp_fx_acos_fixed_i32", "FX-ACOS", &[X], Some(I)),
    spec(Primitive::FxAtan, "kp_fx_atan_fixed_i32", "FX-ATAN", &[X], Some(I)),
    spec(Primitive::FxLn, "kp_fx_ln_i32", "FX-LN", &[I], Some(X)),
    spec(Primitive::FxLog, "kp_fx_log_i32", "FX-LOG", &[I], Some(X)),
];

/// Lifecycle entry points exported next to the primitives; not callable through `invoke`.
pub const LIFECYCLE_DECLARES: &[&str] = &[
    "declare i32 @kp_rt_init(i32)",
    "declare void @kp_rt_teardown()",
];

/// Looks a primitive up by C symbol (exact) or source word (ASCII case-insensitive).
pub fn lookup(name: &str) -> Option<&'static PrimitiveSpec> {
    let name = name.trim();
    PRIMITIVES
        .iter()
        .find(|p| p.symbol == name || p.word.eq_ignore_ascii_case(name))
}

impl Primitive {
    pub fn spec(self) -> &'static PrimitiveSpec {
        // The table has exactly one row per variant; see `every_variant_has_one_row`.
        match PRIMITIVES.iter().find(|p| p.prim == self) {
            Some(spec) => spec,
            None => unreachable!("primitive {self:?} missing from PRIMITIVES"),
        }
    }
}

/// One argument to `Runtime::invoke`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arg<'a> {
    Int(i32),
    Bytes(&'a [u8]),
}

impl<R: BufRead, W: Write> Runtime<R, W> {
    /// Runs `prim` with `args`, checking arity and argument kinds against the registry.
    /// Returns the primitive's result, or `None` for primitives without one.
    pub fn invoke(&mut self, prim: Primitive, args: &[Arg<'_>]) -> Result<Option<i32>> {
        let spec = prim.spec();
        if args.len() != spec.params.len() {
            return Err(RuntimeError::Arity {
                symbol: spec.symbol,
                expected: spec.params.len(),
                got: args.len(),
            });
        }
        let int = |index: usize| -> Result<i32> {
            match args[index] {
                Arg::Int(x) => Ok(x),
                Arg::Bytes(_) => Err(RuntimeError::ArgKind {
                    symbol: spec.symbol,
                    index,
                    expected: spec.params[index],
                }),
            }
        };

        use Primitive as P;
        let ret = match prim {
            P::WriteI32 => return self.write_i32(int(0)?).map(|()| None),
            P::WriteBool => return self.write_bool(int(0)?).map(|()| None),
            P::WriteChar => return self.write_char(int(0)?).map(|()| None),
            P::WriteHex => return self.write_hex(int(0)?).map(|()| None),
            P::WriteLn => return self.write_newline().map(|()| None),
            P::WriteStr => {
                let Arg::Bytes(s) = args[0] else {
                    return Err(RuntimeError::ArgKind {
                        symbol: spec.symbol,
                        index: 0,
                        expected: ValueKind::Str,
                    });
                };
                return self.write_str(s).map(|()| None);
            }
            P::WriteF32 => return self.write_f32_bits(int(0)?).map(|()| None),
            P::ReadI32 => self.read_i32(),
            P::ReadBool => self.read_bool(),
            P::ReadChar => self.read_char(),
            P::ReadF32 => self.read_f32_bits(),
            P::ReadLn => {
                self.skip_line();
                return Ok(None);
            }
            P::ReadMore => self.has_more_input(),
            P::VarGet => self.var_get(int(0)?),
            P::VarSet => {
                self.var_set(int(0)?, int(1)?);
                return Ok(None);
            }
            P::FieldGet => self.field_get(int(0)?, int(1)?),
            P::FieldSet => {
                self.field_set(int(0)?, int(1)?, int(2)?);
                return Ok(None);
            }
            P::Bool => self.to_bool(int(0)?),
            P::HeapReset => {
                self.heap_reset(int(0)?);
                return Ok(None);
            }
            P::Here => self.here(),
            P::Allot => {
                self.allot(int(0)?);
                return Ok(None);
            }
            P::FAdd => fbits::add(int(0)?, int(1)?),
            P::FSub => fbits::sub(int(0)?, int(1)?),
            P::FMul => fbits::mul(int(0)?, int(1)?),
            P::FDiv => fbits::div(int(0)?, int(1)?),
            P::FNegate => fbits::negate(int(0)?),
            P::FAbs => fbits::abs(int(0)?),
            P::FEq => fbits::eq(int(0)?, int(1)?),
            P::FLt => fbits::lt(int(0)?, int(1)?),
            P::FLe => fbits::le(int(0)?, int(1)?),
            P::FZero => fbits::is_zero(int(0)?),
            P::FInf => fbits::is_inf(int(0)?),
            P::FNan => fbits::is_nan(int(0)?),
            P::FFinite => fbits::is_finite(int(0)?),
            P::SToF => fbits::from_int(int(0)?),
            P::FToS => fbits::to_int(int(0)?),
            P::Q16ToF => fbits::from_q16_16(int(0)?),
            P::FToQ16 => fbits::to_q16_16(int(0)?),
            P::FRound => fbits::round(int(0)?),
            P::MathAbs => fbits::fabs(int(0)?),
            P::MathSqrt => fbits::sqrt(int(0)?),
            P::MathSin => fbits::sin(int(0)?),
            P::MathCos => fbits::cos(int(0)?),
            P::MathPow => fbits::pow_i32(int(0)?, int(1)?),
            P::MathFloor => fbits::floor(int(0)?),
            P::MathCeil => fbits::ceil(int(0)?),
            P::FxSqrt => fixed::isqrt(int(0)?),
            P::FxSin => fixed::sin_deg(int(0)?),
            P::FxCos => fixed::cos_deg(int(0)?),
            P::FxTan => fixed::tan_deg(int(0)?),
            P::FxAsin => fixed::asin_fixed(int(0)?),
            P::FxAcos => fixed::acos_fixed(int(0)?),
            P::FxAtan => fixed::atan_fixed(int(0)?),
            P::FxLn => fixed::ln(int(0)?),
            P::FxLog => fixed::log10(int(0)?),
        };
        Ok(Some(ret))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Cursor;

    use kp_profiles::ProfileId;

    use super::*;

    fn rt(input: &str) -> Runtime<Cursor<Vec<u8>>, Vec<u8>> {
        Runtime::with_profile(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            ProfileId::Kforth,
        )
    }

    #[test]
    fn every_variant_has_one_row() {
        let mut seen = HashSet::new();
        for p in PRIMITIVES {
            assert!(seen.insert(p.prim), "duplicate row for {:?}", p.prim);
            assert_eq!(p.prim.spec().symbol, p.symbol);
        }
        assert_eq!(seen.len(), PRIMITIVES.len());
    }

    #[test]
    fn symbols_and_words_are_unique() {
        let symbols: HashSet<_> = PRIMITIVES.iter().map(|p| p.symbol).collect();
        let words: HashSet<_> = PRIMITIVES.iter().map(|p| p.word).collect();
        assert_eq!(symbols.len(), PRIMITIVES.len());
        assert_eq!(words.len(), PRIMITIVES.len());
    }

    #[test]
    fn lookup_by_symbol_or_word() {
        assert_eq!(lookup("pvar_get").unwrap().prim, Primitive::VarGet);
        assert_eq!(lookup("PVAR@").unwrap().prim, Primitive::VarGet);
        assert_eq!(lookup("pwrite-i32").unwrap().prim, Primitive::WriteI32);
        assert_eq!(lookup("f+").unwrap().prim, Primitive::FAdd);
        assert!(lookup("PVAR_GET").is_none());
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn llvm_declarations() {
        assert_eq!(
            Primitive::WriteStr.spec().llvm_declare(),
            "declare void @pwrite_str(i8*)"
        );
        assert_eq!(
            Primitive::FieldSet.spec().llvm_declare(),
            "declare void @pfield_set(i32, i32, i32)"
        );
        assert_eq!(Primitive::ReadI32.spec().llvm_declare(), "declare i32 @pread_i32()");
    }

    #[test]
    fn invoke_dispatches() {
        let mut r = rt("17");
        assert_eq!(r.invoke(Primitive::ReadI32, &[]).unwrap(), Some(17));
        assert_eq!(r.invoke(Primitive::VarSet, &[Arg::Int(9), Arg::Int(40)]).unwrap(), None);
        assert_eq!(r.invoke(Primitive::VarGet, &[Arg::Int(40)]).unwrap(), Some(9));
        assert_eq!(
            r.invoke(Primitive::FxCos, &[Arg::Int(0)]).unwrap(),
            Some(10_000)
        );
        r.invoke(Primitive::WriteStr, &[Arg::Bytes(b"ok")]).unwrap();
        r.invoke(Primitive::WriteHex, &[Arg::Int(171)]).unwrap();
        assert_eq!(r.output().as_slice(), b"ok000000AB");
    }

    #[test]
    fn invoke_checks_arity_and_kinds() {
        let mut r = rt("");
        let err = r.invoke(Primitive::FAdd, &[Arg::Int(1)]).unwrap_err();
        assert!(matches!(err, RuntimeError::Arity { expected: 2, got: 1, .. }), "{err}");

        let err = r.invoke(Primitive::WriteStr, &[Arg::Int(1)]).unwrap_err();
        assert!(matches!(err, RuntimeError::ArgKind { index: 0, .. }), "{err}");

        let err = r.invoke(Primitive::WriteI32, &[Arg::Bytes(b"1")]).unwrap_err();
        assert_eq!(err.to_string(), "pwrite_i32: argument 0 must be i32");
    }
}
