use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use kp_contracts::{FIX_SCALE, KP_RT_CALL_REPORT_SCHEMA_VERSION};
use kp_profiles::ProfileId;
use kp_runtime::input::parse_f32_token;
use kp_runtime::{fbits, lookup, output, Arg, PrimitiveSpec, Runtime, RuntimeConfig, ValueKind};
use serde::Serialize;

use crate::ConfigArgs;

#[derive(clap::Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Capture program output and print a JSON report instead.
    #[arg(long)]
    report: bool,

    /// C symbol (`fadd_bits`) or source word (`F+`).
    primitive: String,

    /// Arguments: decimal or `0x` hex integers, `f:<float>` for a float's bit pattern, or raw
    /// text for string parameters. Options may follow them; put text starting with `-` after
    /// `--`.
    #[arg(allow_negative_numbers = true)]
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CallReport {
    schema_version: &'static str,
    profile: ProfileId,
    primitive: &'static str,
    word: &'static str,
    args: Vec<serde_json::Value>,
    result: Option<i32>,
    /// `result` rendered according to the primitive's return kind.
    result_text: Option<String>,
    stdout: String,
}

#[derive(Debug)]
enum ParsedArg {
    Int(i32),
    Text(String),
}

impl ParsedArg {
    fn as_arg(&self) -> Arg<'_> {
        match self {
            ParsedArg::Int(x) => Arg::Int(*x),
            ParsedArg::Text(s) => Arg::Bytes(s.as_bytes()),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ParsedArg::Int(x) => serde_json::Value::from(*x),
            ParsedArg::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

fn parse_int_arg(raw: &str) -> Result<i32> {
    let raw = raw.trim();
    if let Some(float) = raw.strip_prefix("f:") {
        let x = parse_f32_token(float.as_bytes())
            .with_context(|| format!("invalid float literal {float:?}"))?;
        return Ok(fbits::encode(x));
    }
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let u = u32::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex literal {raw:?}"))?;
        return Ok(u as i32);
    }
    raw.parse::<i32>()
        .with_context(|| format!("invalid integer {raw:?}"))
}

fn parse_args(spec: &PrimitiveSpec, raw: &[String]) -> Result<Vec<ParsedArg>> {
    if raw.len() != spec.params.len() {
        anyhow::bail!(
            "{} takes {} argument(s) ({}), got {}",
            spec.symbol,
            spec.params.len(),
            spec.params
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            raw.len()
        );
    }
    spec.params
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(i, (kind, raw))| match kind {
            ValueKind::Str => Ok(ParsedArg::Text(raw.clone())),
            _ => parse_int_arg(raw)
                .map(ParsedArg::Int)
                .with_context(|| format!("{}: argument {i}", spec.symbol)),
        })
        .collect()
}

fn render_fixed(v: i32) -> String {
    let v = i64::from(v);
    let scale = i64::from(FIX_SCALE);
    let sign = if v < 0 { "-" } else { "" };
    format!("{sign}{}.{:04}", v.abs() / scale, v.abs() % scale)
}

fn render_result(kind: Option<ValueKind>, result: Option<i32>) -> Result<Option<String>> {
    let (Some(kind), Some(v)) = (kind, result) else {
        return Ok(None);
    };
    let text = match kind {
        ValueKind::F32Bits => {
            let mut buf = Vec::new();
            output::write_f32_bits(&mut buf, v)?;
            String::from_utf8_lossy(&buf).into_owned()
        }
        ValueKind::Fixed => render_fixed(v),
        ValueKind::I32 | ValueKind::Str => v.to_string(),
    };
    Ok(Some(text))
}

fn invoke<R: BufRead, W: Write>(
    spec: &PrimitiveSpec,
    args: &[ParsedArg],
    input: R,
    out: W,
    config: &RuntimeConfig,
) -> Result<(Option<i32>, W)> {
    let mut rt = Runtime::new(input, out, config);
    let args: Vec<Arg<'_>> = args.iter().map(ParsedArg::as_arg).collect();
    let result = rt.invoke(spec.prim, &args)?;
    let (_, out) = rt.finish().context("flush runtime output")?;
    Ok((result, out))
}

pub fn run(args: CallArgs) -> Result<ExitCode> {
    let config = args.config.resolve()?;
    let spec = lookup(&args.primitive)
        .with_context(|| format!("unknown primitive {:?}", args.primitive))?;
    let parsed = parse_args(spec, &args.args)?;
    tracing::debug!(primitive = spec.symbol, profile = %config.profile, "calling primitive");

    let stdin = std::io::stdin().lock();
    if args.report {
        let (result, captured) = invoke(spec, &parsed, stdin, Vec::new(), &config)?;
        let report = CallReport {
            schema_version: KP_RT_CALL_REPORT_SCHEMA_VERSION,
            profile: config.profile,
            primitive: spec.symbol,
            word: spec.word,
            args: parsed.iter().map(ParsedArg::to_json).collect(),
            result,
            result_text: render_result(spec.ret, result)?,
            stdout: String::from_utf8_lossy(&captured).into_owned(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        let (result, _) = invoke(spec, &parsed, stdin, std::io::stdout(), &config)?;
        if let Some(v) = result {
            println!("{v}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_argument_forms() {
        assert_eq!(parse_int_arg("42").unwrap(), 42);
        assert_eq!(parse_int_arg("-7").unwrap(), -7);
        assert_eq!(parse_int_arg("0xFF").unwrap(), 255);
        assert_eq!(parse_int_arg("0xffffffff").unwrap(), -1);
        assert_eq!(parse_int_arg("f:1.5").unwrap(), 1.5f32.to_bits() as i32);
        assert!(parse_int_arg("f:abc").is_err());
        assert!(parse_int_arg("12abc").is_err());
    }

    #[test]
    fn argument_count_is_checked() {
        let spec = lookup("fadd_bits").unwrap();
        let err = parse_args(spec, &["1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("takes 2 argument(s)"), "{err}");
    }

    #[test]
    fn string_parameters_stay_raw() {
        let spec = lookup("pwrite_str").unwrap();
        let parsed = parse_args(spec, &["-5 words".to_string()]).unwrap();
        assert!(matches!(&parsed[0], ParsedArg::Text(s) if s == "-5 words"));
    }

    #[test]
    fn fixed_results_render_with_four_decimals() {
        assert_eq!(render_fixed(10_000), "1.0000");
        assert_eq!(render_fixed(-5_000), "-0.5000");
        assert_eq!(render_fixed(23_026), "2.3026");
        assert_eq!(render_fixed(i32::MIN), "-214748.3648");
    }

    #[test]
    fn results_render_by_kind() {
        let bits = 3.75f32.to_bits() as i32;
        assert_eq!(
            render_result(Some(ValueKind::F32Bits), Some(bits)).unwrap(),
            Some("3.7500".to_string())
        );
        assert_eq!(render_result(None, None).unwrap(), None);
        assert_eq!(
            render_result(Some(ValueKind::I32), Some(-3)).unwrap(),
            Some("-3".to_string())
        );
    }
}
