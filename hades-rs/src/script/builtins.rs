//! Native function libraries.
//!
//! Each library is a static table of [`NativeDef`]s registered under its
//! namespace (`math:sqrt`, `string:split`, `array:join`, …).  Native
//! functions receive exactly one argument per declared parameter; missing
//! arguments have already been replaced by defaults (or Null) by the caller.

use crate::diag::ScriptError;

use super::value::{Collection, Value};

/// Default parameter value in a static table.
#[derive(Debug, Clone, Copy)]
pub enum Literal {
    Number(f64),
    Bool(bool),
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        match lit {
            Literal::Number(n) => Value::Number(n),
            Literal::Bool(b) => Value::Bool(b),
        }
    }
}

/// One entry of a native library table.
#[derive(Debug, Clone, Copy)]
pub struct NativeDef {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub defaults: &'static [(&'static str, Literal)],
    pub func: fn(&[Value]) -> Result<Value, ScriptError>,
}

/// Look up a bundled library by name.
pub fn library(name: &str) -> Option<&'static [NativeDef]> {
    match name {
        "math" => Some(MATH),
        "string" => Some(STRING),
        "array" => Some(ARRAY),
        _ => None,
    }
}

// ── Argument helpers ──────────────────────────────────────────────────────────

static NULL: Value = Value::Null;

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&NULL)
}

fn num(args: &[Value], i: usize) -> f64 {
    arg(args, i).as_number()
}

fn int(args: &[Value], i: usize) -> i64 {
    num(args, i).trunc() as i64
}

fn text(args: &[Value], i: usize) -> String {
    arg(args, i).as_str()
}

fn collection<'a>(
    args: &'a [Value],
    i: usize,
    function: &'static str,
) -> Result<&'a Collection, ScriptError> {
    match arg(args, i) {
        Value::Collection(c) => Ok(c),
        other => Err(ScriptError::BadArgument {
            function,
            message: format!("expected a collection, got {}", other.type_name()),
        }),
    }
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> Result<Value, ScriptError> {
    Ok(Value::Number(f(num(args, 0))))
}

/// Resolve a substr-style `(offset, length)` against `len` items.
///
/// Negative offsets count from the end; a length of 0 means "to the end",
/// a negative length stops that many items before the end.
fn span(len: usize, offset: i64, length: i64) -> (usize, usize) {
    let len = len as i64;
    let start = if offset < 0 { len.saturating_add(offset).max(0) } else { offset.min(len) };
    let end = match length {
        0 => len,
        l if l < 0 => len.saturating_add(l).max(start),
        l => start.saturating_add(l).min(len),
    };
    (start as usize, end as usize)
}

// ── math ──────────────────────────────────────────────────────────────────────

const ARG: &[&str] = &["arg"];

pub static MATH: &[NativeDef] = &[
    NativeDef { name: "sin", params: ARG, defaults: &[], func: |a| unary(a, f64::sin) },
    NativeDef { name: "sinh", params: ARG, defaults: &[], func: |a| unary(a, f64::sinh) },
    NativeDef { name: "asin", params: ARG, defaults: &[], func: |a| unary(a, f64::asin) },
    NativeDef { name: "asinh", params: ARG, defaults: &[], func: |a| unary(a, f64::asinh) },
    NativeDef { name: "cos", params: ARG, defaults: &[], func: |a| unary(a, f64::cos) },
    NativeDef { name: "cosh", params: ARG, defaults: &[], func: |a| unary(a, f64::cosh) },
    NativeDef { name: "acos", params: ARG, defaults: &[], func: |a| unary(a, f64::acos) },
    NativeDef { name: "acosh", params: ARG, defaults: &[], func: |a| unary(a, f64::acosh) },
    NativeDef { name: "tan", params: ARG, defaults: &[], func: |a| unary(a, f64::tan) },
    NativeDef { name: "tanh", params: ARG, defaults: &[], func: |a| unary(a, f64::tanh) },
    NativeDef { name: "atan", params: ARG, defaults: &[], func: |a| unary(a, f64::atan) },
    NativeDef { name: "atanh", params: ARG, defaults: &[], func: |a| unary(a, f64::atanh) },
    NativeDef { name: "sqrt", params: ARG, defaults: &[], func: |a| unary(a, f64::sqrt) },
    NativeDef { name: "abs", params: ARG, defaults: &[], func: |a| unary(a, f64::abs) },
    NativeDef { name: "exp", params: ARG, defaults: &[], func: |a| unary(a, f64::exp) },
    NativeDef { name: "ln", params: ARG, defaults: &[], func: |a| unary(a, f64::ln) },
    NativeDef { name: "log", params: ARG, defaults: &[], func: |a| unary(a, f64::log10) },
    NativeDef {
        name: "round",
        params: &["val", "precision"],
        defaults: &[("precision", Literal::Number(0.0))],
        func: math_round,
    },
    NativeDef { name: "pi", params: &[], defaults: &[], func: |_| Ok(Value::Number(std::f64::consts::PI)) },
];

/// Round half away from zero to `precision` decimal places (negative
/// precision rounds to tens, hundreds, …).
fn math_round(args: &[Value]) -> Result<Value, ScriptError> {
    let factor = 10f64.powi(int(args, 1) as i32);
    Ok(Value::Number((num(args, 0) * factor).round() / factor))
}

// ── string ────────────────────────────────────────────────────────────────────

pub static STRING: &[NativeDef] = &[
    NativeDef { name: "find", params: &["find", "string"], defaults: &[], func: string_find },
    NativeDef {
        name: "length",
        params: &["string"],
        defaults: &[],
        func: |a| Ok(Value::Number(text(a, 0).chars().count() as f64)),
    },
    NativeDef {
        name: "replace",
        params: &["find", "replace", "string"],
        defaults: &[],
        func: string_replace,
    },
    NativeDef {
        name: "slice",
        params: &["string", "offset", "length"],
        defaults: &[("length", Literal::Number(0.0))],
        func: string_slice,
    },
    NativeDef {
        name: "split",
        params: &["delimiter", "string", "limit"],
        defaults: &[("limit", Literal::Number(0.0))],
        func: string_split,
    },
];

/// Character index of the first occurrence, or `false`.
fn string_find(args: &[Value]) -> Result<Value, ScriptError> {
    let needle = text(args, 0);
    let haystack = text(args, 1);
    Ok(match haystack.find(&needle) {
        Some(byte) => Value::Number(haystack[..byte].chars().count() as f64),
        None => Value::Bool(false),
    })
}

fn string_replace(args: &[Value]) -> Result<Value, ScriptError> {
    let find = text(args, 0);
    let subject = text(args, 2);
    if find.is_empty() {
        return Ok(Value::Str(subject));
    }
    Ok(Value::Str(subject.replace(&find, &text(args, 1))))
}

fn string_slice(args: &[Value]) -> Result<Value, ScriptError> {
    let chars: Vec<char> = text(args, 0).chars().collect();
    let (start, end) = span(chars.len(), int(args, 1), int(args, 2));
    Ok(Value::Str(chars[start..end].iter().collect()))
}

/// Split on `delimiter`.  A positive `limit` caps the number of pieces
/// (the last piece keeps the remainder); a negative one drops that many
/// pieces from the end.
fn string_split(args: &[Value]) -> Result<Value, ScriptError> {
    let delimiter = text(args, 0);
    if delimiter.is_empty() {
        return Err(ScriptError::BadArgument {
            function: "string:split",
            message: "empty delimiter".into(),
        });
    }
    let subject = text(args, 1);
    let limit = int(args, 2);
    let pieces: Vec<&str> = match limit {
        l if l > 0 => subject.splitn(l as usize, delimiter.as_str()).collect(),
        l => {
            let mut all: Vec<&str> = subject.split(delimiter.as_str()).collect();
            let keep = all.len().saturating_sub(l.unsigned_abs() as usize);
            all.truncate(keep);
            all
        }
    };
    Ok(Value::Collection(pieces.into_iter().map(Value::from).collect()))
}

// ── array ─────────────────────────────────────────────────────────────────────

pub static ARRAY: &[NativeDef] = &[
    NativeDef { name: "sum", params: &["array"], defaults: &[], func: array_sum },
    NativeDef { name: "product", params: &["array"], defaults: &[], func: array_product },
    NativeDef {
        name: "slice",
        params: &["array", "offset", "length"],
        defaults: &[("length", Literal::Number(0.0))],
        func: array_slice,
    },
    NativeDef { name: "join", params: &["delimiter", "array"], defaults: &[], func: array_join },
    NativeDef {
        name: "length",
        params: &["array", "recursive"],
        defaults: &[("recursive", Literal::Bool(false))],
        func: array_length,
    },
];

fn array_sum(args: &[Value]) -> Result<Value, ScriptError> {
    let c = collection(args, 0, "array:sum")?;
    Ok(Value::Number(c.values().map(Value::as_number).sum()))
}

fn array_product(args: &[Value]) -> Result<Value, ScriptError> {
    let c = collection(args, 0, "array:product")?;
    Ok(Value::Number(c.values().map(Value::as_number).product()))
}

fn array_slice(args: &[Value]) -> Result<Value, ScriptError> {
    let c = collection(args, 0, "array:slice")?;
    let (start, end) = span(c.len(), int(args, 1), int(args, 2));
    Ok(Value::Collection(c.slice(start, end)))
}

fn array_join(args: &[Value]) -> Result<Value, ScriptError> {
    let delimiter = text(args, 0);
    let c = collection(args, 1, "array:join")?;
    let parts: Vec<String> = c.values().map(Value::as_str).collect();
    Ok(Value::Str(parts.join(&delimiter)))
}

fn array_length(args: &[Value]) -> Result<Value, ScriptError> {
    let c = collection(args, 0, "array:length")?;
    Ok(Value::Number(c.count(arg(args, 1).as_bool()) as f64))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
