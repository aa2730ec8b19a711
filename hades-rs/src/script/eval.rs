//! RPN evaluator.
//!
//! Walks the token sequence produced by [`tokenize`] with an operand stack.
//! Variable reads and function calls go through [`EvalContext`] so the
//! evaluator itself holds no interpreter state.

use std::sync::OnceLock;

use regex::Regex;

use crate::diag::ScriptError;

use super::expand::{expand_double, unescape_single};
use super::expr::{split_list, tokenize, Op, Token};
use super::static_regex;
use super::value::{Collection, Key, Value};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Interface between the evaluator and the surrounding interpreter.
pub trait EvalContext {
    /// Resolve `$name[.path]` (without the `$`).
    fn get_var(&mut self, path: &str) -> Result<Value, ScriptError>;

    /// Invoke a native or script-bodied function.
    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError>;
}

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?s)^([a-zA-Z_][\w:]*)(?:\s+(.+))?$")
}

fn keyed_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?s)^([a-zA-Z_]\w*)\s*:\s*(.+)$")
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Evaluate an RPN token sequence.
pub fn evaluate(tokens: &[Token], ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    let mut stack: Vec<Value> = Vec::with_capacity(tokens.len());

    for tok in tokens {
        let value = match tok {
            Token::Op(op) => {
                let rhs = stack.pop().ok_or(ScriptError::MissingOperand)?;
                let lhs = stack.pop().ok_or(ScriptError::MissingOperand)?;
                apply(*op, &lhs, &rhs)?
            }
            Token::Neg => stack.pop().ok_or(ScriptError::MissingOperand)?.neg(),
            Token::Number(n) => Value::Number(*n),
            Token::Bool(b) => Value::Bool(*b),
            Token::Null => Value::Null,
            Token::Ident(word) => return Err(ScriptError::InvalidValue(word.clone())),
            Token::SingleQuoted(s) => Value::Str(unescape_single(s)),
            Token::DoubleQuoted(s) => Value::Str(expand_double(s, ctx)?),
            Token::Collection(inner) => Value::Collection(eval_collection(inner, ctx)?),
            Token::Call(inner) => eval_call(inner, ctx)?,
            Token::Var(path) => ctx.get_var(path)?,
        };
        stack.push(value);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(v), true) => Ok(v),
        _ => Err(ScriptError::Internal),
    }
}

/// Tokenize and evaluate `src`.
pub fn eval_str(src: &str, ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    let tokens = tokenize(src)?;
    evaluate(&tokens, ctx)
}

/// Evaluate every element of a comma-separated expression list.
pub fn eval_list(src: &str, ctx: &mut dyn EvalContext) -> Result<Vec<Value>, ScriptError> {
    split_list(src)?
        .iter()
        .map(|item| eval_str(item, ctx))
        .collect()
}

fn apply(op: Op, lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    use std::cmp::Ordering::*;
    Ok(match op {
        Op::Add => lhs.add(rhs),
        Op::Sub => lhs.sub(rhs),
        Op::Mul => lhs.mul(rhs),
        Op::Div => lhs.div(rhs).ok_or(ScriptError::DivisionByZero)?,
        Op::Rem => lhs.rem(rhs).ok_or(ScriptError::DivisionByZero)?,
        Op::Pow => lhs.pow(rhs),
        Op::And => Value::Bool(lhs.as_bool() && rhs.as_bool()),
        Op::Or => Value::Bool(lhs.as_bool() || rhs.as_bool()),
        Op::Xor => Value::Bool(lhs.as_bool() != rhs.as_bool()),
        Op::Eq => Value::Bool(lhs.loose_eq(rhs)),
        Op::Ne => Value::Bool(!lhs.loose_eq(rhs)),
        Op::Identical => Value::Bool(lhs.identical(rhs)),
        Op::NotIdentical => Value::Bool(!lhs.identical(rhs)),
        Op::Lt => Value::Bool(lhs.loose_cmp(rhs) == Some(Less)),
        Op::Le => Value::Bool(matches!(lhs.loose_cmp(rhs), Some(Less | Equal))),
        Op::Gt => Value::Bool(lhs.loose_cmp(rhs) == Some(Greater)),
        Op::Ge => Value::Bool(matches!(lhs.loose_cmp(rhs), Some(Greater | Equal))),
    })
}

/// `[a, b, key: c]` → Collection.
fn eval_collection(inner: &str, ctx: &mut dyn EvalContext) -> Result<Collection, ScriptError> {
    let mut out = Collection::new();
    for item in split_list(inner)? {
        match keyed_pattern().captures(&item) {
            Some(caps) => {
                let value = eval_str(&caps[2], ctx)?;
                out.insert(Key::Name(caps[1].to_owned()), value);
            }
            None => out.push(eval_str(&item, ctx)?),
        }
    }
    Ok(out)
}

/// `{name arg, arg}` → call result.
fn eval_call(inner: &str, ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    let caps = call_pattern()
        .captures(inner.trim())
        .ok_or(ScriptError::InvalidSyntax("function call"))?;
    let args = match caps.get(2) {
        Some(list) => eval_list(list.as_str(), ctx)?,
        None => Vec::new(),
    };
    ctx.call_fn(&caps[1], args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
