//! String literal unescaping and variable interpolation.
//!
//! | Literal        | Escapes                          | Substitution            |
//! |----------------|----------------------------------|-------------------------|
//! | `'...'`        | `\'` `\\`                        | none                    |
//! | `"..."`        | `\"` `\\` `\$` `\n` `\t`         | `$name[.path]` → value  |
//!
//! Any other backslash sequence is kept as written.

use crate::diag::ScriptError;

use super::eval::EvalContext;

/// Unescape the contents of a single-quoted literal.
pub fn unescape_single(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next @ ('\'' | '\\')) = chars.peek() {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Unescape the contents of a double-quoted literal and substitute every
/// `$name[.path]` reference with the stringified variable value.
pub fn expand_double(src: &str, ctx: &mut dyn EvalContext) -> Result<String, ScriptError> {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(e @ ('"' | '\'' | '\\' | '$')) => {
                    out.push(e);
                    chars.next();
                }
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('t') => {
                    out.push('\t');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '$' if chars.peek().is_some_and(|&d| is_ident_start(d)) => {
                let mut path = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_ascii_alphanumeric() || d == '_' || d == '.') {
                        break;
                    }
                    path.push(d);
                    chars.next();
                }
                // "$name." ends a sentence, not a path.
                let trimmed = path.trim_end_matches('.');
                let trailing = path.len() - trimmed.len();
                out.push_str(&ctx.get_var(trimmed)?.to_string());
                out.extend(std::iter::repeat('.').take(trailing));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

// ── Tests ─────────────────────────────────────────────────────────────────────
