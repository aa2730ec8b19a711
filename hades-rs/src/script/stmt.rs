//! Statement parsing.
//!
//! Hades is line-oriented: every non-blank, non-comment line is one
//! statement, recognised by its leading command word.  Anything that is not
//! a keyword is a call to a function of that name.
//!
//! Expressions inside a statement are kept as raw text; they are tokenized
//! and evaluated only when (and each time) the statement runs.

use std::sync::OnceLock;

use regex::Regex;

use crate::diag::ScriptError;
use crate::var::Lifetime;

use super::expr::split_list;
use super::static_regex;

/// Compound assignment operator of a `set` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// `return [E]`
    Return(Option<&'a str>),
    /// `echo E`
    Echo(&'a str),
    /// `eval E`
    Eval(&'a str),
    /// `import E`
    Import(&'a str),
    /// `namespace global` (None) or `namespace E`.
    Namespace(Option<&'a str>),
    /// `var|global|const $a = E, $b`
    Declare { lifetime: Lifetime, list: &'a str },
    /// `set $path op E`
    Set { path: &'a str, op: AssignOp, expr: &'a str },
    If(&'a str),
    ElseIf(&'a str),
    Else,
    While(&'a str),
    /// `for $v = E to E [step E]`
    For { var: &'a str, start: &'a str, end: &'a str, step: Option<&'a str> },
    /// `foreach $v in E`
    Foreach { var: &'a str, expr: &'a str },
    /// `function name [$a, $b = E]` / `macro ...`
    Function { name: &'a str, params: Option<&'a str> },
    End,
    /// `name [arg, ...]`
    Call { name: &'a str, args: Option<&'a str> },
}

/// Coarse classification used while a function body is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// Opens a block (`if`, `while`, `for`, `foreach`, `function`, `macro`).
    Opener,
    /// `end`
    End,
    Other,
}

// ── Patterns ──────────────────────────────────────────────────────────────────

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^([a-zA-Z_][\w:]*)(?:\s+(.+))?$")
}

fn set_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\$([a-zA-Z_][\w.]*)\s*([=+\-*/])\s*(.+)$")
}

fn for_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\$([a-zA-Z_]\w*)\s*=\s*(.+?)\s+to\s+(.+?)(?:\s+step\s+(.+))?$")
}

fn foreach_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\$([a-zA-Z_]\w*)\s+in\s+(.+)$")
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^([a-zA-Z_]\w*)(?:\s+(.+))?$")
}

fn assign_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?s)^\$([a-zA-Z_]\w*)(?:\s*=\s*(.+))?$")
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Split a trimmed line into its command word and raw parameter text.
fn split_command(line: &str) -> Result<(&str, Option<&str>), ScriptError> {
    let caps = command_re().captures(line).ok_or(ScriptError::InvalidCommand)?;
    let command = caps.get(1).map_or("", |m| m.as_str());
    Ok((command, caps.get(2).map(|m| m.as_str())))
}

/// Parse one trimmed, non-empty, non-comment line.
pub fn parse_line(line: &str) -> Result<Stmt<'_>, ScriptError> {
    let (command, params) = split_command(line)?;
    let text = params.unwrap_or("");

    let stmt = match command {
        "return" => Stmt::Return(params),
        "echo" => Stmt::Echo(text),
        "eval" => Stmt::Eval(text),
        "import" => Stmt::Import(text),
        "namespace" => match params {
            Some("global") | None => Stmt::Namespace(None),
            Some(e) => Stmt::Namespace(Some(e)),
        },
        "var" | "global" | "const" => {
            let lifetime = match command {
                "var" => Lifetime::Local,
                "global" => Lifetime::Global,
                _ => Lifetime::Const,
            };
            let list = params.ok_or(ScriptError::InvalidSyntax("declaration"))?;
            Stmt::Declare { lifetime, list }
        }
        "set" => {
            let caps = set_re().captures(text).ok_or(ScriptError::InvalidSyntax("set statement"))?;
            let op = match &caps[2] {
                "+" => AssignOp::Add,
                "-" => AssignOp::Sub,
                "*" => AssignOp::Mul,
                "/" => AssignOp::Div,
                _ => AssignOp::Assign,
            };
            Stmt::Set { path: group(&caps, 1), op, expr: group(&caps, 3) }
        }
        "if" => Stmt::If(text),
        "elseif" => Stmt::ElseIf(text),
        "else" => Stmt::Else,
        "while" => Stmt::While(text),
        "for" => {
            let caps = for_re().captures(text).ok_or(ScriptError::InvalidSyntax("for block"))?;
            Stmt::For {
                var: group(&caps, 1),
                start: group(&caps, 2),
                end: group(&caps, 3),
                step: caps.get(4).map(|m| m.as_str()),
            }
        }
        "foreach" => {
            let caps = foreach_re()
                .captures(text)
                .ok_or(ScriptError::InvalidSyntax("foreach block"))?;
            Stmt::Foreach { var: group(&caps, 1), expr: group(&caps, 2) }
        }
        "function" | "macro" => {
            let caps = function_re()
                .captures(text)
                .ok_or(ScriptError::InvalidSyntax("function definition"))?;
            Stmt::Function { name: group(&caps, 1), params: caps.get(2).map(|m| m.as_str()) }
        }
        "end" => Stmt::End,
        name => Stmt::Call { name, args: params },
    };
    Ok(stmt)
}

fn group<'a>(caps: &regex::Captures<'a>, i: usize) -> &'a str {
    caps.get(i).map_or("", |m| m.as_str())
}

/// Classify a line without fully parsing it.
pub fn line_shape(line: &str) -> LineShape {
    let word = line
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default();
    match word {
        "if" | "while" | "for" | "foreach" | "function" | "macro" => LineShape::Opener,
        "end" => LineShape::End,
        _ => LineShape::Other,
    }
}

/// Parse `$a = E, $b` into names with optional initializer text.
///
/// Used for declarations and function parameter lists.
pub fn parse_assign_list(list: &str) -> Result<Vec<(String, Option<String>)>, ScriptError> {
    split_list(list)?
        .into_iter()
        .map(|item| {
            let caps = assign_item_re()
                .captures(&item)
                .ok_or(ScriptError::InvalidSyntax("assignment list"))?;
            let name = caps[1].to_owned();
            let init = caps.get(2).map(|m| m.as_str().to_owned());
            Ok((name, init))
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse_line("echo 'hi'").unwrap(), Stmt::Echo("'hi'"));
        assert_eq!(parse_line("return").unwrap(), Stmt::Return(None));
        assert_eq!(parse_line("return $x + 1").unwrap(), Stmt::Return(Some("$x + 1")));
        assert_eq!(parse_line("else").unwrap(), Stmt::Else);
        assert_eq!(parse_line("end").unwrap(), Stmt::End);
        assert_eq!(parse_line("namespace global").unwrap(), Stmt::Namespace(None));
        assert_eq!(parse_line("namespace 'util'").unwrap(), Stmt::Namespace(Some("'util'")));
    }

    #[test]
    fn declarations() {
        assert_eq!(
            parse_line("const $pi = 3.14, $e").unwrap(),
            Stmt::Declare { lifetime: Lifetime::Const, list: "$pi = 3.14, $e" }
        );
        assert_eq!(parse_line("var"), Err(ScriptError::InvalidSyntax("declaration")));
    }

    #[test]
    fn set_operators() {
        assert_eq!(
            parse_line("set $list + 'x'").unwrap(),
            Stmt::Set { path: "list", op: AssignOp::Add, expr: "'x'" }
        );
        assert_eq!(
            parse_line("set $p.hp=10").unwrap(),
            Stmt::Set { path: "p.hp", op: AssignOp::Assign, expr: "10" }
        );
        assert_eq!(parse_line("set x = 1"), Err(ScriptError::InvalidSyntax("set statement")));
    }

    #[test]
    fn for_with_and_without_step() {
        assert_eq!(
            parse_line("for $i = 1 to 10 step 2").unwrap(),
            Stmt::For { var: "i", start: "1", end: "10", step: Some("2") }
        );
        assert_eq!(
            parse_line("for $i = $a + 1 to {f 3}").unwrap(),
            Stmt::For { var: "i", start: "$a + 1", end: "{f 3}", step: None }
        );
        assert!(parse_line("for i = 1 to 2").is_err());
    }

    #[test]
    fn foreach_and_function() {
        assert_eq!(
            parse_line("foreach $item in [1, 2]").unwrap(),
            Stmt::Foreach { var: "item", expr: "[1, 2]" }
        );
        assert_eq!(
            parse_line("function add $a, $b = 1").unwrap(),
            Stmt::Function { name: "add", params: Some("$a, $b = 1") }
        );
        assert_eq!(
            parse_line("macro hello").unwrap(),
            Stmt::Function { name: "hello", params: None }
        );
        assert!(parse_line("function ns:bad").is_err());
    }

    #[test]
    fn anything_else_is_a_call() {
        assert_eq!(
            parse_line("math:round 2.5, 1").unwrap(),
            Stmt::Call { name: "math:round", args: Some("2.5, 1") }
        );
        assert_eq!(parse_line("greet").unwrap(), Stmt::Call { name: "greet", args: None });
        assert_eq!(parse_line("$x = 1"), Err(ScriptError::InvalidCommand));
    }

    #[test]
    fn shapes() {
        assert_eq!(line_shape("if $x"), LineShape::Opener);
        assert_eq!(line_shape("function f"), LineShape::Opener);
        assert_eq!(line_shape("end"), LineShape::End);
        assert_eq!(line_shape("endless 1"), LineShape::Other);
        assert_eq!(line_shape("elseif 1"), LineShape::Other);
    }

    #[test]
    fn assign_lists() {
        assert_eq!(
            parse_assign_list("$a = [1, 2], $b, $c='x,y'").unwrap(),
            vec![
                ("a".to_string(), Some("[1, 2]".to_string())),
                ("b".to_string(), None),
                ("c".to_string(), Some("'x,y'".to_string())),
            ]
        );
        assert!(parse_assign_list("a = 1").is_err());
    }
}
