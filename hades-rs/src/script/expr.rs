//! Hades expression tokenizer.
//!
//! Formulas are converted to Reverse Polish order in a single left-to-right
//! shunting-yard scan.  String, collection (`[...]`) and call (`{...}`)
//! literals are copied through whole; their contents are only interpreted
//! later by the evaluator.
//!
//! Operator precedence (lowest → highest):
//!   `| ~ &` and comparison  →  `+ -`  →  `* / %` and unary minus  →  `^`
//!
//! Logical and comparison operators share one tier, so `1 | 0 == 0` reads as
//! `(1 | 0) == 0`.  `^` is right-associative, everything else left-associative.  Two operands
//! written next to each other multiply: `2 3` is `2*3`, `2($x)` is `2*$x`.

use crate::diag::{Delimiter, ScriptError};

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Or | Op::Xor | Op::And
            | Op::Eq | Op::Ne | Op::Identical | Op::NotIdentical
            | Op::Lt | Op::Le | Op::Gt | Op::Ge => 0,
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div | Op::Rem => 2,
            Op::Pow => 3,
        }
    }

    fn right_assoc(self) -> bool {
        matches!(self, Op::Pow)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Rem => "%",
            Op::Pow => "^",
            Op::And => "&",
            Op::Or => "|",
            Op::Xor => "~",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Identical => "===",
            Op::NotIdentical => "!==",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }
}

/// Precedence of unary minus; same tier as `*`.
const NEG_PRECEDENCE: u8 = 2;

// ── Token ─────────────────────────────────────────────────────────────────────

/// One RPN token.  Literal variants carry the raw text between delimiters.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Bool(bool),
    Null,
    /// Bare identifier that is not a keyword literal.
    Ident(String),
    /// `'...'` contents, escapes not yet processed.
    SingleQuoted(String),
    /// `"..."` contents, escapes and `$var` references not yet processed.
    DoubleQuoted(String),
    /// `[...]` contents.
    Collection(String),
    /// `{...}` contents.
    Call(String),
    /// `$name[.path]` without the leading `$`.
    Var(String),
    Op(Op),
    Neg,
}

/// Entry on the operator stack.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Op(Op),
    Neg,
    Open,
}

impl Pending {
    fn emit(self) -> Option<Token> {
        match self {
            Pending::Op(op) => Some(Token::Op(op)),
            Pending::Neg => Some(Token::Neg),
            Pending::Open => None,
        }
    }
}

// ── Nesting ───────────────────────────────────────────────────────────────────

/// Delimiter-depth tracker shared by the tokenizer and list splitter.
///
/// Quotes nest inside brackets and braces and vice versa; a backslash
/// escapes the following character only inside a string.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Nesting {
    single: bool,
    double: bool,
    bracket: usize,
    brace: usize,
    escape: bool,
}

impl Nesting {
    pub(crate) fn at_top(&self) -> bool {
        !self.single && !self.double && self.bracket == 0 && self.brace == 0
    }

    pub(crate) fn feed(&mut self, c: char) -> Result<(), ScriptError> {
        if self.single || self.double {
            let quote = if self.single { '\'' } else { '"' };
            if self.escape {
                self.escape = false;
            } else if c == '\\' {
                self.escape = true;
            } else if c == quote {
                self.single = false;
                self.double = false;
            }
            return Ok(());
        }
        match c {
            '\'' => self.single = true,
            '"' => self.double = true,
            '[' => self.bracket += 1,
            '{' => self.brace += 1,
            ']' => {
                self.bracket = self
                    .bracket
                    .checked_sub(1)
                    .ok_or(ScriptError::UnexpectedCloser(Delimiter::Collection))?;
            }
            '}' => {
                self.brace = self
                    .brace
                    .checked_sub(1)
                    .ok_or(ScriptError::UnexpectedCloser(Delimiter::Call))?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Error describing the innermost still-open delimiter.
    pub(crate) fn unterminated(&self) -> Option<ScriptError> {
        if self.single || self.double {
            Some(ScriptError::Unterminated(Delimiter::String))
        } else if self.bracket > 0 {
            Some(ScriptError::Unterminated(Delimiter::Collection))
        } else if self.brace > 0 {
            Some(ScriptError::Unterminated(Delimiter::Call))
        } else {
            None
        }
    }
}

/// Split `input` on commas that are outside every string, collection and
/// call literal.  Each piece is trimmed.  An empty or all-blank input yields
/// no pieces.
pub fn split_list(input: &str) -> Result<Vec<String>, ScriptError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut nest = Nesting::default();
    for c in input.chars() {
        if c == ',' && nest.at_top() {
            parts.push(current.trim().to_owned());
            current.clear();
            continue;
        }
        nest.feed(c)?;
        current.push(c);
    }
    if let Some(err) = nest.unterminated() {
        return Err(err);
    }
    parts.push(current.trim().to_owned());
    Ok(parts)
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    output: Vec<Token>,
    stack: Vec<Pending>,
    expecting_operator: bool,
}

impl Tokenizer {
    fn new(src: &str) -> Self {
        Tokenizer {
            chars: src.trim().chars().collect(),
            pos: 0,
            output: Vec::new(),
            stack: Vec::new(),
            expecting_operator: false,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Shunting-yard push: drain higher (or equal, for left-associative)
    /// precedence operators to the output first.
    fn push_operator(&mut self, op: Op) {
        let prec = op.precedence();
        while let Some(top) = self.stack.last().copied() {
            let top_prec = match top {
                Pending::Op(t) => t.precedence(),
                Pending::Neg => NEG_PRECEDENCE,
                Pending::Open => break,
            };
            let pops = if op.right_assoc() { prec < top_prec } else { prec <= top_prec };
            if !pops {
                break;
            }
            self.stack.pop();
            self.output.extend(top.emit());
        }
        self.stack.push(Pending::Op(op));
    }

    /// Juxtaposed operands multiply.
    fn begin_operand(&mut self) {
        if self.expecting_operator {
            self.push_operator(Op::Mul);
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek_at(0).is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Copy a delimited literal through whole, starting at its opener.
    fn read_literal(&mut self) -> Result<Token, ScriptError> {
        let start = self.pos;
        let mut nest = Nesting::default();
        while let Some(c) = self.peek_at(0) {
            nest.feed(c)?;
            self.pos += 1;
            if nest.at_top() {
                let inner: String = self.chars[start + 1..self.pos - 1].iter().collect();
                return Ok(match self.chars[start] {
                    '\'' => Token::SingleQuoted(inner),
                    '"' => Token::DoubleQuoted(inner),
                    '[' => Token::Collection(inner),
                    _ => Token::Call(inner),
                });
            }
        }
        Err(nest.unterminated().unwrap_or(ScriptError::Internal))
    }

    fn read_number(&mut self) -> Result<Token, ScriptError> {
        let mut text = self.read_while(|c| c.is_ascii_digit());
        if self.peek_at(0) == Some('.') {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.read_while(|c| c.is_ascii_digit()));
        }
        text.parse()
            .map(Token::Number)
            .map_err(|_| ScriptError::InvalidValue(text))
    }

    fn read_operator(&mut self, c: char) -> Result<Op, ScriptError> {
        let next = self.peek_at(1);
        let (op, len) = match c {
            '+' => (Op::Add, 1),
            '-' => (Op::Sub, 1),
            '*' => (Op::Mul, 1),
            '/' => (Op::Div, 1),
            '%' => (Op::Rem, 1),
            '^' => (Op::Pow, 1),
            '&' => (Op::And, 1),
            '|' => (Op::Or, 1),
            '~' => (Op::Xor, 1),
            '<' if next == Some('=') => (Op::Le, 2),
            '<' => (Op::Lt, 1),
            '>' if next == Some('=') => (Op::Ge, 2),
            '>' => (Op::Gt, 1),
            '=' | '!' if next == Some('=') => {
                let strict = self.peek_at(2) == Some('=');
                match (c, strict) {
                    ('=', true) => (Op::Identical, 3),
                    ('=', false) => (Op::Eq, 2),
                    (_, true) => (Op::NotIdentical, 3),
                    (_, false) => (Op::Ne, 2),
                }
            }
            other => return Err(ScriptError::UnexpectedChar(other)),
        };
        self.pos += len;
        Ok(op)
    }

    fn run(mut self) -> Result<Vec<Token>, ScriptError> {
        while let Some(c) = self.peek_at(0) {
            match c {
                c if c.is_whitespace() => self.pos += 1,

                '\'' | '"' | '[' | '{' => {
                    self.begin_operand();
                    let tok = self.read_literal()?;
                    self.output.push(tok);
                    self.expecting_operator = true;
                }
                ']' => return Err(ScriptError::UnexpectedCloser(Delimiter::Collection)),
                '}' => return Err(ScriptError::UnexpectedCloser(Delimiter::Call)),

                '-' if !self.expecting_operator => {
                    self.stack.push(Pending::Neg);
                    self.pos += 1;
                }

                '+' | '-' | '*' | '/' | '%' | '^' | '&' | '|' | '~' | '=' | '!' | '<' | '>' => {
                    if !self.expecting_operator {
                        return Err(ScriptError::UnexpectedOperator(c));
                    }
                    let op = self.read_operator(c)?;
                    self.push_operator(op);
                    self.expecting_operator = false;
                }

                '(' => {
                    self.begin_operand();
                    self.stack.push(Pending::Open);
                    self.expecting_operator = false;
                    self.pos += 1;
                }
                ')' => {
                    if !self.expecting_operator {
                        return Err(ScriptError::UnexpectedCloseParen);
                    }
                    loop {
                        match self.stack.pop() {
                            Some(Pending::Open) => break,
                            Some(other) => self.output.extend(other.emit()),
                            None => return Err(ScriptError::UnexpectedCloseParen),
                        }
                    }
                    self.pos += 1;
                }

                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    self.begin_operand();
                    let tok = self.read_number()?;
                    self.output.push(tok);
                    self.expecting_operator = true;
                }

                '$' if self.peek_at(1).is_some_and(|d| d.is_ascii_alphabetic() || d == '_') => {
                    self.begin_operand();
                    self.pos += 1;
                    let path = self.read_while(|d| d.is_ascii_alphanumeric() || d == '_' || d == '.');
                    self.output.push(Token::Var(path));
                    self.expecting_operator = true;
                }

                c if c.is_ascii_alphabetic() || c == '_' => {
                    self.begin_operand();
                    let word = self.read_while(|d| d.is_ascii_alphanumeric() || d == '_');
                    let tok = match word.to_ascii_lowercase().as_str() {
                        "true" => Token::Bool(true),
                        "false" => Token::Bool(false),
                        "null" => Token::Null,
                        _ => Token::Ident(word),
                    };
                    self.output.push(tok);
                    self.expecting_operator = true;
                }

                other => return Err(ScriptError::UnexpectedChar(other)),
            }
        }

        if !self.expecting_operator {
            return Err(ScriptError::MissingOperand);
        }
        while let Some(top) = self.stack.pop() {
            match top {
                Pending::Open => return Err(ScriptError::MissingCloseParen),
                other => self.output.extend(other.emit()),
            }
        }
        Ok(self.output)
    }
}

/// Convert an infix formula into RPN tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ScriptError> {
    Tokenizer::new(src).run()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Token {
        Token::Number(x)
    }

    fn op(o: Op) -> Token {
        Token::Op(o)
    }

    #[test]
    fn precedence_orders_output() {
        assert_eq!(
            tokenize("2 + 3 * 4").unwrap(),
            vec![n(2.0), n(3.0), n(4.0), op(Op::Mul), op(Op::Add)]
        );
        assert_eq!(
            tokenize("(2 + 3) * 4").unwrap(),
            vec![n(2.0), n(3.0), op(Op::Add), n(4.0), op(Op::Mul)]
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            tokenize("2 ^ 3 ^ 2").unwrap(),
            vec![n(2.0), n(3.0), n(2.0), op(Op::Pow), op(Op::Pow)]
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            tokenize("5 - 2 - 1").unwrap(),
            vec![n(5.0), n(2.0), op(Op::Sub), n(1.0), op(Op::Sub)]
        );
    }

    #[test]
    fn unary_minus() {
        assert_eq!(tokenize("-5").unwrap(), vec![n(5.0), Token::Neg]);
        assert_eq!(tokenize("2 * -3").unwrap(), vec![n(2.0), n(3.0), Token::Neg, op(Op::Mul)]);
        // binds looser than ^
        assert_eq!(tokenize("-2 ^ 2").unwrap(), vec![n(2.0), n(2.0), op(Op::Pow), Token::Neg]);
        assert_eq!(tokenize("1 -1").unwrap(), vec![n(1.0), n(1.0), op(Op::Sub)]);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(tokenize("2 3").unwrap(), vec![n(2.0), n(3.0), op(Op::Mul)]);
        assert_eq!(tokenize("2(3)").unwrap(), vec![n(2.0), n(3.0), op(Op::Mul)]);
        assert_eq!(
            tokenize("2$x").unwrap(),
            vec![n(2.0), Token::Var("x".into()), op(Op::Mul)]
        );
    }

    #[test]
    fn comparison_and_logic_are_lowest() {
        assert_eq!(
            tokenize("1 + 1 == 2 & $ok").unwrap(),
            vec![
                n(1.0),
                n(1.0),
                op(Op::Add),
                n(2.0),
                op(Op::Eq),
                Token::Var("ok".into()),
                op(Op::And),
            ]
        );
    }

    #[test]
    fn logic_and_comparison_share_a_tier() {
        assert_eq!(
            tokenize("1 | 0 == 0").unwrap(),
            vec![n(1.0), n(0.0), op(Op::Or), n(0.0), op(Op::Eq)]
        );
        assert_eq!(
            tokenize("$a == 1 & $b").unwrap(),
            vec![
                Token::Var("a".into()),
                n(1.0),
                op(Op::Eq),
                Token::Var("b".into()),
                op(Op::And),
            ]
        );
    }

    #[test]
    fn multi_char_operators() {
        assert_eq!(tokenize("1 === 1").unwrap()[2], op(Op::Identical));
        assert_eq!(tokenize("1 !== 1").unwrap()[2], op(Op::NotIdentical));
        assert_eq!(tokenize("1 != 1").unwrap()[2], op(Op::Ne));
        assert_eq!(tokenize("1 <= 1").unwrap()[2], op(Op::Le));
        assert_eq!(tokenize("1 >= 1").unwrap()[2], op(Op::Ge));
        assert_eq!(tokenize("1 < 1").unwrap()[2], op(Op::Lt));
    }

    #[test]
    fn literals_pass_through_whole() {
        assert_eq!(
            tokenize(r"'a\'b' + 'c'").unwrap(),
            vec![
                Token::SingleQuoted(r"a\'b".into()),
                Token::SingleQuoted("c".into()),
                op(Op::Add),
            ]
        );
        assert_eq!(
            tokenize("[1, ']', {f 2}]").unwrap(),
            vec![Token::Collection("1, ']', {f 2}".into())]
        );
        assert_eq!(
            tokenize("{math:round 2.5, 0} * 2").unwrap(),
            vec![Token::Call("math:round 2.5, 0".into()), n(2.0), op(Op::Mul)]
        );
    }

    #[test]
    fn keyword_literals() {
        assert_eq!(tokenize("TRUE").unwrap(), vec![Token::Bool(true)]);
        assert_eq!(tokenize("null").unwrap(), vec![Token::Null]);
        assert_eq!(tokenize("foo").unwrap(), vec![Token::Ident("foo".into())]);
    }

    #[test]
    fn variable_paths() {
        assert_eq!(tokenize("$a.b.0").unwrap(), vec![Token::Var("a.b.0".into())]);
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(tokenize("1 +"), Err(ScriptError::MissingOperand));
        assert_eq!(tokenize(""), Err(ScriptError::MissingOperand));
        assert_eq!(tokenize("(1 + 2"), Err(ScriptError::MissingCloseParen));
        assert_eq!(tokenize("1 + 2)"), Err(ScriptError::UnexpectedCloseParen));
        assert_eq!(tokenize("* 2"), Err(ScriptError::UnexpectedOperator('*')));
        assert_eq!(tokenize("1 = 2"), Err(ScriptError::UnexpectedChar('=')));
        assert_eq!(tokenize("'abc"), Err(ScriptError::Unterminated(Delimiter::String)));
        assert_eq!(tokenize("[1, 2"), Err(ScriptError::Unterminated(Delimiter::Collection)));
        assert_eq!(tokenize("{f"), Err(ScriptError::Unterminated(Delimiter::Call)));
        assert_eq!(tokenize("1 ]"), Err(ScriptError::UnexpectedCloser(Delimiter::Collection)));
        assert_eq!(tokenize("1 # 2"), Err(ScriptError::UnexpectedChar('#')));
    }

    #[test]
    fn split_list_respects_nesting() {
        assert_eq!(
            split_list("1, 'a,b', [2, 3], {f 4, 5}, \"x\\\",y\"").unwrap(),
            vec!["1", "'a,b'", "[2, 3]", "{f 4, 5}", "\"x\\\",y\""]
        );
        assert!(split_list("   ").unwrap().is_empty());
        assert_eq!(split_list("a,").unwrap(), vec!["a", ""]);
        assert!(split_list("'open").is_err());
    }
}
