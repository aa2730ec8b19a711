//! Errors, severity levels, and the accumulating diagnostic log.
//!
//! Every failure in the interpreter is a [`ScriptError`].  Each variant has
//! a kind (what went wrong) and a default [`Level`] (how bad it is).  The
//! interpreter records every reported error as a [`Message`] in
//! [`Diagnostics`]; `Error`-level ones additionally abort the running
//! `execute` call.

use std::fmt;

use thiserror::Error;

// ── Level ─────────────────────────────────────────────────────────────────────

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        })
    }
}

// ── ErrorKind ─────────────────────────────────────────────────────────────────

/// Coarse classification of a [`ScriptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed statement or expression.
    Syntax,
    /// Undeclared variable, undefined function, redeclaration, redefinition.
    Name,
    /// Invalid key path segment, non-Collection where one is required.
    Type,
    /// Division by zero.
    Arithmetic,
    /// Assignment to a Const variable.
    Scope,
    /// Source loading failed.
    Io,
    /// Broken interpreter invariant.
    Internal,
}

/// Which delimiter an unbalanced-literal error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    String,
    Collection,
    Call,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Delimiter::String => "string",
            Delimiter::Collection => "collection",
            Delimiter::Call => "function call",
        })
    }
}

// ── ScriptError ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    // Syntax
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Invalid syntax in {0}")]
    InvalidSyntax(&'static str),
    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("Unexpected operator '{0}'")]
    UnexpectedOperator(char),
    #[error("Unexpected closing parenthesis")]
    UnexpectedCloseParen,
    #[error("Missing closing parenthesis")]
    MissingCloseParen,
    #[error("Unexpected closing {0} delimiter")]
    UnexpectedCloser(Delimiter),
    #[error("Missing closing {0} delimiter")]
    Unterminated(Delimiter),
    #[error("Invalid or missing operand")]
    MissingOperand,
    #[error("Unexpected {0} without an open if block")]
    DanglingBranch(&'static str),
    #[error("Unexpected block end")]
    UnexpectedBlockEnd,
    #[error("Missing block end")]
    MissingBlockEnd,
    #[error("Invalid step in for block")]
    InvalidStep,

    // Name
    #[error("Undefined variable ${0}")]
    UndefinedVariable(String),
    #[error("Undefined key in ${0}")]
    UndefinedKey(String),
    #[error("Call to undefined function {{{0}}}")]
    UndefinedFunction(String),
    #[error("Cannot redeclare variable ${0}")]
    Redeclare(String),
    #[error("Cannot redefine function {{{0}}}")]
    Redefine(String),
    #[error("Invalid value '{0}'")]
    InvalidValue(String),
    #[error("No default value for argument ${param} of {{{function}}}")]
    MissingArgument { function: String, param: String },

    // Type
    #[error("Invalid key name '{segment}' for variable ${path}")]
    InvalidKey { path: String, segment: String },
    #[error("Declaring a variable's subvalue is illegal (${0})")]
    SubvalueDeclaration(String),
    #[error("Cannot use {found} ${path} as a collection")]
    NotIndexable { path: String, found: &'static str },
    #[error("Invalid argument supplied for foreach block")]
    NotACollection,
    #[error("{function}: {message}")]
    BadArgument { function: &'static str, message: String },

    // Arithmetic
    #[error("Division by zero")]
    DivisionByZero,

    // Scope
    #[error("Cannot set constant ${0}")]
    AssignConst(String),

    // Io
    #[error("Could not open script file '{file}': {reason}")]
    Load { file: String, reason: String },

    // Internal
    #[error("Unexpected internal error")]
    Internal,

    /// An `Error`-level diagnostic raised out of an `execute` call.  The
    /// message has already been recorded in the log.
    #[error("hades: {0}")]
    Raised(Message),
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        use ScriptError::*;
        match self {
            InvalidCommand | InvalidSyntax(_) | UnexpectedChar(_) | UnexpectedOperator(_)
            | UnexpectedCloseParen | MissingCloseParen | UnexpectedCloser(_)
            | Unterminated(_) | MissingOperand | DanglingBranch(_) | UnexpectedBlockEnd
            | MissingBlockEnd | InvalidStep => ErrorKind::Syntax,
            UndefinedVariable(_) | UndefinedKey(_) | UndefinedFunction(_) | Redeclare(_)
            | Redefine(_) | InvalidValue(_) | MissingArgument { .. } => ErrorKind::Name,
            InvalidKey { .. } | SubvalueDeclaration(_) | NotIndexable { .. } | NotACollection
            | BadArgument { .. } => ErrorKind::Type,
            DivisionByZero => ErrorKind::Arithmetic,
            AssignConst(_) => ErrorKind::Scope,
            Load { .. } => ErrorKind::Io,
            Internal => ErrorKind::Internal,
            Raised(msg) => msg.kind.unwrap_or(ErrorKind::Internal),
        }
    }

    /// Default severity.  Only `Error`-level problems abort execution.
    pub fn level(&self) -> Level {
        use ScriptError::*;
        match self {
            UndefinedKey(_) => Level::Notice,
            Redeclare(_) | AssignConst(_) | InvalidKey { .. } | SubvalueDeclaration(_)
            | InvalidValue(_) | MissingArgument { .. } | DivisionByZero
            | NotIndexable { .. } | BadArgument { .. } => Level::Warning,
            _ => Level::Error,
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub level: Level,
    /// `None` for informational messages such as silenced `echo` output.
    pub kind: Option<ErrorKind>,
    pub text: String,
    pub zone: Option<String>,
    pub line: usize,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.text)?;
        if let Some(zone) = &self.zone {
            write!(f, " in {zone}")?;
        }
        write!(f, " on line {}", self.line)
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Accumulating message log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<Message>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `msg` and mirror it to `tracing`.
    pub fn push(&mut self, msg: Message) {
        match msg.level {
            Level::Notice => tracing::info!(target: "hades::diag", "{msg}"),
            Level::Warning => tracing::warn!(target: "hades::diag", "{msg}"),
            Level::Error => tracing::error!(target: "hades::diag", "{msg}"),
        }
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
