//! The Hades scripting language.
//!
//! Scripts are executed line by line without building a syntax tree:
//!
//! - [`expr`] tokenizes infix formulas into RPN, [`eval`] evaluates them
//! - [`stmt`] recognises one statement per line
//! - [`block`] tracks `if`/`while`/`for`/`foreach`/`function` nesting
//! - [`func`] holds native and script-bodied functions, [`builtins`] the
//!   bundled `math`, `string` and `array` libraries
//! - [`interp`] ties it all together
//!
//! # Quick start
//!
//! ```rust
//! use hades::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.execute("var $x = 6\necho $x * 7").unwrap();
//! assert_eq!(interp.output, vec!["42"]);
//! ```

use std::sync::OnceLock;

use regex::Regex;

pub mod block;
pub mod builtins;
pub mod eval;
pub mod expand;
pub mod expr;
pub mod func;
pub mod interp;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use eval::EvalContext;
pub use func::{Function, NativeFn};
pub use interp::{fs_loader, Interpreter, SourceLoader};
pub use value::{Collection, Key, Value};

/// Compile a fixed pattern once.
pub(crate) fn static_regex(cell: &'static OnceLock<Regex>, src: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(src).expect("built-in pattern compiles"))
}
