//! Hades: an embeddable interpreter for a small line-oriented scripting
//! language with block control flow, namespaced functions and
//! Collection values.

pub mod cli;
pub mod config;
pub mod diag;
pub mod script;
pub mod var;

pub use config::Config;
pub use diag::{ErrorKind, Level, Message, ScriptError};
pub use script::{Interpreter, Value};
