//! Function definitions and the function table.
//!
//! A [`Function`] is either host-native (a Rust callable) or script-bodied
//! (captured source text).  Names may be namespace-qualified as
//! `namespace:name`.  Once defined, an entry can never be replaced.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::diag::ScriptError;

use super::value::Value;

/// Host callable.  Receives one value per declared parameter, in order.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, ScriptError>>;

#[derive(Clone)]
pub enum Body {
    Native(NativeFn),
    Script(String),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Native(_) => f.write_str("Native(..)"),
            Body::Script(src) => f.debug_tuple("Script").field(src).finish(),
        }
    }
}

/// A callable definition.
#[derive(Debug, Clone)]
pub struct Function {
    /// Fully qualified name (`ns:name` or `name`).
    pub name: String,
    pub params: Vec<String>,
    pub defaults: HashMap<String, Value>,
    pub body: Body,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Body) -> Self {
        Function { name: name.into(), params, defaults: HashMap::new(), body }
    }

    pub fn with_defaults(mut self, defaults: HashMap<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Pair each parameter with the positional argument at its index, else
    /// its default.  Parameters with neither are bound to Null and reported
    /// in the second return value.  Surplus arguments are dropped.
    pub fn bind(&self, args: Vec<Value>) -> (Vec<(String, Value)>, Vec<ScriptError>) {
        let mut args = args.into_iter();
        let mut missing = Vec::new();
        let bound = self
            .params
            .iter()
            .map(|param| {
                let value = match args.next() {
                    Some(v) => v,
                    None => match self.defaults.get(param) {
                        Some(d) => d.clone(),
                        None => {
                            missing.push(ScriptError::MissingArgument {
                                function: self.name.clone(),
                                param: param.clone(),
                            });
                            Value::Null
                        }
                    },
                };
                (param.clone(), value)
            })
            .collect();
        (bound, missing)
    }
}

/// Join a namespace prefix and a bare name.
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}:{name}"),
        None => name.to_owned(),
    }
}

// ── FunctionTable ─────────────────────────────────────────────────────────────

/// All defined functions, keyed by qualified name.
#[derive(Debug, Default)]
pub struct FunctionTable {
    funcs: HashMap<String, Rc<Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `func` under `namespace`.  Fails if the qualified name is taken;
    /// the existing entry is left untouched.
    pub fn define(&mut self, namespace: Option<&str>, mut func: Function) -> Result<(), ScriptError> {
        let name = qualify(namespace, &func.name);
        if self.funcs.contains_key(&name) {
            return Err(ScriptError::Redefine(name));
        }
        func.name = name.clone();
        self.funcs.insert(name, Rc::new(func));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.funcs.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
