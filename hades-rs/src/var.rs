//! Variable store with lifetimes and dotted-path access.
//!
//! Variables are keyed by base name.  A path such as `player.items.0`
//! addresses nested [`Collection`] entries below the base variable; reads
//! and writes walk the in-memory structure directly.

use std::collections::HashMap;

use crate::diag::ScriptError;
use crate::script::value::{Collection, Key, Value};

/// How long a variable lives and whether it may be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Scoped to the current protected execution (function call).
    Local,
    /// Survives function calls.
    Global,
    /// Write-once.
    Const,
}

#[derive(Debug, Clone, PartialEq)]
struct Variable {
    value: Value,
    lifetime: Lifetime,
}

/// Locals detached by [`VarStore::detach_locals`], to be handed back to
/// [`VarStore::restore_locals`].
#[derive(Debug, Default)]
pub struct LocalStash {
    vars: HashMap<String, Variable>,
}

/// Named bindings.
#[derive(Debug, Default)]
pub struct VarStore {
    vars: HashMap<String, Variable>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new variable.  Fails if `name` exists or is a path.
    pub fn declare(&mut self, name: &str, value: Value, lifetime: Lifetime) -> Result<(), ScriptError> {
        if name.contains('.') {
            return Err(ScriptError::SubvalueDeclaration(name.to_owned()));
        }
        if self.vars.contains_key(name) {
            return Err(ScriptError::Redeclare(name.to_owned()));
        }
        self.vars.insert(name.to_owned(), Variable { value, lifetime });
        Ok(())
    }

    /// Bind `name` to `value`, creating it with `lifetime` when absent.
    ///
    /// Used for loop variables and call parameters, which are (re)bound on
    /// every entry.  An existing Global is written in place and stays Global,
    /// so it is still there once the surrounding locals are restored.
    pub fn bind(&mut self, name: &str, value: Value, lifetime: Lifetime) -> Result<(), ScriptError> {
        if name.contains('.') {
            return Err(ScriptError::SubvalueDeclaration(name.to_owned()));
        }
        match self.vars.get_mut(name) {
            Some(var) if var.lifetime == Lifetime::Const => {
                Err(ScriptError::AssignConst(name.to_owned()))
            }
            Some(var) if var.lifetime == Lifetime::Global => {
                var.value = value;
                Ok(())
            }
            _ => {
                self.vars.insert(name.to_owned(), Variable { value, lifetime });
                Ok(())
            }
        }
    }

    /// Read the value at `path`.
    ///
    /// An undeclared base name is [`ScriptError::UndefinedVariable`]; a
    /// missing key below an existing variable is [`ScriptError::UndefinedKey`].
    pub fn get(&self, path: &str) -> Result<Value, ScriptError> {
        let (name, keys) = split_path(path)?;
        let var = self
            .vars
            .get(name)
            .ok_or_else(|| ScriptError::UndefinedVariable(name.to_owned()))?;
        lookup(&var.value, &keys)
            .cloned()
            .ok_or_else(|| ScriptError::UndefinedKey(path.to_owned()))
    }

    /// Assign `value` at `path`, declaring the base name as Local when it
    /// does not exist yet and creating intermediate Collections on the way.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ScriptError> {
        let (name, keys) = split_path(path)?;
        let var = self.vars.entry(name.to_owned()).or_insert_with(|| Variable {
            value: Value::Null,
            lifetime: Lifetime::Local,
        });
        if var.lifetime == Lifetime::Const {
            return Err(ScriptError::AssignConst(name.to_owned()));
        }
        assign(&mut var.value, &keys, value, path)
    }

    pub fn lifetime(&self, name: &str) -> Option<Lifetime> {
        self.vars.get(name).map(|v| v.lifetime)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Detach every Local variable, leaving Globals and Consts in place.
    pub fn detach_locals(&mut self) -> LocalStash {
        let names: Vec<String> = self
            .vars
            .iter()
            .filter(|(_, v)| v.lifetime == Lifetime::Local)
            .map(|(k, _)| k.clone())
            .collect();
        let vars = names
            .into_iter()
            .filter_map(|k| self.vars.remove_entry(&k))
            .collect();
        LocalStash { vars }
    }

    /// Discard every current Local and reinstate the stashed ones.  Stashed
    /// variables take precedence over same-named variables created since.
    pub fn restore_locals(&mut self, stash: LocalStash) {
        self.vars.retain(|_, v| v.lifetime != Lifetime::Local);
        self.vars.extend(stash.vars);
    }
}

// ── Path walking ──────────────────────────────────────────────────────────────

/// Split `a.b.0` into the base name and parsed keys.
fn split_path(path: &str) -> Result<(&str, Vec<Key>), ScriptError> {
    let mut segments = path.split('.');
    let name = segments.next().unwrap_or_default();
    let keys = segments
        .map(|seg| {
            Key::from_segment(seg).ok_or_else(|| ScriptError::InvalidKey {
                path: path.to_owned(),
                segment: seg.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name, keys))
}

fn lookup<'v>(value: &'v Value, keys: &[Key]) -> Option<&'v Value> {
    match keys.split_first() {
        None => Some(value),
        Some((key, rest)) => match value {
            Value::Collection(c) => lookup(c.get(key)?, rest),
            _ => None,
        },
    }
}

fn assign(slot: &mut Value, keys: &[Key], value: Value, path: &str) -> Result<(), ScriptError> {
    let Some((key, rest)) = keys.split_first() else {
        *slot = value;
        return Ok(());
    };
    if matches!(slot, Value::Null | Value::Bool(false)) {
        *slot = Value::Collection(Collection::new());
    }
    match slot {
        Value::Collection(c) => assign(c.entry_mut(key.clone()), rest, value, path),
        other => Err(ScriptError::NotIndexable {
            path: path.to_owned(),
            found: other.type_name(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
