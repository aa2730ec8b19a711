//! Runtime value type for the Hades scripting language.
//!
//! Hades is dynamically typed.  Operators look at the runtime variant of
//! their operands and coerce freely between numbers and strings when needed.
//! The single composite type, [`Collection`], is an insertion-ordered map
//! from integer-or-string keys and serves as both list and dictionary.

use std::cmp::Ordering;
use std::fmt;

// ── Key ───────────────────────────────────────────────────────────────────────

/// A Collection key: either an integer index or an identifier-like name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(i64),
    Name(String),
}

impl Key {
    /// Parse one segment of a dotted variable path.
    ///
    /// Digits-only segments become [`Key::Index`], identifier-shaped segments
    /// become [`Key::Name`]; anything else is rejected.
    pub fn from_segment(segment: &str) -> Option<Key> {
        let mut chars = segment.chars();
        let first = chars.next()?;
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            return segment.parse().ok().map(Key::Index);
        }
        if (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Some(Key::Name(segment.to_owned()));
        }
        None
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(n) => write!(f, "{n}"),
            Key::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Index(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_owned())
    }
}

// ── Collection ────────────────────────────────────────────────────────────────

/// Ordered sequence of `(Key, Value)` entries.  Keys are unique; insertion
/// order is preserved and is the iteration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    entries: Vec<(Key, Value)>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Mutable access to the value under `key`, inserting Null if absent.
    pub fn entry_mut(&mut self, key: Key) -> &mut Value {
        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                self.entries.push((key, Value::Null));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Set `key` to `value`, replacing in place or appending a new entry.
    pub fn insert(&mut self, key: Key, value: Value) {
        *self.entry_mut(key) = value;
    }

    /// Append `value` under the next free integer key (one past the largest
    /// integer key so far, or 0).  When the largest key is `i64::MAX` the
    /// lowest unused non-negative key is taken instead.
    pub fn push(&mut self, value: Value) {
        let entries = &self.entries;
        let indices = move || {
            entries.iter().filter_map(|(k, _)| match k {
                Key::Index(n) => Some(*n),
                Key::Name(_) => None,
            })
        };
        let next = match indices().max() {
            None => 0,
            Some(n) => match n.checked_add(1) {
                Some(next) => next.max(0),
                None => (0..).find(|i| !indices().any(|n| n == *i)).unwrap_or(0),
            },
        };
        self.entries.push((Key::Index(next), value));
    }

    /// Entry at position `offset` in insertion order.
    pub fn entry_at(&self, offset: usize) -> Option<(&Key, &Value)> {
        self.entries.get(offset).map(|(k, v)| (k, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Concatenate: integer-keyed entries of `other` are renumbered onto the
    /// end of `self`, name-keyed entries overwrite same-named ones.
    pub fn append(&self, other: &Collection) -> Collection {
        let mut out = Collection::new();
        for (k, v) in self.iter().chain(other.iter()) {
            match k {
                Key::Index(_) => out.push(v.clone()),
                Key::Name(_) => out.insert(k.clone(), v.clone()),
            }
        }
        out
    }

    /// Entries of `self` whose value loosely equals none of `other`'s values.
    /// Keys are kept as they were.
    pub fn difference(&self, other: &Collection) -> Collection {
        let entries = self
            .entries
            .iter()
            .filter(|(_, v)| !other.values().any(|o| v.loose_eq(o)))
            .cloned()
            .collect();
        Collection { entries }
    }

    /// Slice by position.  Integer keys are renumbered from 0, name keys kept.
    pub fn slice(&self, start: usize, end: usize) -> Collection {
        let mut out = Collection::new();
        for (k, v) in self.entries.iter().take(end).skip(start) {
            match k {
                Key::Index(_) => out.push(v.clone()),
                Key::Name(_) => out.insert(k.clone(), v.clone()),
            }
        }
        out
    }

    /// Number of entries, descending into nested Collections when `recursive`.
    pub fn count(&self, recursive: bool) -> usize {
        self.entries
            .iter()
            .map(|(_, v)| match v {
                Value::Collection(c) if recursive => 1 + c.count(true),
                _ => 1,
            })
            .sum()
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut out = Collection::new();
        for v in iter {
            out.push(v);
        }
        out
    }
}

impl FromIterator<(Key, Value)> for Collection {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut out = Collection::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A Hades runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Collection(Collection),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(x) => {
                // Integral numbers print without a fractional part.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{}", *x as i64)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Collection(c) => {
                f.write_str("[")?;
                for (i, (k, v)) in c.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Key::Name(name) = k {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Value {
    /// Truthiness: Null, `false`, `0`, `""`, `"0"` and empty Collections are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0",
            Value::Collection(c) => !c.is_empty(),
        }
    }

    /// Coerce to `f64`.  Non-numeric strings are 0.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(x) => *x,
            Value::Str(s) => s.trim().parse().unwrap_or(0.0),
            Value::Collection(c) => f64::from(u8::from(!c.is_empty())),
        }
    }

    /// Coerce to a string.
    pub fn as_str(&self) -> String {
        self.to_string()
    }

    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Collection(_) => "collection",
        }
    }

    /// Number, Bool and Null take part in arithmetic without string fallback.
    fn is_numeric(&self) -> bool {
        matches!(self, Value::Null | Value::Bool(_) | Value::Number(_))
    }

    /// Parse a string that looks like a number in full.
    fn numeric_str(&self) -> Option<f64> {
        match self {
            Value::Str(s) => s.trim().parse().ok().filter(|_| !s.trim().is_empty()),
            _ => None,
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// `+`: numeric add, Collection concatenation, append onto a Collection,
    /// or string concatenation.
    pub fn add(&self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Collection(a), Value::Collection(b)) => Value::Collection(a.append(b)),
            (Value::Collection(a), other) => {
                let mut out = a.clone();
                out.push(other.clone());
                Value::Collection(out)
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Value::Number(a.as_number() + b.as_number())
            }
            (a, b) => Value::Str(format!("{a}{b}")),
        }
    }

    /// `-`: numeric subtract, Collection difference, or substring removal.
    pub fn sub(&self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Collection(a), Value::Collection(b)) => Value::Collection(a.difference(b)),
            (Value::Str(a), Value::Str(b)) if self.numeric_str().is_none() && !b.is_empty() => {
                Value::Str(a.replace(b.as_str(), ""))
            }
            (a, b) => Value::Number(a.as_number() - b.as_number()),
        }
    }

    pub fn mul(&self, rhs: &Value) -> Value {
        Value::Number(self.as_number() * rhs.as_number())
    }

    /// Returns `None` on division by zero.
    pub fn div(&self, rhs: &Value) -> Option<Value> {
        let b = rhs.as_number();
        if b == 0.0 {
            return None;
        }
        Some(Value::Number(self.as_number() / b))
    }

    /// Integer remainder.  Returns `None` when the truncated divisor is zero.
    pub fn rem(&self, rhs: &Value) -> Option<Value> {
        let a = self.as_number().trunc() as i64;
        let b = rhs.as_number().trunc() as i64;
        if b == 0 {
            return None;
        }
        Some(Value::Number(a.wrapping_rem(b) as f64))
    }

    pub fn pow(&self, rhs: &Value) -> Value {
        Value::Number(self.as_number().powf(rhs.as_number()))
    }

    pub fn neg(&self) -> Value {
        Value::Number(-self.as_number())
    }

    // ── Comparison helpers ────────────────────────────────────────────────────

    /// Value equality with numeric coercion (`==`).
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Null, other) | (other, Value::Null) => !other.as_bool(),
            (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == other.as_bool(),
            (Value::Collection(a), Value::Collection(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            (Value::Collection(_), _) | (_, Value::Collection(_)) => false,
            _ => self.loose_cmp(rhs) == Some(Ordering::Equal),
        }
    }

    /// Ordering with numeric coercion (`<`, `<=`, `>`, `>=`).
    ///
    /// Two strings compare numerically only when both look like numbers.
    pub fn loose_cmp(&self, rhs: &Value) -> Option<Ordering> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => match (self.numeric_str(), rhs.numeric_str()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => Some(a.cmp(b)),
            },
            (Value::Collection(a), Value::Collection(b)) => Some(a.len().cmp(&b.len())),
            (Value::Collection(_), _) => Some(Ordering::Greater),
            (_, Value::Collection(_)) => Some(Ordering::Less),
            (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
                Some(self.as_bool().cmp(&rhs.as_bool()))
            }
            (Value::Number(x), Value::Str(_)) => match rhs.numeric_str() {
                Some(y) => x.partial_cmp(&y),
                None => Some(self.as_str().cmp(&rhs.as_str())),
            },
            (Value::Str(_), Value::Number(y)) => match self.numeric_str() {
                Some(x) => x.partial_cmp(y),
                None => Some(self.as_str().cmp(&rhs.as_str())),
            },
            (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        }
    }

    /// Identity (`===`): same variant and same value.
    pub fn identical(&self, rhs: &Value) -> bool {
        self == rhs
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<&Key> for Value {
    fn from(key: &Key) -> Self {
        match key {
            Key::Index(n) => Value::from(*n),
            Key::Name(s) => Value::from(s.as_str()),
        }
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
