//! `hadesrc` configuration file parser.
//!
//! One `key = value` setting per line:
//!
//! | Key            | Value                                  | Default                  |
//! |----------------|----------------------------------------|--------------------------|
//! | `silent`       | `true`/`false`/`on`/`off`/`1`/`0`      | `false`                  |
//! | `throw_errors` | same                                   | `true`                   |
//! | `libs`         | comma-separated library names          | `math, string, array`    |
//! | `import_dir`   | directory for relative `import` paths  | none                     |
//!
//! Lines starting with `;` are comments.  Bad lines are reported and skipped;
//! they never abort loading.

use std::path::{Path, PathBuf};

use thiserror::Error;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Route `echo` output into the message log instead of `output`.
    pub silent: bool,
    /// Abort and return `Err` on ERROR-level diagnostics.
    pub throw_errors: bool,
    /// Native libraries registered at construction.
    pub libs: Vec<String>,
    /// Base directory for `import` and `execute_file`.
    pub import_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            silent: false,
            throw_errors: true,
            libs: ["math", "string", "array"].iter().map(|s| s.to_string()).collect(),
            import_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `hadesrc` text on top of the defaults.
    ///
    /// Returns the config and a list of any errors on individual lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError { line: lineno, message: format!("expected key = value: {line}") });
                continue;
            };
            if let Err(message) = config.apply(key.trim(), value.trim()) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "silent" => self.silent = parse_bool(value)?,
            "throw_errors" => self.throw_errors = parse_bool(value)?,
            "libs" => {
                self.libs = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
            }
            "import_dir" => {
                if value.is_empty() {
                    return Err("import_dir needs a path".to_owned());
                }
                self.import_dir = Some(PathBuf::from(value));
            }
            other => return Err(format!("unknown setting '{other}'")),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid boolean '{value}'")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
