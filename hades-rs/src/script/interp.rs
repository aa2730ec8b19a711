//! Hades script interpreter.
//!
//! The [`Interpreter`] owns the variable store, the function table and the
//! message log, and executes source text one line at a time.  It implements
//! [`EvalContext`] so the expression evaluator can call back into it for
//! variable reads and function calls.
//!
//! Problems are classified by [`Level`]: notices and warnings are logged and
//! the offending statement is skipped; an error is logged once, at the line
//! where it happened, and unwinds as [`ScriptError::Raised`] to the nearest
//! `execute` boundary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Config;
use crate::diag::{Diagnostics, ErrorKind, Level, Message, ScriptError};
use crate::var::{Lifetime, VarStore};

use super::block::{BlockKind, BlockStack, Capture, ForRange};
use super::builtins::{library, NativeDef};
use super::eval::{eval_list, eval_str, EvalContext};
use super::func::{qualify, Body, Function, FunctionTable};
use super::stmt::{parse_assign_list, parse_line, AssignOp, Stmt};
use super::value::{Collection, Key, Value};

// ── Source loader ─────────────────────────────────────────────────────────────

/// Resolves an `import` identifier to source text.
pub type SourceLoader = Rc<dyn Fn(&str) -> Result<String, String>>;

/// Loader reading files relative to `dir`.  Absolute identifiers are used
/// as they are.
pub fn fs_loader(dir: impl Into<PathBuf>) -> SourceLoader {
    let dir = dir.into();
    Rc::new(move |id: &str| {
        let path = Path::new(id);
        let path = if path.is_absolute() { path.to_path_buf() } else { dir.join(path) };
        std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))
    })
}

// ── Flow ──────────────────────────────────────────────────────────────────────

/// What the line loop does after a statement.
enum Flow {
    Next,
    /// Continue at this line index (loop re-entry).
    Jump(usize),
    Return(Value),
}

// ── Interpreter ───────────────────────────────────────────────────────────────

pub struct Interpreter {
    pub vars: VarStore,
    pub functions: FunctionTable,
    /// Lines produced by `echo`, in order.
    pub output: Vec<String>,
    pub config: Config,
    /// Prefix applied to functions defined from here on.
    namespace: Option<String>,
    /// Name of what is executing, for messages.
    zone: Option<String>,
    /// 1-based line within the current zone.
    line: usize,
    diag: Diagnostics,
    loader: Option<SourceLoader>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Build an interpreter and register the native libraries `config` names.
    pub fn with_config(config: Config) -> Self {
        let loader = config.import_dir.clone().map(fs_loader);
        let libs = config.libs.clone();
        let mut interp = Interpreter {
            vars: VarStore::new(),
            functions: FunctionTable::new(),
            output: Vec::new(),
            config,
            namespace: None,
            zone: None,
            line: 0,
            diag: Diagnostics::new(),
            loader,
        };
        for name in libs {
            match library(&name) {
                Some(defs) => {
                    if let Err(e) = interp.register_library(&name, defs) {
                        tracing::warn!(library = %name, "{e}");
                    }
                }
                None => tracing::warn!(library = %name, "unknown native library skipped"),
            }
        }
        interp
    }

    /// Replace the `import` resolver.
    pub fn set_loader(&mut self, loader: SourceLoader) {
        self.loader = Some(loader);
    }

    /// Register every entry of a native table under `namespace`.
    pub fn register_library(&mut self, namespace: &str, defs: &[NativeDef]) -> Result<(), ScriptError> {
        for def in defs {
            let defaults = def
                .defaults
                .iter()
                .map(|(name, lit)| (name.to_string(), Value::from(*lit)))
                .collect();
            let params = def.params.iter().map(|p| p.to_string()).collect();
            let func = Function::new(def.name, params, Body::Native(Rc::new(def.func))).with_defaults(defaults);
            self.functions.define(Some(namespace), func)?;
        }
        Ok(())
    }

    /// Expose a host closure to scripts.
    pub fn register_native<F>(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        params: &[&str],
        defaults: Vec<(&str, Value)>,
        f: F,
    ) -> Result<(), ScriptError>
    where
        F: Fn(&[Value]) -> Result<Value, ScriptError> + 'static,
    {
        let defaults: HashMap<String, Value> =
            defaults.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
        let params = params.iter().map(|p| p.to_string()).collect();
        let func = Function::new(name, params, Body::Native(Rc::new(f))).with_defaults(defaults);
        self.functions.define(namespace, func)
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Run a script.  Returns the value of a top-level `return`, `true` when
    /// the script runs off its end, or `false` when it was aborted and
    /// `throw_errors` is off.
    pub fn execute(&mut self, code: &str) -> Result<Value, ScriptError> {
        self.run(code, None)
    }

    /// Like [`execute`](Self::execute) with a zone name for messages.
    pub fn execute_in(&mut self, code: &str, zone: &str) -> Result<Value, ScriptError> {
        self.run(code, Some(zone.to_owned()))
    }

    /// Load `id` through the source loader and run it in zone `id`.
    pub fn execute_file(&mut self, id: &str) -> Result<Value, ScriptError> {
        tracing::debug!(file = id, "import");
        let loaded = match &self.loader {
            Some(load) => load(id),
            None => Err("no source loader configured".to_owned()),
        };
        match loaded {
            Ok(code) => self.run(&code, Some(id.to_owned())),
            Err(reason) => {
                let err = self.raise(ScriptError::Load { file: id.to_owned(), reason });
                self.settle(Err(err))
            }
        }
    }

    /// Evaluate a single formula.  Errors are returned, not logged.
    pub fn evaluate(&mut self, formula: &str) -> Result<Value, ScriptError> {
        eval_str(formula, self)
    }

    /// Call a function by qualified name with positional arguments.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| ScriptError::UndefinedFunction(name.to_owned()))?;
        let (bound, missing) = func.bind(args);
        for err in missing {
            self.report(err);
        }
        match &func.body {
            Body::Native(f) => {
                let values: Vec<Value> = bound.into_iter().map(|(_, v)| v).collect();
                f(&values)
            }
            Body::Script(src) => self.execute_protected(src, format!("{{{name}}}"), bound),
        }
    }

    /// Current value at `path`, if it resolves.
    pub fn var(&self, path: &str) -> Option<Value> {
        self.vars.get(path).ok()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        self.diag.messages()
    }

    pub fn take_messages(&mut self) -> Vec<Message> {
        self.diag.take()
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    fn run(&mut self, code: &str, zone: Option<String>) -> Result<Value, ScriptError> {
        tracing::debug!(zone = zone.as_deref().unwrap_or("main"), lines = code.lines().count(), "execute");
        let saved_zone = std::mem::replace(&mut self.zone, zone);
        let saved_line = self.line;
        let result = self.run_lines(code);
        self.zone = saved_zone;
        self.line = saved_line;
        self.settle(result)
    }

    /// Run `code` with the caller's locals hidden and `params` bound as fresh
    /// locals.  The caller's locals come back afterwards whatever happens.
    fn execute_protected(
        &mut self,
        code: &str,
        zone: String,
        params: Vec<(String, Value)>,
    ) -> Result<Value, ScriptError> {
        let stash = self.vars.detach_locals();
        for (name, value) in params {
            if let Err(e) = self.vars.bind(&name, value, Lifetime::Local) {
                self.report(e);
            }
        }
        let result = self.run(code, Some(zone));
        self.vars.restore_locals(stash);
        result
    }

    /// Apply the `throw_errors` policy at an execute boundary.
    fn settle(&self, result: Result<Value, ScriptError>) -> Result<Value, ScriptError> {
        match result {
            Err(ScriptError::Raised(_)) if !self.config.throw_errors => Ok(Value::Bool(false)),
            other => other,
        }
    }

    fn run_lines(&mut self, code: &str) -> Result<Value, ScriptError> {
        let lines: Vec<&str> = code.lines().collect();
        let mut blocks = BlockStack::new();
        let mut cursor = 0;

        while let Some(raw) = lines.get(cursor) {
            let index = cursor;
            cursor += 1;
            self.line = cursor;

            let line = raw.trim();

            // Captured bodies keep blank lines so their line numbers hold.
            if blocks.is_capturing() {
                if let Some(capture) = blocks.capture_line(line) {
                    if let Err(e) = self.define_captured(capture) {
                        self.recover(e)?;
                    }
                }
                continue;
            }

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            match self.exec_line(line, index, &mut blocks) {
                Ok(Flow::Next) => {}
                Ok(Flow::Jump(header)) => cursor = header,
                Ok(Flow::Return(value)) => return Ok(value),
                Err(e) => self.recover(e)?,
            }
        }

        if blocks.depth() > 0 {
            return Err(self.raise(ScriptError::MissingBlockEnd));
        }
        Ok(Value::Bool(true))
    }

    fn exec_line(&mut self, line: &str, index: usize, blocks: &mut BlockStack) -> Result<Flow, ScriptError> {
        match parse_line(line)? {
            // Block statements track nesting even on inactive paths.
            Stmt::If(cond) => {
                if blocks.enter(BlockKind::If, index).outer_active {
                    let taken = self.evaluate(cond)?.as_bool();
                    let frame = blocks.current_mut();
                    frame.active = taken;
                    frame.branch_taken = taken;
                }
            }
            Stmt::ElseIf(cond) => {
                let (frame, outer_active) = blocks.branch("elseif")?;
                let taken = outer_active && !frame.branch_taken && self.evaluate(cond)?.as_bool();
                frame.active = taken;
                frame.branch_taken |= taken;
            }
            Stmt::Else => {
                let (frame, outer_active) = blocks.branch("else")?;
                frame.active = outer_active && !frame.branch_taken;
                frame.branch_taken = true;
            }
            Stmt::While(cond) => {
                if blocks.enter(BlockKind::While, index).outer_active {
                    let go = self.evaluate(cond)?.as_bool();
                    blocks.current_mut().active = go;
                }
            }
            Stmt::For { var, start, end, step } => {
                let entry = blocks.enter(BlockKind::For(None), index);
                if !entry.outer_active {
                    return Ok(Flow::Next);
                }
                if entry.revisit {
                    let more = match &blocks.current().kind {
                        BlockKind::For(Some(range)) => self.for_advance(range)?,
                        _ => return Err(ScriptError::Internal),
                    };
                    blocks.current_mut().active = more;
                } else {
                    let range = self.for_open(var, start, end, step)?;
                    let frame = blocks.current_mut();
                    frame.kind = BlockKind::For(Some(range));
                    frame.active = true;
                }
            }
            Stmt::Foreach { var, expr } => {
                if blocks.enter(BlockKind::Foreach, index).outer_active {
                    let Value::Collection(items) = self.evaluate(expr)? else {
                        return Err(ScriptError::NotACollection);
                    };
                    let frame = blocks.current_mut();
                    let offset = frame.iteration;
                    frame.iteration += frame.step;
                    if let Some((key, value)) = items.entry_at(offset) {
                        let record: Collection = [
                            (Key::from("key"), Value::from(key)),
                            (Key::from("value"), value.clone()),
                        ]
                        .into_iter()
                        .collect();
                        self.vars.bind(var, Value::Collection(record), Lifetime::Local)?;
                        blocks.current_mut().active = true;
                    }
                }
            }
            Stmt::Function { name, params } => {
                let mut capture = Capture {
                    name: qualify(self.namespace.as_deref(), name),
                    register: blocks.active(),
                    ..Capture::default()
                };
                let prepared = if capture.register {
                    self.prepare_capture(&mut capture, params)
                } else {
                    Ok(())
                };
                if prepared.is_err() {
                    capture.register = false;
                }
                blocks.begin_capture(capture, index);
                prepared?;
            }
            Stmt::End => {
                if let Some(header) = blocks.close()? {
                    return Ok(Flow::Jump(header));
                }
            }

            _ if !blocks.active() => {}

            Stmt::Return(expr) => {
                let value = match expr {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Echo(expr) => {
                let text = self.evaluate(expr)?.to_string();
                if self.config.silent {
                    self.record(Level::Notice, None, text);
                } else {
                    self.output.push(text);
                }
            }
            Stmt::Eval(expr) => {
                let code = self.evaluate(expr)?.to_string();
                let zone = self.zone.clone();
                self.run(&code, zone)?;
            }
            Stmt::Import(expr) => {
                let id = self.evaluate(expr)?.to_string();
                self.execute_file(&id)?;
            }
            Stmt::Namespace(expr) => {
                self.namespace = match expr {
                    Some(e) => Some(self.evaluate(e)?.to_string()),
                    None => None,
                };
            }
            Stmt::Declare { lifetime, list } => {
                for (name, init) in parse_assign_list(list)? {
                    let value = match init {
                        Some(src) => self.evaluate(&src)?,
                        None => Value::Null,
                    };
                    if let Err(e) = self.vars.declare(&name, value, lifetime) {
                        self.recover(e)?;
                    }
                }
            }
            Stmt::Set { path, op, expr } => self.assign(path, op, expr)?,
            Stmt::Call { name, args } => {
                let values = match args {
                    Some(a) => eval_list(a, self)?,
                    None => Vec::new(),
                };
                self.call(name, values)?;
            }
        }
        Ok(Flow::Next)
    }

    /// First visit of a `for` header: evaluate the bounds and bind the
    /// counter.  The step's sign follows the direction from start to end.
    fn for_open(
        &mut self,
        var: &str,
        start: &str,
        end: &str,
        step: Option<&str>,
    ) -> Result<ForRange, ScriptError> {
        let from = self.evaluate(start)?.as_number();
        let end = self.evaluate(end)?.as_number();
        let step = match step {
            Some(s) => self.evaluate(s)?.as_number().abs(),
            None => 1.0,
        };
        if step == 0.0 || step.is_nan() {
            return Err(ScriptError::InvalidStep);
        }
        let step = if end > from {
            step
        } else if end < from {
            -step
        } else {
            0.0
        };
        self.vars.bind(var, Value::Number(from), Lifetime::Local)?;
        Ok(ForRange { var: var.to_owned(), end, step })
    }

    /// Later visits: move the counter one step, or report the loop done.
    fn for_advance(&mut self, range: &ForRange) -> Result<bool, ScriptError> {
        if range.step == 0.0 {
            return Ok(false);
        }
        let next = self.vars.get(&range.var)?.as_number() + range.step;
        let more = if range.step > 0.0 { next <= range.end } else { next >= range.end };
        if more {
            self.vars.set(&range.var, Value::Number(next))?;
        }
        Ok(more)
    }

    fn assign(&mut self, path: &str, op: AssignOp, expr: &str) -> Result<(), ScriptError> {
        let base = path.split('.').next().unwrap_or(path);
        if self.vars.lifetime(base) == Some(Lifetime::Const) {
            return Err(ScriptError::AssignConst(base.to_owned()));
        }
        let rhs = self.evaluate(expr)?;
        let value = match op {
            AssignOp::Assign => rhs,
            _ => {
                let current = if self.vars.contains(base) { self.get_var(path)? } else { Value::Null };
                match op {
                    AssignOp::Add => current.add(&rhs),
                    AssignOp::Sub => current.sub(&rhs),
                    AssignOp::Mul => current.mul(&rhs),
                    AssignOp::Div => current.div(&rhs).ok_or(ScriptError::DivisionByZero)?,
                    AssignOp::Assign => rhs,
                }
            }
        };
        self.vars.set(path, value)
    }

    /// Check the name and evaluate default parameter values at the opener.
    fn prepare_capture(&mut self, capture: &mut Capture, params: Option<&str>) -> Result<(), ScriptError> {
        if self.functions.contains(&capture.name) {
            return Err(ScriptError::Redefine(capture.name.clone()));
        }
        for (param, init) in parse_assign_list(params.unwrap_or(""))? {
            if let Some(src) = init {
                let value = self.evaluate(&src)?;
                capture.defaults.insert(param.clone(), value);
            }
            capture.params.push(param);
        }
        Ok(())
    }

    fn define_captured(&mut self, capture: Capture) -> Result<(), ScriptError> {
        if !capture.register {
            return Ok(());
        }
        tracing::debug!(function = %capture.name, params = capture.params.len(), "define");
        let body = capture.body();
        let func = Function::new(capture.name, capture.params, Body::Script(body)).with_defaults(capture.defaults);
        self.functions.define(None, func)
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    fn record(&mut self, level: Level, kind: Option<ErrorKind>, text: String) -> Message {
        let msg = Message { level, kind, text, zone: self.zone.clone(), line: self.line };
        self.diag.push(msg.clone());
        msg
    }

    /// Log `err` at its own level.
    fn report(&mut self, err: ScriptError) {
        self.record(err.level(), Some(err.kind()), err.to_string());
    }

    /// Log `err` as an error and turn it into `Raised`.  Already raised
    /// errors pass through unlogged.
    fn raise(&mut self, err: ScriptError) -> ScriptError {
        match err {
            ScriptError::Raised(_) => err,
            e => ScriptError::Raised(self.record(Level::Error, Some(e.kind()), e.to_string())),
        }
    }

    /// Log a failed statement.  Below error level execution continues;
    /// otherwise the error unwinds.
    fn recover(&mut self, err: ScriptError) -> Result<(), ScriptError> {
        match err {
            ScriptError::Raised(_) => Err(err),
            e if e.level() < Level::Error => {
                self.report(e);
                Ok(())
            }
            e => Err(self.raise(e)),
        }
    }
}

// ── EvalContext impl ──────────────────────────────────────────────────────────

impl EvalContext for Interpreter {
    fn get_var(&mut self, path: &str) -> Result<Value, ScriptError> {
        match self.vars.get(path) {
            Ok(v) => Ok(v),
            Err(e) if e.level() < Level::Error => {
                self.report(e);
                Ok(Value::Null)
            }
            Err(e) => Err(e),
        }
    }

    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        self.call(name, args)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
