//! Block-state machine.
//!
//! Control flow is decided line by line without building a syntax tree.
//! Each nesting depth owns one [`BlockFrame`]; `frames[0]` is the implicit,
//! always-active main block.  Openers increment the depth and create (or,
//! for a loop being re-entered, revisit) the frame at the new depth; `end`
//! decrements it and either drops the frame or, for an active loop, sends
//! the line cursor back to the loop header.
//!
//! While a function body is being captured the stack only counts openers
//! and `end`s so that the capture's own `end` can be recognised; the lines
//! themselves are buffered instead of executed.

use std::collections::HashMap;

use crate::diag::ScriptError;

use super::stmt::{line_shape, LineShape};
use super::value::Value;

/// Evaluated bounds of a `for` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ForRange {
    pub var: String,
    pub end: f64,
    /// Signed: positive counts up, negative down, zero runs once.
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Main,
    If,
    While,
    For(Option<ForRange>),
    Foreach,
    Function,
}

impl BlockKind {
    pub fn is_loop(&self) -> bool {
        matches!(self, BlockKind::While | BlockKind::For(_) | BlockKind::Foreach)
    }
}

/// A function definition being collected.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// Qualified name.
    pub name: String,
    pub params: Vec<String>,
    pub defaults: HashMap<String, Value>,
    /// False when the opener sat on an inactive path: the body is consumed
    /// but not defined.
    pub register: bool,
    pub lines: Vec<String>,
}

impl Capture {
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct BlockFrame {
    pub kind: BlockKind,
    pub active: bool,
    /// Index of the opener line.
    pub header: usize,
    pub iteration: usize,
    pub step: usize,
    pub branch_taken: bool,
    pub capture: Option<Capture>,
}

impl BlockFrame {
    fn new(kind: BlockKind, header: usize) -> Self {
        BlockFrame {
            kind,
            active: false,
            header,
            iteration: 0,
            step: 1,
            branch_taken: false,
            capture: None,
        }
    }
}

/// Result of entering a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// The frame already existed: this is a loop coming round again.
    pub revisit: bool,
    /// The enclosing block is active.
    pub outer_active: bool,
}

#[derive(Debug)]
pub struct BlockStack {
    frames: Vec<BlockFrame>,
    depth: usize,
    /// Depth of the function frame whose body is being captured.
    capturing: Option<usize>,
}

impl Default for BlockStack {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStack {
    pub fn new() -> Self {
        let mut main = BlockFrame::new(BlockKind::Main, 0);
        main.active = true;
        BlockStack { frames: vec![main], depth: 0, capturing: None }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether statements at the current depth should run.
    pub fn active(&self) -> bool {
        self.frames[self.depth].active
    }

    pub fn current(&self) -> &BlockFrame {
        &self.frames[self.depth]
    }

    pub fn current_mut(&mut self) -> &mut BlockFrame {
        &mut self.frames[self.depth]
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.is_some()
    }

    /// Open a block whose opener sits at line index `header`.
    ///
    /// A frame left at the new depth by the same header is a loop being
    /// re-entered and is kept; anything else starts a fresh frame.  Either
    /// way the frame is inactive until the caller decides otherwise.
    pub fn enter(&mut self, kind: BlockKind, header: usize) -> Entry {
        let outer_active = self.active();
        self.depth += 1;
        let revisit = self
            .frames
            .get(self.depth)
            .is_some_and(|f| f.header == header && f.kind.is_loop() && kind.is_loop());
        if revisit {
            self.frames[self.depth].active = false;
        } else {
            self.frames.truncate(self.depth);
            self.frames.push(BlockFrame::new(kind, header));
        }
        Entry { revisit, outer_active }
    }

    /// The `if` frame an `elseif`/`else` continues, plus whether its
    /// enclosing block is active.
    pub fn branch(&mut self, keyword: &'static str) -> Result<(&mut BlockFrame, bool), ScriptError> {
        if self.depth == 0 || self.frames[self.depth].kind != BlockKind::If {
            return Err(ScriptError::DanglingBranch(keyword));
        }
        let outer_active = self.frames[self.depth - 1].active;
        Ok((&mut self.frames[self.depth], outer_active))
    }

    /// Process `end`.  Returns the header line index to jump back to when
    /// an active loop comes round again.
    pub fn close(&mut self) -> Result<Option<usize>, ScriptError> {
        if self.depth == 0 {
            return Err(ScriptError::UnexpectedBlockEnd);
        }
        let frame = &self.frames[self.depth];
        let jump = (frame.kind.is_loop() && frame.active).then_some(frame.header);
        if jump.is_none() {
            self.frames.truncate(self.depth);
        }
        self.depth -= 1;
        Ok(jump)
    }

    /// Open a function frame and start buffering its body.
    pub fn begin_capture(&mut self, capture: Capture, header: usize) {
        self.enter(BlockKind::Function, header);
        self.current_mut().capture = Some(capture);
        self.capturing = Some(self.depth);
    }

    /// Feed one line while capturing.  Returns the finished capture when
    /// `line` is the `end` closing it.
    pub fn capture_line(&mut self, line: &str) -> Option<Capture> {
        let target = self.capturing?;
        match line_shape(line) {
            LineShape::End if self.depth == target => {
                let capture = self.frames.get_mut(target).and_then(|f| f.capture.take());
                self.frames.truncate(target);
                self.depth -= 1;
                self.capturing = None;
                return capture;
            }
            LineShape::End => self.depth -= 1,
            LineShape::Opener => self.depth += 1,
            LineShape::Other => {}
        }
        if let Some(capture) = self.frames.get_mut(target).and_then(|f| f.capture.as_mut()) {
            capture.lines.push(line.to_owned());
        }
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
