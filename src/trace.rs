//! Best-effort execution traces attached to causes.
//!
//! A [`Trace`] is opaque to the algebra: wrapping a cause in
//! `Cause::Traced` never changes what the cause means, only what a human
//! sees when the failure is reported. Equality and hashing ignore traces
//! entirely.

use core::fmt;
use std::sync::Arc;

/// One recorded source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceFrame {
    /// Source file, as captured at the recording site.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// Enclosing function or combinator label.
    pub label: String,
}

impl TraceFrame {
    /// Creates a frame for the given location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, label: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            label: label.into(),
        }
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.label, self.file, self.line)
    }
}

/// A best-effort execution/stack trace for one fiber.
///
/// `execution` holds the most recent effect locations (newest first),
/// `stack` the continuation frames pending at capture time, and `parent`
/// the trace of the fiber that forked this one, if known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    /// Recently executed locations, newest first.
    pub execution: Vec<TraceFrame>,
    /// Pending continuation frames at capture time.
    pub stack: Vec<TraceFrame>,
    /// Trace of the forking fiber, if known.
    pub parent: Option<Arc<Trace>>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            execution: Vec::new(),
            stack: Vec::new(),
            parent: None,
        }
    }

    /// True when the trace carries no information at all: no executed
    /// locations, no pending frames, no parent. `Cause::traced` refuses to
    /// wrap with such a trace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.execution.is_empty() && self.stack.is_empty() && self.parent.is_none()
    }

    /// Compact human-readable rendering, one frame per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut current = Some(self);
        let mut hops = 0usize;
        // Rendering is best-effort diagnostics; bound the parent walk.
        const MAX_PARENT_HOPS: usize = 16;
        while let Some(trace) = current {
            if hops > 0 {
                out.push_str("forked from:\n");
            }
            for frame in &trace.execution {
                out.push_str("  at ");
                out.push_str(&frame.to_string());
                out.push('\n');
            }
            for frame in &trace.stack {
                out.push_str("  suspended at ");
                out.push_str(&frame.to_string());
                out.push('\n');
            }
            hops += 1;
            if hops >= MAX_PARENT_HOPS {
                break;
            }
            current = trace.parent.as_deref();
        }
        out
    }
}
