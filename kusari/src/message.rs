//! Status envelope passed between operations, the evaluator, the sequencer,
//! and the driver.
//!
//! Every native or user operation returns a [`Message`]: a status code, a
//! human-readable detail string, and an optional captured value. Success and
//! redirect carry results; head/tail steer the statement sequencer; fatal
//! codes abort the enclosing block and bubble to the caller.

use std::fmt;

use crate::value::Value;

/// Classification of fatal results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Arity or argument-type mismatch in an operation call.
    IllegalArguments,
    /// Entry or object not found, or not callable where a call was made.
    IllegalCall,
    /// Bracket mismatch, malformed operator sequence, or other statement
    /// text that cannot be evaluated.
    IllegalSymbol,
    /// An Entry registered without a usable arity was invoked.
    BrokenEntry,
    /// A block call's argument count does not match its parameter list.
    ParameterCountMismatch,
    /// Anything else.
    Generic,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FatalKind::IllegalArguments => "illegal arguments",
            FatalKind::IllegalCall => "illegal call",
            FatalKind::IllegalSymbol => "illegal symbol",
            FatalKind::BrokenEntry => "broken entry",
            FatalKind::ParameterCountMismatch => "parameter count mismatch",
            FatalKind::Generic => "fatal",
        };
        f.write_str(text)
    }
}

/// Result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// Normal completion; the detail or captured value is the result.
    Success,
    /// Completion with a condition worth reporting; execution continues.
    Warning,
    /// Completion whose result is the captured value, never the detail text.
    Redirect,
    /// A head statement whose condition held: open (or re-enter) a region.
    HeadTrue,
    /// A head statement whose condition failed: leave its region.
    HeadFalse,
    /// A region terminator.
    Tail,
    /// `return` — unwind the current block with the captured value.
    Return,
    /// `quit` — end the driving loop.
    Quit,
    /// Abort the statement and the enclosing block.
    Fatal(FatalKind),
}

/// One operation/statement result.
#[derive(Debug, Clone)]
pub struct Message {
    pub code: Code,
    pub detail: String,
    pub object: Option<Value>,
}

impl Message {
    pub fn success() -> Message {
        Message {
            code: Code::Success,
            detail: String::new(),
            object: None,
        }
    }

    /// Success carrying a result value.
    pub fn with_value(value: Value) -> Message {
        Message {
            code: Code::Success,
            detail: String::new(),
            object: Some(value),
        }
    }

    /// Redirect: the captured value is the result (used by operations whose
    /// result has no faithful text form, e.g. constructors and aliases).
    pub fn redirect(value: Value) -> Message {
        Message {
            code: Code::Redirect,
            detail: String::new(),
            object: Some(value),
        }
    }

    pub fn warning(detail: impl Into<String>) -> Message {
        Message {
            code: Code::Warning,
            detail: detail.into(),
            object: None,
        }
    }

    pub fn head(truth: bool) -> Message {
        Message {
            code: if truth { Code::HeadTrue } else { Code::HeadFalse },
            detail: String::new(),
            object: None,
        }
    }

    pub fn tail() -> Message {
        Message {
            code: Code::Tail,
            detail: String::new(),
            object: None,
        }
    }

    pub fn ret(value: Value) -> Message {
        Message {
            code: Code::Return,
            detail: String::new(),
            object: Some(value),
        }
    }

    pub fn quit() -> Message {
        Message {
            code: Code::Quit,
            detail: String::new(),
            object: None,
        }
    }

    pub fn fatal(kind: FatalKind, detail: impl Into<String>) -> Message {
        Message {
            code: Code::Fatal(kind),
            detail: detail.into(),
            object: None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.code, Code::Fatal(_))
    }

    pub fn fatal_kind(&self) -> Option<FatalKind> {
        match self.code {
            Code::Fatal(kind) => Some(kind),
            _ => None,
        }
    }

    /// The carried value, or null for plain successes.
    pub fn value(&self) -> Value {
        self.object.clone().unwrap_or_else(Value::null)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
