//! Kusari — a small dynamically-typed scripting language.
//!
//! This crate implements a tree-walking interpreter built from:
//!
//! - reference-counted values with owning and alias handles ([`value`])
//! - a status message threaded through every operation ([`message`])
//! - registries of operations and types ([`registry`], [`types`])
//! - region-based control flow: `if` … `elif` … `else` … `end`,
//!   `while` … `end`, `for` … `end`, and `def` … `end` blocks
//! - a built-in operation catalog ([`builtins`]) extendable at runtime
//!   through [`Extension`]
//!
//! # Quick start
//!
//! ```rust
//! use kusari::Interp;
//!
//! let mut interp = Interp::new();
//! interp.exec_line("var x = 6\nprint(x * 7)");
//! assert_eq!(interp.output(), ["42"]);
//! ```

pub mod builtins;
pub mod cli;
pub mod expr;
pub mod extension;
pub mod interp;
pub mod message;
pub mod registry;
pub mod scope;
pub mod source;
pub mod stmt;
pub mod token;
pub mod tracker;
pub mod types;
pub mod value;

// Re-exports for convenience.
pub use extension::Extension;
pub use interp::Interp;
pub use message::{Code, FatalKind, Message};
pub use registry::{Arity, Entry, Operands, OpResult, Origin};
pub use source::{FileSource, MemorySource, ScriptSource, SourceError};
pub use tracker::Tracker;
pub use value::{Payload, Value};
