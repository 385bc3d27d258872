//! The operation registry ("entry table").
//!
//! Every callable thing in the language — builtin operations, the shared
//! infix operator entry, user `def` blocks, plugin registrations — is an
//! [`Entry`] keyed by name plus an optional owning-type domain. Binary
//! operator symbols have no entries of their own; they all resolve to the
//! single entry named [`INFIX_ENTRY`], which receives the operator symbol
//! as its trailing argument.
//!
//! Invariants:
//! - `(name, domain)` identifies exactly one entry; re-registration
//!   replaces.
//! - `revoke_plugins` removes plugin-origin entries and nothing else.

use std::collections::HashMap;
use std::rc::Rc;

use crate::interp::Interp;
use crate::message::{FatalKind, Message};
use crate::stmt::Block;
use crate::value::Value;

/// Name of the shared infix operator entry.
pub const INFIX_ENTRY: &str = "infix";

/// Who registered an entry or type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Core,
    User,
    Plugin,
}

/// Declared argument count of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
    /// Registered without a usable arity; invoking such an entry is a
    /// broken-entry fatal.
    Undefined,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => *n == count,
            Arity::Variadic => true,
            Arity::Undefined => false,
        }
    }
}

/// Shorthand for native operation results: `Err` carries an early-exit
/// Message (almost always a fatal) and is flattened into the call result.
pub type OpResult = Result<Message, Message>;

/// Native operation implementation.
pub type NativeFn = fn(&mut Interp, Operands) -> OpResult;

/// What an entry runs when invoked.
#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    Block(Rc<Block>),
}

/// One registered operation.
#[derive(Clone)]
pub struct Entry {
    name: String,
    domain: Option<String>,
    arity: Arity,
    origin: Origin,
    infix: bool,
    params: Option<Vec<String>>,
    callable: Callable,
}

impl Entry {
    /// Native entry; core origin unless overridden.
    pub fn native(name: impl Into<String>, arity: Arity, f: NativeFn) -> Entry {
        Entry {
            name: name.into(),
            domain: None,
            arity,
            origin: Origin::Core,
            infix: false,
            params: None,
            callable: Callable::Native(f),
        }
    }

    /// User-defined block entry; arity and parameter names come from the
    /// block's declared parameter list.
    pub fn block(name: impl Into<String>, block: Rc<Block>) -> Entry {
        let params = block.params().to_vec();
        Entry {
            name: name.into(),
            domain: None,
            arity: Arity::Exact(params.len()),
            origin: Origin::User,
            infix: false,
            params: Some(params),
            callable: Callable::Block(block),
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Entry {
        self.origin = origin;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Entry {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Entry {
        self.params = Some(params);
        self
    }

    pub fn as_infix(mut self) -> Entry {
        self.infix = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_infix(&self) -> bool {
        self.infix
    }

    pub fn params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Bind already-evaluated argument values into an ordered operand map:
    /// by declared parameter name when a parameter list exists, by numeric
    /// index otherwise.
    pub fn bind_args(&self, values: Vec<Value>) -> Operands {
        match &self.params {
            Some(params) if params.len() >= values.len() => {
                Operands::named(params, values)
            }
            _ => Operands::positional(values),
        }
    }
}

/// Ordered name→value argument map handed to operation callables.
#[derive(Default)]
pub struct Operands {
    slots: Vec<(String, Value)>,
}

impl Operands {
    pub fn new() -> Operands {
        Operands::default()
    }

    /// Values keyed by their numeric index (`"0"`, `"1"`, …).
    pub fn positional(values: Vec<Value>) -> Operands {
        let slots = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        Operands { slots }
    }

    /// Values keyed by declared parameter names, in declaration order.
    pub fn named(params: &[String], values: Vec<Value>) -> Operands {
        let slots = params.iter().cloned().zip(values).collect();
        Operands { slots }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.slots.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots
            .iter()
            .find_map(|(n, v)| if n == name { Some(v) } else { None })
    }

    /// Value in slot `i` (slot order is argument order).
    pub fn at(&self, i: usize) -> Option<&Value> {
        self.slots.get(i).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(n, v)| (n.as_str(), v))
    }

    // ── Typed accessors for native operations ────────────────────────────────

    pub fn value_arg(&self, i: usize, op: &str) -> Result<Value, Message> {
        self.at(i).cloned().ok_or_else(|| {
            Message::fatal(
                FatalKind::IllegalArguments,
                format!("{op}: missing argument {i}"),
            )
        })
    }

    pub fn str_arg(&self, i: usize, op: &str) -> Result<String, Message> {
        Ok(self.value_arg(i, op)?.as_str())
    }

    pub fn int_arg(&self, i: usize, op: &str) -> Result<i64, Message> {
        Ok(self.value_arg(i, op)?.as_int())
    }
}

type EntryKey = (String, Option<String>);

/// Table of entries keyed by `(name, domain)`.
#[derive(Default)]
pub struct OperationRegistry {
    table: HashMap<EntryKey, Entry>,
}

impl OperationRegistry {
    pub fn new() -> OperationRegistry {
        OperationRegistry::default()
    }

    /// Register an entry, replacing any previous `(name, domain)` holder.
    pub fn register(&mut self, entry: Entry) {
        let key = (entry.name.clone(), entry.domain.clone());
        self.table.insert(key, entry);
    }

    /// Remove the plain (domain-less) entry of this name.
    pub fn unregister(&mut self, name: &str) -> Option<Entry> {
        self.table.remove(&(name.to_owned(), None))
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.table.get(&(name.to_owned(), None))
    }

    /// Domain-scoped lookup for `recv.method(...)` dispatch.
    pub fn lookup_method(&self, name: &str, domain: &str) -> Option<&Entry> {
        self.table.get(&(name.to_owned(), Some(domain.to_owned())))
    }

    /// Declared arity of the named entry, `Undefined` when absent.
    pub fn lookup_arity(&self, name: &str) -> Arity {
        self.lookup(name).map(|e| e.arity).unwrap_or(Arity::Undefined)
    }

    /// The shared infix operator entry.
    pub fn lookup_infix(&self) -> Option<&Entry> {
        self.lookup(INFIX_ENTRY)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every plugin-origin entry, leaving core and user entries.
    pub fn revoke_plugins(&mut self) {
        self.table.retain(|_, e| e.origin != Origin::Plugin);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
