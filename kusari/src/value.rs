//! Runtime values.
//!
//! Kusari is dynamically typed. Every value is a shared cell holding a
//! payload, a method-name list, an alias counter, and an adopt flag; the
//! [`Value`] handles that scripts and native operations pass around are
//! either *owning* or *aliasing* views of one cell. Because an alias shares
//! the owner's cell, mutation through either handle is visible through the
//! other, and the cell cannot be freed while any alias is alive.
//!
//! Value equality is identity: two handles are "the same value" iff they
//! share a cell (see [`Value::shares_cell`]). There is deliberately no
//! `PartialEq`; structural comparison belongs to the script-level operators.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Runtime payload carried by a value cell.
///
/// `Foreign` is the type-erased escape hatch for plugin-registered types;
/// everything the core language touches has a dedicated variant.
#[derive(Clone)]
pub enum Payload {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<Value>),
    Foreign { type_id: String, data: Rc<dyn Any> },
}

impl Payload {
    /// Type identifier used by the type and operation registries.
    pub fn type_id(&self) -> &str {
        match self {
            Payload::Null => "null",
            Payload::Int(_) => "int",
            Payload::Float(_) => "float",
            Payload::Bool(_) => "bool",
            Payload::Str(_) => "string",
            Payload::Array(_) => "array",
            Payload::Foreign { type_id, .. } => type_id,
        }
    }
}

/// Structural equality over the scalar variants, as a derive would give.
/// `Array` and `Foreign` cannot derive (`Value` has identity equality only
/// and `Rc<dyn Any>` is opaque), so those variants never compare equal.
impl PartialEq for Payload {
    fn eq(&self, other: &Payload) -> bool {
        match (self, other) {
            (Payload::Null, Payload::Null) => true,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Null => write!(f, "null"),
            Payload::Int(n) => write!(f, "{n}"),
            Payload::Float(x) => {
                // Floats print without an exponent and keep one decimal
                // place when the fraction is zero.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Payload::Bool(b) => write!(f, "{b}"),
            Payload::Str(s) => write!(f, "{s}"),
            Payload::Array(items) => write!(f, "(array:{})", items.len()),
            Payload::Foreign { type_id, .. } => write!(f, "({type_id})"),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Str(s) => write!(f, "Str({s:?})"),
            Payload::Array(items) => write!(f, "Array(len={})", items.len()),
            Payload::Foreign { type_id, .. } => write!(f, "Foreign({type_id})"),
            other => write!(f, "{other}"),
        }
    }
}

/// Whether a handle owns its cell or aliases another handle's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Owning,
    Alias,
}

struct ValueCell {
    payload: RefCell<Payload>,
    methods: RefCell<Vec<String>>,
    /// Number of live `Mode::Alias` handles on this cell. Maintained by
    /// alias construction/clone/drop; never negative.
    alias_count: Cell<u64>,
    /// Just-constructed flag; consumed by the first copy-on-store so
    /// constructor results are adopted rather than deep-copied.
    adopt: Cell<bool>,
}

/// A handle on one runtime value cell.
pub struct Value {
    cell: Rc<ValueCell>,
    mode: Mode,
}

impl Value {
    /// New owning value with an empty method list.
    pub fn new(payload: Payload) -> Value {
        Value::build(payload, Vec::new(), false)
    }

    /// New owning value carrying a method list.
    pub fn with_methods(payload: Payload, methods: Vec<String>) -> Value {
        Value::build(payload, methods, false)
    }

    /// New owning value with the adopt flag set, as produced by
    /// constructor-style operations (`array(…)` and friends).
    pub fn fresh(payload: Payload, methods: Vec<String>) -> Value {
        Value::build(payload, methods, true)
    }

    /// The null value.
    pub fn null() -> Value {
        Value::new(Payload::Null)
    }

    fn build(payload: Payload, methods: Vec<String>, adopt: bool) -> Value {
        Value {
            cell: Rc::new(ValueCell {
                payload: RefCell::new(payload),
                methods: RefCell::new(methods),
                alias_count: Cell::new(0),
                adopt: Cell::new(adopt),
            }),
            mode: Mode::Owning,
        }
    }

    /// New aliasing handle on `target`'s cell. Bumps the alias counter;
    /// the matching decrement happens when the alias is dropped.
    pub fn alias_of(target: &Value) -> Value {
        target.cell.alias_count.set(target.cell.alias_count.get() + 1);
        Value {
            cell: Rc::clone(&target.cell),
            mode: Mode::Alias,
        }
    }

    // ── Identity and metadata ────────────────────────────────────────────────

    /// Identity comparison: true iff both handles share one cell.
    pub fn shares_cell(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_alias(&self) -> bool {
        self.mode == Mode::Alias
    }

    /// Live alias handles on this cell.
    pub fn alias_count(&self) -> u64 {
        self.cell.alias_count.get()
    }

    pub fn type_id(&self) -> String {
        // Path call: `.type_id()` on the `Ref` guard would resolve to
        // `Any::type_id` instead of the inherent method.
        Payload::type_id(&self.cell.payload.borrow()).to_owned()
    }

    pub fn methods(&self) -> Vec<String> {
        self.cell.methods.borrow().clone()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.cell.methods.borrow().iter().any(|m| m == name)
    }

    pub fn set_methods(&self, methods: Vec<String>) {
        *self.cell.methods.borrow_mut() = methods;
    }

    /// Consume the adopt flag, returning whether it was set.
    pub fn take_adopt_flag(&self) -> bool {
        self.cell.adopt.replace(false)
    }

    // ── Payload access ───────────────────────────────────────────────────────

    /// Borrow the payload. Do not hold the borrow across [`Value::assign`].
    pub fn payload(&self) -> Ref<'_, Payload> {
        self.cell.payload.borrow()
    }

    /// Replace the payload in place. Writing through an alias writes the
    /// target cell, so the change is visible through every handle.
    pub fn assign(&self, payload: Payload) {
        *self.cell.payload.borrow_mut() = payload;
    }

    /// Element handle of an array payload (shares the element's cell).
    pub fn index(&self, i: usize) -> Option<Value> {
        match &*self.cell.payload.borrow() {
            Payload::Array(items) => items.get(i).cloned(),
            _ => None,
        }
    }

    // ── Coercions ────────────────────────────────────────────────────────────

    /// Truthiness: null and false are falsy, zero is falsy, `""` and `"0"`
    /// are falsy; everything else is truthy.
    pub fn as_bool(&self) -> bool {
        match &*self.cell.payload.borrow() {
            Payload::Null => false,
            Payload::Bool(b) => *b,
            Payload::Int(n) => *n != 0,
            Payload::Float(x) => *x != 0.0,
            Payload::Str(s) => !s.is_empty() && s != "0",
            Payload::Array(_) | Payload::Foreign { .. } => true,
        }
    }

    /// Coerce to `i64` (0 when the payload has no numeric reading).
    pub fn as_int(&self) -> i64 {
        match &*self.cell.payload.borrow() {
            Payload::Int(n) => *n,
            Payload::Float(x) => *x as i64,
            Payload::Bool(b) => *b as i64,
            Payload::Str(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Coerce to `f64`.
    pub fn as_float(&self) -> f64 {
        match &*self.cell.payload.borrow() {
            Payload::Int(n) => *n as f64,
            Payload::Float(x) => *x,
            Payload::Bool(b) => *b as i64 as f64,
            Payload::Str(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Coerce to a display string.
    pub fn as_str(&self) -> String {
        self.cell.payload.borrow().to_string()
    }

    /// Whether `print` can render this value as text.
    pub fn is_printable(&self) -> bool {
        !matches!(
            &*self.cell.payload.borrow(),
            Payload::Array(_) | Payload::Foreign { .. }
        )
    }
}

impl Clone for Value {
    fn clone(&self) -> Value {
        if self.mode == Mode::Alias {
            self.cell.alias_count.set(self.cell.alias_count.get() + 1);
        }
        Value {
            cell: Rc::clone(&self.cell),
            mode: self.mode,
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if self.mode == Mode::Alias {
            let n = self.cell.alias_count.get();
            self.cell.alias_count.set(n.saturating_sub(1));
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cell.payload.borrow())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("payload", &*self.cell.payload.borrow())
            .field("mode", &self.mode)
            .field("aliases", &self.cell.alias_count.get())
            .finish()
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::new(Payload::Int(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::new(Payload::Float(x))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(Payload::Bool(b))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(Payload::Str(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(Payload::Str(s.to_owned()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
