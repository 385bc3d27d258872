//! Variable binding scopes.
//!
//! A [`Container`] is one ordered name→value mapping; a [`ScopeChain`] is
//! the stack of containers active during execution. The outermost frame is
//! created with the chain and lives as long as the interpreter; every block
//! invocation pushes a fresh frame on entry and pops it on exit. Lookup
//! walks innermost→outermost unless restricted to the innermost frame.

use std::collections::BTreeMap;

use crate::value::Value;

/// One scope frame.
#[derive(Default)]
pub struct Container {
    map: BTreeMap<String, Value>,
}

impl Container {
    pub fn new() -> Container {
        Container::default()
    }

    /// Bind `name`, replacing any existing binding in this frame.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.map.insert(name.into(), value);
    }

    /// Handle of the named value (shares the stored cell).
    pub fn find(&self, name: &str) -> Option<Value> {
        self.map.get(name).cloned()
    }

    pub fn unbind(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bound names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

/// Stack of containers: index 0 is the outermost (interpreter-lifetime)
/// frame, the last is the innermost.
pub struct ScopeChain {
    frames: Vec<Container>,
}

impl ScopeChain {
    pub fn new() -> ScopeChain {
        ScopeChain {
            frames: vec![Container::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a new innermost frame.
    pub fn push(&mut self) {
        self.frames.push(Container::new());
    }

    /// Close the innermost frame and return it. The outermost frame is
    /// never popped; popping at depth 1 returns `None`.
    pub fn pop(&mut self) -> Option<Container> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Bind `name` in the innermost frame.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bind(name, value);
        }
    }

    /// Replace `name` in the innermost frame that already binds it.
    /// Returns false when no frame does.
    pub fn rebind(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if frame.find(name).is_some() {
                frame.bind(name, value);
                return true;
            }
        }
        false
    }

    /// Look `name` up, innermost→outermost; with `innermost_only` the
    /// search stops after the innermost frame.
    pub fn find(&self, name: &str, innermost_only: bool) -> Option<Value> {
        if innermost_only {
            return self.frames.last().and_then(|f| f.find(name));
        }
        self.frames.iter().rev().find_map(|f| f.find(name))
    }

    /// Remove the innermost binding of `name`, if any.
    pub fn unbind(&mut self, name: &str) -> Option<Value> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|f| f.unbind(name))
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        ScopeChain::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
