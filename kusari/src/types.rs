//! Runtime type descriptors and the copy-on-store policy.
//!
//! Every runtime type id maps to a [`TypeDescriptor`]: a copy strategy plus
//! the method names instances of the type answer to. Binding a value into a
//! scope copies it through its descriptor unless the value is fresh from a
//! constructor (adopted as-is) or an alias (re-aliased). A value whose type
//! has no descriptor copies to null.

use std::collections::HashMap;

use crate::registry::Origin;
use crate::value::{Payload, Value};

/// Copy strategy for one runtime type's payload.
pub type CopyFn = fn(&Payload) -> Payload;

/// Descriptor for one runtime type.
pub struct TypeDescriptor {
    type_id: String,
    copier: CopyFn,
    methods: Vec<String>,
    origin: Origin,
}

impl TypeDescriptor {
    pub fn new(
        type_id: impl Into<String>,
        copier: CopyFn,
        methods: Vec<String>,
        origin: Origin,
    ) -> TypeDescriptor {
        TypeDescriptor {
            type_id: type_id.into(),
            copier,
            methods,
            origin,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Registry of type descriptors, one per type id.
pub struct TypeRegistry {
    table: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Empty registry (no descriptors, not even the core types).
    pub fn new() -> TypeRegistry {
        TypeRegistry {
            table: HashMap::new(),
        }
    }

    /// Registry seeded with the core types: `null`, `int`, `float`, `bool`,
    /// `string` (method `size`) and `array` (methods `size`, `at`).
    pub fn with_core() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        for id in ["null", "int", "float", "bool"] {
            reg.register(TypeDescriptor::new(id, copy_plain, Vec::new(), Origin::Core));
        }
        reg.register(TypeDescriptor::new(
            "string",
            copy_plain,
            vec!["size".into()],
            Origin::Core,
        ));
        reg.register(TypeDescriptor::new(
            "array",
            copy_array,
            vec!["size".into(), "at".into()],
            Origin::Core,
        ));
        reg
    }

    /// Register a descriptor. A later registration for the same id replaces
    /// the earlier one, so each id always maps to exactly one descriptor.
    pub fn register(&mut self, desc: TypeDescriptor) {
        self.table.insert(desc.type_id.clone(), desc);
    }

    pub fn lookup(&self, type_id: &str) -> Option<&TypeDescriptor> {
        self.table.get(type_id)
    }

    /// Method list for a type id; empty when the type is unknown.
    pub fn methods_of(&self, type_id: &str) -> Vec<String> {
        self.table
            .get(type_id)
            .map(|d| d.methods.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every plugin-origin descriptor, leaving core and user types.
    pub fn revoke_plugins(&mut self) {
        self.table.retain(|_, d| d.origin != Origin::Plugin);
    }

    /// Copy-on-store policy. Returns the value to store and whether the
    /// source's type was known; an unknown type stores null and the caller
    /// is expected to report a warning.
    ///
    /// A fresh constructor result is adopted (handle shared, flag consumed).
    /// An alias source stays an alias of the same target. Everything else
    /// copies through the type's strategy.
    pub fn copy_for_store(&self, source: &Value) -> (Value, bool) {
        if source.take_adopt_flag() {
            return (source.clone(), true);
        }
        if source.is_alias() {
            return (Value::alias_of(source), true);
        }
        match self.table.get(source.type_id().as_str()) {
            Some(desc) => {
                let payload = (desc.copier)(&source.payload());
                (Value::with_methods(payload, desc.methods.clone()), true)
            }
            None => (Value::null(), false),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::with_core()
    }
}

/// Strategy for scalar payloads: a plain payload clone.
fn copy_plain(payload: &Payload) -> Payload {
    payload.clone()
}

/// Strategy for arrays: fresh element cells with cloned payloads, so the
/// copy's elements mutate independently of the source's.
fn copy_array(payload: &Payload) -> Payload {
    match payload {
        Payload::Array(items) => Payload::Array(
            items
                .iter()
                .map(|v| Value::with_methods(v.payload().clone(), v.methods()))
                .collect(),
        ),
        other => other.clone(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_has_base_types() {
        let reg = TypeRegistry::with_core();
        for id in ["null", "int", "float", "bool", "string", "array"] {
            assert!(reg.lookup(id).is_some(), "missing {id}");
        }
        assert_eq!(reg.methods_of("string"), vec!["size".to_owned()]);
        assert_eq!(reg.methods_of("array").len(), 2);
        assert!(reg.methods_of("int").is_empty());
        assert!(reg.methods_of("nothing").is_empty());
    }

    #[test]
    fn copy_scalar_makes_new_cell() {
        let reg = TypeRegistry::with_core();
        let a = Value::from(5i64);
        let (b, hit) = reg.copy_for_store(&a);
        assert!(hit);
        assert_eq!(b.as_int(), 5);
        assert!(!b.shares_cell(&a));
    }

    #[test]
    fn copy_miss_yields_null() {
        let reg = TypeRegistry::new();
        let a = Value::from(5i64);
        let (b, hit) = reg.copy_for_store(&a);
        assert!(!hit);
        assert_eq!(b.type_id(), "null");
    }

    #[test]
    fn fresh_value_is_adopted_not_copied() {
        let reg = TypeRegistry::with_core();
        let a = Value::fresh(Payload::Int(1), Vec::new());
        let (b, hit) = reg.copy_for_store(&a);
        assert!(hit);
        assert!(b.shares_cell(&a));
        // Flag consumed: the next store copies.
        let (c, _) = reg.copy_for_store(&a);
        assert!(!c.shares_cell(&a));
    }

    #[test]
    fn alias_source_stays_an_alias() {
        let reg = TypeRegistry::with_core();
        let target = Value::from(1i64);
        let alias = Value::alias_of(&target);
        let (stored, hit) = reg.copy_for_store(&alias);
        assert!(hit);
        assert!(stored.is_alias());
        assert!(stored.shares_cell(&target));
        assert_eq!(target.alias_count(), 2);
    }

    #[test]
    fn array_copy_isolates_elements() {
        let reg = TypeRegistry::with_core();
        let arr = Value::new(Payload::Array(vec![Value::from(1i64), Value::from(2i64)]));
        let (copy, hit) = reg.copy_for_store(&arr);
        assert!(hit);
        copy.index(0).unwrap().assign(Payload::Int(99));
        assert_eq!(arr.index(0).unwrap().as_int(), 1);
        assert_eq!(copy.index(0).unwrap().as_int(), 99);
    }

    #[test]
    fn revoke_plugins_removes_only_plugin_types() {
        let mut reg = TypeRegistry::with_core();
        let before = reg.len();
        reg.register(TypeDescriptor::new(
            "widget",
            copy_plain,
            vec!["poke".into()],
            Origin::Plugin,
        ));
        assert_eq!(reg.len(), before + 1);
        reg.revoke_plugins();
        assert_eq!(reg.len(), before);
        assert!(reg.lookup("widget").is_none());
        assert!(reg.lookup("int").is_some());
    }
}
