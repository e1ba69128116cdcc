//! Scopes and the live heap the dump engine reads from.
//!
//! The interpreter facade owns every heap object and scope and hands out
//! handles. A fresh interpreter pre-registers the unconditional built-in
//! objects (prototypes, the `Object` constructor, the ROOT owner) so a
//! dump can recover them by key. The heap is read-only during a dump;
//! the seeding API below exists for embedders building state to dump and
//! for tests.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::object_model::{Builtins, InterpreterObject, ObjectData, ObjectId, Property, Value};

// ---------------------------------------------------------------------------
// ScopeId / Scope
// ---------------------------------------------------------------------------

/// Opaque handle referencing a scope. The global scope is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A variable scope: insertion-ordered bindings plus the enclosing
/// scope (`None` only at global).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub outer: Option<ScopeId>,
    vars: IndexMap<String, Value>,
}

impl Scope {
    fn new(outer: Option<ScopeId>) -> Self {
        Self {
            outer,
            vars: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Variable names in declaration order.
    pub fn var_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    fn define(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// The live interpreter: heap, scope tree, and built-in registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpreter {
    heap: Vec<InterpreterObject>,
    scopes: Vec<Scope>,
    builtins: Builtins,
    object_proto: ObjectId,
    function_proto: ObjectId,
    root_owner: ObjectId,
}

impl Interpreter {
    /// A fresh interpreter with the unconditional built-ins registered.
    pub fn new() -> Self {
        let mut interp = Self {
            heap: Vec::new(),
            scopes: vec![Scope::new(None)],
            builtins: Builtins::default(),
            object_proto: ObjectId::new(0),
            function_proto: ObjectId::new(0),
            root_owner: ObjectId::new(0),
        };

        let object_proto = interp.alloc(InterpreterObject::new(ObjectData::Plain, None, None));
        interp.object_proto = object_proto;
        let function_proto = interp.alloc(InterpreterObject::new(
            ObjectData::Function { source: None },
            Some(object_proto),
            None,
        ));
        interp.function_proto = function_proto;
        let root_owner = interp.alloc(InterpreterObject::new(
            ObjectData::Plain,
            Some(object_proto),
            None,
        ));
        interp.root_owner = root_owner;

        let array_proto = interp.alloc(InterpreterObject::new(
            ObjectData::Plain,
            Some(object_proto),
            Some(root_owner),
        ));
        let date_proto = interp.alloc(InterpreterObject::new(
            ObjectData::Plain,
            Some(object_proto),
            Some(root_owner),
        ));
        let regexp_proto = interp.alloc(InterpreterObject::new(
            ObjectData::Plain,
            Some(object_proto),
            Some(root_owner),
        ));
        let object_ctor = interp.alloc(InterpreterObject::new(
            ObjectData::Function { source: None },
            Some(function_proto),
            Some(root_owner),
        ));

        interp.builtins.register("Object.prototype", object_proto);
        interp.builtins.register("Function.prototype", function_proto);
        interp.builtins.register("Array.prototype", array_proto);
        interp.builtins.register("Date.prototype", date_proto);
        interp.builtins.register("RegExp.prototype", regexp_proto);
        interp.builtins.register("Object", object_ctor);
        interp.builtins.register("ROOT", root_owner);

        interp
    }

    fn alloc(&mut self, object: InterpreterObject) -> ObjectId {
        let id = ObjectId::new(self.heap.len() as u32);
        self.heap.push(object);
        id
    }

    // -- accessors ----------------------------------------------------------

    pub fn global(&self) -> ScopeId {
        ScopeId::GLOBAL
    }

    /// The privileged ROOT owner identity.
    pub fn root_owner(&self) -> ObjectId {
        self.root_owner
    }

    /// The default `Object` prototype.
    pub fn object_proto(&self) -> ObjectId {
        self.object_proto
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn object(&self, id: ObjectId) -> &InterpreterObject {
        &self.heap[id.index()]
    }

    // -- seeding ------------------------------------------------------------

    /// Allocate an object of the given class. Plain objects default to
    /// the `Object` prototype; ownership defaults to ROOT.
    pub fn create_object(&mut self, data: ObjectData, proto: Option<ObjectId>) -> ObjectId {
        let owner = self.root_owner;
        self.alloc(InterpreterObject::new(data, proto, Some(owner)))
    }

    /// A plain `{}` with the default prototype.
    pub fn create_plain(&mut self) -> ObjectId {
        let proto = self.object_proto;
        self.create_object(ObjectData::Plain, Some(proto))
    }

    pub fn create_child_scope(&mut self, outer: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(outer)));
        id
    }

    pub fn define_var(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.index()].define(name, value);
    }

    /// Plain-assignment property write (default attributes).
    pub fn set_property(&mut self, object: ObjectId, key: &str, value: Value) {
        self.heap[object.index()].set_assigned(key, value);
    }

    /// Install a full property descriptor.
    pub fn define_property(&mut self, object: ObjectId, key: &str, property: Property) {
        self.heap[object.index()].define_property(key, property);
    }

    pub fn register_builtin(&mut self, key: &str, object: ObjectId) {
        self.builtins.register(key, object);
    }

    /// Resolve a variable through the scope chain starting at `from`.
    /// Returns the scope that binds it and the current value.
    pub fn resolve_var(&self, from: ScopeId, name: &str) -> Option<(ScopeId, &Value)> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scope(id);
            if let Some(value) = scope.get(name) {
                return Some((id, value));
            }
            cursor = scope.outer;
        }
        None
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
