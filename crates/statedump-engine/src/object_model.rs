//! Value and object model consumed by the dump engine.
//!
//! Mirrors the interpreter's heap shape: tagged values, handle-based
//! object identity, property descriptors with the full attribute set
//! (writable/enumerable/configurable plus world-readable and ownership
//! attributes), class-specific intrinsic data, and the built-in registry
//! that names objects guaranteed to exist in any fresh interpreter.
//!
//! Own properties live in an `IndexMap` because insertion order is a
//! semantic property the dump must preserve.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ObjectId — handle-based object identity
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the interpreter heap. Handle
/// equality is object identity; the serializer keys its interned state
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Value — tagged runtime value
// ---------------------------------------------------------------------------

/// Runtime value: a primitive or an object reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Object(ObjectId),
}

impl Value {
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
        }
    }

    /// SameValue comparison: `NaN` equals `NaN`, and `0` and `-0` are
    /// distinct. Objects compare by handle.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(id) => write!(f, "[{id}]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Property — descriptor with the full attribute set
// ---------------------------------------------------------------------------

/// A property descriptor. Beyond the classic three attributes this
/// carries `readable` (world-readable), `inherited_ownership` (ownership
/// propagates to children), and the owning object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub value: Value,
    pub owner: Option<ObjectId>,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    pub readable: bool,
    pub inherited_ownership: bool,
}

impl Property {
    /// The descriptor a plain assignment creates: all permission bits
    /// set, ownership not inherited, owner taken from the holder.
    pub fn assigned(value: Value, owner: Option<ObjectId>) -> Self {
        Self {
            value,
            owner,
            writable: true,
            enumerable: true,
            configurable: true,
            readable: true,
            inherited_ownership: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectData — class-specific intrinsic data
// ---------------------------------------------------------------------------

/// Internal class of an object plus the intrinsic data that class
/// carries. A `Function` without source text is a native function and
/// can only be recovered through the built-in registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectData {
    Plain,
    Array { length: u32 },
    Function { source: Option<String> },
    Date { epoch_ms: i64 },
    Regexp { pattern: String, flags: String },
}

impl ObjectData {
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Plain => "Object",
            Self::Array { .. } => "Array",
            Self::Function { .. } => "Function",
            Self::Date { .. } => "Date",
            Self::Regexp { .. } => "RegExp",
        }
    }
}

// ---------------------------------------------------------------------------
// Reader — who is asking for a property value
// ---------------------------------------------------------------------------

/// Identity used for property reads. `Root` is the privileged identity
/// the dump engine reads with; it sees everything. Any other reader only
/// sees world-readable properties or properties it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    Root,
    Object(ObjectId),
}

// ---------------------------------------------------------------------------
// InterpreterObject
// ---------------------------------------------------------------------------

/// A heap object: prototype link, insertion-ordered own properties,
/// object owner, and class intrinsics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterObject {
    pub proto: Option<ObjectId>,
    pub owner: Option<ObjectId>,
    pub data: ObjectData,
    properties: IndexMap<String, Property>,
}

impl InterpreterObject {
    pub fn new(data: ObjectData, proto: Option<ObjectId>, owner: Option<ObjectId>) -> Self {
        Self {
            proto,
            owner,
            data,
            properties: IndexMap::new(),
        }
    }

    /// Own property keys in insertion order.
    pub fn own_property_keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    pub fn own_property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Read an own property as `reader`. Non-privileged readers see a
    /// property only when it is world-readable or they own it.
    pub fn get(&self, key: &str, reader: Reader) -> Option<&Value> {
        let property = self.properties.get(key)?;
        let visible = match reader {
            Reader::Root => true,
            Reader::Object(id) => property.readable || property.owner == Some(id),
        };
        if visible {
            Some(&property.value)
        } else {
            None
        }
    }

    /// Plain-assignment semantics: create with default attributes or
    /// update the value in place, keeping insertion position. Arrays
    /// grow their intrinsic length past numeric keys.
    pub(crate) fn set_assigned(&mut self, key: &str, value: Value) {
        if let Some(existing) = self.properties.get_mut(key) {
            existing.value = value;
        } else {
            let owner = self.owner;
            self.properties
                .insert(key.to_string(), Property::assigned(value, owner));
        }
        self.grow_length(key);
    }

    /// Install a full descriptor, keeping insertion position on update.
    pub(crate) fn define_property(&mut self, key: &str, property: Property) {
        self.properties.insert(key.to_string(), property);
        self.grow_length(key);
    }

    fn grow_length(&mut self, key: &str) {
        if let ObjectData::Array { length } = &mut self.data {
            if let Ok(index) = key.parse::<u32>() {
                if index >= *length {
                    *length = index + 1;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Builtins — two-way registry of unconditional objects
// ---------------------------------------------------------------------------

/// Registry of built-in objects. Each carries a stable key naming an
/// object that exists in any fresh interpreter; the dump recovers these
/// by key instead of reconstructing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Builtins {
    by_key: BTreeMap<String, ObjectId>,
    by_object: BTreeMap<ObjectId, String>,
}

impl Builtins {
    /// Register `object` under `key`. The first registration of either
    /// side wins; re-registration is ignored.
    pub fn register(&mut self, key: &str, object: ObjectId) {
        if self.by_key.contains_key(key) || self.by_object.contains_key(&object) {
            return;
        }
        self.by_key.insert(key.to_string(), object);
        self.by_object.insert(object, key.to_string());
    }

    pub fn key_for(&self, object: ObjectId) -> Option<&str> {
        self.by_object.get(&object).map(String::as_str)
    }

    pub fn object_for(&self, key: &str) -> Option<ObjectId> {
        self.by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_semantics() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
        assert!(Value::Number(1.5).same_value(&Value::Number(1.5)));
        assert!(Value::Object(ObjectId::new(3)).same_value(&Value::Object(ObjectId::new(3))));
        assert!(!Value::Undefined.same_value(&Value::Null));
    }

    #[test]
    fn properties_keep_insertion_order() {
        let mut obj = InterpreterObject::new(ObjectData::Plain, None, None);
        obj.set_assigned("b", Value::Number(1.0));
        obj.set_assigned("a", Value::Number(2.0));
        obj.set_assigned("b", Value::Number(3.0));
        assert_eq!(obj.own_property_keys(), vec!["b", "a"]);
        assert_eq!(
            obj.get("b", Reader::Root),
            Some(&Value::Number(3.0))
        );
    }

    #[test]
    fn unreadable_properties_hide_from_strangers() {
        let owner = ObjectId::new(7);
        let stranger = ObjectId::new(8);
        let mut obj = InterpreterObject::new(ObjectData::Plain, None, Some(owner));
        obj.define_property(
            "secret",
            Property {
                value: Value::Str("hidden".to_string()),
                owner: Some(owner),
                writable: true,
                enumerable: true,
                configurable: true,
                readable: false,
                inherited_ownership: false,
            },
        );
        assert!(obj.get("secret", Reader::Root).is_some());
        assert!(obj.get("secret", Reader::Object(owner)).is_some());
        assert!(obj.get("secret", Reader::Object(stranger)).is_none());
    }

    #[test]
    fn arrays_grow_length_past_numeric_keys() {
        let mut arr = InterpreterObject::new(ObjectData::Array { length: 0 }, None, None);
        arr.set_assigned("0", Value::Number(1.0));
        arr.set_assigned("4", Value::Number(2.0));
        arr.set_assigned("name", Value::Str("x".to_string()));
        assert_eq!(arr.data, ObjectData::Array { length: 5 });
    }

    #[test]
    fn builtin_registry_is_two_way_and_first_wins() {
        let mut builtins = Builtins::default();
        let proto = ObjectId::new(0);
        builtins.register("Object.prototype", proto);
        builtins.register("Object.prototype", ObjectId::new(9));
        builtins.register("other", proto);
        assert_eq!(builtins.object_for("Object.prototype"), Some(proto));
        assert_eq!(builtins.key_for(proto), Some("Object.prototype"));
        assert_eq!(builtins.object_for("other"), None);
        assert_eq!(builtins.len(), 1);
    }
}
