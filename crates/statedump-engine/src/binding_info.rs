//! Interned dump-status records.
//!
//! One record per scope and per object, created lazily on first touch.
//! Each owns a `done` table mapping binding names to the highest depth
//! level achieved so far. Levels only move up (`max` semantics) with one
//! exception: a pruned binding is terminal and never resurrected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::Do;
use crate::interpreter::ScopeId;
use crate::object_model::ObjectId;
use crate::selector::Parts;

// ---------------------------------------------------------------------------
// ScopeInfo / ObjectInfo
// ---------------------------------------------------------------------------

/// Dump status of one scope's variable bindings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeInfo {
    done: BTreeMap<String, Do>,
}

impl ScopeInfo {
    pub fn done(&self, name: &str) -> Option<Do> {
        self.done.get(name).copied()
    }

    /// Raise a binding to `max(current, todo)`. Pruned stays pruned.
    pub(crate) fn raise(&mut self, name: &str, todo: Do) -> Do {
        raise(&mut self.done, name, todo)
    }
}

/// Dump status of one object: per-property levels, the canonical
/// reference path, and which properties have had attributes finalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    done: BTreeMap<String, Do>,
    ref_parts: Option<Parts>,
    attrs_finalized: BTreeSet<String>,
}

impl ObjectInfo {
    pub fn done(&self, name: &str) -> Option<Do> {
        self.done.get(name).copied()
    }

    pub(crate) fn raise(&mut self, name: &str, todo: Do) -> Do {
        raise(&mut self.done, name, todo)
    }

    /// The Parts this object was first emitted at, if any.
    pub fn ref_parts(&self) -> Option<&Parts> {
        self.ref_parts.as_ref()
    }

    /// Record the canonical reference. First emission wins; the ref
    /// never changes afterwards.
    pub(crate) fn set_ref(&mut self, parts: Parts) {
        if self.ref_parts.is_none() {
            self.ref_parts = Some(parts);
        }
    }

    pub fn attrs_finalized(&self, key: &str) -> bool {
        self.attrs_finalized.contains(key)
    }

    pub(crate) fn mark_attrs_finalized(&mut self, key: &str) {
        self.attrs_finalized.insert(key.to_string());
    }
}

fn raise(done: &mut BTreeMap<String, Do>, name: &str, todo: Do) -> Do {
    match done.get(name).copied() {
        Some(Do::Prune) => Do::Prune,
        Some(current) => {
            let next = current.max(todo);
            done.insert(name.to_string(), next);
            next
        }
        None => {
            done.insert(name.to_string(), todo);
            todo
        }
    }
}

// ---------------------------------------------------------------------------
// BindingRegistry
// ---------------------------------------------------------------------------

/// Interned maps from scope and object handles to their status records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingRegistry {
    scopes: BTreeMap<ScopeId, ScopeInfo>,
    objects: BTreeMap<ObjectId, ObjectInfo>,
}

impl BindingRegistry {
    pub fn scope_info(&mut self, id: ScopeId) -> &mut ScopeInfo {
        self.scopes.entry(id).or_default()
    }

    pub fn object_info(&mut self, id: ObjectId) -> &mut ObjectInfo {
        self.objects.entry(id).or_default()
    }

    /// Read-only scope status; `None` means never touched.
    pub fn scope_done(&self, id: ScopeId, name: &str) -> Option<Do> {
        self.scopes.get(&id).and_then(|info| info.done(name))
    }

    /// Read-only property status; `None` means never touched.
    pub fn object_done(&self, id: ObjectId, name: &str) -> Option<Do> {
        self.objects.get(&id).and_then(|info| info.done(name))
    }

    /// The canonical reference path of an object, if emitted.
    pub fn object_ref(&self, id: ObjectId) -> Option<&Parts> {
        self.objects.get(&id).and_then(ObjectInfo::ref_parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_only_move_up() {
        let mut info = ScopeInfo::default();
        assert_eq!(info.raise("x", Do::Decl), Do::Decl);
        assert_eq!(info.raise("x", Do::Recurse), Do::Recurse);
        assert_eq!(info.raise("x", Do::Set), Do::Recurse);
        assert_eq!(info.done("x"), Some(Do::Recurse));
    }

    #[test]
    fn prune_is_terminal() {
        let mut info = ObjectInfo::default();
        assert_eq!(info.raise("p", Do::Prune), Do::Prune);
        assert_eq!(info.raise("p", Do::Recurse), Do::Prune);
        assert_eq!(info.done("p"), Some(Do::Prune));
    }

    #[test]
    fn first_ref_wins() {
        let mut info = ObjectInfo::default();
        info.set_ref(Parts::root("a"));
        info.set_ref(Parts::root("b"));
        assert_eq!(info.ref_parts().map(Parts::to_selector), Some("a".into()));
    }

    #[test]
    fn registry_interns_lazily() {
        let mut registry = BindingRegistry::default();
        assert_eq!(registry.scope_done(ScopeId::GLOBAL, "x"), None);
        registry.scope_info(ScopeId::GLOBAL).raise("x", Do::Set);
        assert_eq!(registry.scope_done(ScopeId::GLOBAL, "x"), Some(Do::Set));
    }
}
