//! Selectors and their canonical Parts form.
//!
//! A selector is a dotted path string (`$.util.cmd`); Parts is the split
//! array and is the canonical form everywhere inside the engine. The two
//! conversions here are the only places dotted strings are parsed or
//! joined. The first part names a global variable; each later part names
//! an own property of the value reached so far.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DumpError;
use crate::quote;

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// Canonical array form of a dotted selector. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Parts(Vec<String>);

impl Parts {
    /// Parse a dotted selector. Empty selectors and empty components
    /// (`a..b`) are config errors.
    pub fn from_selector(selector: &str) -> Result<Self, DumpError> {
        if selector.is_empty() {
            return Err(DumpError::config(selector, "empty selector"));
        }
        let components: Vec<String> = selector.split('.').map(str::to_string).collect();
        if components.iter().any(|component| component.is_empty()) {
            return Err(DumpError::config(selector, "empty path component"));
        }
        Ok(Self(components))
    }

    /// Build from already-split components. Zero-length lists are errors.
    pub fn from_components(components: Vec<String>) -> Result<Self, DumpError> {
        if components.is_empty() {
            return Err(DumpError::config("", "empty parts list"));
        }
        Ok(Self(components))
    }

    /// A single-component path (a variable name).
    pub fn root(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    /// Join back into the dotted selector string.
    pub fn to_selector(&self) -> String {
        self.0.join(".")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the path names a variable rather than a property.
    pub fn is_variable(&self) -> bool {
        self.0.len() == 1
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// All but the last component; `None` for variables.
    pub fn parent(&self) -> Option<Parts> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Extend with one more property key.
    pub fn child(&self, key: &str) -> Parts {
        let mut components = self.0.clone();
        components.push(key.to_string());
        Self(components)
    }

    /// Render as a JavaScript lvalue expression. Identifier components
    /// join with dots; canonical numeric keys index unquoted (`a[0]`);
    /// anything else falls back to quoted bracket indexing so the
    /// emitted source stays parseable (`a['my key']`).
    pub fn to_source(&self) -> String {
        let mut out = String::from(self.first());
        for component in &self.0[1..] {
            if quote::is_js_identifier(component) {
                out.push('.');
                out.push_str(component);
            } else if is_canonical_index(component) {
                out.push('[');
                out.push_str(component);
                out.push(']');
            } else {
                out.push('[');
                out.push_str(&quote::quote_string(component));
                out.push(']');
            }
        }
        out
    }
}

/// A key that round-trips through a numeric array index (`"0"`, `"42"`
/// — but not `"007"`, whose numeric form names a different key).
fn is_canonical_index(component: &str) -> bool {
    component
        .parse::<u32>()
        .map(|index| index.to_string() == component)
        .unwrap_or(false)
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_round_trips_through_parts() {
        let parts = Parts::from_selector("$.util.cmd").expect("parse");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first(), "$");
        assert_eq!(parts.last(), "cmd");
        assert_eq!(parts.to_selector(), "$.util.cmd");
    }

    #[test]
    fn empty_selector_is_rejected() {
        assert!(Parts::from_selector("").is_err());
        assert!(Parts::from_selector("a..b").is_err());
        assert!(Parts::from_selector(".a").is_err());
        assert!(Parts::from_components(Vec::new()).is_err());
    }

    #[test]
    fn parent_and_child_navigation() {
        let parts = Parts::from_selector("a.b.c").expect("parse");
        let parent = parts.parent().expect("parent");
        assert_eq!(parent.to_selector(), "a.b");
        assert_eq!(parent.child("c"), parts);
        assert!(Parts::root("a").parent().is_none());
    }

    #[test]
    fn source_rendering_brackets_non_identifiers() {
        let parts = Parts::root("obj").child("plain").child("my key");
        assert_eq!(parts.to_source(), "obj.plain['my key']");
    }

    #[test]
    fn source_rendering_indexes_canonical_numbers_unquoted() {
        assert_eq!(Parts::root("arr").child("0").to_source(), "arr[0]");
        assert_eq!(Parts::root("arr").child("42").to_source(), "arr[42]");
        assert_eq!(Parts::root("arr").child("007").to_source(), "arr['007']");
    }
}
