//! Dump driver and state machine.
//!
//! The `Dumper` walks the config file by file, emitting statements that
//! rebuild the live heap when evaluated in declared order. Its moving
//! parts:
//!
//! - `to_expr` — the value serializer: primitives render directly;
//!   objects render as a reference once emitted, as a keyed sentinel
//!   when built-in, and as a construction exactly once otherwise.
//! - `dump_binding` — emits one `var name = …;` / `path.prop = …;`
//!   statement and advances the binding's done level.
//! - the recursive walk — drives object contents in insertion order,
//!   deferring to other files with placeholders and finalizing property
//!   attributes after each object completes.
//! - forward declarations — a reference to a not-yet-emitted object
//!   pulls its claimed path into existence first (shell construction),
//!   recursively declaring path prefixes as needed.
//!
//! Cycles close through references: `to_expr` records an object's ref
//! before descending into anything it points at. The live heap is never
//! mutated; all dump state lives in the `BindingRegistry`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::binding_info::BindingRegistry;
use crate::config::{Config, ContentEntry, Do, SpecEntry};
use crate::error::DumpError;
use crate::expr::{self, ShadowSnapshot};
use crate::interpreter::{Interpreter, ScopeId};
use crate::object_model::{ObjectData, ObjectId, Reader, Value};
use crate::quote;
use crate::selector::Parts;

// ---------------------------------------------------------------------------
// DumpEvent — structured observability stream
// ---------------------------------------------------------------------------

/// Structured event emitted while dumping. Sequence numbers are
/// monotonic across the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpEvent {
    pub sequence: u64,
    /// Filename of the file being written when the event fired.
    pub file: String,
    pub kind: DumpEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DumpEventKind {
    FileOpened,
    BindingDumped { selector: String, level: Do },
    ForwardDeclared { selector: String },
    PlaceholderEmitted { selector: String },
    AttributesFinalized { selector: String },
    Pruned { selector: String },
}

// ---------------------------------------------------------------------------
// Output surface
// ---------------------------------------------------------------------------

/// One emitted source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub filename: String,
    pub source: String,
}

/// The result of a dump: one source file per spec entry plus the event
/// stream. Persisting the files is the caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpOutput {
    pub files: Vec<OutputFile>,
    pub events: Vec<DumpEvent>,
}

// ---------------------------------------------------------------------------
// Dumper
// ---------------------------------------------------------------------------

/// First file/path that claims an object, resolved against the live heap.
#[derive(Debug, Clone)]
struct Claim {
    file_no: usize,
    parts: Parts,
}

/// Where a binding lives: a scope variable or an object property.
#[derive(Debug, Clone, Copy)]
enum BindingSite {
    Var(ScopeId),
    Prop(ObjectId),
}

/// The dump engine. Owns all dump state; reads the interpreter heap
/// through its public accessors only.
pub struct Dumper<'a> {
    interp: &'a Interpreter,
    config: Config,
    registry: BindingRegistry,
    claims: BTreeMap<ObjectId, Claim>,
    buffers: Vec<String>,
    current_file: usize,
    scope_cursor: ScopeId,
    events: Vec<DumpEvent>,
    next_sequence: u64,
}

impl<'a> Dumper<'a> {
    pub fn new(interp: &'a Interpreter, config: Config) -> Self {
        let buffers = vec![String::new(); config.files().len()];
        let mut dumper = Self {
            interp,
            config,
            registry: BindingRegistry::default(),
            claims: BTreeMap::new(),
            buffers,
            current_file: 0,
            scope_cursor: interp.global(),
            events: Vec::new(),
            next_sequence: 0,
        };
        dumper.claims = dumper.compute_claims();
        dumper
    }

    /// Resolve every claiming config path against the live heap up
    /// front; the first file/path to name an object owns its forward
    /// declarations. Paths that do not resolve are skipped here and
    /// surface errors when actually dumped. When a rest file exists,
    /// every object held directly by a global variable is implicitly
    /// claimed there, so references can always forward-declare through
    /// the variable.
    fn compute_claims(&self) -> BTreeMap<ObjectId, Claim> {
        let mut claims = BTreeMap::new();
        for (file_no, file) in self.config.files().iter().enumerate() {
            for entry in &file.entries {
                if entry.directive < Do::Decl {
                    continue;
                }
                if let Some(Value::Object(id)) = self.try_resolve(&entry.parts) {
                    claims.entry(id).or_insert(Claim {
                        file_no,
                        parts: entry.parts.clone(),
                    });
                }
            }
        }
        if let Some(rest_no) = self.config.default_file_no() {
            let global_scope = self.interp.scope(self.interp.global());
            for name in global_scope.var_names() {
                if let Some(Value::Object(id)) = global_scope.get(&name) {
                    claims.entry(*id).or_insert(Claim {
                        file_no: rest_no,
                        parts: Parts::root(&name),
                    });
                }
            }
        }
        claims
    }

    // -- driver -------------------------------------------------------------

    /// Run the full dump: every file in declared order, then the rest
    /// pass on the rest file.
    pub fn run(mut self) -> Result<DumpOutput, DumpError> {
        for file_no in 0..self.config.files().len() {
            self.current_file = file_no;
            self.scope_cursor = self.interp.global();
            self.record(DumpEventKind::FileOpened);
            let entries = self.config.files()[file_no].entries.clone();
            for entry in &entries {
                self.process_entry(entry)?;
            }
            if self.config.files()[file_no].rest {
                self.dump_rest()?;
            }
        }
        Ok(self.into_output())
    }

    /// Consume the dumper without running the driver. For embedders
    /// that drive bindings manually.
    pub fn finish(self) -> DumpOutput {
        self.into_output()
    }

    fn into_output(self) -> DumpOutput {
        let files = self
            .config
            .files()
            .iter()
            .zip(self.buffers)
            .map(|(file, source)| OutputFile {
                filename: file.filename.clone(),
                source,
            })
            .collect();
        DumpOutput {
            files,
            events: self.events,
        }
    }

    fn process_entry(&mut self, entry: &ContentEntry) -> Result<(), DumpError> {
        match entry.directive {
            Do::Prune => {
                let (site, _) = self.site_for(&entry.parts)?;
                self.raise_at(site, entry.parts.last(), Do::Prune);
                self.record(DumpEventKind::Pruned {
                    selector: entry.parts.to_selector(),
                });
                Ok(())
            }
            // The rest pass reconsiders skipped paths.
            Do::Skip => Ok(()),
            Do::Decl => {
                self.dump_binding(&entry.parts, Do::Decl)?;
                Ok(())
            }
            Do::Set => {
                self.dump_binding(&entry.parts, Do::Set)?;
                self.finalize_attrs_for(&entry.parts)?;
                Ok(())
            }
            Do::Recurse => {
                let value = self.dump_binding(&entry.parts, Do::Recurse)?;
                if let Some(object) = value.as_object() {
                    let mut visited = BTreeSet::new();
                    self.recurse_contents(object, &entry.parts, entry.reorder, &mut visited)?;
                }
                self.finalize_attrs_for(&entry.parts)?;
                Ok(())
            }
        }
    }

    /// The rest pass: drive every unpruned global binding to `Recurse`.
    /// Done tables make revisits emission-free; the walk still descends
    /// so bindings deferred from earlier files get finalized.
    fn dump_rest(&mut self) -> Result<(), DumpError> {
        self.scope_cursor = self.interp.global();
        let global = self.interp.global();
        for name in self.interp.scope(global).var_names() {
            if self.registry.scope_done(global, &name) == Some(Do::Prune) {
                continue;
            }
            let parts = Parts::root(&name);
            let value = self.dump_binding(&parts, Do::Recurse)?;
            if let Some(object) = value.as_object() {
                let mut visited = BTreeSet::new();
                self.recurse_contents(object, &parts, false, &mut visited)?;
            }
        }
        Ok(())
    }

    /// Walk an object's own properties in insertion order, driving each
    /// to `Recurse` unless an exact config directive overrides it or
    /// routing defers it to another file. Afterwards, finalize property
    /// attributes and the array length intrinsic.
    fn recurse_contents(
        &mut self,
        object: ObjectId,
        at: &Parts,
        reorder: bool,
        visited: &mut BTreeSet<ObjectId>,
    ) -> Result<(), DumpError> {
        if !visited.insert(object) {
            return Ok(());
        }
        let keys = self.interp.object(object).own_property_keys();
        for key in &keys {
            let child = at.child(key);
            if self.registry.object_done(object, key) == Some(Do::Prune) {
                continue;
            }
            let (mut directive, child_reorder) = self
                .config
                .directive_for(&child)
                .unwrap_or((Do::Recurse, reorder));

            if directive == Do::Prune {
                self.registry.object_info(object).raise(key, Do::Prune);
                self.record(DumpEventKind::Pruned {
                    selector: child.to_selector(),
                });
                continue;
            }
            if directive == Do::Skip {
                if self.is_rest_file() {
                    directive = Do::Recurse;
                } else {
                    if !child_reorder {
                        self.emit_placeholder(object, &child)?;
                    }
                    continue;
                }
            }
            let target = self.config.file_for(&child).unwrap_or(self.current_file);
            if target > self.current_file {
                if !child_reorder {
                    self.emit_placeholder(object, &child)?;
                }
                continue;
            }

            match directive {
                Do::Decl => {
                    self.dump_binding(&child, Do::Decl)?;
                }
                Do::Set => {
                    self.dump_binding(&child, Do::Set)?;
                    self.finalize_attrs(object, key, &child)?;
                }
                Do::Recurse => {
                    let value = self.dump_binding(&child, Do::Recurse)?;
                    if let Some(child_object) = value.as_object() {
                        self.recurse_contents(child_object, &child, child_reorder, visited)?;
                    }
                }
                Do::Prune | Do::Skip => {}
            }
        }

        for key in &keys {
            let final_value = self
                .registry
                .object_done(object, key)
                .is_some_and(|done| done >= Do::Set);
            if final_value {
                self.finalize_attrs(object, key, &at.child(key))?;
            }
        }

        if let ObjectData::Array { length } = self.interp.object(object).data {
            let grown = keys
                .iter()
                .filter_map(|key| key.parse::<u32>().ok())
                .map(|index| index + 1)
                .max()
                .unwrap_or(0);
            if length != grown {
                self.emit(format!("{}.length = {length};", at.to_source()));
            }
        }
        Ok(())
    }

    // -- binding dumper -----------------------------------------------------

    /// Emit at most one statement bringing the binding at `parts` to
    /// `todo` (which must be at least `Decl`), and advance its done
    /// level. Returns the binding's live value for further driving.
    pub fn dump_binding(&mut self, parts: &Parts, todo: Do) -> Result<Value, DumpError> {
        debug_assert!(todo >= Do::Decl);
        let (site, value) = self.site_for(parts)?;
        let current = self.done_at(site, parts.last());
        if current == Some(Do::Prune) {
            return Ok(value);
        }

        match todo {
            Do::Decl => {
                if current.map_or(true, |done| done < Do::Decl) {
                    if parts.is_variable() {
                        if value.is_object() {
                            // Declaring an object-valued variable means
                            // constructing its shell: the declaration must
                            // leave a usable reference behind.
                            let rhs = self.to_expr(&value, Some(parts))?;
                            self.emit(format!("var {} = {rhs};", parts.first()));
                            self.raise_at(site, parts.last(), Do::Set);
                        } else {
                            self.emit(format!("var {};", parts.first()));
                            self.raise_at(site, parts.last(), Do::Decl);
                        }
                    } else {
                        if let Some(parent) = parts.parent() {
                            self.ensure_declared(&parent)?;
                        }
                        let placeholder = expr::undefined_expr(&self.shadow_snapshot());
                        self.emit(format!("{} = {placeholder};", parts.to_source()));
                        self.raise_at(site, parts.last(), Do::Decl);
                    }
                    self.record(DumpEventKind::BindingDumped {
                        selector: parts.to_selector(),
                        level: Do::Decl,
                    });
                }
            }
            Do::Set | Do::Recurse => {
                if current.map_or(true, |done| done < Do::Set) {
                    if let Some(parent) = parts.parent() {
                        self.ensure_declared(&parent)?;
                    }
                    let rhs = self.to_expr(&value, Some(parts))?;
                    let lhs = if parts.is_variable() {
                        if current.map_or(true, |done| done < Do::Decl) {
                            format!("var {}", parts.first())
                        } else {
                            parts.first().to_string()
                        }
                    } else {
                        parts.to_source()
                    };
                    self.emit(format!("{lhs} = {rhs};"));
                    self.record(DumpEventKind::BindingDumped {
                        selector: parts.to_selector(),
                        level: todo,
                    });
                }
                self.raise_at(site, parts.last(), todo);
            }
            Do::Prune | Do::Skip => {}
        }
        Ok(value)
    }

    /// Make the binding at `parts` usable as a reference or lvalue
    /// prefix: prefixes first, then the binding itself, constructing the
    /// object shell (or referencing an existing emission) as needed.
    fn ensure_declared(&mut self, parts: &Parts) -> Result<(), DumpError> {
        let (site, value) = self.site_for(parts)?;
        let current = self.done_at(site, parts.last());
        if current.is_some_and(|done| done >= Do::Set) {
            return Ok(());
        }
        if let Some(parent) = parts.parent() {
            self.ensure_declared(&parent)?;
        }
        let rhs = self.to_expr(&value, Some(parts))?;
        let lhs = if parts.is_variable() {
            if current.map_or(true, |done| done < Do::Decl) {
                format!("var {}", parts.first())
            } else {
                parts.first().to_string()
            }
        } else {
            parts.to_source()
        };
        self.emit(format!("{lhs} = {rhs};"));
        self.raise_at(site, parts.last(), Do::Set);
        self.record(DumpEventKind::ForwardDeclared {
            selector: parts.to_selector(),
        });
        Ok(())
    }

    /// Order-preserving placeholder for a property finalized elsewhere.
    fn emit_placeholder(&mut self, holder: ObjectId, child: &Parts) -> Result<(), DumpError> {
        if self
            .registry
            .object_done(holder, child.last())
            .map_or(false, |done| done >= Do::Decl)
        {
            return Ok(());
        }
        let placeholder = expr::undefined_expr(&self.shadow_snapshot());
        self.emit(format!("{} = {placeholder};", child.to_source()));
        self.registry.object_info(holder).raise(child.last(), Do::Decl);
        self.record(DumpEventKind::PlaceholderEmitted {
            selector: child.to_selector(),
        });
        Ok(())
    }

    // -- serializer ---------------------------------------------------------

    /// Serialize a value to source text evaluated at the current dump
    /// cursor. `parts` is the path the value is about to be stored at;
    /// constructing a new object without one is an error, because the
    /// result could never be referenced again.
    pub fn to_expr(&mut self, value: &Value, parts: Option<&Parts>) -> Result<String, DumpError> {
        let shadow = self.shadow_snapshot();
        if let Some(text) = expr::primitive_expr(value, &shadow) {
            return Ok(text);
        }
        let object = match value {
            Value::Object(id) => *id,
            _ => unreachable!("primitive_expr covers all non-object values"),
        };

        // Already emitted: always a reference, never a reconstruction.
        if let Some(existing) = self.registry.object_ref(object) {
            return Ok(existing.to_source());
        }

        // Built-ins are recovered by key in the target interpreter.
        if let Some(key) = self.interp.builtins().key_for(object).map(str::to_string) {
            if let Some(parts) = parts {
                self.registry.object_info(object).set_ref(parts.clone());
            }
            return Ok(expr::builtin_expr(&key));
        }

        // An object claimed by another path must be constructed there,
        // not here: forward-declare at the claimed location (or fail if
        // that location's file has already closed).
        if let Some(claim) = self.claims.get(&object).cloned() {
            if parts != Some(&claim.parts) {
                if claim.file_no < self.current_file {
                    return Err(DumpError::ordering(
                        claim.parts.to_selector(),
                        format!(
                            "object claimed by earlier file '{}' was never declared there",
                            self.config.files()[claim.file_no].filename
                        ),
                    ));
                }
                self.ensure_declared(&claim.parts)?;
                return match self.registry.object_ref(object) {
                    Some(existing) => Ok(existing.to_source()),
                    None => Err(DumpError::serializer(
                        claim.parts.to_selector(),
                        "forward declaration did not establish a reference",
                    )),
                };
            }
        }

        let parts = parts.ok_or_else(|| {
            DumpError::serializer(
                object.to_string(),
                "cannot construct an object inline without a path to reference it by",
            )
        })?;

        // Record the reference first so cycles close through it.
        self.registry.object_info(object).set_ref(parts.clone());

        let data = self.interp.object(object).data.clone();
        let proto = self.interp.object(object).proto;
        match data {
            ObjectData::Plain => match proto {
                Some(p) if p == self.interp.object_proto() => Ok("{}".to_string()),
                None => Ok("Object.create(null)".to_string()),
                Some(p) => Ok(format!(
                    "Object.create({})",
                    self.to_expr(&Value::Object(p), None)?
                )),
            },
            ObjectData::Array { .. } => Ok("[]".to_string()),
            ObjectData::Function { source: Some(source) } => Ok(source),
            ObjectData::Function { source: None } => Err(DumpError::serializer(
                parts.to_selector(),
                "function is neither user-defined nor a registered builtin",
            )),
            ObjectData::Date { epoch_ms } => expr::date_expr(epoch_ms).ok_or_else(|| {
                DumpError::serializer(parts.to_selector(), "date epoch outside representable range")
            }),
            ObjectData::Regexp { pattern, flags } => Ok(expr::regexp_expr(&pattern, &flags)),
        }
    }

    // -- attribute finalization ---------------------------------------------

    fn finalize_attrs_for(&mut self, parts: &Parts) -> Result<(), DumpError> {
        let Some(parent) = parts.parent() else {
            // Variables carry no property attributes.
            return Ok(());
        };
        let holder_value = self.get_value_for_parts(&parent)?;
        let Some(holder) = holder_value.as_object() else {
            return Ok(());
        };
        self.finalize_attrs(holder, parts.last(), parts)
    }

    /// Emit one `Object.defineProperty` for a property whose descriptor
    /// differs from the assignment default. The extended form also
    /// serializes ownership attributes. Runs once per property, after
    /// its value is final, so `configurable: false` lands last.
    fn finalize_attrs(
        &mut self,
        holder: ObjectId,
        key: &str,
        parts: &Parts,
    ) -> Result<(), DumpError> {
        if self.registry.object_info(holder).attrs_finalized(key) {
            return Ok(());
        }
        let holder_object = self.interp.object(holder);
        let holder_owner = holder_object.owner;
        let Some(property) = holder_object.own_property(key) else {
            return Ok(());
        };
        let property = property.clone();

        let mut attrs = Vec::new();
        if !property.writable {
            attrs.push("writable: false".to_string());
        }
        if !property.enumerable {
            attrs.push("enumerable: false".to_string());
        }
        if !property.configurable {
            attrs.push("configurable: false".to_string());
        }
        if !property.readable {
            attrs.push("readable: false".to_string());
        }
        if property.inherited_ownership {
            attrs.push("inheritedOwnership: true".to_string());
        }
        if property.owner != holder_owner {
            let owner_expr = match property.owner {
                None => "null".to_string(),
                Some(owner) => self.to_expr(&Value::Object(owner), None)?,
            };
            attrs.push(format!("owner: {owner_expr}"));
        }
        if attrs.is_empty() {
            return Ok(());
        }

        let Some(parent) = parts.parent() else {
            return Ok(());
        };
        self.emit(format!(
            "Object.defineProperty({}, {}, {{{}}});",
            parent.to_source(),
            quote::quote_string(key),
            attrs.join(", ")
        ));
        self.registry.object_info(holder).mark_attrs_finalized(key);
        self.record(DumpEventKind::AttributesFinalized {
            selector: parts.to_selector(),
        });
        Ok(())
    }

    // -- path resolution ----------------------------------------------------

    /// Resolve a path against the live heap, with fatal structure
    /// errors: the first part through the scope chain at the cursor,
    /// each further part as a privileged own-property read that must
    /// pass through an object. Missing leaf properties read as
    /// `undefined`.
    pub fn get_value_for_parts(&self, parts: &Parts) -> Result<Value, DumpError> {
        let Some((_, first)) = self.interp.resolve_var(self.scope_cursor, parts.first()) else {
            return Err(DumpError::structure(
                parts.to_selector(),
                format!("variable '{}' is not bound", parts.first()),
            ));
        };
        let mut value = first.clone();
        for key in &parts.components()[1..] {
            let Some(object) = value.as_object() else {
                return Err(DumpError::structure(
                    parts.to_selector(),
                    format!("traversal through a non-object ({})", value.type_name()),
                ));
            };
            value = self
                .interp
                .object(object)
                .get(key, Reader::Root)
                .cloned()
                .unwrap_or(Value::Undefined);
        }
        Ok(value)
    }

    /// Quiet resolution for claims precomputation.
    fn try_resolve(&self, parts: &Parts) -> Option<Value> {
        let (_, first) = self.interp.resolve_var(self.scope_cursor, parts.first())?;
        let mut value = first.clone();
        for key in &parts.components()[1..] {
            let object = value.as_object()?;
            value = self.interp.object(object).get(key, Reader::Root)?.clone();
        }
        Some(value)
    }

    fn site_for(&self, parts: &Parts) -> Result<(BindingSite, Value), DumpError> {
        if parts.is_variable() {
            match self.interp.resolve_var(self.scope_cursor, parts.first()) {
                Some((scope, value)) => Ok((BindingSite::Var(scope), value.clone())),
                None => Err(DumpError::structure(
                    parts.to_selector(),
                    format!("variable '{}' is not bound", parts.first()),
                )),
            }
        } else {
            let Some(parent) = parts.parent() else {
                return Err(DumpError::structure(parts.to_selector(), "empty path"));
            };
            let holder_value = self.get_value_for_parts(&parent)?;
            let Some(holder) = holder_value.as_object() else {
                return Err(DumpError::structure(
                    parts.to_selector(),
                    format!(
                        "cannot bind a property on a {}",
                        holder_value.type_name()
                    ),
                ));
            };
            let value = self
                .interp
                .object(holder)
                .get(parts.last(), Reader::Root)
                .cloned()
                .unwrap_or(Value::Undefined);
            Ok((BindingSite::Prop(holder), value))
        }
    }

    fn done_at(&self, site: BindingSite, name: &str) -> Option<Do> {
        match site {
            BindingSite::Var(scope) => self.registry.scope_done(scope, name),
            BindingSite::Prop(object) => self.registry.object_done(object, name),
        }
    }

    fn raise_at(&mut self, site: BindingSite, name: &str, todo: Do) {
        match site {
            BindingSite::Var(scope) => {
                self.registry.scope_info(scope).raise(name, todo);
            }
            BindingSite::Prop(object) => {
                self.registry.object_info(object).raise(name, todo);
            }
        }
    }

    // -- shadowing oracle ---------------------------------------------------

    /// True when any scope strictly between the cursor and the global
    /// reference scope binds `name`.
    pub fn is_shadowed(&self, name: &str) -> bool {
        let global = self.interp.global();
        let mut cursor = self.scope_cursor;
        while cursor != global {
            let scope = self.interp.scope(cursor);
            if scope.has_binding(name) {
                return true;
            }
            match scope.outer {
                Some(outer) => cursor = outer,
                None => break,
            }
        }
        false
    }

    fn shadow_snapshot(&self) -> ShadowSnapshot {
        ShadowSnapshot {
            undefined: self.is_shadowed("undefined"),
            nan: self.is_shadowed("NaN"),
            infinity: self.is_shadowed("Infinity"),
        }
    }

    /// Move the dump cursor to another scope. The driver resets it to
    /// global at each file; embedders dumping inside a closure scope set
    /// it explicitly.
    pub fn set_scope_cursor(&mut self, scope: ScopeId) {
        self.scope_cursor = scope;
    }

    // -- plumbing -----------------------------------------------------------

    fn is_rest_file(&self) -> bool {
        self.config
            .files()
            .get(self.current_file)
            .map_or(false, |file| file.rest)
    }

    fn emit(&mut self, statement: String) {
        let buffer = &mut self.buffers[self.current_file];
        buffer.push_str(&statement);
        buffer.push('\n');
    }

    fn record(&mut self, kind: DumpEventKind) {
        let file = self
            .config
            .files()
            .get(self.current_file)
            .map(|file| file.filename.clone())
            .unwrap_or_default();
        self.events.push(DumpEvent {
            sequence: self.next_sequence,
            file,
            kind,
        });
        self.next_sequence += 1;
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Dump the interpreter's live state per `spec`. Evaluating the
/// returned files in declared order in a fresh interpreter reproduces
/// the dumped state.
pub fn dump(interp: &Interpreter, spec: &[SpecEntry]) -> Result<DumpOutput, DumpError> {
    let config = Config::from_spec(spec)?;
    Dumper::new(interp, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentItem;

    fn rest_spec() -> Vec<SpecEntry> {
        vec![SpecEntry {
            filename: "out.js".to_string(),
            contents: Vec::new(),
            rest: true,
        }]
    }

    fn dumper_for<'a>(interp: &'a Interpreter, spec: &[SpecEntry]) -> Dumper<'a> {
        Dumper::new(interp, Config::from_spec(spec).expect("config"))
    }

    #[test]
    fn get_value_for_parts_traverses_objects_only() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let obj = interp.create_plain();
        interp.set_property(obj, "n", Value::Number(4.0));
        interp.define_var(global, "a", Value::Object(obj));
        interp.define_var(global, "prim", Value::Number(1.0));

        let dumper = dumper_for(&interp, &rest_spec());
        let parts = Parts::from_selector("a.n").expect("parts");
        assert_eq!(
            dumper.get_value_for_parts(&parts).expect("value"),
            Value::Number(4.0)
        );

        let bad = Parts::from_selector("prim.x").expect("parts");
        let err = dumper.get_value_for_parts(&bad).expect_err("non-object");
        assert_eq!(err.kind(), crate::error::DumpErrorKind::Structure);

        let unbound = Parts::root("missing");
        assert!(dumper.get_value_for_parts(&unbound).is_err());
    }

    #[test]
    fn shadowing_oracle_ignores_the_global_scope() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        interp.define_var(global, "NaN", Value::Number(f64::NAN));
        let inner = interp.create_child_scope(global);
        interp.define_var(inner, "Infinity", Value::Number(f64::INFINITY));

        let mut dumper = dumper_for(&interp, &rest_spec());
        assert!(!dumper.is_shadowed("NaN"));
        dumper.set_scope_cursor(inner);
        assert!(dumper.is_shadowed("Infinity"));
        assert!(!dumper.is_shadowed("NaN"));
    }

    #[test]
    fn to_expr_refuses_inline_construction_without_a_path() {
        let mut interp = Interpreter::new();
        let obj = interp.create_plain();
        let global = interp.global();
        interp.define_var(global, "a", Value::Object(obj));

        // No rest file: the object has no claimed location to
        // forward-declare through, so an inline mention is fatal.
        let spec = vec![SpecEntry {
            filename: "out.js".to_string(),
            contents: Vec::new(),
            rest: false,
        }];
        let mut dumper = dumper_for(&interp, &spec);
        let err = dumper
            .to_expr(&Value::Object(obj), None)
            .expect_err("no path");
        assert_eq!(err.kind(), crate::error::DumpErrorKind::Serializer);
    }

    #[test]
    fn to_expr_emits_each_object_once_then_references() {
        let mut interp = Interpreter::new();
        let obj = interp.create_plain();
        let global = interp.global();
        interp.define_var(global, "a", Value::Object(obj));

        let mut dumper = dumper_for(&interp, &rest_spec());
        let a = Parts::root("a");
        assert_eq!(
            dumper.to_expr(&Value::Object(obj), Some(&a)).expect("new"),
            "{}"
        );
        let b = Parts::root("b");
        assert_eq!(
            dumper.to_expr(&Value::Object(obj), Some(&b)).expect("ref"),
            "a"
        );
    }

    #[test]
    fn builtins_are_recovered_by_key() {
        let interp = Interpreter::new();
        let proto = interp.object_proto();
        let mut dumper = dumper_for(&interp, &rest_spec());
        assert_eq!(
            dumper.to_expr(&Value::Object(proto), None).expect("builtin"),
            "new 'Object.prototype'"
        );
    }

    #[test]
    fn dump_binding_prefixes_var_only_below_decl() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        interp.define_var(global, "x", Value::Number(2.0));

        let mut dumper = dumper_for(&interp, &rest_spec());
        let x = Parts::root("x");
        dumper.dump_binding(&x, Do::Decl).expect("decl");
        dumper.dump_binding(&x, Do::Set).expect("set");
        dumper.dump_binding(&x, Do::Set).expect("idempotent");
        let output = dumper.finish();
        assert_eq!(output.files[0].source, "var x;\nx = 2;\n");
    }

    #[test]
    fn function_without_source_or_key_is_a_serializer_error() {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let native = interp.create_object(ObjectData::Function { source: None }, None);
        interp.define_var(global, "f", Value::Object(native));

        let spec = vec![SpecEntry {
            filename: "out.js".to_string(),
            contents: vec![ContentItem::Selector("f".to_string())],
            rest: false,
        }];
        let err = dump(&interp, &spec).expect_err("native function");
        assert_eq!(err.kind(), crate::error::DumpErrorKind::Serializer);
    }
}
