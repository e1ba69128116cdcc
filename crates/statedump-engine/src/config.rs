//! Dump specification and the routing trie built from it.
//!
//! A spec is an ordered list of output files, each claiming a set of
//! dotted paths at a depth directive. Parsing is one pass: every content
//! item normalizes to `{path, do, reorder}`, every path inserts into a
//! trie of `ConfigNode`s recording which file first claimed it, and at
//! most one file may be the rest file that absorbs everything unclaimed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DumpError;
use crate::selector::Parts;

// ---------------------------------------------------------------------------
// Do — the depth directive lattice
// ---------------------------------------------------------------------------

/// How deep to dump a binding. Totally ordered; status updates take the
/// maximum and never downgrade.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Do {
    /// Exclude this binding and everything reachable only through it.
    Prune = 1,
    /// Defer to the rest file.
    Skip = 2,
    /// Ensure the binding exists (forward declaration).
    Decl = 3,
    /// Ensure the binding holds its final value; attributes finalized.
    Set = 4,
    /// `Set`, then drive every own property to `Recurse`.
    Recurse = 5,
}

impl fmt::Display for Do {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prune => "prune",
            Self::Skip => "skip",
            Self::Decl => "decl",
            Self::Set => "set",
            Self::Recurse => "recurse",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Spec input types
// ---------------------------------------------------------------------------

/// One content item as written in a spec: either a bare selector
/// (shorthand for a full-depth dump) or the explicit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    Selector(String),
    Detailed {
        path: String,
        #[serde(rename = "do")]
        directive: Do,
        #[serde(default)]
        reorder: bool,
    },
}

/// One output file of the spec, in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub filename: String,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
    #[serde(default)]
    pub rest: bool,
}

/// Normalized content entry: canonical Parts, directive, reorder flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub parts: Parts,
    pub directive: Do,
    pub reorder: bool,
}

impl ContentItem {
    fn normalize(&self) -> Result<ContentEntry, DumpError> {
        match self {
            Self::Selector(path) => Ok(ContentEntry {
                parts: Parts::from_selector(path)?,
                directive: Do::Recurse,
                reorder: false,
            }),
            Self::Detailed {
                path,
                directive,
                reorder,
            } => Ok(ContentEntry {
                parts: Parts::from_selector(path)?,
                directive: *directive,
                reorder: *reorder,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Config — normalized spec plus the routing trie
// ---------------------------------------------------------------------------

/// One file of the normalized config.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSpec {
    pub filename: String,
    pub entries: Vec<ContentEntry>,
    pub rest: bool,
}

#[derive(Debug, Clone, Default)]
struct ConfigNode {
    children: BTreeMap<String, ConfigNode>,
    first_file_no: Option<usize>,
    directive: Option<(Do, bool)>,
}

/// The normalized dump config. Answers the two questions the driver
/// asks: which file claims a path, and what directive applies at it.
#[derive(Debug, Clone)]
pub struct Config {
    files: Vec<FileSpec>,
    root: ConfigNode,
    default_file_no: Option<usize>,
}

impl Config {
    /// Build in one pass over the spec. Duplicate rest entries are a
    /// fatal config error; path claims and directives are first-wins.
    pub fn from_spec(spec: &[SpecEntry]) -> Result<Self, DumpError> {
        let mut files = Vec::with_capacity(spec.len());
        let mut root = ConfigNode::default();
        let mut default_file_no = None;

        for (file_no, entry) in spec.iter().enumerate() {
            if entry.rest {
                if default_file_no.is_some() {
                    return Err(DumpError::config(
                        &entry.filename,
                        "more than one rest entry",
                    ));
                }
                default_file_no = Some(file_no);
            }
            let mut entries = Vec::with_capacity(entry.contents.len());
            for item in &entry.contents {
                let content = item.normalize()?;
                let node = root.insert(&content.parts);
                node.first_file_no.get_or_insert(file_no);
                if node.directive.is_none() {
                    node.directive = Some((content.directive, content.reorder));
                }
                entries.push(content);
            }
            files.push(FileSpec {
                filename: entry.filename.clone(),
                entries,
                rest: entry.rest,
            });
        }

        Ok(Self {
            files,
            root,
            default_file_no,
        })
    }

    /// Parse a JSON spec and build the config from it.
    pub fn from_json(json: &str) -> Result<Self, DumpError> {
        let spec: Vec<SpecEntry> = serde_json::from_str(json)
            .map_err(|err| DumpError::config("", format!("malformed spec: {err}")))?;
        Self::from_spec(&spec)
    }

    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }

    pub fn default_file_no(&self) -> Option<usize> {
        self.default_file_no
    }

    /// The file that claims `parts`: the closest ancestor claim on the
    /// path, else the rest file.
    pub fn file_for(&self, parts: &Parts) -> Option<usize> {
        let mut node = &self.root;
        let mut claimed = None;
        for component in parts.components() {
            match node.children.get(component) {
                Some(child) => {
                    node = child;
                    if let Some(file_no) = node.first_file_no {
                        claimed = Some(file_no);
                    }
                }
                None => break,
            }
        }
        claimed.or(self.default_file_no)
    }

    /// The directive declared at exactly `parts`, if any.
    pub fn directive_for(&self, parts: &Parts) -> Option<(Do, bool)> {
        let mut node = &self.root;
        for component in parts.components() {
            node = node.children.get(component)?;
        }
        node.directive
    }
}

impl ConfigNode {
    fn insert(&mut self, parts: &Parts) -> &mut ConfigNode {
        let mut node = self;
        for component in parts.components() {
            node = node.children.entry(component.clone()).or_default();
        }
        node
    }
}
