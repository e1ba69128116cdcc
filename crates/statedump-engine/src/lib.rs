#![forbid(unsafe_code)]

//! Dump engine that snapshots a live JavaScript-semantics interpreter
//! into source-text files: re-evaluating the files in declared order in
//! a fresh interpreter reconstructs the original object graph, including
//! cycles, shared references, property attributes, and insertion order.
//!
//! Entry point: [`dumper::dump`] with an [`interpreter::Interpreter`]
//! and a spec of [`config::SpecEntry`] files.

pub mod binding_info;
pub mod config;
pub mod dumper;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod object_model;
pub mod quote;
pub mod selector;
