#![allow(clippy::result_large_err)]
//! thrifty-schema: Thrift IDL front end.
//!
//! Parses `.thrift` files, follows their includes, and links every type
//! reference into a shared type graph, producing a read-only [`Schema`]
//! for code generators.
//!
//! # Public API
//!
//! - [`Loader`] -- configure root files and include paths, then load
//! - [`Schema`] -- the linked result; [`Schema::to_json`] for tooling
//! - [`TypeGraph`], [`TypeId`], [`TypeVisitor`] -- the type graph
//! - [`ThriftError`] -- syntax, link and I/O failures
//!
//! Individual pass entry functions are also public for tools that want
//! to stop after parsing or loading.

/// Version of the JSON document produced by [`Schema::to_json`].
pub const SCHEMA_FORMAT_VERSION: &str = "1.0";

pub mod ast;
pub mod error;
pub mod load;
pub mod namespace;
pub mod parser;
pub mod pass1_load;
pub mod pass2_index;
pub mod pass3_typedefs;
pub mod pass4_link;
pub mod pass5_serialize;
pub mod program;
pub mod scanner;
pub mod schema;
pub mod source;
pub mod types;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Location, Requiredness, StructKind, ThriftFile};
pub use error::ThriftError;
pub use namespace::NamespaceScope;
pub use program::{Program, ProgramId, ProgramRegistry};
pub use schema::{
    EnumMember, EnumType, Field, Schema, Service, ServiceId, ServiceMethod, StructType, Typedef,
};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use types::{BuiltinType, ThriftType, TypeGraph, TypeId, TypeVisitor, UserKind};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use load::{load, Loader};
pub use parser::parse;
pub use pass1_load::load_programs;
pub use pass4_link::link;
