//! Programs: one parsed `.thrift` file plus its linking state.

use crate::ast::{Location, RawType, ThriftFile};
use crate::error::ThriftError;
use crate::namespace::NamespaceScope;
use crate::schema::ServiceId;
use crate::types::{TypeGraph, TypeId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::{Index, IndexMut};
use std::path::PathBuf;

/// Identifies a program within one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProgramId(pub(crate) usize);

impl ProgramId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One loaded file. The symbol tables start empty and are filled once,
/// by the linker, as the program's declarations are resolved.
#[derive(Debug)]
pub struct Program {
    pub id: ProgramId,
    pub path: PathBuf,
    /// File stem; the prefix other programs use for qualified names.
    pub name: String,
    pub file: ThriftFile,
    /// Included programs, in declaration order, duplicates removed.
    pub includes: Vec<ProgramId>,
    types: HashMap<String, TypeId>,
    services: HashMap<String, ServiceId>,
}

impl Program {
    pub fn new(id: ProgramId, path: PathBuf, file: ThriftFile) -> Self {
        let name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Program {
            id,
            path,
            name,
            file,
            includes: Vec::new(),
            types: HashMap::new(),
            services: HashMap::new(),
        }
    }

    pub fn type_symbol(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    pub fn service_symbol(&self, name: &str) -> Option<ServiceId> {
        self.services.get(name).copied()
    }

    pub(crate) fn define_type(&mut self, name: &str, id: TypeId) {
        let previous = self.types.insert(name.to_owned(), id);
        debug_assert!(previous.is_none(), "type '{}' defined twice", name);
    }

    pub(crate) fn define_service(&mut self, name: &str, id: ServiceId) {
        let previous = self.services.insert(name.to_owned(), id);
        debug_assert!(previous.is_none(), "service '{}' defined twice", name);
    }

    /// Effective namespaces; a later statement for the same scope wins.
    pub fn namespaces(&self) -> BTreeMap<NamespaceScope, String> {
        self.file
            .namespaces
            .iter()
            .map(|n| (n.scope, n.namespace.clone()))
            .collect()
    }
}

/// Every program of one load, indexed by [`ProgramId`].
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: Vec<Program>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, path: PathBuf, file: ThriftFile) -> ProgramId {
        let id = ProgramId(self.programs.len());
        self.programs.push(Program::new(id, path, file));
        id
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter()
    }

    /// Find a type visible from `program`: its own symbols first, then the
    /// symbols of each directly included program, by simple name or by
    /// `stem.Name`.
    pub fn lookup_type(&self, program: ProgramId, name: &str) -> Option<TypeId> {
        let local = &self[program];
        if let Some(id) = local.type_symbol(name) {
            return Some(id);
        }
        local.includes.iter().find_map(|&inc| {
            let included = &self[inc];
            included.type_symbol(name).or_else(|| {
                strip_qualifier(name, &included.name).and_then(|n| included.type_symbol(n))
            })
        })
    }

    /// Same visibility rules as [`lookup_type`](Self::lookup_type), for services.
    pub fn lookup_service(&self, program: ProgramId, name: &str) -> Option<ServiceId> {
        let local = &self[program];
        if let Some(id) = local.service_symbol(name) {
            return Some(id);
        }
        local.includes.iter().find_map(|&inc| {
            let included = &self[inc];
            included.service_symbol(name).or_else(|| {
                strip_qualifier(name, &included.name).and_then(|n| included.service_symbol(n))
            })
        })
    }

    /// Resolve a written type against the symbols visible from `program`,
    /// interning containers in `graph`.
    ///
    /// Unknown names, and containers over them, come back as
    /// [`TypeId::PLACEHOLDER`]. `void` is rejected; return types are
    /// checked by the caller before they get here.
    pub fn resolve_type(
        &self,
        program: ProgramId,
        raw: &RawType,
        location: &Location,
        graph: &mut TypeGraph,
    ) -> Result<TypeId, ThriftError> {
        let id = match raw {
            RawType::Named(name) => match TypeGraph::builtin(name) {
                Some(TypeId::VOID) => {
                    return Err(ThriftError::link(
                        location,
                        "void is only valid as a function return type",
                    ))
                }
                Some(id) => id,
                None => self
                    .lookup_type(program, name)
                    .unwrap_or(TypeId::PLACEHOLDER),
            },
            RawType::List(element) => {
                let element = self.resolve_type(program, element, location, graph)?;
                if element.is_placeholder() {
                    TypeId::PLACEHOLDER
                } else {
                    graph.list(element)
                }
            }
            RawType::Set(element) => {
                let element = self.resolve_type(program, element, location, graph)?;
                if element.is_placeholder() {
                    TypeId::PLACEHOLDER
                } else {
                    graph.set(element)
                }
            }
            RawType::Map { key, value } => {
                let key = self.resolve_type(program, key, location, graph)?;
                let value = self.resolve_type(program, value, location, graph)?;
                if key.is_placeholder() || value.is_placeholder() {
                    TypeId::PLACEHOLDER
                } else {
                    graph.map(key, value)
                }
            }
        };
        Ok(id)
    }

    /// The first name inside `raw` that does not resolve from `program`.
    pub fn first_unresolved<'a>(&self, program: ProgramId, raw: &'a RawType) -> Option<&'a str> {
        match raw {
            RawType::Named(name) => {
                if TypeGraph::builtin(name).is_some() || self.lookup_type(program, name).is_some() {
                    None
                } else {
                    Some(name)
                }
            }
            RawType::List(e) | RawType::Set(e) => self.first_unresolved(program, e),
            RawType::Map { key, value } => self
                .first_unresolved(program, key)
                .or_else(|| self.first_unresolved(program, value)),
        }
    }
}

fn strip_qualifier<'a>(name: &'a str, program: &str) -> Option<&'a str> {
    name.strip_prefix(program)?.strip_prefix('.')
}

impl Index<ProgramId> for ProgramRegistry {
    type Output = Program;

    fn index(&self, id: ProgramId) -> &Program {
        &self.programs[id.0]
    }
}

impl IndexMut<ProgramId> for ProgramRegistry {
    fn index_mut(&mut self, id: ProgramId) -> &mut Program {
        &mut self.programs[id.0]
    }
}
