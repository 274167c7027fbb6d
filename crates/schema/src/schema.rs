//! The linked, read-only result of a load.
//!
//! Every type reference in these records is a [`TypeId`] into the schema's
//! own [`TypeGraph`], so identity comparisons work across programs.

use crate::ast::{Location, Requiredness, StructKind};
use crate::namespace::NamespaceScope;
use crate::types::{TypeGraph, TypeId};
use serde::Serialize;
use std::collections::BTreeMap;

pub type Namespaces = BTreeMap<NamespaceScope, String>;

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: i32,
    pub documentation: String,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub type_id: TypeId,
    pub members: Vec<EnumMember>,
    pub documentation: String,
    pub location: Location,
    pub namespaces: Namespaces,
}

impl EnumType {
    pub fn find_member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: String,
    /// The aliased type; may itself be a typedef.
    pub old_type: TypeId,
    /// This typedef's own node in the graph.
    pub type_id: TypeId,
    pub documentation: String,
    pub location: Location,
    pub namespaces: Namespaces,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub id: i32,
    pub name: String,
    pub requiredness: Requiredness,
    pub type_id: TypeId,
    pub documentation: String,
    pub location: Location,
}

impl Field {
    pub fn required(&self) -> bool {
        self.requiredness == Requiredness::Required
    }

    pub fn optional(&self) -> bool {
        self.requiredness == Requiredness::Optional
    }

    /// Marked `@redacted` in its documentation; generators hide the value.
    pub fn is_redacted(&self) -> bool {
        has_marker(&self.documentation, "@redacted")
    }

    /// Marked `@obfuscated` in its documentation.
    pub fn is_obfuscated(&self) -> bool {
        has_marker(&self.documentation, "@obfuscated")
    }
}

fn has_marker(doc: &str, marker: &str) -> bool {
    doc.to_ascii_lowercase().contains(marker)
}

/// A struct, union or exception.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub kind: StructKind,
    pub type_id: TypeId,
    pub fields: Vec<Field>,
    pub documentation: String,
    pub location: Location,
    pub namespaces: Namespaces,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Index of a service in [`Schema::services`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceId(pub(crate) usize);

impl ServiceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ServiceMethod {
    pub name: String,
    pub one_way: bool,
    pub return_type: TypeId,
    pub params: Vec<Field>,
    pub exceptions: Vec<Field>,
    pub documentation: String,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub extends: Option<ServiceId>,
    pub methods: Vec<ServiceMethod>,
    pub documentation: String,
    pub location: Location,
    pub namespaces: Namespaces,
}

impl Service {
    pub fn method(&self, name: &str) -> Option<&ServiceMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Everything declared across the loaded files, in link order: included
/// programs' elements precede those of the programs including them.
#[derive(Debug, Default)]
pub struct Schema {
    pub(crate) types: TypeGraph,
    pub(crate) enums: Vec<EnumType>,
    pub(crate) typedefs: Vec<Typedef>,
    pub(crate) structs: Vec<StructType>,
    pub(crate) unions: Vec<StructType>,
    pub(crate) exceptions: Vec<StructType>,
    pub(crate) services: Vec<Service>,
}

impl Schema {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &TypeGraph {
        &self.types
    }

    pub fn enums(&self) -> &[EnumType] {
        &self.enums
    }

    pub fn typedefs(&self) -> &[Typedef] {
        &self.typedefs
    }

    pub fn structs(&self) -> &[StructType] {
        &self.structs
    }

    pub fn unions(&self) -> &[StructType] {
        &self.unions
    }

    pub fn exceptions(&self) -> &[StructType] {
        &self.exceptions
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: ServiceId) -> &Service {
        &self.services[id.0]
    }

    /// The canonical name of a type, e.g. `map<string, list<i32>>`.
    pub fn type_name(&self, id: TypeId) -> &str {
        self.types.name(id)
    }

    pub(crate) fn struct_likes_mut(&mut self, kind: StructKind) -> &mut Vec<StructType> {
        match kind {
            StructKind::Struct => &mut self.structs,
            StructKind::Union => &mut self.unions,
            StructKind::Exception => &mut self.exceptions,
        }
    }
}
