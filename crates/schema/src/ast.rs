//! Parse-tree records for a single `.thrift` file.
//!
//! These are produced by the parser and consumed by the loader and linker.
//! Nothing here is resolved: type references are still [`RawType`] names.

use crate::namespace::NamespaceScope;
use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Location
// ──────────────────────────────────────────────

/// A position in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// The location of a whole file, before any position is known.
    pub fn file(file: impl Into<String>) -> Self {
        Location {
            file: file.into(),
            line: 1,
            column: 1,
        }
    }

    pub fn at(&self, line: u32, column: u32) -> Self {
        Location {
            file: self.file.clone(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Raw types (pre-linking)
// ──────────────────────────────────────────────

/// A type name as written in the IDL, before symbol resolution.
///
/// Container specs nest arbitrarily; every other name is kept verbatim and
/// only checked by the linker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    Named(String),
    List(Box<RawType>),
    Set(Box<RawType>),
    Map {
        key: Box<RawType>,
        value: Box<RawType>,
    },
}

impl RawType {
    pub fn named(name: impl Into<String>) -> Self {
        RawType::Named(name.into())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, RawType::Named(n) if n == "void")
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawType::Named(n) => write!(f, "{}", n),
            RawType::List(e) => write!(f, "list<{}>", e),
            RawType::Set(e) => write!(f, "set<{}>", e),
            RawType::Map { key, value } => write!(f, "map<{}, {}>", key, value),
        }
    }
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NamespaceElement {
    pub location: Location,
    pub scope: NamespaceScope,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct IncludeElement {
    pub location: Location,
    pub path: String,
    /// `cpp_include`: only meaningful to the native C++ generator, never loaded.
    pub is_cpp: bool,
}

#[derive(Debug, Clone)]
pub struct TypedefElement {
    pub location: Location,
    pub documentation: String,
    pub old_type: RawType,
    pub new_name: String,
}

#[derive(Debug, Clone)]
pub struct EnumElement {
    pub location: Location,
    pub documentation: String,
    pub name: String,
    pub members: Vec<EnumMemberElement>,
}

#[derive(Debug, Clone)]
pub struct EnumMemberElement {
    pub location: Location,
    pub documentation: String,
    pub name: String,
    /// The value written in the source, if any.
    pub explicit_value: Option<i32>,
    /// The effective value, auto-assigned when `explicit_value` is absent.
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructKind {
    Struct,
    Union,
    Exception,
}

impl fmt::Display for StructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructKind::Struct => write!(f, "struct"),
            StructKind::Union => write!(f, "union"),
            StructKind::Exception => write!(f, "exception"),
        }
    }
}

/// One parse-level shape for structs, unions and exceptions.
#[derive(Debug, Clone)]
pub struct StructElement {
    pub location: Location,
    pub documentation: String,
    pub kind: StructKind,
    pub name: String,
    pub fields: Vec<FieldElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    Required,
    Optional,
    /// Neither `required` nor `optional` was written.
    #[default]
    Default,
}

#[derive(Debug, Clone)]
pub struct FieldElement {
    pub location: Location,
    pub documentation: String,
    pub id: i32,
    /// Whether `id` was written in the source or assigned by the parser.
    pub explicit_id: bool,
    pub requiredness: Requiredness,
    pub type_name: RawType,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ServiceElement {
    pub location: Location,
    pub documentation: String,
    pub name: String,
    pub extends: Option<String>,
    pub functions: Vec<FunctionElement>,
}

#[derive(Debug, Clone)]
pub struct FunctionElement {
    pub location: Location,
    pub documentation: String,
    pub one_way: bool,
    pub return_type: RawType,
    pub name: String,
    pub params: Vec<FieldElement>,
    pub exceptions: Vec<FieldElement>,
}

/// A top-level declaration as read by the parser, before it is filed into
/// the per-kind lists of a [`ThriftFile`].
#[derive(Debug, Clone)]
pub enum Declaration {
    Namespace(NamespaceElement),
    Include(IncludeElement),
    Typedef(TypedefElement),
    Enum(EnumElement),
    Struct(StructElement),
    Service(ServiceElement),
}

impl Declaration {
    /// Namespace and include statements must precede everything else.
    pub fn is_header(&self) -> bool {
        matches!(self, Declaration::Namespace(_) | Declaration::Include(_))
    }

    pub fn location(&self) -> &Location {
        match self {
            Declaration::Namespace(n) => &n.location,
            Declaration::Include(i) => &i.location,
            Declaration::Typedef(t) => &t.location,
            Declaration::Enum(e) => &e.location,
            Declaration::Struct(s) => &s.location,
            Declaration::Service(s) => &s.location,
        }
    }
}

// ──────────────────────────────────────────────
// File
// ──────────────────────────────────────────────

/// The complete parse tree of one `.thrift` file.
#[derive(Debug, Clone)]
pub struct ThriftFile {
    pub location: Location,
    pub namespaces: Vec<NamespaceElement>,
    pub includes: Vec<IncludeElement>,
    pub typedefs: Vec<TypedefElement>,
    pub enums: Vec<EnumElement>,
    pub structs: Vec<StructElement>,
    pub unions: Vec<StructElement>,
    pub exceptions: Vec<StructElement>,
    pub services: Vec<ServiceElement>,
    /// Number of non-header declarations seen, including rejected `const`.
    pub declaration_count: usize,
}

impl ThriftFile {
    pub fn new(location: Location) -> Self {
        ThriftFile {
            location,
            namespaces: Vec::new(),
            includes: Vec::new(),
            typedefs: Vec::new(),
            enums: Vec::new(),
            structs: Vec::new(),
            unions: Vec::new(),
            exceptions: Vec::new(),
            services: Vec::new(),
            declaration_count: 0,
        }
    }

    /// File a declaration into its per-kind list.
    pub fn push(&mut self, decl: Declaration) {
        match decl {
            Declaration::Namespace(n) => self.namespaces.push(n),
            Declaration::Include(i) => self.includes.push(i),
            Declaration::Typedef(t) => self.typedefs.push(t),
            Declaration::Enum(e) => self.enums.push(e),
            Declaration::Struct(s) => match s.kind {
                StructKind::Struct => self.structs.push(s),
                StructKind::Union => self.unions.push(s),
                StructKind::Exception => self.exceptions.push(s),
            },
            Declaration::Service(s) => self.services.push(s),
        }
    }

    /// Struct-like declarations of every kind, in kind order.
    pub fn struct_likes(&self) -> impl Iterator<Item = &StructElement> {
        self.structs
            .iter()
            .chain(self.unions.iter())
            .chain(self.exceptions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_type_display_is_canonical() {
        let t = RawType::List(Box::new(RawType::Map {
            key: Box::new(RawType::named("string")),
            value: Box::new(RawType::Set(Box::new(RawType::named("Status")))),
        }));
        assert_eq!(t.to_string(), "list<map<string, set<Status>>>");
    }

    #[test]
    fn location_display() {
        let loc = Location::file("a.thrift").at(3, 7);
        assert_eq!(loc.to_string(), "a.thrift:3:7");
    }

    #[test]
    fn push_partitions_struct_kinds() {
        let loc = Location::file("x.thrift");
        let mut file = ThriftFile::new(loc.clone());
        for (kind, name) in [
            (StructKind::Exception, "E"),
            (StructKind::Struct, "S"),
            (StructKind::Union, "U"),
        ] {
            file.push(Declaration::Struct(StructElement {
                location: loc.clone(),
                documentation: String::new(),
                kind,
                name: name.to_owned(),
                fields: Vec::new(),
            }));
        }
        assert_eq!(file.structs[0].name, "S");
        assert_eq!(file.unions[0].name, "U");
        assert_eq!(file.exceptions[0].name, "E");
        let order: Vec<_> = file.struct_likes().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["S", "U", "E"]);
    }
}
