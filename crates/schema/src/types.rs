//! The type graph: every Thrift type known to one load, de-duplicated.
//!
//! Types are referred to by [`TypeId`] handles into a [`TypeGraph`] arena.
//! Built-ins live at fixed indices shared by every graph, so
//! `TypeId::I32` means the same thing in every schema. Containers are
//! interned by structure: resolving `list<i32>` twice yields one handle.

use crate::program::ProgramId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A handle to a node in a [`TypeGraph`]. Equal handles are the same type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    /// Marks a reference that is not resolved yet. Never reachable from a
    /// finished schema.
    pub const PLACEHOLDER: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const BYTE: TypeId = TypeId(2);
    /// `i8` is a synonym for `byte`.
    pub const I8: TypeId = TypeId::BYTE;
    pub const I16: TypeId = TypeId(3);
    pub const I32: TypeId = TypeId(4);
    pub const I64: TypeId = TypeId(5);
    pub const DOUBLE: TypeId = TypeId(6);
    pub const STRING: TypeId = TypeId(7);
    pub const BINARY: TypeId = TypeId(8);
    /// Only valid as a function return type.
    pub const VOID: TypeId = TypeId(9);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_placeholder(self) -> bool {
        self == TypeId::PLACEHOLDER
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Void,
}

const BUILTINS: [BuiltinType; 9] = [
    BuiltinType::Bool,
    BuiltinType::Byte,
    BuiltinType::I16,
    BuiltinType::I32,
    BuiltinType::I64,
    BuiltinType::Double,
    BuiltinType::String,
    BuiltinType::Binary,
    BuiltinType::Void,
];

impl BuiltinType {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Bool => "bool",
            BuiltinType::Byte => "byte",
            BuiltinType::I16 => "i16",
            BuiltinType::I32 => "i32",
            BuiltinType::I64 => "i64",
            BuiltinType::Double => "double",
            BuiltinType::String => "string",
            BuiltinType::Binary => "binary",
            BuiltinType::Void => "void",
        }
    }

    /// Look up a built-in by its IDL spelling; `i8` maps to `byte`.
    pub fn from_name(name: &str) -> Option<BuiltinType> {
        match name {
            "bool" => Some(BuiltinType::Bool),
            "byte" | "i8" => Some(BuiltinType::Byte),
            "i16" => Some(BuiltinType::I16),
            "i32" => Some(BuiltinType::I32),
            "i64" => Some(BuiltinType::I64),
            "double" => Some(BuiltinType::Double),
            "string" => Some(BuiltinType::String),
            "binary" => Some(BuiltinType::Binary),
            "void" => Some(BuiltinType::Void),
            _ => None,
        }
    }

    pub fn id(self) -> TypeId {
        match self {
            BuiltinType::Bool => TypeId::BOOL,
            BuiltinType::Byte => TypeId::BYTE,
            BuiltinType::I16 => TypeId::I16,
            BuiltinType::I32 => TypeId::I32,
            BuiltinType::I64 => TypeId::I64,
            BuiltinType::Double => TypeId::DOUBLE,
            BuiltinType::String => TypeId::STRING,
            BuiltinType::Binary => TypeId::BINARY,
            BuiltinType::Void => TypeId::VOID,
        }
    }
}

/// What kind of declaration a user-defined type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Struct,
    Union,
    Exception,
    Enum,
}

/// One node of the type graph. Child types are handles, so structurally
/// equal nodes hash equal and intern to a single [`TypeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThriftType {
    Placeholder,
    Builtin(BuiltinType),
    List(TypeId),
    Set(TypeId),
    Map {
        key: TypeId,
        value: TypeId,
    },
    User {
        name: String,
        kind: UserKind,
        program: ProgramId,
    },
    Typedef {
        name: String,
        target: TypeId,
        program: ProgramId,
    },
}

/// Visits a type by kind. `byte` and `i8` both reach [`visit_byte`].
///
/// [`visit_byte`]: TypeVisitor::visit_byte
pub trait TypeVisitor<T> {
    fn visit_bool(&mut self) -> T;
    fn visit_byte(&mut self) -> T;
    fn visit_i16(&mut self) -> T;
    fn visit_i32(&mut self) -> T;
    fn visit_i64(&mut self) -> T;
    fn visit_double(&mut self) -> T;
    fn visit_string(&mut self) -> T;
    fn visit_binary(&mut self) -> T;
    fn visit_void(&mut self) -> T;
    fn visit_enum(&mut self, id: TypeId, name: &str) -> T;
    fn visit_list(&mut self, id: TypeId, element: TypeId) -> T;
    fn visit_set(&mut self, id: TypeId, element: TypeId) -> T;
    fn visit_map(&mut self, id: TypeId, key: TypeId, value: TypeId) -> T;
    fn visit_user_type(&mut self, id: TypeId, name: &str, kind: UserKind) -> T;
    fn visit_typedef(&mut self, id: TypeId, name: &str, target: TypeId) -> T;
}

/// Arena of type nodes for one load.
#[derive(Debug)]
pub struct TypeGraph {
    nodes: Vec<ThriftType>,
    /// Canonical name of each node, e.g. `map<string, list<i32>>`.
    names: Vec<String>,
    interned: HashMap<ThriftType, TypeId>,
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// A graph holding only the placeholder and the built-ins, at the
    /// indices named by the `TypeId` constants.
    pub fn new() -> Self {
        let mut graph = TypeGraph {
            nodes: Vec::new(),
            names: Vec::new(),
            interned: HashMap::new(),
        };
        let placeholder = graph.intern(ThriftType::Placeholder);
        debug_assert_eq!(placeholder, TypeId::PLACEHOLDER);
        for builtin in BUILTINS {
            let id = graph.intern(ThriftType::Builtin(builtin));
            debug_assert_eq!(id, builtin.id());
        }
        graph
    }

    /// The built-in handle for an IDL name, if it is one.
    pub fn builtin(name: &str) -> Option<TypeId> {
        BuiltinType::from_name(name).map(BuiltinType::id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: TypeId) -> &ThriftType {
        &self.nodes[id.index()]
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.names[id.index()]
    }

    /// All nodes in creation order, placeholder and built-ins first.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &ThriftType)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    // -- Construction (linker only) -------------------------------

    fn intern(&mut self, node: ThriftType) -> TypeId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let name = match &node {
            ThriftType::Placeholder => "<placeholder>".to_owned(),
            ThriftType::Builtin(b) => b.name().to_owned(),
            ThriftType::List(e) => format!("list<{}>", self.name(*e)),
            ThriftType::Set(e) => format!("set<{}>", self.name(*e)),
            ThriftType::Map { key, value } => {
                format!("map<{}, {}>", self.name(*key), self.name(*value))
            }
            ThriftType::User { name, .. } | ThriftType::Typedef { name, .. } => name.clone(),
        };
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.names.push(name);
        self.interned.insert(node, id);
        id
    }

    pub(crate) fn list(&mut self, element: TypeId) -> TypeId {
        debug_assert!(!element.is_placeholder());
        self.intern(ThriftType::List(element))
    }

    pub(crate) fn set(&mut self, element: TypeId) -> TypeId {
        debug_assert!(!element.is_placeholder());
        self.intern(ThriftType::Set(element))
    }

    pub(crate) fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        debug_assert!(!key.is_placeholder() && !value.is_placeholder());
        self.intern(ThriftType::Map { key, value })
    }

    pub(crate) fn user(&mut self, name: &str, kind: UserKind, program: ProgramId) -> TypeId {
        self.intern(ThriftType::User {
            name: name.to_owned(),
            kind,
            program,
        })
    }

    /// The target must already exist, so a typedef always points at an
    /// older node and typedef chains cannot loop.
    pub(crate) fn typedef(&mut self, name: &str, target: TypeId, program: ProgramId) -> TypeId {
        debug_assert!(!target.is_placeholder());
        self.intern(ThriftType::Typedef {
            name: name.to_owned(),
            target,
            program,
        })
    }

    // -- Queries --------------------------------------------------

    pub fn is_builtin(&self, id: TypeId) -> bool {
        matches!(self.get(id), ThriftType::Builtin(_))
    }

    pub fn is_typedef(&self, id: TypeId) -> bool {
        matches!(self.get(id), ThriftType::Typedef { .. })
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            ThriftType::User {
                kind: UserKind::Enum,
                ..
            }
        )
    }

    pub fn is_list(&self, id: TypeId) -> bool {
        matches!(self.get(self.true_type(id)), ThriftType::List(_))
    }

    pub fn is_set(&self, id: TypeId) -> bool {
        matches!(self.get(self.true_type(id)), ThriftType::Set(_))
    }

    pub fn is_map(&self, id: TypeId) -> bool {
        matches!(self.get(self.true_type(id)), ThriftType::Map { .. })
    }

    /// The kind of user type this resolves to once typedefs are followed.
    pub fn user_kind(&self, id: TypeId) -> Option<UserKind> {
        match self.get(self.true_type(id)) {
            ThriftType::User { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Follow a typedef chain to its first non-typedef type.
    pub fn true_type(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let ThriftType::Typedef { target, .. } = self.get(current) {
            current = *target;
        }
        current
    }

    pub fn accept<T, V: TypeVisitor<T> + ?Sized>(&self, id: TypeId, visitor: &mut V) -> T {
        match self.get(id) {
            ThriftType::Placeholder => unreachable!("placeholder types never escape linking"),
            ThriftType::Builtin(b) => match b {
                BuiltinType::Bool => visitor.visit_bool(),
                BuiltinType::Byte => visitor.visit_byte(),
                BuiltinType::I16 => visitor.visit_i16(),
                BuiltinType::I32 => visitor.visit_i32(),
                BuiltinType::I64 => visitor.visit_i64(),
                BuiltinType::Double => visitor.visit_double(),
                BuiltinType::String => visitor.visit_string(),
                BuiltinType::Binary => visitor.visit_binary(),
                BuiltinType::Void => visitor.visit_void(),
            },
            ThriftType::List(e) => visitor.visit_list(id, *e),
            ThriftType::Set(e) => visitor.visit_set(id, *e),
            ThriftType::Map { key, value } => visitor.visit_map(id, *key, *value),
            ThriftType::User {
                name,
                kind: UserKind::Enum,
                ..
            } => visitor.visit_enum(id, name),
            ThriftType::User { name, kind, .. } => visitor.visit_user_type(id, name, *kind),
            ThriftType::Typedef { name, target, .. } => visitor.visit_typedef(id, name, *target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_and_i8_are_one_node() {
        let graph = TypeGraph::new();
        let byte = TypeGraph::builtin("byte").unwrap();
        let i8 = TypeGraph::builtin("i8").unwrap();
        assert_eq!(byte, i8);
        assert_eq!(TypeId::I8, TypeId::BYTE);
        assert!(graph.is_builtin(byte));
        assert!(graph.is_builtin(i8));
        assert_eq!(graph.name(i8), "byte");
    }

    #[test]
    fn builtins_sit_at_fixed_handles() {
        let graph = TypeGraph::new();
        for b in BUILTINS {
            assert_eq!(graph.get(b.id()), &ThriftType::Builtin(b));
            assert_eq!(TypeGraph::builtin(b.name()), Some(b.id()));
        }
        assert_eq!(graph.get(TypeId::PLACEHOLDER), &ThriftType::Placeholder);
        assert_eq!(TypeGraph::builtin("Foo"), None);
    }

    #[test]
    fn containers_are_interned() {
        let mut graph = TypeGraph::new();
        let a = graph.list(TypeId::I32);
        let b = graph.list(TypeId::I32);
        assert_eq!(a, b);
        assert_ne!(a, graph.set(TypeId::I32));

        let m = graph.map(TypeId::STRING, a);
        assert_eq!(graph.name(m), "map<string, list<i32>>");
        assert!(graph.is_map(m));
        assert!(!graph.is_list(m));
    }

    #[test]
    fn same_named_user_types_in_different_programs_differ() {
        let mut graph = TypeGraph::new();
        let a = graph.user("Thing", UserKind::Struct, ProgramId(0));
        let b = graph.user("Thing", UserKind::Struct, ProgramId(1));
        assert_ne!(a, b);
        assert_eq!(graph.name(a), graph.name(b));
    }

    #[test]
    fn true_type_follows_typedef_chain() {
        let mut graph = TypeGraph::new();
        let a = graph.typedef("A", TypeId::I32, ProgramId(0));
        let b = graph.typedef("B", a, ProgramId(0));
        assert!(graph.is_typedef(b));
        assert_eq!(graph.true_type(b), TypeId::I32);

        let l = graph.list(TypeId::STRING);
        let names = graph.typedef("Names", l, ProgramId(0));
        assert!(graph.is_list(names));
        assert!(!graph.is_builtin(names));
    }

    #[test]
    fn enum_tag_is_kept() {
        let mut graph = TypeGraph::new();
        let e = graph.user("Status", UserKind::Enum, ProgramId(0));
        let s = graph.user("Status2", UserKind::Struct, ProgramId(0));
        assert!(graph.is_enum(e));
        assert!(!graph.is_enum(s));
        assert_eq!(graph.user_kind(s), Some(UserKind::Struct));
    }

    struct Counter {
        bytes: usize,
        other: usize,
    }

    impl TypeVisitor<()> for Counter {
        fn visit_bool(&mut self) {
            self.other += 1;
        }
        fn visit_byte(&mut self) {
            self.bytes += 1;
        }
        fn visit_i16(&mut self) {
            self.other += 1;
        }
        fn visit_i32(&mut self) {
            self.other += 1;
        }
        fn visit_i64(&mut self) {
            self.other += 1;
        }
        fn visit_double(&mut self) {
            self.other += 1;
        }
        fn visit_string(&mut self) {
            self.other += 1;
        }
        fn visit_binary(&mut self) {
            self.other += 1;
        }
        fn visit_void(&mut self) {
            self.other += 1;
        }
        fn visit_enum(&mut self, _: TypeId, _: &str) {
            self.other += 1;
        }
        fn visit_list(&mut self, _: TypeId, _: TypeId) {
            self.other += 1;
        }
        fn visit_set(&mut self, _: TypeId, _: TypeId) {
            self.other += 1;
        }
        fn visit_map(&mut self, _: TypeId, _: TypeId, _: TypeId) {
            self.other += 1;
        }
        fn visit_user_type(&mut self, _: TypeId, _: &str, _: UserKind) {
            self.other += 1;
        }
        fn visit_typedef(&mut self, _: TypeId, _: &str, _: TypeId) {
            self.other += 1;
        }
    }

    #[test]
    fn visitor_treats_i8_as_byte() {
        let graph = TypeGraph::new();
        let mut v = Counter { bytes: 0, other: 0 };
        graph.accept(TypeId::I8, &mut v);
        graph.accept(TypeId::BYTE, &mut v);
        graph.accept(TypeId::I32, &mut v);
        assert_eq!(v.bytes, 2);
        assert_eq!(v.other, 1);
    }
}
