//! Pass 5: Canonical JSON for a linked [`Schema`]: sorted keys, elements
//! in link order, types spelled out structurally.

use crate::ast::Location;
use crate::schema::{EnumType, Field, Namespaces, Schema, Service, StructType, Typedef};
use crate::types::{TypeGraph, TypeId, TypeVisitor, UserKind};
use crate::SCHEMA_FORMAT_VERSION;
use serde_json::{json, Map, Value};

impl Schema {
    /// Serialize the whole schema. Two loads of the same files produce
    /// byte-identical output.
    pub fn to_json(&self) -> Value {
        serialize(self)
    }
}

pub fn serialize(schema: &Schema) -> Value {
    let graph = schema.types();
    let mut out = Map::new();
    out.insert(
        "enums".to_owned(),
        Value::Array(schema.enums().iter().map(serialize_enum).collect()),
    );
    out.insert(
        "exceptions".to_owned(),
        Value::Array(schema.exceptions().iter().map(|s| serialize_struct(s, graph)).collect()),
    );
    out.insert(
        "format_version".to_owned(),
        Value::String(SCHEMA_FORMAT_VERSION.to_owned()),
    );
    out.insert("kind".to_owned(), Value::String("Schema".to_owned()));
    out.insert(
        "services".to_owned(),
        Value::Array(
            schema
                .services()
                .iter()
                .map(|s| serialize_service(s, schema))
                .collect(),
        ),
    );
    out.insert(
        "structs".to_owned(),
        Value::Array(schema.structs().iter().map(|s| serialize_struct(s, graph)).collect()),
    );
    out.insert(
        "typedefs".to_owned(),
        Value::Array(schema.typedefs().iter().map(|t| serialize_typedef(t, graph)).collect()),
    );
    out.insert(
        "unions".to_owned(),
        Value::Array(schema.unions().iter().map(|s| serialize_struct(s, graph)).collect()),
    );
    Value::Object(out)
}

fn serialize_location(location: &Location) -> Value {
    json!({
        "column": location.column,
        "file": location.file,
        "line": location.line,
    })
}

fn serialize_namespaces(namespaces: &Namespaces) -> Value {
    let map: Map<String, Value> = namespaces
        .iter()
        .map(|(scope, ns)| (scope.thrift_name().to_owned(), Value::String(ns.clone())))
        .collect();
    Value::Object(map)
}

fn serialize_enum(e: &EnumType) -> Value {
    let members: Vec<Value> = e
        .members
        .iter()
        .map(|m| {
            json!({
                "documentation": m.documentation,
                "location": serialize_location(&m.location),
                "name": m.name,
                "value": m.value,
            })
        })
        .collect();
    json!({
        "documentation": e.documentation,
        "kind": "Enum",
        "location": serialize_location(&e.location),
        "members": members,
        "name": e.name,
        "namespaces": serialize_namespaces(&e.namespaces),
    })
}

fn serialize_typedef(t: &Typedef, graph: &TypeGraph) -> Value {
    json!({
        "documentation": t.documentation,
        "kind": "Typedef",
        "location": serialize_location(&t.location),
        "name": t.name,
        "namespaces": serialize_namespaces(&t.namespaces),
        "old_type": serialize_type(graph, t.old_type),
        "true_type": serialize_type(graph, graph.true_type(t.type_id)),
    })
}

fn serialize_struct(s: &StructType, graph: &TypeGraph) -> Value {
    json!({
        "documentation": s.documentation,
        "fields": serialize_fields(&s.fields, graph),
        "kind": s.kind,
        "location": serialize_location(&s.location),
        "name": s.name,
        "namespaces": serialize_namespaces(&s.namespaces),
    })
}

fn serialize_fields(fields: &[Field], graph: &TypeGraph) -> Value {
    Value::Array(
        fields
            .iter()
            .map(|f| {
                let mut m = Map::new();
                m.insert("documentation".to_owned(), json!(f.documentation));
                m.insert("id".to_owned(), json!(f.id));
                m.insert("location".to_owned(), serialize_location(&f.location));
                m.insert("name".to_owned(), json!(f.name));
                if f.is_obfuscated() {
                    m.insert("obfuscated".to_owned(), Value::Bool(true));
                }
                if f.is_redacted() {
                    m.insert("redacted".to_owned(), Value::Bool(true));
                }
                m.insert("requiredness".to_owned(), json!(f.requiredness));
                m.insert("type".to_owned(), serialize_type(graph, f.type_id));
                Value::Object(m)
            })
            .collect(),
    )
}

fn serialize_service(s: &Service, schema: &Schema) -> Value {
    let graph = schema.types();
    let methods: Vec<Value> = s
        .methods
        .iter()
        .map(|m| {
            json!({
                "documentation": m.documentation,
                "exceptions": serialize_fields(&m.exceptions, graph),
                "location": serialize_location(&m.location),
                "name": m.name,
                "oneway": m.one_way,
                "params": serialize_fields(&m.params, graph),
                "return_type": serialize_type(graph, m.return_type),
            })
        })
        .collect();
    json!({
        "documentation": s.documentation,
        "extends": s.extends.map(|id| schema.service(id).name.clone()),
        "kind": "Service",
        "location": serialize_location(&s.location),
        "methods": methods,
        "name": s.name,
        "namespaces": serialize_namespaces(&s.namespaces),
    })
}

/// Structured JSON form of a type node, e.g.
/// `{"kind":"list","element":{"kind":"builtin","name":"i32"}}`.
pub fn serialize_type(graph: &TypeGraph, id: TypeId) -> Value {
    graph.accept(id, &mut TypeJson { graph })
}

struct TypeJson<'a> {
    graph: &'a TypeGraph,
}

impl TypeJson<'_> {
    fn builtin(&self, name: &str) -> Value {
        json!({ "kind": "builtin", "name": name })
    }

    fn nested(&mut self, id: TypeId) -> Value {
        let graph = self.graph;
        graph.accept(id, self)
    }
}

impl TypeVisitor<Value> for TypeJson<'_> {
    fn visit_bool(&mut self) -> Value {
        self.builtin("bool")
    }

    fn visit_byte(&mut self) -> Value {
        self.builtin("byte")
    }

    fn visit_i16(&mut self) -> Value {
        self.builtin("i16")
    }

    fn visit_i32(&mut self) -> Value {
        self.builtin("i32")
    }

    fn visit_i64(&mut self) -> Value {
        self.builtin("i64")
    }

    fn visit_double(&mut self) -> Value {
        self.builtin("double")
    }

    fn visit_string(&mut self) -> Value {
        self.builtin("string")
    }

    fn visit_binary(&mut self) -> Value {
        self.builtin("binary")
    }

    fn visit_void(&mut self) -> Value {
        self.builtin("void")
    }

    fn visit_enum(&mut self, _id: TypeId, name: &str) -> Value {
        json!({ "kind": "enum", "name": name })
    }

    fn visit_list(&mut self, _id: TypeId, element: TypeId) -> Value {
        json!({ "element": self.nested(element), "kind": "list" })
    }

    fn visit_set(&mut self, _id: TypeId, element: TypeId) -> Value {
        json!({ "element": self.nested(element), "kind": "set" })
    }

    fn visit_map(&mut self, _id: TypeId, key: TypeId, value: TypeId) -> Value {
        json!({
            "key": self.nested(key),
            "kind": "map",
            "value": self.nested(value),
        })
    }

    fn visit_user_type(&mut self, _id: TypeId, name: &str, kind: UserKind) -> Value {
        json!({ "kind": kind, "name": name })
    }

    fn visit_typedef(&mut self, _id: TypeId, name: &str, target: TypeId) -> Value {
        json!({
            "kind": "typedef",
            "name": name,
            "target": self.nested(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::pass1_load::load_programs;
    use crate::pass4_link::link;
    use crate::source::InMemoryProvider;
    use crate::Schema;
    use serde_json::json;
    use std::path::PathBuf;

    fn schema(src: &str) -> Schema {
        let provider = InMemoryProvider::default().with_file("/idl/s.thrift", src);
        let loaded = load_programs(&[PathBuf::from("/idl/s.thrift")], &[], &provider).unwrap();
        link(loaded.registry, &loaded.order).unwrap()
    }

    #[test]
    fn field_types_are_structural() {
        let s = schema(
            "enum Color { RED = 1 }\n\
             typedef map<string, list<Color>> Palette\n\
             struct Canvas { 1: required Palette palette, 2: i8 alpha }",
        );
        let v = s.to_json();
        let field = &v["structs"][0]["fields"][0];
        assert_eq!(field["requiredness"], "required");
        assert_eq!(field["type"]["kind"], "typedef");
        assert_eq!(field["type"]["target"]["kind"], "map");
        assert_eq!(
            field["type"]["target"]["value"],
            json!({ "element": { "kind": "enum", "name": "Color" }, "kind": "list" })
        );
        assert_eq!(v["structs"][0]["fields"][1]["type"]["name"], "byte");
        assert_eq!(v["typedefs"][0]["true_type"]["kind"], "map");
        assert_eq!(v["enums"][0]["members"][0]["value"], 1);
    }

    #[test]
    fn services_and_markers() {
        let s = schema(
            "namespace java com.example\n\
             struct Login {\n\
               /** @redacted */\n\
               1: string password\n\
             }\n\
             service Base {}\n\
             service Auth extends Base { oneway void logout() }",
        );
        let v = s.to_json();
        assert_eq!(v["structs"][0]["fields"][0]["redacted"], true);
        assert!(v["structs"][0]["fields"][0].get("obfuscated").is_none());
        assert_eq!(v["services"][1]["extends"], "Base");
        assert!(v["services"][0]["extends"].is_null());
        assert_eq!(v["services"][1]["methods"][0]["oneway"], true);
        assert_eq!(v["services"][1]["namespaces"]["java"], "com.example");
    }

    #[test]
    fn output_is_deterministic() {
        let src = "struct A { 1: set<string> s }\nunion U { 1: i64 n }";
        let a = serde_json::to_string(&schema(src).to_json()).unwrap();
        let b = serde_json::to_string(&schema(src).to_json()).unwrap();
        assert_eq!(a, b);
    }
}
