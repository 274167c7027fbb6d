//! End-to-end loading of `.thrift` files from a real directory tree.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thrifty_schema::{Loader, Requiredness, Schema, ThriftError, TypeId};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write(dir: &Path, name: &str, src: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    std::fs::write(&path, src).expect("write thrift file");
    path
}

fn load_one(src: &str) -> Result<Schema, ThriftError> {
    init_logging();
    let dir = TempDir::new().expect("temp dir");
    let path = write(dir.path(), "test.thrift", src);
    Loader::new().add_thrift_file(path).load()
}

#[test]
fn end_to_end_scenario() {
    let schema = load_one(
        r#"
        namespace java com.example.test

        enum E { ONE = 1, TWO }

        typedef i32 Int

        struct S {
          1: required Int n
        }

        service Svc {
          oneway void sayHello(1: S arg1)
        }
        "#,
    )
    .unwrap();

    assert_eq!(schema.enums().len(), 1);
    let e = &schema.enums()[0];
    assert_eq!(e.find_member("TWO").unwrap().value, 2);

    let s = &schema.structs()[0];
    assert_eq!(s.name, "S");
    let n = s.field("n").unwrap();
    assert_eq!(n.requiredness, Requiredness::Required);
    let types = schema.types();
    assert!(types.is_typedef(n.type_id));
    assert_eq!(schema.type_name(n.type_id), "Int");
    assert_eq!(types.true_type(n.type_id), TypeId::I32);

    assert_eq!(schema.services().len(), 1);
    let svc = &schema.services()[0];
    assert_eq!(svc.methods.len(), 1);
    let hello = &svc.methods[0];
    assert_eq!(hello.name, "sayHello");
    assert!(hello.one_way);
    assert_eq!(hello.return_type, TypeId::VOID);
    assert_eq!(hello.params[0].name, "arg1");
    assert_eq!(hello.params[0].type_id, s.type_id);
    assert!(hello.exceptions.is_empty());
}

#[test]
fn enum_values_continue_after_explicit() {
    let schema = load_one("enum Level { A = 5, B, C, D = 2, E }").unwrap();
    let values: Vec<i32> = schema.enums()[0].members.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![5, 6, 7, 2, 8]);
}

#[test]
fn typedef_chain_true_type() {
    let schema = load_one("typedef i32 A\ntypedef A B").unwrap();
    let b = &schema.typedefs()[1];
    assert_eq!(b.name, "B");
    assert_eq!(b.old_type, schema.typedefs()[0].type_id);
    assert_eq!(schema.types().true_type(b.type_id), TypeId::I32);
}

#[test]
fn circular_typedefs_fail_to_link() {
    let err = load_one("typedef A B\ntypedef B A").unwrap_err();
    assert!(matches!(err, ThriftError::Link { .. }));
    assert!(err.message().starts_with("circular typedef"), "{}", err);
}

#[test]
fn identical_container_types_share_one_node() {
    let schema = load_one(
        "struct One { 1: list<i32> a }\n\
         struct Two { 1: list<i32> b, 2: list<i8> c, 3: list<byte> d }",
    )
    .unwrap();
    let one = &schema.structs()[0];
    let two = &schema.structs()[1];
    assert_eq!(one.fields[0].type_id, two.fields[0].type_id);
    assert_eq!(two.fields[1].type_id, two.fields[2].type_id);
    assert_ne!(one.fields[0].type_id, two.fields[1].type_id);
}

#[test]
fn container_typedefs_keep_key_and_value_identity() {
    let schema = load_one(
        "typedef string Key\n\
         typedef map<Key, list<Key>> Index\n\
         struct Holder { 1: Index index, 2: Key key }",
    )
    .unwrap();
    let types = schema.types();
    let holder = &schema.structs()[0];
    let index = holder.fields[0].type_id;
    assert!(types.is_map(index));
    match types.get(types.true_type(index)) {
        thrifty_schema::ThriftType::Map { key, value } => {
            assert_eq!(*key, holder.fields[1].type_id);
            assert!(types.is_list(*value));
        }
        other => panic!("expected map, got {:?}", other),
    }
    assert_eq!(schema.type_name(types.true_type(index)), "map<Key, list<Key>>");
}

#[test]
fn deeply_nested_forward_references() {
    let schema = load_one(
        "struct Outer {\n\
           1: map<list<Inner>, set<map<string, Inner>>> crazy\n\
           2: list<list<list<Kind>>> kinds\n\
         }\n\
         struct Inner { 1: Kind kind }\n\
         enum Kind { X, Y }",
    )
    .unwrap();
    let outer = &schema.structs()[0];
    assert_eq!(
        schema.type_name(outer.fields[0].type_id),
        "map<list<Inner>, set<map<string, Inner>>>"
    );
    assert_eq!(schema.type_name(outer.fields[1].type_id), "list<list<list<Kind>>>");
    assert!(schema.types().is_map(outer.fields[0].type_id));
}

#[test]
fn unknown_type_reports_location() {
    let err = load_one("struct S {\n  1: Missing m\n}").unwrap_err();
    assert!(matches!(err, ThriftError::Link { .. }));
    assert_eq!(err.message(), "unknown type 'Missing'");
    let location = err.location().unwrap();
    assert!(location.file.ends_with("test.thrift"));
    assert_eq!(location.line, 2);
    assert!(err.to_string().starts_with("Link error in "));
}

#[test]
fn headers_must_precede_declarations() {
    let err = load_one("struct S {}\nnamespace java x").unwrap_err();
    assert!(matches!(err, ThriftError::Syntax { .. }));
}

#[test]
fn include_shares_typedef_identity() {
    init_logging();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common/types.thrift", "typedef i64 Timestamp\nstruct Ref { 1: string id }");
    let main = write(
        dir.path(),
        "main.thrift",
        "include \"common/types.thrift\"\n\
         struct Event {\n\
           1: Timestamp at\n\
           2: types.Timestamp also\n\
           3: types.Ref ref\n\
         }",
    );
    let schema = Loader::new().add_thrift_file(&main).load().unwrap();

    let ts = &schema.typedefs()[0];
    assert_eq!(ts.old_type, TypeId::I64);
    let event = &schema.structs()[1];
    assert_eq!(event.name, "Event");
    assert_eq!(event.fields[0].type_id, ts.type_id);
    assert_eq!(event.fields[1].type_id, ts.type_id);
    assert_eq!(event.fields[2].type_id, schema.structs()[0].type_id);
}

#[test]
fn circular_include_is_rejected() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let f1 = write(dir.path(), "f1.thrift", "include \"f2.thrift\"");
    write(dir.path(), "f2.thrift", "include \"f3.thrift\"");
    write(dir.path(), "f3.thrift", "include \"f1.thrift\"");
    let err = Loader::new().add_thrift_file(f1).load().unwrap_err();
    assert!(matches!(err, ThriftError::Link { .. }));
    assert_eq!(
        err.message(),
        "Circular include: f1.thrift -> f2.thrift -> f3.thrift -> f1.thrift"
    );
}

#[test]
fn diamond_include_loads_shared_file_once() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let f1 = write(
        dir.path(),
        "f1.thrift",
        "include \"f2.thrift\"\ninclude \"f3.thrift\"\nstruct Top { 1: Left l, 2: Right r }",
    );
    write(dir.path(), "f2.thrift", "include \"f4.thrift\"\nstruct Left { 1: Base b }");
    write(dir.path(), "f3.thrift", "include \"f4.thrift\"\nstruct Right { 1: f4.Base b }");
    write(dir.path(), "f4.thrift", "enum Base { ZERO }");

    let schema = Loader::new().add_thrift_file(f1).load().unwrap();
    assert_eq!(schema.enums().len(), 1);
    let base = schema.enums()[0].type_id;
    let names: Vec<&str> = schema.structs().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Left", "Right", "Top"]);
    assert_eq!(schema.structs()[0].fields[0].type_id, base);
    assert_eq!(schema.structs()[1].fields[0].type_id, base);
}

#[test]
fn include_path_fallback() {
    init_logging();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "vendor/shared.thrift", "exception Failure { 1: string reason }");
    let app = write(
        dir.path(),
        "app/api.thrift",
        "include \"shared.thrift\"\nservice Api { void run() throws (1: shared.Failure f) }",
    );

    let err = Loader::new().add_thrift_file(&app).load().unwrap_err();
    assert!(err.message().contains("cannot find included file 'shared.thrift'"));

    let schema = Loader::new()
        .add_include_path(dir.path().join("vendor"))
        .add_thrift_file(&app)
        .load()
        .unwrap();
    let run = schema.services()[0].method("run").unwrap();
    assert_eq!(run.exceptions[0].type_id, schema.exceptions()[0].type_id);
}

#[test]
fn same_name_in_different_files_stays_distinct() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.thrift", "struct Thing { 1: i32 x }");
    let b = write(dir.path(), "b.thrift", "struct Thing { 1: string y }");
    let schema = Loader::new()
        .add_thrift_file(a)
        .add_thrift_file(b)
        .load()
        .unwrap();
    assert_eq!(schema.structs().len(), 2);
    assert_ne!(schema.structs()[0].type_id, schema.structs()[1].type_id);
}

#[test]
fn missing_root_file_is_io_error() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let err = Loader::new()
        .add_thrift_file(dir.path().join("nope.thrift"))
        .load()
        .unwrap_err();
    assert!(matches!(err, ThriftError::Io { .. }));
    assert!(err.to_string().starts_with("cannot read "));
}
