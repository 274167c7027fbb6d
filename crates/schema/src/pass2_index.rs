//! Pass 2: Register a program's enums, structs, unions and exceptions as
//! type nodes, and reject duplicate or reserved top-level names.

use crate::ast::{Location, StructKind};
use crate::error::ThriftError;
use crate::program::{ProgramId, ProgramRegistry};
use crate::types::{TypeGraph, UserKind};
use std::collections::HashMap;

/// Typedefs and services share the namespace checked here but are entered
/// into the symbol tables by later passes.
pub fn index_program(
    registry: &mut ProgramRegistry,
    graph: &mut TypeGraph,
    program: ProgramId,
) -> Result<(), ThriftError> {
    check_names(registry, program)?;

    let mut user_types: Vec<(String, UserKind)> = Vec::new();
    let file = &registry[program].file;
    for e in &file.enums {
        user_types.push((e.name.clone(), UserKind::Enum));
    }
    for s in file.struct_likes() {
        let kind = match s.kind {
            StructKind::Struct => UserKind::Struct,
            StructKind::Union => UserKind::Union,
            StructKind::Exception => UserKind::Exception,
        };
        user_types.push((s.name.clone(), kind));
    }

    for (name, kind) in user_types {
        let id = graph.user(&name, kind, program);
        registry[program].define_type(&name, id);
    }
    Ok(())
}

fn check_names(registry: &ProgramRegistry, program: ProgramId) -> Result<(), ThriftError> {
    let file = &registry[program].file;
    let mut declared: Vec<(&str, &Location)> = Vec::new();
    declared.extend(file.typedefs.iter().map(|t| (t.new_name.as_str(), &t.location)));
    declared.extend(file.enums.iter().map(|e| (e.name.as_str(), &e.location)));
    declared.extend(file.struct_likes().map(|s| (s.name.as_str(), &s.location)));
    declared.extend(file.services.iter().map(|s| (s.name.as_str(), &s.location)));
    declared.sort_by_key(|(_, loc)| (loc.line, loc.column));

    let mut seen: HashMap<&str, &Location> = HashMap::new();
    for (name, location) in declared {
        if TypeGraph::builtin(name).is_some() {
            return Err(ThriftError::link(
                location,
                format!("cannot redefine built-in type '{}'", name),
            ));
        }
        if let Some(first) = seen.get(name) {
            return Err(ThriftError::link(
                location,
                format!(
                    "duplicate declaration '{}': first declared at line {}",
                    name, first.line
                ),
            ));
        }
        seen.insert(name, location);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::path::PathBuf;

    fn index(src: &str) -> Result<(ProgramRegistry, TypeGraph, ProgramId), ThriftError> {
        let mut registry = ProgramRegistry::new();
        let file = parse(Location::file("idx.thrift"), src).unwrap();
        let id = registry.add(PathBuf::from("/idx.thrift"), file);
        let mut graph = TypeGraph::new();
        index_program(&mut registry, &mut graph, id)?;
        Ok((registry, graph, id))
    }

    #[test]
    fn user_types_get_tagged_nodes() {
        let (reg, graph, id) =
            index("enum Color { RED }\nstruct S {}\nunion U {}\nexception E {}").unwrap();
        let color = reg[id].type_symbol("Color").unwrap();
        assert!(graph.is_enum(color));
        let e = reg[id].type_symbol("E").unwrap();
        assert_eq!(graph.user_kind(e), Some(UserKind::Exception));
        assert_eq!(graph.user_kind(reg[id].type_symbol("U").unwrap()), Some(UserKind::Union));
    }

    #[test]
    fn duplicate_names_across_kinds() {
        let err = index("struct Thing {}\n\nenum Thing { A }").unwrap_err();
        assert_eq!(
            err.message(),
            "duplicate declaration 'Thing': first declared at line 1"
        );
        assert_eq!(err.location().unwrap().line, 3);

        let err = index("typedef i32 Id\nservice Id {}").unwrap_err();
        assert!(err.message().starts_with("duplicate declaration 'Id'"));
    }

    #[test]
    fn builtin_names_are_reserved() {
        let err = index("struct string {}").unwrap_err();
        assert_eq!(err.message(), "cannot redefine built-in type 'string'");
        let err = index("typedef i32 i8").unwrap_err();
        assert_eq!(err.message(), "cannot redefine built-in type 'i8'");
    }
}
