//! Pass 4: Resolve fields, functions and service inheritance, and assemble
//! the [`Schema`] from the linked programs.

use crate::ast::{FieldElement, FunctionElement, Location, RawType, ServiceElement};
use crate::error::ThriftError;
use crate::pass2_index;
use crate::pass3_typedefs::{self, ResolvedTypedef};
use crate::program::{ProgramId, ProgramRegistry};
use crate::schema::{
    EnumMember, EnumType, Field, Schema, Service, ServiceId, ServiceMethod, StructType, Typedef,
};
use crate::types::{TypeId, UserKind};
use log::debug;
use std::collections::HashMap;

/// Link every program in `order`, which must list each program after the
/// programs it includes.
pub fn link(mut registry: ProgramRegistry, order: &[ProgramId]) -> Result<Schema, ThriftError> {
    let mut schema = Schema::new();
    for &program in order {
        pass2_index::index_program(&mut registry, &mut schema.types, program)?;
        let typedefs = pass3_typedefs::link_typedefs(&mut registry, &mut schema.types, program)?;
        link_program(&mut registry, &mut schema, program, &typedefs)?;
        debug!(
            "linked {} ({} types in graph)",
            registry[program].path.display(),
            schema.types.len()
        );
    }
    Ok(schema)
}

fn link_program(
    registry: &mut ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
    typedefs: &[ResolvedTypedef],
) -> Result<(), ThriftError> {
    let namespaces = registry[program].namespaces();

    for e in &registry[program].file.enums {
        let type_id = registry
            .lookup_type(program, &e.name)
            .unwrap_or(TypeId::PLACEHOLDER);
        schema.enums.push(EnumType {
            name: e.name.clone(),
            type_id,
            members: e
                .members
                .iter()
                .map(|m| EnumMember {
                    name: m.name.clone(),
                    value: m.value,
                    documentation: m.documentation.clone(),
                    location: m.location.clone(),
                })
                .collect(),
            documentation: e.documentation.clone(),
            location: e.location.clone(),
            namespaces: namespaces.clone(),
        });
    }

    for (td, resolved) in registry[program].file.typedefs.iter().zip(typedefs) {
        schema.typedefs.push(Typedef {
            name: td.new_name.clone(),
            old_type: resolved.old_type,
            type_id: resolved.type_id,
            documentation: td.documentation.clone(),
            location: td.location.clone(),
            namespaces: namespaces.clone(),
        });
    }

    for s in registry[program].file.struct_likes() {
        let type_id = registry
            .lookup_type(program, &s.name)
            .unwrap_or(TypeId::PLACEHOLDER);
        let fields = link_fields(registry, schema, program, &s.fields)?;
        schema.struct_likes_mut(s.kind).push(StructType {
            name: s.name.clone(),
            kind: s.kind,
            type_id,
            fields,
            documentation: s.documentation.clone(),
            location: s.location.clone(),
            namespaces: namespaces.clone(),
        });
    }

    link_services(registry, schema, program)
}

fn link_fields(
    registry: &ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
    fields: &[FieldElement],
) -> Result<Vec<Field>, ThriftError> {
    fields
        .iter()
        .map(|f| {
            let type_id = resolve_known(registry, schema, program, &f.type_name, &f.location)?;
            Ok(Field {
                id: f.id,
                name: f.name.clone(),
                requiredness: f.requiredness,
                type_id,
                documentation: f.documentation.clone(),
                location: f.location.clone(),
            })
        })
        .collect()
}

/// Resolve a type that must exist by now; anything left unresolved is an
/// unknown name.
fn resolve_known(
    registry: &ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
    raw: &RawType,
    location: &Location,
) -> Result<TypeId, ThriftError> {
    let id = registry.resolve_type(program, raw, location, &mut schema.types)?;
    if id.is_placeholder() {
        let missing = registry.first_unresolved(program, raw).unwrap_or_default();
        return Err(ThriftError::link(
            location,
            format!("unknown type '{}'", missing),
        ));
    }
    Ok(id)
}

// ──────────────────────────────────────────────
// Services
// ──────────────────────────────────────────────

/// Ids are assigned in declaration order before any service is linked,
/// so a service may extend one declared later in the same file.
fn link_services(
    registry: &mut ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
) -> Result<(), ThriftError> {
    let services = registry[program].file.services.clone();
    let base = schema.services.len();
    for (i, s) in services.iter().enumerate() {
        registry[program].define_service(&s.name, ServiceId(base + i));
    }

    let mut parents: Vec<Option<ServiceId>> = Vec::with_capacity(services.len());
    for s in &services {
        let parent = match &s.extends {
            None => None,
            Some(name) => Some(registry.lookup_service(program, name).ok_or_else(|| {
                ThriftError::link(&s.location, format!("unknown base service '{}'", name))
            })?),
        };
        parents.push(parent);
    }
    check_inheritance(&services, &parents, base)?;

    let namespaces = registry[program].namespaces();
    for (i, (s, extends)) in services.iter().zip(parents).enumerate() {
        let methods = link_methods(registry, schema, program, s)?;
        schema.services.push(Service {
            id: ServiceId(base + i),
            name: s.name.clone(),
            extends,
            methods,
            documentation: s.documentation.clone(),
            location: s.location.clone(),
            namespaces: namespaces.clone(),
        });
    }
    Ok(())
}

/// Only services of this program can form a cycle: included programs were
/// linked earlier and cannot refer back.
fn check_inheritance(
    services: &[ServiceElement],
    parents: &[Option<ServiceId>],
    base: usize,
) -> Result<(), ThriftError> {
    let local_parent = |i: usize| {
        parents[i]
            .map(|p| p.index())
            .filter(|&p| p >= base)
            .map(|p| p - base)
    };
    for start in 0..services.len() {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(parent) = local_parent(current) {
            if parent == start {
                let mut names: Vec<&str> = chain.iter().map(|&c| services[c].name.as_str()).collect();
                names.push(&services[start].name);
                return Err(ThriftError::link(
                    &services[start].location,
                    format!("circular service inheritance: {}", names.join(" -> ")),
                ));
            }
            if chain.contains(&parent) {
                // A cycle not through `start`; reported when its own member is the start.
                break;
            }
            chain.push(parent);
            current = parent;
        }
    }
    Ok(())
}

fn link_methods(
    registry: &ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
    service: &ServiceElement,
) -> Result<Vec<ServiceMethod>, ThriftError> {
    let mut seen: HashMap<&str, &Location> = HashMap::new();
    let mut methods = Vec::with_capacity(service.functions.len());
    for f in &service.functions {
        if let Some(first) = seen.insert(&f.name, &f.location) {
            return Err(ThriftError::link(
                &f.location,
                format!(
                    "duplicate function '{}' in service '{}': first declared at line {}",
                    f.name, service.name, first.line
                ),
            ));
        }
        methods.push(link_method(registry, schema, program, f)?);
    }
    Ok(methods)
}

fn link_method(
    registry: &ProgramRegistry,
    schema: &mut Schema,
    program: ProgramId,
    f: &FunctionElement,
) -> Result<ServiceMethod, ThriftError> {
    let return_type = if f.return_type.is_void() {
        TypeId::VOID
    } else {
        resolve_known(registry, schema, program, &f.return_type, &f.location)?
    };

    if f.one_way {
        if return_type != TypeId::VOID {
            return Err(ThriftError::link(
                &f.location,
                format!("oneway function '{}' must return void", f.name),
            ));
        }
        if !f.exceptions.is_empty() {
            return Err(ThriftError::link(
                &f.location,
                format!("oneway function '{}' cannot throw exceptions", f.name),
            ));
        }
    }

    let params = link_fields(registry, schema, program, &f.params)?;
    let exceptions = link_fields(registry, schema, program, &f.exceptions)?;
    for e in &exceptions {
        if schema.types.user_kind(e.type_id) != Some(UserKind::Exception) {
            return Err(ThriftError::link(
                &e.location,
                format!(
                    "'{}' in the throws clause of '{}' is not an exception type",
                    schema.types.name(e.type_id),
                    f.name
                ),
            ));
        }
    }

    Ok(ServiceMethod {
        name: f.name.clone(),
        one_way: f.one_way,
        return_type,
        params,
        exceptions,
        documentation: f.documentation.clone(),
        location: f.location.clone(),
    })
}
