//! Pass 3: Resolve a program's typedefs in dependency order.
//!
//! Typedefs may refer to each other in any order, so resolution runs in
//! rounds: each round resolves every typedef whose target is now known.
//! A round that resolves nothing means the rest are unknown or circular.

use crate::error::ThriftError;
use crate::program::{ProgramId, ProgramRegistry};
use crate::types::{TypeGraph, TypeId};
use log::trace;

/// A typedef after linking, by index into the program's typedef list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTypedef {
    pub old_type: TypeId,
    pub type_id: TypeId,
}

pub fn link_typedefs(
    registry: &mut ProgramRegistry,
    graph: &mut TypeGraph,
    program: ProgramId,
) -> Result<Vec<ResolvedTypedef>, ThriftError> {
    let typedefs = registry[program].file.typedefs.clone();
    let mut resolved: Vec<Option<ResolvedTypedef>> = vec![None; typedefs.len()];
    let mut pending: Vec<usize> = (0..typedefs.len()).collect();
    let mut round = 0;

    while !pending.is_empty() {
        round += 1;
        let mut unresolved = Vec::new();
        for &i in &pending {
            let td = &typedefs[i];
            let old_type = registry.resolve_type(program, &td.old_type, &td.location, graph)?;
            if old_type.is_placeholder() {
                unresolved.push(i);
                continue;
            }
            let type_id = graph.typedef(&td.new_name, old_type, program);
            registry[program].define_type(&td.new_name, type_id);
            resolved[i] = Some(ResolvedTypedef { old_type, type_id });
        }
        trace!(
            "{}: typedef round {} resolved {}, {} pending",
            registry[program].name,
            round,
            pending.len() - unresolved.len(),
            unresolved.len()
        );
        if unresolved.len() == pending.len() {
            return Err(stuck(registry, program, &unresolved));
        }
        pending = unresolved;
    }

    Ok(resolved.into_iter().flatten().collect())
}

/// Explain why no pending typedef can be resolved: an unknown name if
/// there is one, otherwise the dependency cycle among the pending ones.
fn stuck(registry: &ProgramRegistry, program: ProgramId, pending: &[usize]) -> ThriftError {
    let typedefs = &registry[program].file.typedefs;
    let pending_named = |name: &str| {
        pending
            .iter()
            .copied()
            .find(|&i| typedefs[i].new_name == name)
    };

    let mut next: Vec<(usize, usize)> = Vec::new();
    for &i in pending {
        let td = &typedefs[i];
        let missing = registry
            .first_unresolved(program, &td.old_type)
            .unwrap_or_default();
        match pending_named(missing) {
            Some(j) => next.push((i, j)),
            None => {
                return ThriftError::link(&td.location, format!("unknown type '{}'", missing))
            }
        }
    }

    let follow = |i: usize| next.iter().find(|(from, _)| *from == i).map(|(_, to)| *to);
    let mut chain: Vec<usize> = vec![pending[0]];
    while let Some(to) = follow(chain[chain.len() - 1]) {
        if let Some(start) = chain.iter().position(|&c| c == to) {
            let mut names: Vec<&str> = chain[start..]
                .iter()
                .map(|&c| typedefs[c].new_name.as_str())
                .collect();
            names.push(&typedefs[to].new_name);
            return ThriftError::link(
                &typedefs[to].location,
                format!("circular typedef: {}", names.join(" -> ")),
            );
        }
        chain.push(to);
    }
    let td = &typedefs[pending[0]];
    ThriftError::link(&td.location, format!("cannot resolve typedef '{}'", td.new_name))
}
