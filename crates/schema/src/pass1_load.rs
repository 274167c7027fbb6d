//! Pass 1: Read and parse every reachable file, follow includes, detect
//! include cycles and compute the link order.

use crate::ast::Location;
use crate::error::ThriftError;
use crate::parser;
use crate::program::{ProgramId, ProgramRegistry};
use crate::source::SourceProvider;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// The parsed programs of one load, with dependencies ordered before the
/// programs that include them.
#[derive(Debug)]
pub struct LoadedPrograms {
    pub registry: ProgramRegistry,
    pub order: Vec<ProgramId>,
}

/// An include statement resolved to the program it names.
struct IncludeEdge {
    target: ProgramId,
    location: Location,
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Parse `roots` and everything they include. Each distinct file, by
/// canonical path, is read and parsed exactly once.
pub fn load_programs(
    roots: &[PathBuf],
    include_paths: &[PathBuf],
    provider: &dyn SourceProvider,
) -> Result<LoadedPrograms, ThriftError> {
    let mut registry = ProgramRegistry::new();
    let mut by_path: HashMap<PathBuf, ProgramId> = HashMap::new();
    let mut queue: VecDeque<ProgramId> = VecDeque::new();
    let mut root_ids: Vec<ProgramId> = Vec::new();

    for root in roots {
        let canon = provider
            .canonicalize(root)
            .map_err(|e| ThriftError::io(root.to_string_lossy(), &e))?;
        let id = intern_program(canon, provider, &mut registry, &mut by_path, &mut queue)?;
        if !root_ids.contains(&id) {
            root_ids.push(id);
        }
    }

    let mut edges: Vec<Vec<IncludeEdge>> = Vec::new();
    while let Some(id) = queue.pop_front() {
        let includes: Vec<_> = registry[id]
            .file
            .includes
            .iter()
            .filter(|inc| !inc.is_cpp)
            .cloned()
            .collect();
        let base_dir = registry[id]
            .path
            .parent()
            .unwrap_or(Path::new("."))
            .to_owned();

        for inc in includes {
            let canon = find_include(&base_dir, &inc.path, include_paths, provider)
                .ok_or_else(|| {
                    ThriftError::link(
                        &inc.location,
                        format!("cannot find included file '{}'", inc.path),
                    )
                })?;
            let target = intern_program(canon, provider, &mut registry, &mut by_path, &mut queue)?;
            if edges.len() < registry.len() {
                edges.resize_with(registry.len(), Vec::new);
            }
            if !registry[id].includes.contains(&target) {
                registry[id].includes.push(target);
                edges[id.index()].push(IncludeEdge {
                    target,
                    location: inc.location,
                });
            }
        }
    }
    edges.resize_with(registry.len(), Vec::new);

    let order = link_order(&registry, &root_ids, &edges)?;
    debug!(
        "link order: {}",
        order
            .iter()
            .map(|&id| registry[id].name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(LoadedPrograms { registry, order })
}

fn intern_program(
    canon: PathBuf,
    provider: &dyn SourceProvider,
    registry: &mut ProgramRegistry,
    by_path: &mut HashMap<PathBuf, ProgramId>,
    queue: &mut VecDeque<ProgramId>,
) -> Result<ProgramId, ThriftError> {
    if let Some(&id) = by_path.get(&canon) {
        return Ok(id);
    }
    let display = canon.to_string_lossy().to_string();
    let src = provider
        .read_source(&canon)
        .map_err(|e| ThriftError::io(display.clone(), &e))?;
    let file = parser::parse(Location::file(display.clone()), &src)?;
    debug!(
        "parsed {} ({} declarations, {} includes)",
        display,
        file.declaration_count,
        file.includes.len()
    );
    let id = registry.add(canon.clone(), file);
    by_path.insert(canon, id);
    queue.push_back(id);
    Ok(id)
}

/// Relative to the including file first, then each include path in order.
fn find_include(
    base_dir: &Path,
    include: &str,
    include_paths: &[PathBuf],
    provider: &dyn SourceProvider,
) -> Option<PathBuf> {
    std::iter::once(base_dir)
        .chain(include_paths.iter().map(PathBuf::as_path))
        .find_map(|dir| {
            provider
                .canonicalize(&provider.resolve_include(dir, include))
                .ok()
        })
}

/// Depth-first post-order over the include graph: roots in the order
/// given, includes in declaration order.
fn link_order(
    registry: &ProgramRegistry,
    roots: &[ProgramId],
    edges: &[Vec<IncludeEdge>],
) -> Result<Vec<ProgramId>, ThriftError> {
    let mut state = vec![VisitState::Unvisited; registry.len()];
    let mut stack: Vec<ProgramId> = Vec::new();
    let mut order: Vec<ProgramId> = Vec::new();
    for &root in roots {
        visit(root, registry, edges, &mut state, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    id: ProgramId,
    registry: &ProgramRegistry,
    edges: &[Vec<IncludeEdge>],
    state: &mut [VisitState],
    stack: &mut Vec<ProgramId>,
    order: &mut Vec<ProgramId>,
) -> Result<(), ThriftError> {
    if state[id.index()] == VisitState::Done {
        return Ok(());
    }
    state[id.index()] = VisitState::InProgress;
    stack.push(id);

    for edge in &edges[id.index()] {
        match state[edge.target.index()] {
            VisitState::Done => {}
            VisitState::InProgress => {
                let start = stack
                    .iter()
                    .position(|&p| p == edge.target)
                    .unwrap_or_default();
                let cycle: Vec<String> = stack[start..]
                    .iter()
                    .chain(std::iter::once(&edge.target))
                    .map(|&p| file_name(registry, p))
                    .collect();
                return Err(ThriftError::link(
                    &edge.location,
                    format!("Circular include: {}", cycle.join(" -> ")),
                ));
            }
            VisitState::Unvisited => visit(edge.target, registry, edges, state, stack, order)?,
        }
    }

    stack.pop();
    state[id.index()] = VisitState::Done;
    order.push(id);
    Ok(())
}

fn file_name(registry: &ProgramRegistry, id: ProgramId) -> String {
    registry[id]
        .path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
