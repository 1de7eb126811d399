//! Pure functions relating two match sets through a combinator.
//!
//! Every set is a slice of node ids in ascending (document) order, and every
//! function returns its result in the same order.
use crate::ast::Combinator;
use crate::index::{NodeId, NodeIndex};
use std::collections::HashSet;

fn add_node(id: NodeId, seen: &mut HashSet<NodeId>, results: &mut Vec<NodeId>) {
    if seen.insert(id) {
        results.push(id);
    }
}

/// Relates `left` and `right` through `combinator`, keeping members of `right`.
pub fn apply(
    combinator: Combinator,
    index: &NodeIndex<'_>,
    left: &[NodeId],
    right: &[NodeId],
) -> Vec<NodeId> {
    match combinator {
        Combinator::Union => union([left, right]),
        Combinator::Child => collect_children_of(index, left, right),
        Combinator::Descendant => collect_descendants_of(index, left, right),
        Combinator::Sibling => collect_siblings_of(index, left, right),
    }
}

/// Merges several sets, dropping duplicate ids and restoring document order.
pub fn union<'s>(sets: impl IntoIterator<Item = &'s [NodeId]>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for set in sets {
        for &id in set {
            add_node(id, &mut seen, &mut results);
        }
    }
    results.sort_unstable();
    results
}

/// Members of `right` whose parent is in `left`.
pub fn collect_children_of(index: &NodeIndex<'_>, left: &[NodeId], right: &[NodeId]) -> Vec<NodeId> {
    let parents: HashSet<NodeId> = left.iter().copied().collect();
    right
        .iter()
        .copied()
        .filter(|&id| index.parent_of(id).is_some_and(|p| parents.contains(&p)))
        .collect()
}

/// Members of `right` with a proper ancestor in `left`.
pub fn collect_descendants_of(
    index: &NodeIndex<'_>,
    left: &[NodeId],
    right: &[NodeId],
) -> Vec<NodeId> {
    let ancestors: HashSet<NodeId> = left.iter().copied().collect();
    right
        .iter()
        .copied()
        .filter(|&id| {
            let mut current = index.parent_of(id);
            while let Some(p) = current {
                if ancestors.contains(&p) {
                    return true;
                }
                current = index.parent_of(p);
            }
            false
        })
        .collect()
}

/// Members of `right` sharing a parent with some member of `left`. A node
/// on both sides is kept; the root has no parent and is never kept.
pub fn collect_siblings_of(index: &NodeIndex<'_>, left: &[NodeId], right: &[NodeId]) -> Vec<NodeId> {
    let parents: HashSet<NodeId> = left.iter().filter_map(|&id| index.parent_of(id)).collect();
    right
        .iter()
        .copied()
        .filter(|&id| index.parent_of(id).is_some_and(|p| parents.contains(&p)))
        .collect()
}
