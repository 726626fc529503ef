//! Department hierarchy for tree pickers and indented select lists.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{Department, DepartmentId};

/// Prefix added once per level below the roots.
pub const INDENT_PREFIX: &str = "├─ ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Department graph contains a cycle through {ids:?}")]
    Cycle { ids: Vec<DepartmentId> },
    #[error("Department {id} appears more than once")]
    DuplicateId { id: DepartmentId },
}

/// Node shape expected by tree widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub title: String,
    pub key: String,
    pub is_leaf: bool,
    pub children: Vec<TreeNode>,
    /// The department itself, without its nested children.
    pub origin: Department,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: DepartmentId,
}

struct FlatNode {
    department: Department,
    parent: Option<DepartmentId>,
}

/// Build the forest from flat (parent-linked), nested or mixed input.
///
/// Sibling order follows input order. A nested child's parent is its
/// container; departments whose parent is not in the input become roots.
///
/// The returned [`TreeNode`]s nest one level per department level, and
/// building, cloning or dropping them recurses once per level. Org charts a
/// few dozen levels deep are fine; a parent chain thousands of departments
/// long can exhaust the stack.
pub fn build_tree(departments: &[Department]) -> Result<Vec<TreeNode>, TreeError> {
    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    collect(departments, None, &mut nodes, &mut seen)?;

    let mut children_map: HashMap<DepartmentId, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) if seen.contains(&parent) => {
                children_map.entry(parent).or_default().push(index)
            }
            _ => roots.push(index),
        }
    }

    let mut reached = vec![false; nodes.len()];
    let tree: Vec<TreeNode> = roots
        .into_iter()
        .map(|index| build_subtree(index, &nodes, &children_map, &mut reached))
        .collect();

    // Every node has one parent, so anything unreachable from a root sits on
    // or under a cycle.
    let mut stranded: Vec<DepartmentId> = nodes
        .iter()
        .zip(&reached)
        .filter(|(_, reached)| !**reached)
        .map(|(node, _)| node.department.id)
        .collect();
    if !stranded.is_empty() {
        stranded.sort_unstable();
        return Err(TreeError::Cycle { ids: stranded });
    }

    Ok(tree)
}

fn collect(
    departments: &[Department],
    container: Option<DepartmentId>,
    out: &mut Vec<FlatNode>,
    seen: &mut HashSet<DepartmentId>,
) -> Result<(), TreeError> {
    for department in departments {
        if !seen.insert(department.id) {
            return Err(TreeError::DuplicateId { id: department.id });
        }
        let parent = container.or(department.parent_id);
        out.push(FlatNode {
            department: without_children(department),
            parent,
        });
        collect(&department.children, Some(department.id), out, seen)?;
    }
    Ok(())
}

fn without_children(department: &Department) -> Department {
    Department {
        id: department.id,
        name: department.name.clone(),
        description: department.description.clone(),
        parent_id: department.parent_id,
        manager_id: department.manager_id,
        sort_order: department.sort_order,
        children: Vec::new(),
    }
}

fn build_subtree(
    index: usize,
    nodes: &[FlatNode],
    children_map: &HashMap<DepartmentId, Vec<usize>>,
    reached: &mut [bool],
) -> TreeNode {
    reached[index] = true;
    let department = &nodes[index].department;

    let children: Vec<TreeNode> = children_map
        .get(&department.id)
        .map(|children| {
            children
                .iter()
                .map(|&child| build_subtree(child, nodes, children_map, reached))
                .collect()
        })
        .unwrap_or_default();

    TreeNode {
        title: department.name.clone(),
        key: department.id.to_string(),
        is_leaf: children.is_empty(),
        children,
        origin: department.clone(),
    }
}

/// Depth-first option list with one [`INDENT_PREFIX`] per level.
pub fn flatten_with_indent(departments: &[Department]) -> Result<Vec<SelectOption>, TreeError> {
    Ok(flatten_tree(&build_tree(departments)?))
}

pub fn flatten_tree(tree: &[TreeNode]) -> Vec<SelectOption> {
    let mut options = Vec::new();
    let mut stack: Vec<(&TreeNode, usize)> = tree.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        options.push(SelectOption {
            label: format!("{}{}", INDENT_PREFIX.repeat(depth), node.title),
            value: node.origin.id,
        });
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    options
}

/// Sort siblings by `(sort_order, id)` at every level.
pub fn sort_by_order(departments: &mut [Department]) {
    departments.sort_by_key(|d| (d.sort_order, d.id));
    for department in departments.iter_mut() {
        sort_by_order(&mut department.children);
    }
}
