//! Foreign key dependency ordering
//!
//! Tables created in one batch are ordered so that a referenced table is
//! created before the tables pointing at it. Drops go the other way. Only
//! references between members of the same batch count; a reference to a
//! table outside the batch is assumed to be satisfied already.

use schemata_ir::Table;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Order tables for creation: referenced tables first
pub fn creation_order<'a>(tables: Vec<&'a Table>) -> Vec<&'a Table> {
    let edges = reference_edges(&tables)
        .into_iter()
        .map(|(referencing, referenced)| (referenced, referencing))
        .collect();
    reorder(tables, edges, "create")
}

/// Order tables for dropping: referencing tables first
pub fn drop_order<'a>(tables: Vec<&'a Table>) -> Vec<&'a Table> {
    let edges = reference_edges(&tables);
    reorder(tables, edges, "drop")
}

/// `(referencing, referenced)` index pairs within the batch
fn reference_edges(tables: &[&Table]) -> Vec<(usize, usize)> {
    let position: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.qualified_name(), i))
        .collect();

    let mut edges = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        for target in table.foreign_targets() {
            if let Some(&j) = position.get(&target) {
                if i != j {
                    edges.push((i, j));
                }
            }
        }
    }
    edges
}

fn reorder<'a>(tables: Vec<&'a Table>, edges: Vec<(usize, usize)>, what: &str) -> Vec<&'a Table> {
    let (order, complete) = stable_topological(tables.len(), &edges);
    if !complete {
        warn!(
            batch = what,
            "Foreign key cycle, keeping configuration order for the tables involved"
        );
    }
    order.into_iter().map(|i| tables[i]).collect()
}

/// Kahn's algorithm that always takes the lowest ready index
///
/// `edges` are `(before, after)` pairs. Nodes left over by a cycle are
/// appended in index order; the flag is false when that happened.
pub fn stable_topological(n: usize, edges: &[(usize, usize)]) -> (Vec<usize>, bool) {
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];
    for &(before, after) in edges {
        if !adj[before].contains(&after) {
            adj[before].push(after);
            in_degree[after] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted: Vec<usize> = Vec::with_capacity(n);
    let mut placed = vec![false; n];

    while let Some(node) = ready.pop_first() {
        sorted.push(node);
        placed[node] = true;
        for &next in &adj[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    let complete = sorted.len() == n;
    sorted.extend((0..n).filter(|&i| !placed[i]));
    (sorted, complete)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::KeyKind;
    use schemata_ir::Key;

    fn table(name: &str, refs: &[&str]) -> Table {
        let mut t = Table::new(name, "blog_");
        for r in refs {
            t = t.with_key(
                Key::new(format!("fk_{r}"), KeyKind::Foreign, vec![format!("{r}_id")])
                    .references(*r, ["id"]),
            );
        }
        t
    }

    fn names(tables: &[&Table]) -> Vec<String> {
        tables.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_independent_tables_keep_order() {
        let a = table("a", &[]);
        let b = table("b", &[]);
        let c = table("c", &[]);
        assert_eq!(names(&creation_order(vec![&a, &b, &c])), vec!["a", "b", "c"]);
        assert_eq!(names(&drop_order(vec![&a, &b, &c])), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_referenced_created_first() {
        let comments = table("comments", &["posts", "users"]);
        let posts = table("posts", &["users"]);
        let users = table("users", &[]);
        let tags = table("tags", &[]);
        let order = creation_order(vec![&comments, &posts, &tags, &users]);
        assert_eq!(names(&order), vec!["tags", "users", "posts", "comments"]);
    }

    #[test]
    fn test_referencing_dropped_first() {
        let users = table("users", &[]);
        let posts = table("posts", &["users"]);
        let order = drop_order(vec![&users, &posts]);
        assert_eq!(names(&order), vec!["posts", "users"]);
    }

    #[test]
    fn test_reference_outside_batch_is_ignored() {
        let posts = table("posts", &["users"]);
        let tags = table("tags", &[]);
        assert_eq!(names(&creation_order(vec![&posts, &tags])), vec!["posts", "tags"]);
    }

    #[test]
    fn test_cycle_falls_back_to_configuration_order() {
        let a = table("a", &["b"]);
        let b = table("b", &["a"]);
        let c = table("c", &[]);
        let order = creation_order(vec![&a, &b, &c]);
        assert_eq!(names(&order), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_stable_topological() {
        let (order, complete) = stable_topological(4, &[(3, 0), (2, 1)]);
        assert!(complete);
        assert_eq!(order, vec![2, 1, 3, 0]);

        let (order, complete) = stable_topological(2, &[(0, 1), (1, 0)]);
        assert!(!complete);
        assert_eq!(order, vec![0, 1]);
    }
}
