//! Depth-first connectivity walk.
//!
//! Uses an explicit stack so deep graphs do not exhaust the call stack.

use super::edge::Edge;

/// Visit every node reachable from `start` through edges accepted by `passable`.
///
/// `visited` is trial-scoped scratch space sized to the node count; nodes
/// already marked are treated as explored. Returns the number of nodes
/// newly marked. Disconnected graphs are fine: unreachable nodes simply
/// stay unmarked.
pub fn walk_from<F>(
    start: usize,
    adjacency: &[Vec<usize>],
    edges: &[Edge],
    visited: &mut [bool],
    mut passable: F,
) -> usize
where
    F: FnMut(usize) -> bool,
{
    if start >= visited.len() || visited[start] {
        return 0;
    }

    let mut stack = vec![start];
    visited[start] = true;
    let mut reached = 1;

    while let Some(node) = stack.pop() {
        for &edge_index in &adjacency[node] {
            if !passable(edge_index) {
                continue;
            }
            let Some(next) = edges[edge_index].connecting_node(node) else {
                continue;
            };
            if !visited[next] {
                visited[next] = true;
                reached += 1;
                stack.push(next);
            }
        }
    }

    reached
}

/// Build the node -> incident edge index list for `edges`
pub fn build_adjacency(edges: &[Edge], node_count: usize) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); node_count];
    for (index, edge) in edges.iter().enumerate() {
        let (low, high) = edge.nodes();
        adjacency[low].push(index);
        adjacency[high].push(index);
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> (Vec<Edge>, Vec<Vec<usize>>) {
        let edges: Vec<Edge> = (0..n - 1)
            .map(|i| Edge::with_reliability(i, i + 1, 1.0))
            .collect();
        let adjacency = build_adjacency(&edges, n);
        (edges, adjacency)
    }

    #[test]
    fn test_walk_reaches_all_on_path() {
        let (edges, adjacency) = path_graph(5);
        let mut visited = vec![false; 5];
        let reached = walk_from(0, &adjacency, &edges, &mut visited, |_| true);
        assert_eq!(reached, 5);
        assert!(visited.iter().all(|&v| v));
    }

    #[test]
    fn test_walk_stops_at_blocked_edge() {
        let (edges, adjacency) = path_graph(5);
        let mut visited = vec![false; 5];
        let reached = walk_from(0, &adjacency, &edges, &mut visited, |e| e != 2);
        assert_eq!(reached, 3);
        assert_eq!(visited, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_walk_handles_deep_graph() {
        let (edges, adjacency) = path_graph(200_000);
        let mut visited = vec![false; 200_000];
        let reached = walk_from(0, &adjacency, &edges, &mut visited, |_| true);
        assert_eq!(reached, 200_000);
    }

    #[test]
    fn test_walk_isolated_start() {
        let edges = vec![Edge::with_reliability(1, 2, 1.0)];
        let adjacency = build_adjacency(&edges, 3);
        let mut visited = vec![false; 3];
        assert_eq!(walk_from(0, &adjacency, &edges, &mut visited, |_| true), 1);
        assert_eq!(visited, vec![true, false, false]);
    }
}
