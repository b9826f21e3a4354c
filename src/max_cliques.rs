use petgraph::algo::maximal_cliques;
use petgraph::graph::{NodeIndex, UnGraph};

/// All maximal cliques of an undirected graph given as adjacency lists.
/// Self-loops and edges present in only one direction are ignored. Each
/// clique is sorted ascending and the cliques are returned in ascending
/// order; an empty graph has no cliques.
pub fn compute_max_cliques(graph: &[Vec<usize>]) -> Vec<Vec<usize>> {
    if graph.is_empty() {
        return Vec::new();
    }

    let mut undirected = UnGraph::<(), ()>::with_capacity(graph.len(), 0);
    let nodes: Vec<NodeIndex> = (0..graph.len()).map(|_| undirected.add_node(())).collect();
    for (u, neighbors) in graph.iter().enumerate() {
        for &v in neighbors {
            if u < v && graph[v].contains(&u) {
                undirected.add_edge(nodes[u], nodes[v], ());
            }
        }
    }

    let mut cliques: Vec<Vec<usize>> = maximal_cliques(&undirected)
        .into_iter()
        .map(|clique| {
            let mut members: Vec<usize> = clique.into_iter().map(NodeIndex::index).collect();
            members.sort_unstable();
            members
        })
        .collect();
    cliques.sort();
    cliques
}
