//! Path Enumerator (component G): length-guided DFS over a `VariantDag`.
//!
//! At each node, successor edges are explored in ascending order of
//! `|target_size - (cur_len + succ.size)|` -- a greedy ordering, not a
//! pruning cutoff; every path remains reachable. Enumeration stops after
//! `max_paths` yields. This mirrors the original `dfs` generator, restated
//! as an explicit stack so it can be budget-bounded without relying on
//! Python-style early `return`-from-generator semantics.

use super::builder::{NodeId, VariantDag};

struct Frame {
    node: NodeId,
    cur_len: i64,
    /// Remaining successors to try, in already-sorted (best-first) order.
    remaining: Vec<NodeId>,
}

/// Enumerate up to `max_paths` src->snk paths, guided by `target_size`.
/// Returns the interior node lists only (src/snk excluded). A path with no
/// interior nodes (direct src->snk edge) is never yielded.
pub fn enumerate_paths(graph: &VariantDag, target_size: i64, max_paths: usize) -> Vec<Vec<NodeId>> {
    let mut out = Vec::new();
    if max_paths == 0 {
        return out;
    }

    let src = graph.src();
    let snk = graph.snk();

    let mut stack: Vec<Frame> = vec![Frame {
        node: src,
        cur_len: 0,
        remaining: sorted_successors(graph, src, target_size, 0),
    }];
    let mut path: Vec<NodeId> = Vec::new();

    while let Some(frame_top) = stack.last_mut() {
        let Some(next) = frame_top.remaining.pop() else {
            // exhausted this frame's successors; backtrack
            if frame_top.node != src {
                path.pop();
            }
            stack.pop();
            continue;
        };

        let cur_len_at_node = frame_top.cur_len;

        if next == snk {
            if !path.is_empty() {
                out.push(path.clone());
                if out.len() >= max_paths {
                    return out;
                }
            }
            continue;
        }

        path.push(next);
        let new_len = cur_len_at_node + graph.nodes[next].size;
        let remaining = sorted_successors(graph, next, target_size, new_len);
        stack.push(Frame {
            node: next,
            cur_len: new_len,
            remaining,
        });
    }

    out
}

/// Successors of `node`, sorted *descending* by `|target - (cur_len +
/// succ.size)|` so that popping from the back of the Vec visits the
/// smallest-difference (best) successor first.
fn sorted_successors(graph: &VariantDag, node: NodeId, target: i64, cur_len: i64) -> Vec<NodeId> {
    let mut succs: Vec<NodeId> = graph.adj[node].iter().copied().collect();
    succs.sort_by_key(|&n| std::cmp::Reverse((target - (cur_len + graph.nodes[n].size)).abs()));
    succs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::builder::build_dag;
    use crate::model::variant::VariantRecord;

    fn var(chrom: &str, start: i64, reference: &str, alt: &str, idx: usize) -> VariantRecord {
        VariantRecord::new(chrom, start, reference.as_bytes().to_vec(), alt.as_bytes().to_vec(), idx)
    }

    #[test]
    fn single_node_graph_yields_one_path() {
        let cands = vec![var("chr1", 10, "A", "ATTT", 0)];
        let (dag, _) = build_dag(&cands, 3);
        let paths = enumerate_paths(&dag, 3, 1000);
        assert_eq!(paths, vec![vec![1]]);
    }

    #[test]
    fn empty_path_never_yielded() {
        // no candidates at all -> only src/snk, direct edge not built since adj only connects via variants
        let cands: Vec<VariantRecord> = vec![];
        let (dag, _) = build_dag(&cands, 3);
        let paths = enumerate_paths(&dag, 0, 1000);
        assert!(paths.is_empty());
    }

    #[test]
    fn enumeration_is_budget_bounded() {
        // three independent (mutually non-overlapping) candidates -> many combinations of paths
        let cands = vec![
            var("chr1", 10, "A", "ATTT", 0),
            var("chr1", 50, "A", "ACCC", 1),
            var("chr1", 90, "A", "AGGG", 2),
        ];
        let (dag, _) = build_dag(&cands, 3);
        let paths = enumerate_paths(&dag, 0, 2);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn best_matching_length_path_is_found_among_enumerated() {
        let cands = vec![
            var("chr1", 10, "A", "ATTTTTTTTTT", 0), // size +10
            var("chr1", 50, "A", "ACCCCCCCCCC", 1), // size +10
            var("chr1", 90, "A", "AGGGGG", 2),      // size +5
        ];
        let (dag, _) = build_dag(&cands, 3);
        let paths = enumerate_paths(&dag, 10, 1000);
        // one of the enumerated paths sums to exactly size 10
        let has_exact = paths.iter().any(|p| {
            p.iter().map(|&n| dag.nodes[n].size).sum::<i64>() == 10
        });
        assert!(has_exact);
    }
}
