//! Variant DAG Builder (component F).
//!
//! Builds a source -> sink DAG over position-sorted candidate variants:
//! one node per candidate with non-zero kfeat, plus virtual `src`/`snk`
//! nodes. An edge `u -> v` exists whenever `u` precedes `v` in position
//! order and their intervals don't overlap.
//!
//! Represented as a dense `Vec<NodeData>` plus `Vec<Vec<NodeId>>` adjacency
//! (design note in SPEC_FULL.md §9), so path-sum operations stay
//! cache-friendly and we avoid per-node hashing on the hot DFS path.

use smallvec::SmallVec;

use crate::kmer::codec::{variant_to_kfeat, KFeat};
use crate::model::variant::VariantRecord;

pub type NodeId = usize;

/// Most candidates in a chunk have only a handful of non-overlapping
/// successors; inline a small run of them to skip a heap allocation per node.
pub type Successors = SmallVec<[NodeId; 8]>;

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kfeat: KFeat,
    pub size: i64,
    pub start: i64,
    pub end: i64,
    /// Index into the candidate slice the DAG was built from; `usize::MAX`
    /// for the virtual src/snk nodes.
    pub variant_idx: usize,
}

/// A variant DAG for one region. `src = 0`, `snk = nodes.len() - 1`.
pub struct VariantDag {
    pub nodes: Vec<NodeData>,
    pub adj: Vec<Successors>,
}

impl VariantDag {
    pub fn src(&self) -> NodeId {
        0
    }

    pub fn snk(&self) -> NodeId {
        self.nodes.len() - 1
    }

    /// All node ids excluding the virtual src/snk endpoints.
    pub fn interior(&self) -> impl Iterator<Item = NodeId> + '_ {
        1..self.snk()
    }
}

/// Build the DAG for a position-sorted slice of candidate variants.
///
/// Returns `(dag, unused)` where `unused` holds the indices (into
/// `candidates`) of variants whose net kfeat was zero and were therefore
/// excluded from the graph entirely.
pub fn build_dag(candidates: &[VariantRecord], k: u8) -> (VariantDag, Vec<usize>) {
    let mut kept: Vec<(usize, KFeat, i64)> = Vec::with_capacity(candidates.len());
    let mut unused = Vec::new();

    for (idx, v) in candidates.iter().enumerate() {
        let (kfeat, size) = variant_to_kfeat(&v.reference, &v.alt, k);
        if kfeat.iter().any(|&x| x != 0.0) {
            kept.push((idx, kfeat, size));
        } else {
            unused.push(idx);
        }
    }

    let n = kept.len();
    let snk_id = n + 1;

    let mut nodes = Vec::with_capacity(n + 2);
    nodes.push(NodeData {
        kfeat: KFeat::zeros(4usize.pow(k as u32)),
        size: 0,
        start: i64::MIN,
        end: i64::MIN,
        variant_idx: usize::MAX,
    });
    for &(idx, ref kfeat, size) in &kept {
        let v = &candidates[idx];
        nodes.push(NodeData {
            kfeat: kfeat.clone(),
            size,
            start: v.start,
            end: v.end,
            variant_idx: idx,
        });
    }
    nodes.push(NodeData {
        kfeat: KFeat::zeros(4usize.pow(k as u32)),
        size: 0,
        start: i64::MAX,
        end: i64::MAX,
        variant_idx: usize::MAX,
    });

    let mut adj: Vec<Successors> = vec![Successors::new(); n + 2];

    // src -> every variant node; every variant node -> snk.
    for v in 1..=n {
        adj[0].push(v);
        adj[v].push(snk_id);
    }

    // u -> v for every ordered, non-overlapping pair (u before v in
    // position order, since `candidates` is position-sorted).
    for u in 1..=n {
        for v in (u + 1)..=n {
            if !overlaps(nodes[u].start, nodes[u].end, nodes[v].start, nodes[v].end) {
                adj[u].push(v);
            }
        }
    }

    (VariantDag { nodes, adj }, unused)
}

#[inline]
fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}
