//! Path Scorer & Picker (component H): score each enumerated path's summed
//! featurization and size against a target haplotype, filter by threshold,
//! and choose the best disjoint pair.

use std::collections::HashSet;

use crate::dag::builder::{NodeId, VariantDag};
use crate::kmer::similarity::{cosinesim, sizesim, weighted_cosinesim};
use crate::model::haplotype::Haplotype;
use crate::model::phasepath::PhasePath;

/// Score every enumerated path against `target`. Paths whose summed size
/// has the opposite sign from `target.size` are dropped outright; the rest
/// are scored and returned as `PhasePath`s (without any threshold
/// filtering yet -- that's `get_best_path`'s job).
pub fn score_paths(
    graph: &VariantDag,
    paths: &[Vec<NodeId>],
    target: &Haplotype,
    wcoslen: i64,
) -> Vec<PhasePath> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let m_s: i64 = path.iter().map(|&n| graph.nodes[n].size).sum();

        // Spec's literal "XOR < 0" sign check: rejects whenever exactly one
        // of target.size/m_s is negative, including when the other is 0.
        if (target.size ^ m_s) < 0 {
            continue;
        }

        let m_sz = sizesim(target.size, m_s);

        let m_k = path.iter().fold(
            ndarray::Array1::<f64>::zeros(target.kfeat.len()),
            |acc, &n| acc + &graph.nodes[n].kfeat,
        );
        let m_cs = if m_s.abs() < wcoslen {
            weighted_cosinesim(&m_k, &target.kfeat)
        } else {
            cosinesim(&m_k, &target.kfeat)
        };

        out.push(PhasePath::new(m_sz, m_cs, path.clone()));
    }
    out
}

/// Filter to `sizesim >= pctsize && cossim >= cossim_threshold`, sort
/// descending by the `PhasePath` order, and return the first whose node set
/// is disjoint from `exclude`. Empty `PhasePath` if none qualify.
pub fn get_best_path(
    paths: &[PhasePath],
    exclude: Option<&HashSet<NodeId>>,
    pctsize: f64,
    cossim_threshold: f64,
) -> PhasePath {
    let mut candidates: Vec<&PhasePath> = paths
        .iter()
        .filter(|p| p.sizesim >= pctsize && p.cossim >= cossim_threshold)
        .collect();
    candidates.sort_by(|a, b| b.cmp(a));

    for p in candidates {
        let disjoint = match exclude {
            None => true,
            Some(used) => !p.path.iter().any(|n| used.contains(n)),
        };
        if disjoint {
            return p.clone();
        }
    }
    PhasePath::default()
}
