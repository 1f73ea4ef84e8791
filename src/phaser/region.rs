//! Region Phaser (component I): orchestrates the DAG build, path
//! enumeration, and path scoring for one chunk, then writes the resulting
//! diploid genotype and auxiliary fields back onto the candidate records.

use std::collections::HashSet;

use crate::cli::opts::PhaseConfig;
use crate::dag::builder::{build_dag, NodeId};
use crate::dag::enumerator::enumerate_paths;
use crate::model::haplotype::Haplotype;
use crate::model::variant::VariantRecord;
use crate::scoring::picker::{get_best_path, score_paths};

use super::state::PhaseState;

/// Phase one chunk's candidates against its two target haplotypes. Returns
/// the (mutated) candidates, position-sorted, plus the terminal state
/// reached.
pub fn phase_region(
    candidates: Vec<VariantRecord>,
    h1: Haplotype,
    h2: Haplotype,
    chunk_id: &str,
    config: &PhaseConfig,
) -> (Vec<VariantRecord>, PhaseState) {
    let mut candidates = candidates;
    candidates.sort_by_key(|v| v.start);

    if candidates.is_empty() {
        return (candidates, PhaseState::Written);
    }

    if h1.n == 0 && h2.n == 0 {
        for v in candidates.iter_mut() {
            v.set_unused();
        }
        return (candidates, PhaseState::AllRef00);
    }

    let (dag, unused_idx) = build_dag(&candidates, config.kmer);
    for &idx in &unused_idx {
        candidates[idx].set_unused();
    }

    let node_to_candidate: Vec<usize> = dag.nodes.iter().map(|n| n.variant_idx).collect();

    let mut used: HashSet<NodeId> = HashSet::new();
    let mut group_suffix: u32 = 0;

    loop {
        let best1 = if h1.n > 0 {
            let paths = enumerate_paths(&dag, h1.size, config.maxpaths);
            let scored = score_paths(&dag, &paths, &h1, config.wcoslen);
            let best = get_best_path(&scored, Some(&used), config.pctsize, config.cossim);
            (!best.path.is_empty()).then_some(best)
        } else {
            None
        };

        let best2 = if h2.n > 0 {
            let paths = enumerate_paths(&dag, h2.size, config.maxpaths);
            let scored = score_paths(&dag, &paths, &h2, config.wcoslen);
            let best = get_best_path(&scored, Some(&used), config.pctsize, config.cossim);
            (!best.path.is_empty()).then_some(best)
        } else {
            None
        };

        let phase_group = if config.pg {
            format!("{chunk_id}.{group_suffix}")
        } else {
            chunk_id.to_string()
        };

        let mut round_nodes: HashSet<NodeId> = HashSet::new();
        if let Some(p) = &best1 {
            round_nodes.extend(p.path.iter().copied());
        }
        if let Some(p) = &best2 {
            round_nodes.extend(p.path.iter().copied());
        }

        for &node in &round_nodes {
            let cand_idx = node_to_candidate[node];
            let on1 = best1.as_ref().is_some_and(|p| p.path.contains(&node));
            let on2 = best2.as_ref().is_some_and(|p| p.path.contains(&node));
            let g1 = u8::from(on1);
            let g2 = u8::from(on2);
            let sz1 = on1.then(|| best1.as_ref().unwrap().sizesim);
            let sz2 = on2.then(|| best2.as_ref().unwrap().sizesim);
            let cs1 = on1.then(|| best1.as_ref().unwrap().cossim);
            let cs2 = on2.then(|| best2.as_ref().unwrap().cossim);
            candidates[cand_idx].set_phased(
                g1,
                g2,
                phase_group.clone(),
                sz1,
                sz2,
                cs1,
                cs2,
                (h1.coverage, h2.coverage),
            );
        }

        let any_selected = !round_nodes.is_empty();
        used.extend(round_nodes);

        if !config.pg || !any_selected {
            break;
        }
        group_suffix += 1;
    }

    for node in dag.interior() {
        if !used.contains(&node) {
            let cand_idx = node_to_candidate[node];
            candidates[cand_idx].set_unused();
        }
    }

    (candidates, PhaseState::Written)
}
