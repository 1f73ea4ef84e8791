//! BAM Haplotype Builder (component E): pile up reads in a region, extract
//! indels within the configured size bounds, featurize them per-read,
//! dedupe, and 2-means cluster into H1, H2 with reference-threshold
//! fallback rules.

use fxhash::FxHashMap;

use crate::haplotype::kmeans::{effective_clusters, kmeans2};
use crate::kmer::codec::{seq_to_kmer, KFeat};
use crate::kmer::similarity::sizesim;
use crate::model::haplotype::Haplotype;

/// Fraction of region coverage above which alt evidence suppresses a
/// reference haplotype call.
pub const REFTHRESHOLD: f64 = 0.85;

/// A single indel observed in one read's alignment over the pileup window.
/// `seq` is the inserted bases (insertion) or the deleted reference bases
/// (deletion); the anchor base is assumed already excluded by the collector.
pub struct PileupIndel {
    pub read_name: String,
    /// The read's aligned reference span.
    pub ref_start: i64,
    pub ref_end: i64,
    /// Signed length: positive for insertion, negative for deletion.
    pub indel: i64,
    pub seq: Vec<u8>,
}

fn featurize_indel(indel: &PileupIndel, k: u8) -> (KFeat, i64) {
    let kfeat = seq_to_kmer(&indel.seq, k);
    if indel.indel > 0 {
        (kfeat, indel.indel)
    } else {
        (-kfeat, indel.indel)
    }
}

/// Build (H1, H2) from the indels observed over `[reg_start, reg_end]`,
/// with `tot_cov` the summed pileup depth across the fetched window
/// (`[reg_start - chunksize, reg_end + chunksize]`).
#[allow(clippy::too_many_arguments)]
pub fn build_bam_haplotypes(
    indels: &[PileupIndel],
    tot_cov: i64,
    reg_start: i64,
    reg_end: i64,
    chunksize: i64,
    k: u8,
    sizemin: i64,
    sizemax: i64,
    pctsize: f64,
) -> (Haplotype, Haplotype) {
    let window = (reg_end - reg_start + 2 * chunksize).max(1);
    let coverage = tot_cov / window;

    let mut per_read: FxHashMap<String, Haplotype> = FxHashMap::default();
    let dim = 4usize.pow(k as u32);
    for ind in indels {
        if ind.ref_start >= reg_start || ind.ref_end <= reg_end {
            continue;
        }
        let mag = ind.indel.unsigned_abs() as i64;
        if mag < sizemin || mag > sizemax {
            continue;
        }
        let (kfeat, size) = featurize_indel(ind, k);
        per_read
            .entry(ind.read_name.clone())
            .or_insert_with(|| Haplotype::new(KFeat::zeros(dim), 0, 0, 1))
            .combine(&Haplotype::new(kfeat, size, 1, 1));
    }

    let reads: Vec<Haplotype> = per_read.into_values().collect();

    if coverage == 0 || reads.is_empty() {
        let ref_hap = Haplotype::reference(k, coverage);
        return (ref_hap.clone(), ref_hap);
    }

    let distinct = dedupe_by_kfeat(reads);

    if distinct.len() == 1 {
        let h = distinct.into_iter().next().unwrap();
        let ref_hap = Haplotype::reference(k, coverage);
        return if (h.coverage as f64) / (coverage as f64) < REFTHRESHOLD {
            (ref_hap, h)
        } else {
            (h.clone(), h)
        };
    }

    let kfeats: Vec<KFeat> = distinct.iter().map(|h| h.kfeat.clone()).collect();
    let weights: Vec<f64> = distinct.iter().map(|h| h.coverage as f64).collect();
    let assignment = kmeans2(&kfeats, &weights);
    let eff = effective_clusters(&assignment);
    let alt_cov: i64 = distinct.iter().map(|h| h.coverage).sum();

    if eff <= 1 {
        let consolidated = consolidate(distinct);
        let ref_hap = Haplotype::reference(k, coverage);
        return if (alt_cov as f64) / (coverage as f64) < REFTHRESHOLD {
            (ref_hap, consolidated)
        } else {
            (consolidated.clone(), consolidated)
        };
    }

    let cluster0: Vec<Haplotype> = distinct
        .iter()
        .zip(&assignment)
        .filter(|(_, &c)| c == 0)
        .map(|(h, _)| h.clone())
        .collect();
    let cluster1: Vec<Haplotype> = distinct
        .iter()
        .zip(&assignment)
        .filter(|(_, &c)| c == 1)
        .map(|(h, _)| h.clone())
        .collect();

    let h1 = consolidate(cluster0);
    let h2 = consolidate(cluster1);

    let same_sign = (h1.size >= 0) == (h2.size >= 0);
    if same_sign && sizesim(h1.size.abs(), h2.size.abs()) > pctsize {
        let mut merged = h1.clone();
        merged.combine(&h2);
        merged.coverage = h1.coverage + h2.coverage;
        let ref_hap = Haplotype::reference(k, coverage);
        return if (merged.coverage as f64) / (coverage as f64) < REFTHRESHOLD {
            (ref_hap, merged)
        } else {
            (merged.clone(), merged)
        };
    }

    (h1, h2)
}

/// Group per-read haplotypes by exact kfeat equality, summing coverage.
fn dedupe_by_kfeat(reads: Vec<Haplotype>) -> Vec<Haplotype> {
    let mut groups: Vec<Haplotype> = Vec::new();
    for h in reads {
        if let Some(existing) = groups.iter_mut().find(|g| g.kfeat_eq(&h)) {
            existing.coverage += h.coverage;
        } else {
            groups.push(h);
        }
    }
    groups
}

/// Pick the member with the largest coverage (ties broken by smaller `n`),
/// then absorb every other member's coverage into it.
fn consolidate(group: Vec<Haplotype>) -> Haplotype {
    let total_coverage: i64 = group.iter().map(|h| h.coverage).sum();
    let mut best = group
        .into_iter()
        .reduce(|a, b| {
            if b.coverage > a.coverage || (b.coverage == a.coverage && b.n < a.n) {
                b
            } else {
                a
            }
        })
        .expect("consolidate called with empty group");
    best.coverage = total_coverage;
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indel(name: &str, start: i64, end: i64, len: i64, seq: &str) -> PileupIndel {
        PileupIndel {
            read_name: name.to_string(),
            ref_start: start,
            ref_end: end,
            indel: len,
            seq: seq.as_bytes().to_vec(),
        }
    }

    #[test]
    fn zero_coverage_yields_reference_pair() {
        let (h1, h2) = build_bam_haplotypes(&[], 0, 100, 200, 100, 3, 20, 50000, 0.9);
        assert_eq!(h1.n, 0);
        assert_eq!(h2.n, 0);
    }

    #[test]
    fn single_minority_hap_falls_back_to_ref_het() {
        let reads: Vec<PileupIndel> = (0..3)
            .map(|i| indel(&format!("r{i}"), 0, 400, 30, "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTT"))
            .collect();
        // 3 supporting reads out of implied coverage 30 -> well under REFTHRESHOLD
        let (h1, h2) = build_bam_haplotypes(&reads, 3000, 100, 200, 100, 3, 20, 50000, 0.9);
        assert_eq!(h1.n, 0); // REF
        assert_eq!(h2.n, 1);
    }

    #[test]
    fn single_majority_hap_is_homozygous() {
        let reads: Vec<PileupIndel> = (0..28)
            .map(|i| indel(&format!("r{i}"), 0, 400, 30, "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTT"))
            .collect();
        let (h1, h2) = build_bam_haplotypes(&reads, 3000, 100, 200, 100, 3, 20, 50000, 0.9);
        assert_eq!(h1.n, 1);
        assert_eq!(h2.n, 1);
        assert_eq!(h1.size, h2.size);
    }

    #[test]
    fn two_distinct_haps_cluster_into_compound_het() {
        let mut reads = Vec::new();
        for i in 0..15 {
            reads.push(indel(&format!("a{i}"), 0, 400, 30, "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTT"));
        }
        for i in 0..15 {
            reads.push(indel(&format!("b{i}"), 0, 400, 25, "GGGGGGGGGGGGGGGGGGGGGGGGG"));
        }
        let (h1, h2) = build_bam_haplotypes(&reads, 3000, 100, 200, 100, 3, 20, 50000, 0.9);
        assert!(h1.n >= 1);
        assert!(h2.n >= 1);
        assert_ne!(h1.size, h2.size);
    }

    #[test]
    fn reads_not_spanning_region_are_excluded() {
        let reads = vec![indel("r0", 150, 180, 30, "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTT")];
        let (h1, h2) = build_bam_haplotypes(&reads, 3000, 100, 200, 100, 3, 20, 50000, 0.9);
        assert_eq!(h1.n, 0);
        assert_eq!(h2.n, 0);
    }

    #[test]
    fn indel_outside_size_bounds_is_excluded() {
        let reads = vec![indel("r0", 0, 400, 5, "TTTTT")];
        let (h1, h2) = build_bam_haplotypes(&reads, 3000, 100, 200, 100, 3, 20, 50000, 0.9);
        assert_eq!(h1.n, 0);
        assert_eq!(h2.n, 0);
    }
}
