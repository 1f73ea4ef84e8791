pub mod region;
pub mod state;

use anyhow::Result;
use log::debug;

use crate::cli::io;
use crate::cli::opts::{HaplotypeSource, PhaseConfig};
use crate::haplotype::bam_builder::build_bam_haplotypes;
use crate::haplotype::vcf_builder::build_vcf_haplotypes;
use crate::model::variant::VariantRecord;

use state::PhaseState;

/// The outcome of phasing one chunk, plus enough bookkeeping for the
/// run-level `PhaseCounters`.
pub struct ChunkOutcome {
    pub variants: Vec<VariantRecord>,
    pub state: PhaseState,
    pub bam_retries: u32,
}

/// Build target haplotypes for `[reg_start, reg_end)` from whichever source
/// `config` selects, then hand off to the region phaser (with the §4.7
/// BAM-retry loop applied on the BAM pathway).
pub fn process_chunk(
    chrom: &str,
    reg_start: i64,
    reg_end: i64,
    candidates: Vec<VariantRecord>,
    chunk_id: &str,
    config: &PhaseConfig,
) -> Result<ChunkOutcome> {
    match &config.source {
        HaplotypeSource::Vcf(path) => {
            let base_records = io::read_phased_region(path, chrom, reg_start, reg_end, &config.sample)?;
            let (h1, h2) = build_vcf_haplotypes(&base_records, config.kmer);
            let (variants, state) = region::phase_region(candidates, h1, h2, chunk_id, config);
            Ok(ChunkOutcome {
                variants,
                state,
                bam_retries: 0,
            })
        }
        HaplotypeSource::Bam { bam, reference } => {
            process_bam_chunk(chrom, reg_start, reg_end, candidates, chunk_id, bam, reference, config)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_bam_chunk(
    chrom: &str,
    reg_start: i64,
    reg_end: i64,
    mut candidates: Vec<VariantRecord>,
    chunk_id: &str,
    bam: &std::path::Path,
    reference: &std::path::Path,
    config: &PhaseConfig,
) -> Result<ChunkOutcome> {
    let mut cur_start = reg_start;
    let mut cur_end = reg_end;
    let mut tries = 0u32;

    loop {
        let fetch_start = (cur_start - config.chunksize).max(0);
        let fetch_end = cur_end + config.chunksize;

        let (mut indels, tot_cov) = io::fetch_pileup_indels(bam, chrom, cur_start, cur_end, config.chunksize)?;
        let refseq = io::fetch_reference(reference, chrom, fetch_start, fetch_end)?;
        io::resolve_deletion_sequences(&mut indels, &refseq, fetch_start);

        let (h1, h2) = build_bam_haplotypes(
            &indels,
            tot_cov,
            cur_start,
            cur_end,
            config.chunksize,
            config.kmer,
            config.sizemin,
            config.sizemax,
            config.pctsize,
        );

        let exhausted = h1.n == 0 && h2.n == 0;
        if exhausted && tries < config.n_tries && candidates.len() > 1 {
            if let Some(drop_idx) = largest_candidate_index(&candidates) {
                debug!("chunk {chunk_id}: BAM retry {}/{}, dropping candidate at index {drop_idx}", tries + 1, config.n_tries);
                candidates.remove(drop_idx);
                tries += 1;
                let (new_start, new_end) = recompute_bounds(&candidates, reg_start, reg_end);
                cur_start = new_start;
                cur_end = new_end;
                continue;
            }
        }

        let (variants, state) = region::phase_region(candidates, h1, h2, chunk_id, config);
        return Ok(ChunkOutcome {
            variants,
            state,
            bam_retries: tries,
        });
    }
}

fn largest_candidate_index(candidates: &[VariantRecord]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .max_by_key(|(_, v)| v.size().abs())
        .map(|(i, _)| i)
}

fn recompute_bounds(candidates: &[VariantRecord], fallback_start: i64, fallback_end: i64) -> (i64, i64) {
    if candidates.is_empty() {
        return (fallback_start, fallback_end);
    }
    let start = candidates.iter().map(|v| v.start).min().unwrap();
    let end = candidates.iter().map(|v| v.end).max().unwrap();
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(chrom: &str, start: i64, reference: &str, alt: &str, idx: usize) -> VariantRecord {
        VariantRecord::new(chrom, start, reference.as_bytes().to_vec(), alt.as_bytes().to_vec(), idx)
    }

    #[test]
    fn largest_candidate_index_picks_biggest_size() {
        let cands = vec![
            var("chr1", 10, "A", "ATTT", 0),
            var("chr1", 50, "A", "ATTTTTTTTTTTTTTT", 1),
        ];
        assert_eq!(largest_candidate_index(&cands), Some(1));
    }

    #[test]
    fn recompute_bounds_spans_remaining_candidates() {
        let cands = vec![var("chr1", 20, "A", "ATTT", 0), var("chr1", 40, "A", "AGG", 1)];
        let (start, end) = recompute_bounds(&cands, 0, 1000);
        assert_eq!(start, 20);
        assert_eq!(end, cands[1].end);
    }

    #[test]
    fn recompute_bounds_falls_back_when_empty() {
        let (start, end) = recompute_bounds(&[], 5, 15);
        assert_eq!((start, end), (5, 15));
    }
}
