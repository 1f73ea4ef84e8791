use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use kanpig_phase::cli::counters::PhaseCounters;
use kanpig_phase::cli::io;
use kanpig_phase::cli::opts::PhaseConfig;
use kanpig_phase::model::variant::VariantRecord;
use kanpig_phase::phaser::{process_chunk, state::PhaseState};
use rayon::prelude::*;

fn main() {
    if let Err(e) = run() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = PhaseConfig::parse()?;

    let level = if config.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_threads)
        .build_global()
        .context("building rayon thread pool")?;

    let start_time = Instant::now();

    let (candidates, records_skipped_malformed) = io::read_candidate_vcf(&config.input, config.passonly)?;
    log::info!("loaded {} candidate records", candidates.len());

    let regions = config.regions.as_deref().map(io::parse_regions).transpose()?;
    let chunks = io::chunk_candidates(candidates, &regions, config.chunksize);
    log::info!("grouped into {} chunks", chunks.len());

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("       {bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    let results: Vec<(Vec<VariantRecord>, PhaseState, u32)> = chunks
        .into_par_iter()
        .enumerate()
        .map(|(i, (chrom, start, end, members))| -> Result<(Vec<VariantRecord>, PhaseState, u32)> {
            let chunk_id = i.to_string();
            let fallback = members.clone();
            let outcome = match process_chunk(&chrom, start, end, members, &chunk_id, &config) {
                Ok(outcome) => (outcome.variants, outcome.state, outcome.bam_retries),
                Err(e) => {
                    log::warn!(
                        "chunk {chunk_id} ({chrom}:{start}-{end}) failed: {e:?}; falling back to ALL_REF_0_0"
                    );
                    let mut variants = fallback;
                    for v in variants.iter_mut() {
                        v.set_unused();
                    }
                    (variants, PhaseState::AllRef00, 0)
                }
            };
            pb.inc(1);
            Ok(outcome)
        })
        .collect::<Result<_>>()?; // never actually short-circuits: chunk failures are caught above

    pb.finish_with_message("| Finished phasing");

    let mut counters = PhaseCounters {
        records_skipped_malformed,
        ..Default::default()
    };
    let mut all_variants = Vec::new();
    for (variants, state, retries) in results {
        counters.chunks_total += 1;
        match state {
            PhaseState::AllRef00 => counters.chunks_ref_only += 1,
            PhaseState::Written => counters.chunks_written += 1,
            _ => {}
        }
        if retries > 0 {
            counters.chunks_bam_retried += 1;
        }
        counters.candidates_total += variants.len() as u64;
        counters.candidates_unphased += variants.iter().filter(|v| !v.phased).count() as u64;
        all_variants.extend(variants);
    }

    log::info!("{:?}", counters);

    io::write_output_vcf(&config.input, &config.output, 0, &all_variants)?;

    log::info!("elapsed: {:.2?}", start_time.elapsed());
    Ok(())
}
