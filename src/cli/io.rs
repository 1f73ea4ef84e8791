//! Thin collaborator adapters (§4.11): dumb pass-throughs between
//! `rust-htslib` and the plain structs the core (stages A-I) consumes.
//! No algorithmic logic lives here.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rust_htslib::bam::pileup::Indel;
use rust_htslib::bam::record::GenotypeAllele;
use rust_htslib::bam::{self, Read as BamRead};
use rust_htslib::bcf::{self, Read as BcfRead};
use rust_htslib::faidx;

use crate::haplotype::bam_builder::PileupIndel;
use crate::haplotype::vcf_builder::PhasedBaseRecord;
use crate::model::variant::VariantRecord;

/// A region to phase independently, `[start, end)` 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

/// Parse a region list: either a path to a BED file, or a comma-separated
/// `chrom:start-end` list.
pub fn parse_regions(spec: &str) -> Result<Vec<Region>> {
    let path = Path::new(spec);
    if path.is_file() {
        parse_bed_file(path)
    } else {
        parse_region_list(spec)
    }
}

fn parse_bed_file(path: &Path) -> Result<Vec<Region>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading region BED file {path:?}"))?;
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            bail!("malformed BED line: {line}");
        }
        out.push(Region {
            chrom: fields[0].to_string(),
            start: fields[1].parse().with_context(|| format!("BED start in {line}"))?,
            end: fields[2].parse().with_context(|| format!("BED end in {line}"))?,
        });
    }
    Ok(out)
}

fn parse_region_list(spec: &str) -> Result<Vec<Region>> {
    spec.split(',')
        .map(|part| {
            let part = part.trim();
            let (chrom, range) = part
                .rsplit_once(':')
                .with_context(|| format!("region missing ':' : {part}"))?;
            let (start, end) = range
                .split_once('-')
                .with_context(|| format!("region missing '-' : {part}"))?;
            Ok(Region {
                chrom: chrom.to_string(),
                start: start.parse().with_context(|| format!("region start in {part}"))?,
                end: end.parse().with_context(|| format!("region end in {part}"))?,
            })
        })
        .collect()
}

/// Fetch an upper-cased reference slice `[start, end)` from an indexed FASTA.
pub fn fetch_reference(fasta: &Path, chrom: &str, start: i64, end: i64) -> Result<Vec<u8>> {
    let reader = faidx::Reader::from_path(fasta)
        .with_context(|| format!("opening indexed FASTA {fasta:?}"))?;
    let seq = reader
        .fetch_seq(chrom, start.max(0) as usize, (end - 1).max(0) as usize)
        .with_context(|| format!("fetching {chrom}:{start}-{end} from {fasta:?}"))?;
    Ok(seq.iter().map(|b| b.to_ascii_uppercase()).collect())
}

/// Read every candidate record from the input VCF, in file order.
/// `passonly` drops records whose FILTER is not PASS/`.`. A record that
/// fails to parse (bad contig id, non-UTF8 contig name, missing REF/ALT) is
/// skipped rather than aborting the run (§7 "Malformed record"); the second
/// element of the returned tuple is the number of records skipped this way.
pub fn read_candidate_vcf(path: &Path, passonly: bool) -> Result<(Vec<VariantRecord>, u64)> {
    let mut reader =
        bcf::Reader::from_path(path).with_context(|| format!("opening candidate VCF {path:?}"))?;
    let header = reader.header().clone();
    let mut out = Vec::new();
    let mut skipped = 0u64;

    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping unreadable record {idx} of {path:?}: {e:?}");
                skipped += 1;
                continue;
            }
        };

        match parse_candidate_record(&record, &header, idx, passonly) {
            Ok(Some(v)) => out.push(v),
            Ok(None) => {}
            Err(e) => {
                log::warn!("skipping malformed record {idx} of {path:?}: {e:?}");
                skipped += 1;
            }
        }
    }

    Ok((out, skipped))
}

/// Parse one candidate record. Returns `Ok(None)` when `passonly` drops it,
/// `Err` when the record is malformed (missing contig/REF/ALT).
fn parse_candidate_record(
    record: &bcf::Record,
    header: &bcf::header::HeaderView,
    idx: usize,
    passonly: bool,
) -> Result<Option<VariantRecord>> {
    if passonly {
        let pass = record.filters().all(|f| header.id_to_name(f) == b"PASS");
        if !pass {
            return Ok(None);
        }
    }

    let rid = record.rid().context("record missing contig id")?;
    let chrom = std::str::from_utf8(header.rid2name(rid)?)
        .context("non-UTF8 contig name")?
        .to_string();
    let start = record.pos();
    let alleles = record.alleles();
    let reference = alleles.first().context("record missing REF allele")?.to_vec();
    let alt = alleles.get(1).context("record missing ALT allele")?.to_vec();

    Ok(Some(VariantRecord::new(chrom, start, reference, alt, idx)))
}

/// Resolve `--sample` (a name or a bare integer column index) against a VCF
/// header's sample list.
pub fn resolve_sample_index(header: &bcf::header::HeaderView, sample: &str) -> Result<usize> {
    if let Ok(idx) = sample.parse::<usize>() {
        return Ok(idx);
    }
    header
        .sample_id(sample.as_bytes())
        .with_context(|| format!("sample {sample} not found in VCF header"))
}

/// Read the phased base records overlapping `[start, end)` from an indexed
/// phased VCF, for the given sample.
pub fn read_phased_region(
    path: &Path,
    chrom: &str,
    start: i64,
    end: i64,
    sample: &str,
) -> Result<Vec<PhasedBaseRecord>> {
    let mut reader = bcf::IndexedReader::from_path(path)
        .with_context(|| format!("opening indexed phased VCF {path:?}"))?;
    let sample_idx = resolve_sample_index(reader.header(), sample)?;
    let rid = reader
        .header()
        .name2rid(chrom.as_bytes())
        .with_context(|| format!("contig {chrom} not found in {path:?}"))?;
    reader
        .fetch(rid, start.max(0) as u64, Some(end as u64))
        .with_context(|| format!("fetching {chrom}:{start}-{end} from {path:?}"))?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.context("reading phased VCF record")?;
        let alleles = record.alleles();
        let reference = alleles.first().context("record missing REF allele")?.to_vec();
        let alt = alleles.get(1).context("record missing ALT allele")?.to_vec();

        let genotypes = record.genotypes().context("reading genotypes")?;
        let gt = genotypes.get(sample_idx);
        let a1 = gt.get(0).and_then(allele_index);
        let a2 = gt.get(1).and_then(allele_index);

        out.push(PhasedBaseRecord {
            reference,
            alt,
            genotype: (a1, a2),
        });
    }

    Ok(out)
}

fn allele_index(allele: &GenotypeAllele) -> Option<u8> {
    match allele {
        GenotypeAllele::Unphased(i) | GenotypeAllele::Phased(i) => u8::try_from(*i).ok(),
        GenotypeAllele::UnphasedMissing | GenotypeAllele::PhasedMissing => None,
    }
}

/// Pile up `[reg_start - chunksize, reg_end + chunksize]` in `bam_path` and
/// extract every indel event, plus the summed column depth over the window.
/// Deletion sequences are left empty; call `resolve_deletion_sequences`
/// against a fetched reference window to fill them in.
pub fn fetch_pileup_indels(
    bam_path: &Path,
    chrom: &str,
    reg_start: i64,
    reg_end: i64,
    chunksize: i64,
) -> Result<(Vec<PileupIndel>, i64)> {
    let mut reader = bam::IndexedReader::from_path(bam_path)
        .with_context(|| format!("opening indexed BAM {bam_path:?}"))?;
    let tid = reader
        .header()
        .tid(chrom.as_bytes())
        .with_context(|| format!("contig {chrom} not found in {bam_path:?}"))?;
    let fetch_start = (reg_start - chunksize).max(0);
    let fetch_end = reg_end + chunksize;
    reader
        .fetch((tid, fetch_start, fetch_end))
        .with_context(|| format!("fetching {chrom}:{fetch_start}-{fetch_end}"))?;

    let mut indels = Vec::new();
    let mut tot_cov: i64 = 0;

    let mut pileups = reader.pileup();
    while let Some(p) = pileups.next() {
        let p = p.context("reading pileup column")?;
        tot_cov += p.depth() as i64;

        for alignment in p.alignments() {
            let record = alignment.record();
            let ref_start = record.pos();
            let ref_end = record.cigar().end_pos();
            let name = String::from_utf8_lossy(record.qname()).into_owned();

            match alignment.indel() {
                Indel::Ins(len) => {
                    let Some(qpos) = alignment.qpos() else {
                        continue;
                    };
                    let seq = record.seq();
                    let ins_seq: Vec<u8> = (qpos + 1..qpos + 1 + len as usize)
                        .filter(|&i| i < seq.len())
                        .map(|i| seq[i])
                        .collect();
                    indels.push(PileupIndel {
                        read_name: name,
                        ref_start,
                        ref_end,
                        indel: len as i64,
                        seq: ins_seq,
                    });
                }
                Indel::Del(len) => {
                    indels.push(PileupIndel {
                        read_name: name,
                        ref_start,
                        ref_end,
                        indel: -(len as i64),
                        seq: Vec::new(),
                    });
                }
                Indel::None => {}
            }
        }
    }

    Ok((indels, tot_cov))
}

/// Fill in deletion sequences left empty by `fetch_pileup_indels` (the
/// deleted bases aren't present in the read, so they must come from the
/// reference). `refseq` is the `[chrom, fetch_start, fetch_end)` window that
/// produced `indels`; `fetch_start` is its 0-based start.
pub fn resolve_deletion_sequences(indels: &mut [PileupIndel], refseq: &[u8], fetch_start: i64) {
    for ind in indels.iter_mut() {
        if ind.indel >= 0 {
            continue;
        }
        let del_len = (-ind.indel) as usize;
        // +1 to skip the shared anchor base, matching the anchor-trim
        // convention used for VCF-derived variants.
        let offset = (ind.ref_start - fetch_start + 1).max(0) as usize;
        if offset + del_len <= refseq.len() {
            ind.seq = refseq[offset..offset + del_len].to_vec();
        }
    }
}

const OUTPUT_FORMAT_LINES: &[&[u8]] = &[
    br#"##FORMAT=<ID=SZ,Number=R,Type=Float,Description="Per-allele size similarity of the selected path">"#,
    br#"##FORMAT=<ID=CS,Number=R,Type=Float,Description="Per-allele cosine similarity of the selected path">"#,
    br#"##FORMAT=<ID=PG,Number=1,Type=String,Description="Phase-group id">"#,
    br#"##FORMAT=<ID=AD,Number=R,Type=Integer,Description="Per-haplotype coverage attributed to H1, H2">"#,
];

/// Re-open `input`, register the SZ/CS/PG/AD FORMAT lines on its header, and
/// stream every record back out (in input order) with genotype and
/// auxiliary fields overwritten from `phased` (indexed by
/// `VariantRecord::record_index`).
pub fn write_output_vcf(input: &Path, output: &Path, sample_idx: usize, phased: &[VariantRecord]) -> Result<()> {
    let mut reader =
        bcf::Reader::from_path(input).with_context(|| format!("re-opening candidate VCF {input:?}"))?;

    let mut header = bcf::Header::from_template(reader.header());
    for line in OUTPUT_FORMAT_LINES {
        header.push_record(line);
    }

    let uncompressed = output.as_os_str() == "-" || output.extension().map(|e| e != "gz").unwrap_or(true);
    let mut writer = if output.as_os_str() == "-" {
        bcf::Writer::from_stdout(&header, uncompressed, bcf::Format::Vcf)
            .context("opening stdout VCF writer")?
    } else {
        bcf::Writer::from_path(output, &header, uncompressed, bcf::Format::Vcf)
            .with_context(|| format!("creating output VCF {output:?}"))?
    };

    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("re-reading record {idx}"))?;
        let mut out_record = writer.empty_record();
        out_record.set_rid(record.rid());
        out_record.set_pos(record.pos());
        out_record.set_alleles(&record.alleles())?;
        out_record.set_id(&record.id())?;

        if let Some(v) = phased.iter().find(|v| v.record_index == idx) {
            write_phased_fields(&mut out_record, v, sample_idx)?;
        } else {
            let gt = [GenotypeAllele::Unphased(0), GenotypeAllele::Unphased(0)];
            out_record.push_genotypes(&gt)?;
        }

        writer.write(&out_record).with_context(|| format!("writing record {idx}"))?;
    }

    Ok(())
}

fn write_phased_fields(record: &mut bcf::Record, v: &VariantRecord, _sample_idx: usize) -> Result<()> {
    let (g1, g2) = v.genotype.unwrap_or((0, 0));
    let gt = if v.phased {
        vec![GenotypeAllele::Phased(g1 as i32), GenotypeAllele::Phased(g2 as i32)]
    } else {
        vec![GenotypeAllele::Unphased(g1 as i32), GenotypeAllele::Unphased(g2 as i32)]
    };
    record.push_genotypes(&gt)?;

    if let Some(pg) = &v.phase_group {
        record.push_format_string(b"PG", &[pg.as_bytes()])?;
    }
    if v.phased {
        let sz = [v.sz.0.unwrap_or(f32::NAN as f64) as f32, v.sz.1.unwrap_or(f32::NAN as f64) as f32];
        record.push_format_float(b"SZ", &sz)?;
        let cs = [v.cs.0.unwrap_or(f32::NAN as f64) as f32, v.cs.1.unwrap_or(f32::NAN as f64) as f32];
        record.push_format_float(b"CS", &cs)?;
    }
    if let Some((ad1, ad2)) = v.ad {
        record.push_format_integer(b"AD", &[ad1 as i32, ad2 as i32])?;
    }

    Ok(())
}

/// Group position-sorted candidates into per-chunk work units, standing in
/// for the upstream chunker named in §6. If `regions` is given, each region
/// becomes one chunk (candidates entirely outside every region are
/// dropped). Otherwise, contiguous runs of candidates separated by gaps no
/// larger than `chunksize` are grouped together.
pub fn chunk_candidates(
    mut candidates: Vec<VariantRecord>,
    regions: &Option<Vec<Region>>,
    chunksize: i64,
) -> Vec<(String, i64, i64, Vec<VariantRecord>)> {
    candidates.sort_by(|a, b| a.chrom.cmp(&b.chrom).then(a.start.cmp(&b.start)));

    if let Some(regions) = regions {
        return regions
            .iter()
            .map(|r| {
                let members: Vec<VariantRecord> = candidates
                    .iter()
                    .filter(|v| v.chrom == r.chrom && v.start >= r.start && v.start < r.end)
                    .cloned()
                    .collect();
                (r.chrom.clone(), r.start, r.end, members)
            })
            .collect();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<VariantRecord> = Vec::new();
    for v in candidates {
        if let Some(last) = current.last() {
            if v.chrom != last.chrom || v.start - last.end > chunksize {
                chunks.push(finish_chunk(std::mem::take(&mut current)));
            }
        }
        current.push(v);
    }
    if !current.is_empty() {
        chunks.push(finish_chunk(current));
    }
    chunks
}

fn finish_chunk(members: Vec<VariantRecord>) -> (String, i64, i64, Vec<VariantRecord>) {
    let chrom = members[0].chrom.clone();
    let start = members.iter().map(|v| v.start).min().unwrap();
    let end = members.iter().map(|v| v.end).max().unwrap();
    (chrom, start, end, members)
}
