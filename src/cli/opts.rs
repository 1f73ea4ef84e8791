use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{value_parser, ArgGroup, Parser};
use log::warn;

use crate::kmer::codec::MAX_K;

/// Command-line options for the region phaser.
#[derive(Parser, Debug)]
#[command(
    name = "kdphase",
    about = "Genotype candidate structural variants by k-mer haplotype matching",
    version
)]
#[clap(group = ArgGroup::new("haplotype_source").required(true).args(&["vcf", "bam"]).multiple(false))]
struct Cli {
    /// Candidate VCF to genotype [path]
    #[clap(short = 'i', long, value_parser, required = true, help_heading = "Core")]
    pub input: PathBuf,

    /// Phased VCF supplying the target haplotypes [path]
    #[clap(long, value_parser, group = "haplotype_source", help_heading = "Haplotype source (select one)")]
    pub vcf: Option<PathBuf>,

    /// Aligned BAM supplying the target haplotypes [path]
    #[clap(long, value_parser, group = "haplotype_source", help_heading = "Haplotype source (select one)")]
    pub bam: Option<PathBuf>,

    /// Indexed reference FASTA, required with --bam [path]
    #[clap(short = 'f', long, value_parser, help_heading = "Core")]
    pub reference: Option<PathBuf>,

    /// Output VCF path (default: stdout) [path]
    #[clap(short = 'o', long, value_parser, default_value = "-", help_heading = "Core")]
    pub output: PathBuf,

    /// Region list: a BED file path or `chrom:start-end,...` [string]
    #[clap(short = 'r', long, help_heading = "Core")]
    pub regions: Option<String>,

    /// Sample name or column index in the candidate VCF [string]
    #[clap(short = 's', long, default_value = "0", help_heading = "Core")]
    pub sample: String,

    /// K-mer size for featurization (warns at >= 8) [integer]
    #[clap(long = "kmer", default_value = "4", value_parser = value_parser!(u8).range(1..=(MAX_K as i64)), help_heading = "Tuning")]
    pub kmer: u8,

    /// Only consider PASS candidate records [flag]
    #[clap(long, help_heading = "Tuning")]
    pub passonly: bool,

    /// Minimum indel size to consider (warns below 20) [integer]
    #[clap(long, default_value = "20", help_heading = "Tuning")]
    pub sizemin: i64,

    /// Maximum indel size to consider [integer]
    #[clap(long, default_value = "50000", help_heading = "Tuning")]
    pub sizemax: i64,

    /// Maximum number of DFS paths enumerated per haplotype [integer]
    #[clap(long, default_value = "1000", help_heading = "Tuning")]
    pub maxpaths: usize,

    /// Minimum cosine similarity for a path to qualify [float]
    #[clap(long, default_value = "0.90", help_heading = "Tuning")]
    pub cossim: f64,

    /// Minimum size similarity for a path to qualify [float]
    #[clap(long, default_value = "0.90", help_heading = "Tuning")]
    pub pctsize: f64,

    /// |size| below which weighted cosine similarity is used instead of plain cosine [integer]
    #[clap(long, default_value = "2000", help_heading = "Tuning")]
    pub wcoslen: i64,

    /// Padding added to each side of a region when fetching reads/reference [integer]
    #[clap(long, default_value = "100", help_heading = "Tuning")]
    pub chunksize: i64,

    /// Maximum BAM-pathway retries when both haplotypes come back empty [integer]
    #[clap(long, default_value = "5", help_heading = "Tuning")]
    pub n_tries: u32,

    /// Enable experimental multi-phase-group mode [flag]
    #[clap(long, help_heading = "Tuning")]
    pub pg: bool,

    /// Verbose logging [flag]
    #[clap(long, help_heading = "Core")]
    pub debug: bool,

    /// Worker thread count for chunk-level parallelism [integer]
    #[clap(short = 't', long, default_value = "1", help_heading = "Core")]
    pub n_threads: usize,
}

/// Source of target haplotypes for a run: phased VCF or aligned reads.
#[derive(Debug, Clone)]
pub enum HaplotypeSource {
    Vcf(PathBuf),
    Bam { bam: PathBuf, reference: PathBuf },
}

/// The immutable, validated bundle of every tuning knob, built once at
/// startup and threaded by reference into stages D-I.
#[derive(Debug, Clone)]
pub struct PhaseConfig {
    pub input: PathBuf,
    pub source: HaplotypeSource,
    pub output: PathBuf,
    pub regions: Option<String>,
    pub sample: String,
    pub kmer: u8,
    pub passonly: bool,
    pub sizemin: i64,
    pub sizemax: i64,
    pub maxpaths: usize,
    pub cossim: f64,
    pub pctsize: f64,
    pub wcoslen: i64,
    pub chunksize: i64,
    pub n_tries: u32,
    pub pg: bool,
    pub debug: bool,
    pub n_threads: usize,
}

impl PhaseConfig {
    /// Parse `std::env::args()` into a validated `PhaseConfig`.
    pub fn parse() -> Result<Self> {
        let cli = Cli::parse();
        Self::from_cli(cli)
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        let source = match (cli.vcf, cli.bam) {
            (Some(vcf), None) => {
                if cli.reference.is_some() {
                    warn!("--reference is ignored when --vcf supplies the haplotype source");
                }
                HaplotypeSource::Vcf(vcf)
            }
            (None, Some(bam)) => {
                let reference = cli
                    .reference
                    .context("--reference is required when --bam is used")?;
                HaplotypeSource::Bam { bam, reference }
            }
            (Some(_), Some(_)) => bail!("--vcf and --bam are mutually exclusive"),
            (None, None) => bail!("one of --vcf or --bam is required"),
        };

        if cli.kmer >= 8 {
            warn!("--kmer {} is large; 4^k feature vectors grow quickly", cli.kmer);
        }
        if cli.sizemin < 20 {
            warn!("--sizemin {} is below the recommended minimum of 20", cli.sizemin);
        }
        if cli.sizemax <= cli.sizemin {
            bail!("--sizemax must be greater than --sizemin");
        }
        if !(0.0..=1.0).contains(&cli.cossim) {
            bail!("--cossim must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&cli.pctsize) {
            bail!("--pctsize must be in [0, 1]");
        }

        Ok(PhaseConfig {
            input: cli.input,
            source,
            output: cli.output,
            regions: cli.regions,
            sample: cli.sample,
            kmer: cli.kmer,
            passonly: cli.passonly,
            sizemin: cli.sizemin,
            sizemax: cli.sizemax,
            maxpaths: cli.maxpaths,
            cossim: cli.cossim,
            pctsize: cli.pctsize,
            wcoslen: cli.wcoslen,
            chunksize: cli.chunksize,
            n_tries: cli.n_tries,
            pg: cli.pg,
            debug: cli.debug,
            n_threads: cli.n_threads,
        })
    }
}
