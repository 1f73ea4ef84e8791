//! The plain, I/O-agnostic variant record the core algorithm (stages A-I)
//! operates on. VCF parsing itself is the output collaborator's job
//! (`crate::cli::io`); this struct is what that adapter produces and what it
//! later writes back out with genotype/auxiliary fields filled in.

use fxhash::hash64;

/// A single candidate (or phased base) variant record.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub chrom: String,
    /// 0-based start position.
    pub start: i64,
    /// 0-based, exclusive end position (`start + reference.len()`).
    pub end: i64,
    pub reference: Vec<u8>,
    pub alt: Vec<u8>,
    /// Opaque index back into the input collection; the output adapter
    /// uses this to know which underlying VCF record to rewrite.
    pub record_index: usize,

    /// Genotype assigned by the region phaser. `None` until written.
    pub genotype: Option<(u8, u8)>,
    pub phased: bool,
    pub phase_group: Option<String>,
    pub sz: (Option<f64>, Option<f64>),
    pub cs: (Option<f64>, Option<f64>),
    pub ad: Option<(i64, i64)>,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        start: i64,
        reference: Vec<u8>,
        alt: Vec<u8>,
        record_index: usize,
    ) -> Self {
        let end = start + reference.len() as i64;
        VariantRecord {
            chrom: chrom.into(),
            start,
            end,
            reference,
            alt,
            record_index,
            genotype: None,
            phased: false,
            phase_group: None,
            sz: (None, None),
            cs: (None, None),
            ad: None,
        }
    }

    /// Signed net length delta, `len(alt) - len(ref)`.
    pub fn size(&self) -> i64 {
        self.alt.len() as i64 - self.reference.len() as i64
    }

    /// Content hash of (chrom, pos, ref, alt), used as the DAG node label.
    pub fn content_hash(&self) -> u64 {
        hash64(&(
            self.chrom.as_str(),
            self.start,
            self.reference.as_slice(),
            self.alt.as_slice(),
        ))
    }

    /// Set every auxiliary output field to the "unused" (0,0) unphased state.
    pub fn set_unused(&mut self) {
        self.genotype = Some((0, 0));
        self.phased = false;
        self.phase_group = None;
        self.sz = (None, None);
        self.cs = (None, None);
        self.ad = None;
    }

    /// Record a phased assignment against one allele's chosen path.
    #[allow(clippy::too_many_arguments)]
    pub fn set_phased(
        &mut self,
        g1: u8,
        g2: u8,
        phase_group: String,
        sz1: Option<f64>,
        sz2: Option<f64>,
        cs1: Option<f64>,
        cs2: Option<f64>,
        ad: (i64, i64),
    ) {
        self.genotype = Some((g1, g2));
        self.phased = true;
        self.phase_group = Some(phase_group);
        self.sz = (sz1, sz2);
        self.cs = (cs1, cs2);
        self.ad = Some(ad);
    }
}
