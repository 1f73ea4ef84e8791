//! The `Haplotype` value: a summed k-mer featurization plus the bookkeeping
//! (signed size, change count, supporting coverage) needed by the builders
//! and the region phaser.

use crate::kmer::codec::{seq_to_kmer, KFeat};

/// An inferred bundle of changes for one of the two chromosomal copies.
///
/// `n == 0` iff no changes contributed, i.e. this is a reference haplotype.
#[derive(Debug, Clone)]
pub struct Haplotype {
    pub kfeat: KFeat,
    pub size: i64,
    pub n: u32,
    pub coverage: i64,
}

impl Haplotype {
    pub fn new(kfeat: KFeat, size: i64, n: u32, coverage: i64) -> Self {
        Haplotype {
            kfeat,
            size,
            n,
            coverage,
        }
    }

    /// A reference (no-change) haplotype with the given k-mer dimension and
    /// coverage.
    pub fn reference(k: u8, coverage: i64) -> Self {
        Haplotype::new(seq_to_kmer(b"", k), 0, 0, coverage)
    }

    /// Merge `other` into `self`: component-wise addition of kfeat, size,
    /// and n. Coverage is left untouched here; callers decide coverage
    /// semantics explicitly (dedup sums it, consolidate absorbs it).
    pub fn combine(&mut self, other: &Haplotype) {
        self.kfeat = &self.kfeat + &other.kfeat;
        self.size += other.size;
        self.n += other.n;
    }

    /// Exact equality of kfeat, used only for read deduplication.
    pub fn kfeat_eq(&self, other: &Haplotype) -> bool {
        self.kfeat == other.kfeat
    }
}
