//! VCF Haplotype Builder (component D): sum featurizations of phased
//! REF/ALT edits over a region into two haplotypes, H1 and H2.

use crate::kmer::codec::variant_to_kfeat;
use crate::model::haplotype::Haplotype;

/// One already-phased base-VCF record contributing to the target haplotypes.
#[derive(Debug, Clone)]
pub struct PhasedBaseRecord {
    pub reference: Vec<u8>,
    pub alt: Vec<u8>,
    /// `(allele1, allele2)`, each `Some(1)` if the ALT is present on that
    /// copy, `Some(0)` if REF, `None` if missing (`.`).
    pub genotype: (Option<u8>, Option<u8>),
}

/// Build (H1, H2) from a region's phased base records. Each haplotype
/// accumulates `variant_to_kfeat` for every record where its allele is ALT;
/// a missing allele (`None`) simply skips that haplotype for that record.
pub fn build_vcf_haplotypes(records: &[PhasedBaseRecord], k: u8) -> (Haplotype, Haplotype) {
    let mut h1 = Haplotype::reference(k, 1);
    let mut h2 = Haplotype::reference(k, 1);

    for rec in records {
        let (kfeat, size) = variant_to_kfeat(&rec.reference, &rec.alt, k);

        if rec.genotype.0 == Some(1) {
            h1.combine(&Haplotype::new(kfeat.clone(), size, 1, 1));
        }
        if rec.genotype.1 == Some(1) {
            h2.combine(&Haplotype::new(kfeat, size, 1, 1));
        }
    }

    (h1, h2)
}
