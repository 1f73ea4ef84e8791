//! Two-bit nucleotide encoding and the sliding k-mer index used to turn a
//! sequence (or a REF->ALT edit) into a dense k-mer count vector.

use ndarray::Array1;

/// A k-mer feature vector: length 4^k, signed so that it can represent the
/// net difference between an ALT and a REF allele.
pub type KFeat = Array1<f64>;

/// Static ASCII -> 2-bit lookup table.
/// A=0, G=1, C=2, T=3; anything else (including lowercase n/N and other IUPAC
/// codes) collapses to A, per the fixed nucleotide code.
static LUT: [u8; 256] = {
    let mut t = [0u8; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'G' as usize] = 1;
    t[b'g' as usize] = 1;
    t[b'C' as usize] = 2;
    t[b'c' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t
};

/// Encode a single nucleotide into its 2-bit code (A=0, G=1, C=2, T=3).
/// Unknown bases collapse to A.
#[inline(always)]
pub fn encode_base(b: u8) -> u64 {
    LUT[b as usize] as u64
}

/// Largest k-mer size accepted on the CLI. The dense 4^k feature vector
/// already becomes impractical well before this; the spec's useful range is
/// `k in [2,8]` and warns at `k >= 8`.
pub const MAX_K: u8 = 16;

/// Count k-mers of `seq` (case-insensitive) into a dense length-4^k vector.
///
/// Returns the zero vector when `seq` is shorter than `k`.
pub fn seq_to_kmer(seq: &[u8], k: u8) -> KFeat {
    let dim = 4usize.pow(k as u32);
    let mut out = Array1::<f64>::zeros(dim);
    let k = k as usize;
    if seq.len() < k {
        return out;
    }

    let mask: u64 = (1u64 << (2 * (k - 1) as u32)) - 1;
    let mut code: u64 = 0;
    for &b in &seq[..k] {
        code = (code << 2) | encode_base(b);
    }
    out[code as usize] += 1.0;

    for &b in &seq[k..] {
        code = ((code & mask) << 2) | encode_base(b);
        out[code as usize] += 1.0;
    }

    out
}

/// Featurize a REF->ALT edit, trimming the shared leading VCF anchor base
/// from both alleles before counting k-mers.
///
/// Returns `(KFeat, size)` where `size = len(alt) - len(ref)` (computed on
/// the *untrimmed* alleles, matching VCF convention) and `KFeat` is
/// `seq_to_kmer(alt_trim) - seq_to_kmer(ref_trim)`.
pub fn variant_to_kfeat(refseq: &[u8], alt: &[u8], k: u8) -> (KFeat, i64) {
    let size = alt.len() as i64 - refseq.len() as i64;
    let ref_trim = trim_anchor(refseq);
    let alt_trim = trim_anchor(alt);
    let kfeat = seq_to_kmer(alt_trim, k) - seq_to_kmer(ref_trim, k);
    (kfeat, size)
}

/// Drop the first (anchor) base of a VCF allele, if present.
#[inline]
fn trim_anchor(seq: &[u8]) -> &[u8] {
    if seq.is_empty() {
        seq
    } else {
        &seq[1..]
    }
}
