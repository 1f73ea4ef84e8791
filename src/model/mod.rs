pub mod haplotype;
pub mod phasepath;
pub mod variant;
