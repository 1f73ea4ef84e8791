pub mod cli;
pub mod dag;
pub mod haplotype;
pub mod kmer;
pub mod model;
pub mod phaser;
pub mod scoring;
