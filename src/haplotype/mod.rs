pub mod bam_builder;
pub mod kmeans;
pub mod vcf_builder;
