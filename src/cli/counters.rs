#[derive(Debug, Default)]
pub struct PhaseCounters {
    pub chunks_total: u64,
    pub chunks_written: u64,
    pub chunks_ref_only: u64,
    pub chunks_enumeration_exhausted: u64,
    pub chunks_bam_retried: u64,
    pub records_skipped_malformed: u64,
    pub candidates_total: u64,
    pub candidates_unphased: u64,
}

impl std::ops::AddAssign for PhaseCounters {
    fn add_assign(&mut self, other: Self) {
        self.chunks_total += other.chunks_total;
        self.chunks_written += other.chunks_written;
        self.chunks_ref_only += other.chunks_ref_only;
        self.chunks_enumeration_exhausted += other.chunks_enumeration_exhausted;
        self.chunks_bam_retried += other.chunks_bam_retried;
        self.records_skipped_malformed += other.records_skipped_malformed;
        self.candidates_total += other.candidates_total;
        self.candidates_unphased += other.candidates_unphased;
    }
}
