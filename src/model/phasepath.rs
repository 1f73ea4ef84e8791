//! `PhasePath`: the scored result of matching one DAG path against a target
//! haplotype, plus the total order used to pick the "best" of a batch.

use crate::dag::builder::NodeId;

/// A candidate path through the DAG, scored against one target haplotype.
#[derive(Debug, Clone, Default)]
pub struct PhasePath {
    pub sizesim: f64,
    pub cossim: f64,
    pub path: Vec<NodeId>,
}

impl PhasePath {
    pub fn new(sizesim: f64, cossim: f64, path: Vec<NodeId>) -> Self {
        PhasePath {
            sizesim,
            cossim,
            path,
        }
    }

    /// Rounded to 4 decimal places, per the spec's determinism requirement
    /// for the ordering used to pick a "best" path.
    fn rounded(&self) -> (i64, i64) {
        (round4(self.sizesim), round4(self.cossim))
    }
}

fn round4(x: f64) -> i64 {
    (x * 10_000.0).round() as i64
}

impl PartialEq for PhasePath {
    fn eq(&self, other: &Self) -> bool {
        self.rounded() == other.rounded()
    }
}
impl Eq for PhasePath {}

impl PartialOrd for PhasePath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhasePath {
    /// Primary key sizesim ascending, ties on cossim ascending (both rounded
    /// to 4 decimals first). "Best" is the maximum under this order.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rounded().cmp(&other.rounded())
    }
}
