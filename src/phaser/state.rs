//! The per-region state machine (§4.8). Failure at any stage falls through
//! to `AllRef00`, which writes (0,0) for every candidate; no stage failure
//! aborts a chunk.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Init,
    HapsBuilt,
    DagBuilt,
    PathsScored,
    Picked,
    Written,
    AllRef00,
}
