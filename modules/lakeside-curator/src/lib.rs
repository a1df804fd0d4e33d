pub mod apply;
pub mod dedup;
pub mod infra;
pub mod manual;
pub mod osm;
pub mod promotion;
pub mod review_queue;
pub mod sanitize;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use promotion::{
    candidate_queue, promote_candidates, CandidateError, PromotionOptions, PromotionReport,
    QueuedCandidate, DEFAULT_BATCH_LIMIT,
};
pub use traits::{CandidateVerifier, Verification};
