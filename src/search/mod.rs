// Seed-and-extend search over the sequence tree: match records and the
// reducer, the extension walks, the per-bucket verifier, the output
// aligner, and the chunked-parallel driver.

pub mod align;
pub mod driver;
pub mod extender;
pub mod matches;
pub mod verifier;

pub use align::{align_match, MatchAlignment};
pub use driver::{
    run_search, CancelToken, ChunkFailure, PassThroughFilter, QueryFilter, SearchConfig,
    SearchOutcome,
};
pub use matches::{linear_position, MatchAccumulator, MatchPosition, SearchMatch};
pub use verifier::{pigeonhole_fragments, search_bucket, Bucket};
