//! Location resolution and competitive gap-analysis engine.
//!
//! Pure, synchronous computations over an in-memory [`Snapshot`] of the
//! location corpus: free-text resolution to a canonical record, radius
//! queries, batch duplicate detection, and tenant-category gap analysis.
//! Nothing in this crate performs I/O; the store is reached only through
//! the [`Repository`] trait.

pub mod dedup;
mod error;
pub mod gaps;
pub mod geo;
pub mod normalize;
pub mod proximity;
pub mod repository;
pub mod resolver;

pub use dedup::{
    CancelFlag, DedupeConfig, DuplicateCandidatePair, DuplicateScanner, MatchRule, ScanError,
    ScanReport,
};
pub use error::{EngineError, RepositoryError};
pub use gaps::{
    analyze_gaps, CategoryBucket, DetailLevel, GapConfig, GapRecommendation, GapReport,
};
pub use geo::{haversine_km, km_to_miles, miles_to_km, EARTH_RADIUS_KM};
pub use normalize::{normalize, similarity};
pub use proximity::{find_nearby, CompetitorCandidate, NearbyFilters, NearbyReport};
pub use repository::{Repository, Snapshot};
pub use resolver::{resolve, Resolution, ResolvedMatch, ResolverConfig, ScoredCandidate};
