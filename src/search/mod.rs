// Search - fuzzy re-ranking over store-relevance-ordered candidates

pub mod fuzzy;
pub mod normalize;
pub mod ranking;

pub use fuzzy::{match_candidates, FuzzyOutcome};
pub use normalize::{loosely_equal, names_loosely_equal, normalize, tokenize};
pub use ranking::{dedup_loose, rank_by_quality, Rankable};
