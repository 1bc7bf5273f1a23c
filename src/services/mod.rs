pub mod candidates;
pub mod collaborative;
pub mod content;
pub mod fallback;
pub mod hybrid;
pub mod ranking;
pub mod recommendations;

pub use hybrid::{BlendWeights, CombinedScore, HybridCombiner};
pub use ranking::Page;
pub use recommendations::RecommendationEngine;
