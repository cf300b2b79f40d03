pub mod aggregate;
pub mod engine;
pub mod explain;
pub mod fallback;
pub mod index;
pub mod local;
pub mod providers;

pub use engine::RecommendationEngine;
