//! Engine orchestration for the recommendation system.

pub mod core;

pub use core::RecommendationEngine;
