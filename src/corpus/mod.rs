//! Corpus store: tabular report loading and derived columns.

pub mod loader;

pub use loader::Corpus;
