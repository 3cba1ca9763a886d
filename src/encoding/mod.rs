//! Feature encoding: learned term-weighting vector space.

pub mod vectorizer;

pub use vectorizer::{TfidfVector, TfidfVectorizer};
