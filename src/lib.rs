//! Report-recommendation engine for a field-maintenance task backend.
//!
//! Given a new task's object type, free-text description, and breakage
//! type, the engine retrieves the most similar historical reports ranked
//! by a blended textual-similarity and quality score.

// Interdiction stricte de pratiques dangereuses ou non idiomatiques
#![deny(warnings)] // Tous les warnings sont traités comme des erreurs
#![deny(unsafe_code)] // Le code unsafe est interdit
#![deny(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(dead_code)] // Le code inutilisé est interdit
#![deny(non_camel_case_types)]
// Les types doivent suivre la convention CamelCase (exception explicite possible au besoin)

// Options supplémentaires pour ne rien laisser passer
#![deny(unused_imports)] // Les imports inutilisés sont interdits
#![deny(unused_variables)] // Les variables inutilisés sont interdits
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(non_snake_case)] // Les noms de variables et fonctions doivent être en snake_case
#![deny(non_upper_case_globals)] // Les constantes et globals doivent être en MAJUSCULE
#![deny(nonstandard_style)] // Empêche tout style de code non standard
#![forbid(unsafe_op_in_unsafe_fn)]
// Interdit l'utilisation d'unsafe même dans une fonction unsafe

// Clippy pour stricte discipline
#![deny(clippy::all)] // Active toutes les lints Clippy standard
#![deny(clippy::pedantic)] // Active les lints très strictes de Clippy
#![deny(clippy::nursery)] // Active les lints expérimentales
#![deny(clippy::unwrap_used)] // Interdit unwrap()
#![deny(clippy::expect_used)] // Interdit expect()
#![deny(clippy::panic)] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::todo)] // Interdit les TODO dans le code
#![deny(clippy::unimplemented)] // Interdit les fonctions non implémentées
#![deny(clippy::missing_const_for_fn)] // Force const lorsque possible
#![deny(clippy::unwrap_in_result)] // Interdit unwrap() sur Result
#![deny(clippy::module_inception)] // Interdit un module ayant le même nom que le crate
#![deny(clippy::redundant_clone)] // Interdit les clones inutiles
#![deny(clippy::shadow_unrelated)] // Interdit le shadowing de variables non liées
#![deny(clippy::too_many_arguments)] // Limite le nombre d’arguments des fonctions
#![deny(clippy::cognitive_complexity)] // Limite la complexité cognitive des fonctions

// Lints pour sécurité et robustesse
#![deny(overflowing_literals)] // Interdit les littéraux qui débordent

/// Fitted bundle and model persistence.
pub mod bundle;
/// Core types: configuration, errors, and the report data model.
pub mod core;
/// Corpus store: tabular report loading.
pub mod corpus;
/// Feature encoding: learned term-weighting vector space.
pub mod encoding;
/// Engine orchestration and the public recommendation entry point.
pub mod engine;
/// Quality scoring: indicator standardization.
pub mod quality;
/// Ranking: blended similarity and quality scoring.
pub mod ranking;

// Re-export commonly used types for convenience
pub use bundle::{ARTIFACT_VERSION, FittedBundle, LoadedArtifact, load_bundle, save_bundle};
pub use core::{
    ArtifactConfig, CorpusConfig, INDICATOR_COUNT, QualityIndicators, RecommendError,
    RecommendResult, Recommendation, RecommenderConfig, ReportQuery, ReportRow, ScoringConfig,
};
pub use corpus::Corpus;
pub use encoding::{TfidfVector, TfidfVectorizer};
pub use engine::RecommendationEngine;
pub use quality::StandardScaler;
pub use ranking::rank_reports;
