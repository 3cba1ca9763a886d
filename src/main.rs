//! Operational CLI for the report-recommendation engine.
//!
//! Usage:
//! - `report-recommender fit` — load the corpus, fit the model, and write
//!   the artifact if one is configured.
//! - `report-recommender recommend <object_type> <description> <breakage_type> [top_n]`
//!   — print the top recommendations as JSON on stdout.
//!
//! Configuration comes from `RECOMMENDER_CONFIG` (path to a JSON config
//! file) or, without it, from `RECOMMENDER_CORPUS` / `RECOMMENDER_ARTIFACT`
//! applied over the defaults.

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use report_recommender::{RecommendationEngine, RecommenderConfig, ReportQuery};

const USAGE: &str = "usage: report-recommender <fit | recommend <object_type> <description> <breakage_type> [top_n]>";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = load_config()?;
    let engine = RecommendationEngine::new(config)?;

    match args.first().map(String::as_str) {
        Some("fit") => fit(&engine),
        Some("recommend") => recommend(&engine, &args[1..]),
        _ => bail!(USAGE),
    }
}

fn fit(engine: &RecommendationEngine) -> Result<()> {
    let bundle = engine.refit().context("fitting model from corpus")?;
    tracing::info!(
        rows = bundle.corpus().len(),
        vocabulary = bundle.vectorizer().vocabulary_len(),
        "model fitted"
    );

    if engine.config().artifact.path.is_some() {
        engine.save_artifact().context("writing model artifact")?;
    } else {
        tracing::warn!("no artifact path configured; fitted model not persisted");
    }
    Ok(())
}

fn recommend(engine: &RecommendationEngine, args: &[String]) -> Result<()> {
    let [object_type, description, breakage_type, rest @ ..] = args else {
        bail!(USAGE);
    };

    let query = ReportQuery::new(
        object_type.as_str(),
        description.as_str(),
        breakage_type.as_str(),
    );
    let recommendations = match rest {
        [] => engine.recommend(&query)?,
        [top_n] => {
            let top_n: usize = top_n
                .parse()
                .with_context(|| format!("invalid top_n {top_n:?}"))?;
            engine.recommend_top(&query, top_n)?
        }
        _ => bail!(USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}

fn load_config() -> Result<RecommenderConfig> {
    if let Ok(path) = env::var("RECOMMENDER_CONFIG") {
        return RecommenderConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"));
    }

    let mut config = RecommenderConfig::default();
    if let Ok(path) = env::var("RECOMMENDER_CORPUS") {
        config.corpus.path = path.into();
    }
    if let Ok(path) = env::var("RECOMMENDER_ARTIFACT") {
        config.artifact.path = Some(path.into());
    }
    Ok(config)
}
