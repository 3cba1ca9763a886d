//! Versioned on-disk persistence for the fitted bundle.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bundle::fitted::FittedBundle;
use crate::core::errors::{RecommendError, RecommendResult};

/// On-disk format version; bump on incompatible layout changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// Envelope wrapping the serialized bundle with provenance metadata.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    version: u32,
    saved_at: DateTime<Utc>,
    source_modified: Option<DateTime<Utc>>,
    row_count: usize,
    bundle: FittedBundle,
}

/// A bundle restored from disk, with its recorded provenance.
#[derive(Debug)]
pub struct LoadedArtifact {
    /// The restored fitted bundle.
    pub bundle: FittedBundle,
    /// When the artifact was written.
    pub saved_at: DateTime<Utc>,
    /// Modification time of the corpus source at fit time, if known.
    pub source_modified: Option<DateTime<Utc>>,
}

/// Serialize the bundle to `path` with an atomic replace.
///
/// The envelope is written to a temporary sibling file and renamed into
/// place, so a crash mid-write never leaves a partially readable artifact.
///
/// # Errors
/// Returns an error if encoding or any filesystem step fails.
pub fn save_bundle(
    bundle: &FittedBundle,
    source_modified: Option<DateTime<Utc>>,
    path: &Path,
) -> RecommendResult<()> {
    let envelope = ArtifactEnvelope {
        version: ARTIFACT_VERSION,
        saved_at: Utc::now(),
        source_modified,
        row_count: bundle.corpus().len(),
        bundle: bundle.clone(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = staging_path(path);
    let file = File::create(&staging)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, &envelope)
        .map_err(|err| RecommendError::ArtifactEncode(err.to_string()))?;
    let file = writer
        .into_inner()
        .map_err(|err| RecommendError::ArtifactEncode(err.to_string()))?;
    file.sync_all()?;
    fs::rename(&staging, path)?;

    info!(path = %path.display(), rows = envelope.row_count, "model artifact saved");
    Ok(())
}

/// Restore a bundle from `path`.
///
/// # Errors
/// Returns `ArtifactNotFound` when the path does not exist and
/// `ArtifactCorrupt` when the bytes cannot be decoded, the format version
/// is unsupported, or the restored arrays are inconsistent.
pub fn load_bundle(path: &Path) -> RecommendResult<LoadedArtifact> {
    let file = File::open(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            RecommendError::ArtifactNotFound(path.to_path_buf())
        } else {
            RecommendError::Io(err)
        }
    })?;

    let envelope: ArtifactEnvelope = bincode::deserialize_from(BufReader::new(file))
        .map_err(|err| RecommendError::ArtifactCorrupt(err.to_string()))?;

    if envelope.version != ARTIFACT_VERSION {
        return Err(RecommendError::ArtifactCorrupt(format!(
            "unsupported artifact version {}",
            envelope.version
        )));
    }

    if envelope.row_count != envelope.bundle.corpus().len() || !envelope.bundle.is_consistent() {
        return Err(RecommendError::ArtifactCorrupt(
            "artifact arrays are inconsistent".to_string(),
        ));
    }

    info!(path = %path.display(), rows = envelope.row_count, "model artifact loaded");
    Ok(LoadedArtifact {
        bundle: envelope.bundle,
        saved_at: envelope.saved_at,
        source_modified: envelope.source_modified,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("artifact"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
