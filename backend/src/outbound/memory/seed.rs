//! JSON seed documents for the in-memory store.

use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};
use serde::Deserialize;

use super::CandidateTally;
use crate::domain::{CandidateId, CodeId, VerifiedVoter, VotingCode};

/// Failure to read or parse a seed document.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A candidate and its starting counters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCandidate {
    pub code_id: CodeId,
    pub id: CandidateId,
    #[serde(flatten)]
    pub tally: CandidateTally,
}

/// Documents loaded into a fresh in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    #[serde(default)]
    pub voting_codes: Vec<VotingCode>,
    #[serde(default)]
    pub verified_voters: Vec<VerifiedVoter>,
    #[serde(default)]
    pub candidates: Vec<SeedCandidate>,
}

impl SeedDocument {
    /// Read and parse a seed document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] when the file cannot be read or is not a valid
    /// seed document.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let display = path.display().to_string();
        let contents = read_to_string(path).map_err(|source| SeedError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SeedError::Parse {
            path: display,
            source,
        })
    }
}

fn read_to_string(path: &Path) -> std::io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "seed path has no file name")
    })?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(file_name))
}
