//! Collective directory
//!
//! Resolves agent identifiers against the configured collective roster.
//!
//! # Canonical names
//!
//! Members may be addressed by bare short name (`edgar-dev`) or by a
//! host-style identifier (`edgar-dev.justsparx.local`). Canonicalization
//! strips everything after the first `.`, so both forms resolve to the same
//! member. All storage and comparison happens on canonical names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("cannot determine local hostname: {0}")]
    Hostname(String),
}

/// The collective roster and local identity
///
/// Built from configuration rather than a hard-coded member list, so tests
/// and deployments can substitute arbitrary collectives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directory {
    members: Vec<String>,
    identity: String,
}

impl Directory {
    /// Build a directory from a roster and an explicit local identity
    ///
    /// Roster entries and the identity are canonicalized; duplicate roster
    /// entries (e.g. a short name plus its host-qualified form) collapse.
    pub fn new(roster: impl IntoIterator<Item = impl Into<String>>, identity: &str) -> Self {
        let mut members: Vec<String> = roster
            .into_iter()
            .map(|m| canonicalize(&m.into()))
            .collect();
        members.sort();
        members.dedup();

        Self {
            members,
            identity: canonicalize(identity),
        }
    }

    /// Build a directory using the machine hostname as the local identity
    pub fn from_hostname(
        roster: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, DirectoryError> {
        let host = hostname::get()
            .map_err(|e| DirectoryError::Hostname(e.to_string()))?
            .to_string_lossy()
            .into_owned();
        Ok(Self::new(roster, &host))
    }

    /// Check whether a canonical name belongs to the collective
    pub fn is_known(&self, short_name: &str) -> bool {
        self.members.iter().any(|m| m == short_name)
    }

    /// The local agent's canonical short name
    pub fn self_identity(&self) -> &str {
        &self.identity
    }

    /// Sorted, deduplicated roster of canonical member names
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// Strip any domain-style suffix: everything after the first `.`
pub fn canonicalize(name: &str) -> String {
    name.split('.').next().unwrap_or(name).to_string()
}
