// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Issue fingerprinting
//!
//! The one and only place cache identity is derived. Callers hand over the
//! `(category, title, description)` triple and get back a SHA-256 hex digest of
//! the normalized fields joined by [`FIELD_DELIMITER`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::issue::{IssueIdentity, StructuredIssue};

/// Separator between normalized fields. Not expected to appear in scanner output.
pub const FIELD_DELIMITER: &str = "\u{1f}|";

/// Hex-encoded SHA-256 of a normalized issue identity (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a digest read back from storage.
    pub fn from_stored(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct IssueFingerprinter;

impl IssueFingerprinter {
    pub fn fingerprint(category: &str, title: &str, description: &str) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(normalize(category).as_bytes());
        hasher.update(FIELD_DELIMITER.as_bytes());
        hasher.update(normalize(title).as_bytes());
        hasher.update(FIELD_DELIMITER.as_bytes());
        hasher.update(normalize(description).as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn for_issue(issue: &StructuredIssue) -> Fingerprint {
        Self::fingerprint(issue.category.as_str(), &issue.title, &issue.description)
    }

    pub fn for_identity(identity: &IssueIdentity) -> Fingerprint {
        Self::fingerprint(&identity.category, &identity.title, &identity.description)
    }
}

fn normalize(field: &str) -> String {
    field.trim().to_lowercase()
}
