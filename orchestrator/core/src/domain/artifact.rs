// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Fix Artifacts
//!
//! A fix artifact is the remediation output handed back to the caller. The
//! mutable, not-yet-trusted form is [`ArtifactBody`]; once a body has passed
//! validation it is wrapped into a [`FixArtifact`] tagged with where it came
//! from and how much we trust it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixType {
    /// HTML/JS/CSS snippet for direct insertion
    Code,
    /// Legal or policy text
    Text,
    /// Embeddable widget markup
    Widget,
    /// Step-by-step how-to guide
    Guide,
}

impl FixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixType::Code => "code",
            FixType::Text => "text",
            FixType::Widget => "widget",
            FixType::Guide => "guide",
        }
    }

    /// Code and widget artifacts carry markup that must be well-formed.
    pub fn is_markup(&self) -> bool {
        matches!(self, FixType::Code | FixType::Widget)
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal document kinds served by the authoritative provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    PrivacyPolicy,
    Imprint,
    Terms,
    CookiePolicy,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::PrivacyPolicy => "privacy_policy",
            DocumentType::Imprint => "imprint",
            DocumentType::Terms => "terms",
            DocumentType::CookiePolicy => "cookie_policy",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a returned artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixSource {
    /// Canonical legal-text provider (system of record, never cached)
    Authoritative,
    CacheExact,
    CacheFuzzy,
    Template,
    Generated,
}

impl FixSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixSource::Authoritative => "authoritative",
            FixSource::CacheExact => "cache-exact",
            FixSource::CacheFuzzy => "cache-fuzzy",
            FixSource::Template => "template",
            FixSource::Generated => "generated",
        }
    }
}

impl fmt::Display for FixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact payload before (or after) validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBody {
    pub content: String,
    #[serde(default)]
    pub integration_instructions: String,
}

impl ArtifactBody {
    pub fn new(content: impl Into<String>, integration_instructions: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            integration_instructions: integration_instructions.into(),
        }
    }
}

/// A validated remediation artifact returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixArtifact {
    #[serde(rename = "type")]
    pub fix_type: FixType,
    pub content: String,
    pub integration_instructions: String,
    pub source: FixSource,
    /// Trust in the artifact, 0.0 - 1.0
    pub confidence: f64,
    pub fingerprint: Fingerprint,
    /// Model that produced the artifact, when one did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl FixArtifact {
    pub fn from_body(
        body: ArtifactBody,
        fix_type: FixType,
        source: FixSource,
        confidence: f64,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            fix_type,
            content: body.content,
            integration_instructions: body.integration_instructions,
            source,
            confidence: confidence.clamp(0.0, 1.0),
            fingerprint,
            model_used: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = Some(model.into());
        self
    }

    pub fn body(&self) -> ArtifactBody {
        ArtifactBody::new(self.content.clone(), self.integration_instructions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&FixSource::CacheExact).unwrap(), "\"cache-exact\"");
        assert_eq!(serde_json::to_string(&FixSource::CacheFuzzy).unwrap(), "\"cache-fuzzy\"");
        assert_eq!(FixSource::Generated.as_str(), "generated");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let artifact = FixArtifact::from_body(
            ArtifactBody::new("<div></div>", "paste"),
            FixType::Widget,
            FixSource::Template,
            1.7,
            Fingerprint::from_stored("abc"),
        );
        assert_eq!(artifact.confidence, 1.0);
    }

    #[test]
    fn test_artifact_type_field_name() {
        let artifact = FixArtifact::from_body(
            ArtifactBody::new("text", ""),
            FixType::Text,
            FixSource::Generated,
            0.8,
            Fingerprint::from_stored("abc"),
        );
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["source"], "generated");
        assert!(json.get("model_used").is_none());
    }
}
