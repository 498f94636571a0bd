// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Authoritative Legal-Text Provider Interface
//
// Some categories (privacy policy, imprint, terms) are backed by a canonical
// legal-text provider. Its output is the system of record and bypasses the
// solution cache entirely.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::artifact::DocumentType;

#[async_trait]
pub trait LegalTextProvider: Send + Sync {
    /// Request a rendered legal document for the given company data.
    async fn request(
        &self,
        document_type: DocumentType,
        company_data: &Map<String, Value>,
    ) -> Result<String, LegalTextError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LegalTextError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Document type not supported: {0}")]
    Unsupported(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl LegalTextError {
    pub fn is_transient(&self) -> bool {
        match self {
            LegalTextError::Network(_) | LegalTextError::Timeout(_) => true,
            LegalTextError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LegalTextError::Timeout(30_000).is_transient());
        assert!(LegalTextError::Http { status: 503, message: String::new() }.is_transient());
        assert!(LegalTextError::Http { status: 429, message: String::new() }.is_transient());
        assert!(!LegalTextError::Http { status: 400, message: String::new() }.is_transient());
        assert!(!LegalTextError::Authentication("expired".into()).is_transient());
    }
}
