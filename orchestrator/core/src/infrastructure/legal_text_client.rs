// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Legal-Text Provider HTTP Client
//
// Anti-Corruption Layer for the canonical legal-text service:
// POST {endpoint}/documents/{document_type} with the company data as JSON body,
// answered by { "content": "..." }.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::domain::artifact::DocumentType;
use crate::domain::legal_text::{LegalTextError, LegalTextProvider};
use crate::domain::pipeline_config::{resolve_secret, AuthoritativeConfig};

pub struct HttpLegalTextProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct DocumentResponse {
    content: Option<String>,
}

impl HttpLegalTextProvider {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
        }
    }

    pub fn from_config(config: &AuthoritativeConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.as_deref().map(resolve_secret).transpose()?;
        Ok(Self::new(config.endpoint.clone(), api_key, config.timeout))
    }
}

#[async_trait]
impl LegalTextProvider for HttpLegalTextProvider {
    async fn request(
        &self,
        document_type: DocumentType,
        company_data: &Map<String, Value>,
    ) -> Result<String, LegalTextError> {
        let url = format!(
            "{}/documents/{}",
            self.endpoint.trim_end_matches('/'),
            document_type.as_str()
        );
        debug!(%url, "Requesting authoritative document");

        let mut builder = self.client.post(&url).timeout(self.timeout).json(company_data);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LegalTextError::Timeout(self.timeout.as_millis() as u64)
            } else {
                LegalTextError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LegalTextError::Authentication(message),
                404 => LegalTextError::Unsupported(document_type.to_string()),
                code => LegalTextError::Http { status: code, message },
            });
        }

        let body: DocumentResponse = response
            .json()
            .await
            .map_err(|e| LegalTextError::MalformedResponse(e.to_string()))?;

        match body.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LegalTextError::MalformedResponse("response has no content".into())),
        }
    }
}
