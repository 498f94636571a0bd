// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Template Engine
//!
//! Handlebars rendering for generation prompts and fix templates.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a structured issue into model prompts and template artifacts
//! - **Integration:** GenerationOrchestrator → LLM input, TemplateCatalog → artifact body
//!
//! # Supported Placeholders
//!
//! - `{{category}}` - Normalized issue category
//! - `{{title}}` - Issue title as reported by the scanner
//! - `{{description}}` - Issue description
//! - `{{fix_type}}` - Requested artifact type (code, text, widget, guide)
//! - `{{document_type}}` - Legal document type for text artifacts
//! - `{{company_data}}` - Issue context rendered as JSON
//! - `{{company.<key>}}` - Single values from the issue context
//! - `{{previous_errors}}` - Validator findings from a rejected attempt
//!
//! Two renderers are kept: prompts and text/guide templates are rendered
//! verbatim, markup templates HTML-escape every substituted value.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::artifact::{DocumentType, FixType};
use crate::domain::issue::StructuredIssue;

// ============================================================================
// Template Context
// ============================================================================

/// Context data for prompt and fix-template rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    pub category: String,

    pub title: String,

    pub description: String,

    pub fix_type: FixType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    /// Issue context, addressable as `company.<key>`
    #[serde(default)]
    pub company: Map<String, Value>,

    /// Pretty-printed issue context, absent when the context is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_data: Option<String>,

    /// Output rules for the requested fix type
    #[serde(default)]
    pub instructions: String,

    /// Findings that rejected the previous attempt
    #[serde(default)]
    pub previous_errors: Vec<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

impl PromptContext {
    pub fn for_issue(issue: &StructuredIssue, fix_type: FixType, document_type: Option<DocumentType>) -> Self {
        let company_data = if issue.context.is_empty() {
            None
        } else {
            serde_json::to_string_pretty(&issue.context).ok()
        };

        Self {
            category: issue.category.to_string(),
            title: issue.title.clone(),
            description: issue.description.clone(),
            fix_type,
            document_type,
            company: issue.context.clone(),
            company_data,
            instructions: fix_type_instructions(fix_type).to_string(),
            previous_errors: Vec::new(),
            extras: HashMap::new(),
        }
    }

    /// Builder-style setter for the findings of a rejected attempt
    pub fn previous_errors(mut self, errors: Vec<String>) -> Self {
        self.previous_errors = errors;
        self
    }

    /// Add extra field
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

fn fix_type_instructions(fix_type: FixType) -> &'static str {
    match fix_type {
        FixType::Code => {
            "- content: a self-contained HTML/CSS/JavaScript snippet with balanced tags\n\
             - integration_instructions: where to paste the snippet and how to verify it"
        }
        FixType::Widget => {
            "- content: an embeddable HTML widget with balanced tags and inline script\n\
             - integration_instructions: where to embed the widget and which settings to adjust"
        }
        FixType::Text => {
            "- content: the complete legal text in German, ready to publish\n\
             - integration_instructions: where the text has to be linked on the website"
        }
        FixType::Guide => {
            "- content: a numbered step-by-step guide, one step per line\n\
             - integration_instructions: how to confirm the issue is resolved"
        }
    }
}

// ============================================================================
// Template Engine
// ============================================================================

pub const GENERATION_PROMPT: &str = r#"You are a compliance remediation assistant for websites operated in Germany.
Produce a {{fix_type}} fix for the issue below.

Category: {{category}}
Issue: {{title}}
{{#if description}}Details: {{description}}
{{/if}}{{#if document_type}}Document type: {{document_type}}
{{/if}}{{#if company_data}}
Company data (use these values verbatim):
{{company_data}}
{{/if}}{{#if previous_errors}}
Your previous answer was rejected for these reasons:
{{#each previous_errors}}- {{this}}
{{/each}}{{/if}}
Requirements:
{{instructions}}
- Never leave bracket placeholders such as [COMPANY NAME] or [Ihre Adresse]. Omit unknown details instead.

Respond with a single JSON object and nothing else:
{"content": "...", "integration_instructions": "..."}"#;

pub struct PromptTemplateEngine {
    verbatim: Handlebars<'static>,
    html: Handlebars<'static>,
}

impl PromptTemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut verbatim = Handlebars::new();
        verbatim.set_strict_mode(false); // Don't fail on missing variables
        verbatim.register_escape_fn(handlebars::no_escape);

        let mut html = Handlebars::new();
        html.set_strict_mode(false);

        Self { verbatim, html }
    }

    /// Render a template without escaping
    pub fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.verbatim
            .render_template(template, context)
            .context("Failed to render template")
    }

    /// Render a template, HTML-escaping substituted values
    pub fn render_html<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.html
            .render_template(template, context)
            .context("Failed to render markup template")
    }

    /// Render for an artifact of the given type
    pub fn render_for(&self, fix_type: FixType, template: &str, context: &PromptContext) -> Result<String> {
        if fix_type.is_markup() {
            self.render_html(template, context)
        } else {
            self.render(template, context)
        }
    }

    /// Build the model prompt for an issue
    pub fn generation_prompt(&self, context: &PromptContext) -> Result<String> {
        self.render(GENERATION_PROMPT, context)
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        handlebars::template::Template::compile(template)
            .map(|_| ())
            .context("Invalid Handlebars template syntax")
    }
}

impl Default for PromptTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
