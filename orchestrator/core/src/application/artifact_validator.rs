// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Artifact Validator
//
// Judges whether an artifact can be trusted before it is returned or cached.
// Every source (authoritative, template, generated) goes through the same
// checks; only cache hits skip it, because they were validated on the way in.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::domain::artifact::{ArtifactBody, DocumentType, FixType};
use crate::domain::validation::{ValidationCheck, ValidationReport};

/// Text artifacts shorter than this get a length warning.
pub const MIN_TEXT_LENGTH: usize = 200;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

static COMMENT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").ok());

static RAW_TEXT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").ok()
});

static TAG_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)\b([^<>]*?)(/?)>").ok());

/// All-caps tokens such as `[COMPANY NAME]` or `[FIRMA]`.
static CAPS_PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[[A-ZÄÖÜ][A-ZÄÖÜ0-9 _./-]{2,}\]").ok());

/// Fill-in instructions such as `[Ihre Adresse]`, `[Your email]`, `[TODO: ...]`.
static PROMPT_PLACEHOLDER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[\s*(?:todo|tbd|fixme|placeholder|insert|einfügen|ihre?|ihren|your|dein|deine)\b[^\]\n]{0,80}\]",
    )
    .ok()
});

static GUIDE_STEP_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:\d+[.)]|[-*•])\s+\S").ok());

/// A topic and the German and English keywords that satisfy it.
type TopicGroup = (&'static str, &'static [&'static str]);

const PRIVACY_POLICY_TOPICS: &[TopicGroup] = &[
    ("controller", &["verantwortlich", "controller"]),
    ("legal basis", &["rechtsgrundlage", "art. 6", "legal basis"]),
    (
        "retention period",
        &["speicherdauer", "aufbewahr", "gelöscht", "retention", "stored for", "deleted"],
    ),
    (
        "data subject rights",
        &["betroffenenrechte", "auskunft", "widerspruch", "ihre rechte", "your rights", "right to access"],
    ),
];

const IMPRINT_TOPICS: &[TopicGroup] = &[
    ("postal address", &["anschrift", "straße", "strasse", "address"]),
    ("contact", &["e-mail", "email", "telefon", "phone"]),
    (
        "representative",
        &["vertreten durch", "geschäftsführer", "represented by", "managing director"],
    ),
    ("register entry", &["handelsregister", "registergericht", "ust-id", "commercial register", "vat"]),
];

const TERMS_TOPICS: &[TopicGroup] = &[
    ("scope", &["geltungsbereich", "scope"]),
    ("contract formation", &["vertragsschluss", "vertrag", "contract"]),
    ("liability", &["haftung", "liability"]),
    ("governing law", &["gerichtsstand", "anwendbares recht", "governing law", "jurisdiction"]),
];

const COOKIE_POLICY_TOPICS: &[TopicGroup] = &[
    ("consent", &["einwilligung", "consent"]),
    ("cookie categories", &["notwendig", "necessary", "essential", "statistik", "analytics"]),
    ("withdrawal", &["widerruf", "withdraw", "revoke"]),
];

fn topic_groups(document_type: DocumentType) -> &'static [TopicGroup] {
    match document_type {
        DocumentType::PrivacyPolicy => PRIVACY_POLICY_TOPICS,
        DocumentType::Imprint => IMPRINT_TOPICS,
        DocumentType::Terms => TERMS_TOPICS,
        DocumentType::CookiePolicy => COOKIE_POLICY_TOPICS,
    }
}

/// Stateless validator; cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct ArtifactValidator;

impl ArtifactValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate an artifact body for the given fix type. `document_type` enables
    /// the topic-coverage check for legal texts.
    pub fn validate(
        &self,
        artifact: &ArtifactBody,
        fix_type: FixType,
        document_type: Option<DocumentType>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::check_structure(artifact, fix_type, &mut report);
        if fix_type.is_markup() {
            Self::check_markup(&artifact.content, &mut report);
        }
        Self::check_placeholders(&artifact.content, &mut report);

        match fix_type {
            FixType::Text => {
                if let Some(document_type) = document_type {
                    Self::check_topics(&artifact.content, document_type, &mut report);
                }
                let length = artifact.content.trim().chars().count();
                if length < MIN_TEXT_LENGTH {
                    report.warning(
                        ValidationCheck::Length,
                        format!("text is only {} characters long", length),
                    );
                }
            }
            FixType::Guide => {
                let has_steps = GUIDE_STEP_RE
                    .as_ref()
                    .is_some_and(|re| re.is_match(&artifact.content));
                if !has_steps {
                    report.warning(ValidationCheck::GuideSteps, "guide has no numbered or bulleted steps");
                }
            }
            FixType::Code | FixType::Widget => {}
        }

        report
    }

    /// Parse raw model output into an artifact body.
    ///
    /// Accepts a JSON object `{content, integration_instructions}`, bare or in a
    /// fenced code block. Text artifacts may also come back as plain prose.
    /// Failures are reported as structural validation errors.
    pub fn parse_generated(&self, raw: &str, fix_type: FixType) -> Result<ArtifactBody, ValidationReport> {
        let mut report = ValidationReport::new();

        let parsed = Self::json_candidate(raw).and_then(|json| serde_json::from_str::<Value>(&json).ok());

        match parsed {
            Some(Value::Object(map)) => {
                let content = match map.get("content") {
                    Some(Value::String(s)) => s.clone(),
                    Some(_) => {
                        report.error(ValidationCheck::Structure, "field 'content' must be a string");
                        String::new()
                    }
                    None => {
                        report.error(ValidationCheck::Structure, "missing field 'content'");
                        String::new()
                    }
                };
                let instructions = match map.get("integration_instructions") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(_) => {
                        report.error(
                            ValidationCheck::Structure,
                            "field 'integration_instructions' must be a string",
                        );
                        String::new()
                    }
                };
                if report.is_valid() {
                    Ok(ArtifactBody::new(content, instructions))
                } else {
                    Err(report)
                }
            }
            _ if fix_type == FixType::Text && !raw.trim().is_empty() => {
                Ok(ArtifactBody::new(raw.trim(), ""))
            }
            _ => {
                report.error(
                    ValidationCheck::Structure,
                    "response is not a JSON object with 'content' and 'integration_instructions'",
                );
                Err(report)
            }
        }
    }

    fn json_candidate(text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.starts_with('{') {
            return Some(trimmed.to_string());
        }

        let start_marker = "```json";
        if let Some(start) = text.find(start_marker) {
            let content_start = start + start_marker.len();
            if let Some(end_offset) = text[content_start..].find("```") {
                return Some(text[content_start..content_start + end_offset].trim().to_string());
            }
        }

        // Untagged fence holding an object
        let generic_marker = "```";
        if let Some(start) = text.find(generic_marker) {
            let content_start = start + generic_marker.len();
            if let Some(end_offset) = text[content_start..].find("```") {
                let inner = text[content_start..content_start + end_offset].trim();
                if inner.starts_with('{') {
                    return Some(inner.to_string());
                }
            }
        }

        None
    }

    fn check_structure(artifact: &ArtifactBody, fix_type: FixType, report: &mut ValidationReport) {
        if artifact.content.trim().is_empty() {
            report.error(ValidationCheck::Structure, "content is empty");
        }
        if fix_type.is_markup() && artifact.integration_instructions.trim().is_empty() {
            report.error(
                ValidationCheck::Structure,
                format!("{} artifacts need integration instructions", fix_type),
            );
        }
    }

    fn check_markup(content: &str, report: &mut ValidationReport) {
        let (Some(comment_re), Some(raw_text_re), Some(tag_re)) =
            (COMMENT_RE.as_ref(), RAW_TEXT_RE.as_ref(), TAG_RE.as_ref())
        else {
            return;
        };

        let without_comments = comment_re.replace_all(content, "");
        let stripped = raw_text_re.replace_all(&without_comments, "");

        let mut open: Vec<String> = Vec::new();
        for caps in tag_re.captures_iter(&stripped) {
            let closing = !caps[1].is_empty();
            let name = caps[2].to_ascii_lowercase();
            let self_closing = !caps[4].is_empty();

            if VOID_ELEMENTS.contains(&name.as_str()) || self_closing {
                continue;
            }

            if !closing {
                open.push(name);
                continue;
            }

            match open.pop() {
                Some(expected) if expected == name => {}
                Some(expected) => {
                    report.error(
                        ValidationCheck::Markup,
                        format!("closing tag </{}> does not match open <{}>", name, expected),
                    );
                    return;
                }
                None => {
                    report.error(ValidationCheck::Markup, format!("closing tag </{}> has no opening tag", name));
                    return;
                }
            }
        }

        if !open.is_empty() {
            report.error(
                ValidationCheck::Markup,
                format!("unclosed tags: {}", open.iter().map(|t| format!("<{}>", t)).collect::<Vec<_>>().join(", ")),
            );
        }
    }

    fn check_placeholders(content: &str, report: &mut ValidationReport) {
        let mut found: Vec<&str> = Vec::new();
        for re in [CAPS_PLACEHOLDER_RE.as_ref(), PROMPT_PLACEHOLDER_RE.as_ref()].into_iter().flatten() {
            for m in re.find_iter(content) {
                // Markdown link text, not a placeholder
                if content[m.end()..].starts_with('(') {
                    continue;
                }
                if !found.contains(&m.as_str()) {
                    found.push(m.as_str());
                }
            }
        }

        if !found.is_empty() {
            report.error(
                ValidationCheck::Placeholder,
                format!("unresolved placeholders: {}", found.join(", ")),
            );
        }
    }

    fn check_topics(content: &str, document_type: DocumentType, report: &mut ValidationReport) {
        let lowered = content.to_lowercase();
        for (topic, keywords) in topic_groups(document_type) {
            if !keywords.iter().any(|k| lowered.contains(k)) {
                report.warning(
                    ValidationCheck::TopicCoverage,
                    format!("{} does not mention {}", document_type, topic),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ArtifactValidator {
        ArtifactValidator::new()
    }

    #[test]
    fn test_balanced_widget_is_valid() {
        let body = ArtifactBody::new(
            "<div class=\"cookie-banner\"><p>Wir nutzen Cookies.<br></p><img src=\"x.png\"/><!-- <span> --></div>",
            "Vor </body> einfügen.",
        );
        let report = validator().validate(&body, FixType::Widget, None);
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_script_body_is_skipped() {
        let body = ArtifactBody::new(
            "<script>if (a < b && c > d) { document.write('<div>'); }</script><div></div>",
            "Im <head> einfügen.",
        );
        assert!(validator().validate(&body, FixType::Code, None).is_valid());
    }

    #[test]
    fn test_unbalanced_markup_is_error() {
        let body = ArtifactBody::new("<div><span>Hallo</div>", "paste");
        let report = validator().validate(&body, FixType::Code, None);
        assert!(report.has_error(ValidationCheck::Markup));

        let body = ArtifactBody::new("<section><p>offen</p>", "paste");
        let report = validator().validate(&body, FixType::Widget, None);
        assert!(report.has_error(ValidationCheck::Markup));
    }

    #[test]
    fn test_markup_needs_instructions() {
        let body = ArtifactBody::new("<div></div>", "  ");
        let report = validator().validate(&body, FixType::Widget, None);
        assert!(report.has_error(ValidationCheck::Structure));
    }

    #[test]
    fn test_placeholders_are_errors() {
        for content in [
            "Verantwortlich ist [COMPANY NAME].",
            "Anschrift: [Ihre Adresse]",
            "Contact us at [Your email].",
            "[TODO: add retention period]",
        ] {
            let report = validator().validate(&ArtifactBody::new(content, ""), FixType::Text, None);
            assert!(report.has_error(ValidationCheck::Placeholder), "not flagged: {}", content);
        }
    }

    #[test]
    fn test_brackets_that_are_not_placeholders() {
        let body = ArtifactBody::new(
            "<script>var a = items[0]; var b = [];</script><input type=\"checkbox\"><a href=\"#\">[1]</a>",
            "Siehe [DSGVO](https://dsgvo-gesetz.de).",
        );
        let report = validator().validate(&body, FixType::Code, None);
        assert!(!report.has_error(ValidationCheck::Placeholder), "{:?}", report.errors);

        let body = ArtifactBody::new("Mehr in der [DSGVO](https://dsgvo-gesetz.de).", "");
        let report = validator().validate(&body, FixType::Text, None);
        assert!(!report.has_error(ValidationCheck::Placeholder));
    }

    #[test]
    fn test_topic_coverage_only_warns() {
        let body = ArtifactBody::new("Datenschutzerklärung. Verantwortlich ist die Muster GmbH.", "");
        let report = validator().validate(&body, FixType::Text, Some(DocumentType::PrivacyPolicy));
        assert!(report.is_valid());
        assert_eq!(
            report.warnings.iter().filter(|w| w.check == ValidationCheck::TopicCoverage).count(),
            3
        );
        assert!(report.warnings.iter().any(|w| w.check == ValidationCheck::Length));
    }

    #[test]
    fn test_guide_without_steps_warns() {
        let body = ArtifactBody::new("Aktivieren Sie HTTPS beim Hoster.", "");
        let report = validator().validate(&body, FixType::Guide, None);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.check == ValidationCheck::GuideSteps));

        let body = ArtifactBody::new("1. Zertifikat beantragen\n2. Weiterleitung aktivieren", "");
        assert!(validator().validate(&body, FixType::Guide, None).warnings.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Hier ist der Fix:\n```json\n{\"content\": \"<div></div>\", \"integration_instructions\": \"paste\"}\n```";
        let body = validator().parse_generated(raw, FixType::Widget).unwrap();
        assert_eq!(body.content, "<div></div>");
        assert_eq!(body.integration_instructions, "paste");
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let report = validator()
            .parse_generated(r#"{"content": 42, "integration_instructions": "x"}"#, FixType::Code)
            .unwrap_err();
        assert!(report.has_error(ValidationCheck::Structure));
    }

    #[test]
    fn test_parse_plain_text_only_for_text() {
        let body = validator().parse_generated("Impressum\nMuster GmbH", FixType::Text).unwrap();
        assert_eq!(body.content, "Impressum\nMuster GmbH");
        assert!(validator().parse_generated("<div></div>", FixType::Widget).is_err());
    }
}
