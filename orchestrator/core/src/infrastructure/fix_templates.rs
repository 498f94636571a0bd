// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fix Template Catalog
//
// Deterministic, always-available artifacts: one built-in Handlebars template per
// fix type, document-specific legal texts, and per-category overrides from the
// configuration. Rendered output is validated by the caller like any other artifact.

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::domain::artifact::{ArtifactBody, DocumentType, FixType};
use crate::domain::issue::StructuredIssue;
use crate::domain::pipeline_config::{FixRoute, TemplateConfig, TemplateOverride};

use super::prompt_template_engine::{PromptContext, PromptTemplateEngine};

const OPERATOR: &str =
    "{{#if company.company_name}}{{company.company_name}}{{else}}der Betreiber dieser Website{{/if}}";

const CODE_TEMPLATE: &str = r##"<!-- Barrierefreiheit: {{title}} -->
<a class="skip-link" href="#main-content">Zum Inhalt springen</a>
<main id="main-content" tabindex="-1">
  <!-- Bestehenden Seiteninhalt hier einfügen -->
</main>
<style>
  .skip-link { position: absolute; left: -9999px; }
  .skip-link:focus { left: 1rem; top: 1rem; z-index: 1000; padding: 0.5rem 1rem; background: #fff; color: #000; }
  :focus-visible { outline: 3px solid #1a73e8; outline-offset: 2px; }
</style>"##;

const CODE_INSTRUCTIONS: &str = "Setzen Sie den Link direkt nach dem öffnenden <body>-Tag ein und umschließen Sie den \
Hauptinhalt mit dem <main>-Element. Prüfen Sie anschließend mit der Tab-Taste, ob der Link sichtbar wird.";

const WIDGET_TEMPLATE: &str = r#"<div id="cookie-consent" class="cookie-consent" role="dialog" aria-live="polite" aria-label="Cookie-Einwilligung" hidden>
  <p>Wir verwenden technisch notwendige Cookies. Statistik- und Marketing-Cookies setzen wir nur mit Ihrer Einwilligung, die Sie jederzeit mit Wirkung für die Zukunft widerrufen können.</p>
  <button type="button" data-consent="necessary">Nur notwendige</button>
  <button type="button" data-consent="all">Alle akzeptieren</button>
</div>
<script>
(function () {
  var key = "cookie-consent";
  var banner = document.getElementById(key);
  if (!banner || localStorage.getItem(key)) { return; }
  banner.hidden = false;
  banner.addEventListener("click", function (event) {
    var choice = event.target.getAttribute("data-consent");
    if (!choice) { return; }
    localStorage.setItem(key, choice);
    banner.hidden = true;
    document.dispatchEvent(new CustomEvent("cookie-consent", { detail: choice }));
  });
})();
</script>"#;

const WIDGET_INSTRUCTIONS: &str = "Binden Sie das Widget vor dem schließenden </body>-Tag ein. Laden Sie Statistik- \
und Marketing-Skripte erst nach dem Ereignis \"cookie-consent\" mit dem Wert \"all\".";

const GUIDE_TEMPLATE: &str = r#"Anleitung: {{title}}
{{#if description}}
Befund: {{description}}
{{/if}}
1. Öffnen Sie die betroffene Seite und reproduzieren Sie den Befund.
2. Ermitteln Sie, welche Komponente (Server, CMS, Theme oder Plugin) die Ursache ist.
3. Beheben Sie die Ursache in der Konfiguration dieser Komponente oder aktualisieren Sie sie auf die aktuelle Version.
4. Leeren Sie alle Caches (CDN, Server, Browser).
5. Führen Sie den Compliance-Scan erneut aus und prüfen Sie, ob der Befund verschwunden ist."#;

const GUIDE_INSTRUCTIONS: &str =
    "Arbeiten Sie die Schritte der Reihe nach ab. Bleibt der Befund bestehen, wenden Sie sich an Ihren Hosting-Anbieter.";

const TEXT_TEMPLATE: &str = r#"Hinweis zu: {{title}}
{{#if description}}
{{description}}
{{/if}}
Dieser Hinweis wird von {{operator}} bereitgestellt. Die beschriebenen Maßnahmen werden auf der Website umgesetzt, sobald der Befund geprüft wurde. Für Rückfragen steht {{operator}} über die im Impressum genannten Kontaktwege zur Verfügung."#;

const PRIVACY_POLICY_TEMPLATE: &str = r#"Datenschutzerklärung

1. Verantwortlicher
Verantwortlich für die Datenverarbeitung auf dieser Website ist {{operator}}.{{#if company.email}} Sie erreichen uns unter {{company.email}}.{{/if}}

2. Rechtsgrundlage
Wir verarbeiten personenbezogene Daten auf Grundlage von Art. 6 Abs. 1 DSGVO. Rechtsgrundlage ist je nach Zweck Ihre Einwilligung (lit. a), die Erfüllung eines Vertrags (lit. b) oder unser berechtigtes Interesse am sicheren Betrieb der Website (lit. f).

3. Server-Logfiles
Beim Aufruf der Website speichert der Server Datum, Uhrzeit, aufgerufene Seite, Browsertyp und anonymisierte IP-Adresse.

4. Speicherdauer
Personenbezogene Daten werden gelöscht, sobald der Zweck der Speicherung entfällt und keine gesetzlichen Aufbewahrungsfristen entgegenstehen. Server-Logfiles werden nach spätestens 14 Tagen gelöscht.

5. Ihre Rechte
Sie haben das Recht auf Auskunft, Berichtigung, Löschung und Einschränkung der Verarbeitung, auf Datenübertragbarkeit sowie das Recht auf Widerspruch. Zudem können Sie sich bei einer Datenschutz-Aufsichtsbehörde beschweren."#;

const IMPRINT_TEMPLATE: &str = r#"Impressum

Angaben gemäß § 5 DDG
{{operator}}
{{#if company.street}}{{company.street}}
{{/if}}{{#if company.city}}{{company.postal_code}} {{company.city}}
{{/if}}{{#if company.representative}}
Vertreten durch: {{company.representative}}
{{/if}}
Kontakt
{{#if company.phone}}Telefon: {{company.phone}}
{{/if}}{{#if company.email}}E-Mail: {{company.email}}
{{/if}}{{#if company.register_court}}
Registereintrag
Registergericht: {{company.register_court}}
{{#if company.register_number}}Registernummer: {{company.register_number}}
{{/if}}{{/if}}{{#if company.vat_id}}
Umsatzsteuer-ID gemäß § 27a UStG: {{company.vat_id}}
{{/if}}
Verbraucherstreitbeilegung
Wir sind nicht bereit oder verpflichtet, an Streitbeilegungsverfahren vor einer Verbraucherschlichtungsstelle teilzunehmen."#;

const TERMS_TEMPLATE: &str = r#"Allgemeine Geschäftsbedingungen

§ 1 Geltungsbereich
Diese Geschäftsbedingungen gelten für alle Verträge zwischen {{operator}} und den Kunden, die über diese Website geschlossen werden.

§ 2 Vertragsschluss
Die Darstellung der Angebote auf der Website ist kein bindendes Angebot. Der Vertrag kommt erst mit der Bestätigung der Bestellung zustande.

§ 3 Preise und Zahlung
Alle Preise verstehen sich inklusive der gesetzlichen Umsatzsteuer. Die verfügbaren Zahlungsarten werden im Bestellvorgang angezeigt.

§ 4 Haftung
Die Haftung für leicht fahrlässige Pflichtverletzungen ist auf den vertragstypischen, vorhersehbaren Schaden beschränkt. Die Haftung für Schäden aus der Verletzung des Lebens, des Körpers oder der Gesundheit bleibt unberührt.

§ 5 Anwendbares Recht und Gerichtsstand
Es gilt das Recht der Bundesrepublik Deutschland. Gerichtsstand für Kaufleute ist der Sitz des Anbieters."#;

const COOKIE_POLICY_TEMPLATE: &str = r#"Cookie-Richtlinie

Diese Website von {{operator}} verwendet Cookies. Technisch notwendige Cookies sind für den Betrieb der Website erforderlich und werden ohne Einwilligung gesetzt.

Statistik- und Marketing-Cookies setzen wir nur mit Ihrer Einwilligung nach § 25 Abs. 1 TDDDG und Art. 6 Abs. 1 lit. a DSGVO.

Sie können Ihre Einwilligung jederzeit mit Wirkung für die Zukunft widerrufen, indem Sie die Cookie-Einstellungen erneut öffnen oder die Cookies in Ihrem Browser löschen."#;

const TEXT_INSTRUCTIONS: &str =
    "Veröffentlichen Sie den Text auf einer eigenen Unterseite und verlinken Sie diese im Footer jeder Seite.";

/// The built-in template for an artifact type and optional legal document.
fn builtin(fix_type: FixType, document_type: Option<DocumentType>) -> (&'static str, &'static str) {
    match (fix_type, document_type) {
        (FixType::Code, _) => (CODE_TEMPLATE, CODE_INSTRUCTIONS),
        (FixType::Widget, _) => (WIDGET_TEMPLATE, WIDGET_INSTRUCTIONS),
        (FixType::Guide, _) => (GUIDE_TEMPLATE, GUIDE_INSTRUCTIONS),
        (FixType::Text, Some(DocumentType::PrivacyPolicy)) => (PRIVACY_POLICY_TEMPLATE, TEXT_INSTRUCTIONS),
        (FixType::Text, Some(DocumentType::Imprint)) => (IMPRINT_TEMPLATE, TEXT_INSTRUCTIONS),
        (FixType::Text, Some(DocumentType::Terms)) => (TERMS_TEMPLATE, TEXT_INSTRUCTIONS),
        (FixType::Text, Some(DocumentType::CookiePolicy)) => (COOKIE_POLICY_TEMPLATE, TEXT_INSTRUCTIONS),
        (FixType::Text, None) => (TEXT_TEMPLATE, TEXT_INSTRUCTIONS),
    }
}

pub struct TemplateCatalog {
    engine: PromptTemplateEngine,
    overrides: BTreeMap<String, TemplateOverride>,
}

impl TemplateCatalog {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            engine: PromptTemplateEngine::new(),
            overrides: config.overrides.clone(),
        }
    }

    pub fn has_override(&self, category: &str) -> bool {
        self.overrides.contains_key(category)
    }

    /// Render the template for an issue's category and route.
    pub fn render(&self, issue: &StructuredIssue, route: &FixRoute) -> Result<ArtifactBody> {
        let (content_source, instructions_source) = match self.overrides.get(issue.category.as_str()) {
            Some(custom) => (custom.content.as_str(), custom.integration_instructions.as_str()),
            None => builtin(route.fix_type, route.document_type),
        };

        let context = PromptContext::for_issue(issue, route.fix_type, route.document_type);
        let operator = self.engine.render(OPERATOR, &context)?;
        let context = context.extra("operator", serde_json::Value::String(operator));

        let content = self
            .engine
            .render_for(route.fix_type, content_source, &context)
            .with_context(|| format!("Failed to render {} template for '{}'", route.fix_type, issue.category))?;
        let integration_instructions = self
            .engine
            .render(instructions_source, &context)
            .with_context(|| format!("Failed to render instructions for '{}'", issue.category))?;

        Ok(ArtifactBody::new(content.trim(), integration_instructions.trim()))
    }

    /// Compile every configured override.
    pub fn validate_overrides(&self) -> Result<()> {
        for (category, custom) in &self.overrides {
            self.engine
                .validate_template(&custom.content)
                .with_context(|| format!("templates.overrides.{}.content", category))?;
            self.engine
                .validate_template(&custom.integration_instructions)
                .with_context(|| format!("templates.overrides.{}.integration_instructions", category))?;
        }
        Ok(())
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(&TemplateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::artifact_validator::ArtifactValidator;
    use crate::domain::pipeline_config::RoutingConfig;
    use serde_json::json;

    fn issue(category: &str) -> StructuredIssue {
        StructuredIssue::new(category, "Fehlende Seite", "keine Seite gefunden").unwrap()
    }

    #[test]
    fn test_every_builtin_route_renders_valid_artifacts() {
        let catalog = TemplateCatalog::default();
        let routing = RoutingConfig::default();
        let validator = ArtifactValidator::new();

        for (category, route) in routing.routes.iter().map(|(c, r)| (c.as_str(), r)).chain([("unknown", &routing.default_route)]) {
            let body = catalog.render(&issue(category), route).unwrap();
            let report = validator.validate(&body, route.fix_type, route.document_type);
            assert!(report.is_valid(), "{} template invalid: {:?}", category, report.error_messages());
        }
    }

    #[test]
    fn test_legal_templates_cover_required_topics() {
        let catalog = TemplateCatalog::default();
        let validator = ArtifactValidator::new();

        for document_type in [DocumentType::PrivacyPolicy, DocumentType::Terms, DocumentType::CookiePolicy] {
            let route = FixRoute {
                fix_type: FixType::Text,
                document_type: Some(document_type),
                authoritative: false,
                prefer_template: false,
            };
            let body = catalog.render(&issue("legal"), &route).unwrap();
            let report = validator.validate(&body, FixType::Text, Some(document_type));
            assert!(report.warnings.is_empty(), "{}: {:?}", document_type, report.warnings);
        }
    }

    #[test]
    fn test_company_data_fills_imprint() {
        let catalog = TemplateCatalog::default();
        let issue = issue("impressum").with_context(
            json!({
                "company_name": "Muster GmbH",
                "street": "Hauptstraße 1",
                "postal_code": "10115",
                "city": "Berlin",
                "email": "info@muster.de",
                "representative": "Erika Mustermann"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let route = RoutingConfig::default().route_for("impressum").clone();

        let body = catalog.render(&issue, &route).unwrap();

        assert!(body.content.contains("Muster GmbH\nHauptstraße 1\n10115 Berlin"));
        assert!(body.content.contains("Vertreten durch: Erika Mustermann"));
        assert!(body.content.contains("E-Mail: info@muster.de"));
        assert!(!body.content.contains("Registergericht"));
    }

    #[test]
    fn test_missing_company_name_uses_neutral_wording() {
        let catalog = TemplateCatalog::default();
        let route = RoutingConfig::default().route_for("datenschutz").clone();

        let body = catalog.render(&issue("datenschutz"), &route).unwrap();
        assert!(body.content.contains("ist der Betreiber dieser Website."));
    }

    #[test]
    fn test_override_replaces_builtin() {
        let mut config = TemplateConfig::default();
        config.overrides.insert(
            "cookies".to_string(),
            TemplateOverride {
                content: "<div class=\"banner\">{{title}}</div>".to_string(),
                integration_instructions: "Im Footer einbinden".to_string(),
            },
        );
        let catalog = TemplateCatalog::new(&config);
        let issue = StructuredIssue::new("cookies", "Banner <fehlt>", "").unwrap();
        let route = RoutingConfig::default().route_for("cookies").clone();

        let body = catalog.render(&issue, &route).unwrap();

        assert!(catalog.has_override("cookies"));
        assert_eq!(body.content, "<div class=\"banner\">Banner &lt;fehlt&gt;</div>");
        assert_eq!(body.integration_instructions, "Im Footer einbinden");
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let mut config = TemplateConfig::default();
        config.overrides.insert(
            "ssl".to_string(),
            TemplateOverride {
                content: "{{#if title}}unclosed".to_string(),
                integration_instructions: String::new(),
            },
        );
        let catalog = TemplateCatalog::new(&config);
        assert!(catalog.validate_overrides().is_err());
    }
}
