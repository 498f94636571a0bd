// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Pipeline Configuration Types
//
// Defines the configuration schema for the remediation pipeline:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Solution cache thresholds and fuzzy-match weights
// - Generative model providers and the retry/admission policy
// - Authoritative legal-text provider
// - Category routing and template overrides
// - Storage and observability settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use super::artifact::{DocumentType, FixType};
use super::repository::{PostgresConfig, StorageBackend};
use super::similarity::SimilarityWeights;

pub const API_VERSION: &str = "remedy/v1";
pub const KIND: &str = "PipelineConfig";

const SUPPORTED_PROVIDER_TYPES: &[&str] = &["anthropic", "openai", "openai-compatible"];

/// Top-level Kubernetes-style pipeline configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfigManifest {
    /// API version (must be "remedy/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PipelineConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: PipelineConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Content under spec:
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfigSpec {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Canonical legal-text provider; disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoritative: Option<AuthoritativeConfig>,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub templates: TemplateConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries below this success rate are never served
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,

    /// Combined fuzzy score needed to accept a candidate (inclusive)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default = "default_fuzzy_candidate_limit")]
    pub fuzzy_candidate_limit: usize,

    #[serde(default = "default_title_weight")]
    pub title_weight: f64,

    #[serde(default = "default_description_weight")]
    pub description_weight: f64,

    #[serde(default = "default_success_bonus_weight")]
    pub success_bonus_weight: f64,

    /// Success rate given to a freshly stored solution
    #[serde(default = "default_initial_success_rate")]
    pub initial_success_rate: f64,
}

impl CacheConfig {
    pub fn weights(&self) -> SimilarityWeights {
        SimilarityWeights {
            title: self.title_weight,
            description: self.description_weight,
            success_bonus: self.success_bonus_weight,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_success_rate: default_min_success_rate(),
            similarity_threshold: default_similarity_threshold(),
            fuzzy_candidate_limit: default_fuzzy_candidate_limit(),
            title_weight: default_title_weight(),
            description_weight: default_description_weight(),
            success_bonus_weight: default_success_bonus_weight(),
            initial_success_rate: default_initial_success_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_positive_step")]
    pub positive_step: f64,

    #[serde(default = "default_negative_step")]
    pub negative_step: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            positive_step: default_positive_step(),
            negative_step: default_negative_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub providers: Vec<LLMProviderConfig>,

    /// Model alias used for fix generation
    #[serde(default = "default_model_alias")]
    pub default_model: String,

    /// Retries after the first attempt, for transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled per retry
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Process-wide cap on in-flight model calls
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Temperature for the single regeneration after a validation failure
    #[serde(default = "default_regeneration_temperature")]
    pub regeneration_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            default_model: default_model_alias(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            request_timeout: default_request_timeout(),
            max_concurrency: default_max_concurrency(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            regeneration_temperature: default_regeneration_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g., "anthropic", "openai-eu")
    pub name: String,

    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: String, // "anthropic", "openai", "openai-compatible"

    /// API endpoint URL; the vendor default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Alias referenced by `generation.default_model`
    pub alias: String,

    /// Actual model identifier for the provider API
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritativeConfig {
    pub endpoint: String,

    /// Bearer key (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(with = "humantime_serde", default = "default_authoritative_timeout")]
    pub timeout: Duration,
}

/// How a category is remediated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRoute {
    pub fix_type: FixType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    /// Consult the legal-text provider first
    #[serde(default)]
    pub authoritative: bool,

    /// Serve the template before trying generation
    #[serde(default)]
    pub prefer_template: bool,
}

impl FixRoute {
    pub fn new(fix_type: FixType) -> Self {
        Self {
            fix_type,
            document_type: None,
            authoritative: false,
            prefer_template: false,
        }
    }

    fn legal(document_type: DocumentType) -> Self {
        Self {
            fix_type: FixType::Text,
            document_type: Some(document_type),
            authoritative: true,
            prefer_template: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Routes keyed by normalized category. Entries here replace the built-ins.
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, FixRoute>,

    /// Route for categories with no entry
    #[serde(default = "default_route")]
    pub default_route: FixRoute,
}

impl RoutingConfig {
    pub fn route_for(&self, category: &str) -> &FixRoute {
        self.routes.get(category).unwrap_or(&self.default_route)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            default_route: default_route(),
        }
    }
}

/// Handlebars template source for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOverride {
    pub content: String,

    #[serde(default)]
    pub integration_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Per-category overrides of the built-in catalog
    #[serde(default)]
    pub overrides: BTreeMap<String, TemplateOverride>,

    #[serde(default = "default_template_confidence")]
    pub template_confidence: f64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            template_confidence: default_template_confidence(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_kind")]
    pub backend: StorageKind,

    /// Connection URL (supports "env:VAR_NAME"); required for postgres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl StorageConfig {
    pub fn to_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.backend {
            StorageKind::InMemory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let url = self
                    .database_url
                    .as_deref()
                    .context("storage.database_url is required for the postgres backend")?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: resolve_secret(url)?,
                }))
            }
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_kind(),
            database_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, text
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_success_rate() -> f64 {
    0.6
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_fuzzy_candidate_limit() -> usize {
    30
}

fn default_title_weight() -> f64 {
    0.7
}

fn default_description_weight() -> f64 {
    0.3
}

fn default_success_bonus_weight() -> f64 {
    0.05
}

fn default_initial_success_rate() -> f64 {
    0.8
}

fn default_positive_step() -> f64 {
    0.1
}

fn default_negative_step() -> f64 {
    0.2
}

fn default_model_alias() -> String {
    "default".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(45)
}

fn default_authoritative_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.4
}

fn default_regeneration_temperature() -> f32 {
    0.1
}

fn default_template_confidence() -> f64 {
    0.5
}

fn default_storage_kind() -> StorageKind {
    StorageKind::InMemory
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

fn default_route() -> FixRoute {
    FixRoute::new(FixType::Guide)
}

fn default_routes() -> BTreeMap<String, FixRoute> {
    let privacy = FixRoute::legal(DocumentType::PrivacyPolicy);
    let imprint = FixRoute::legal(DocumentType::Imprint);
    let terms = FixRoute::legal(DocumentType::Terms);
    let widget = FixRoute::new(FixType::Widget);
    let code = FixRoute::new(FixType::Code);
    let guide = FixRoute {
        prefer_template: true,
        ..FixRoute::new(FixType::Guide)
    };

    BTreeMap::from([
        ("datenschutz".to_string(), privacy.clone()),
        ("privacy".to_string(), privacy),
        ("impressum".to_string(), imprint.clone()),
        ("imprint".to_string(), imprint),
        ("agb".to_string(), terms.clone()),
        ("terms".to_string(), terms),
        ("cookies".to_string(), widget.clone()),
        ("cookie-banner".to_string(), widget),
        ("barrierefreiheit".to_string(), code.clone()),
        ("accessibility".to_string(), code),
        ("security".to_string(), guide.clone()),
        ("ssl".to_string(), guide),
    ])
}

/// Resolve "env:VAR_NAME" references; other values pass through.
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var)
            .with_context(|| format!("Environment variable '{}' is not set", var)),
        None => Ok(value.to_string()),
    }
}

impl Default for PipelineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "remedy".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: PipelineConfigSpec::default(),
        }
    }
}

impl PipelineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. REMEDY_CONFIG_PATH environment variable
    /// 2. ./remedy-config.yaml (working directory)
    /// 3. ~/.remedy/config.yaml (user home)
    /// 4. /etc/remedy/config.yaml (system, Unix) or C:\ProgramData\Remedy\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("REMEDY_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./remedy-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".remedy").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/remedy/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Remedy\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using built-in defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(val) = env_parse::<f64>("REMEDY_SIMILARITY_THRESHOLD") {
            tracing::info!("Environment override: REMEDY_SIMILARITY_THRESHOLD={}", val);
            self.spec.cache.similarity_threshold = val;
        }

        if let Some(val) = env_parse::<f64>("REMEDY_MIN_SUCCESS_RATE") {
            tracing::info!("Environment override: REMEDY_MIN_SUCCESS_RATE={}", val);
            self.spec.cache.min_success_rate = val;
        }

        if let Some(val) = env_parse::<usize>("REMEDY_MAX_CONCURRENCY") {
            tracing::info!("Environment override: REMEDY_MAX_CONCURRENCY={}", val);
            self.spec.generation.max_concurrency = val;
        }

        if let Ok(url) = std::env::var("REMEDY_DATABASE_URL") {
            tracing::info!("Environment override: REMEDY_DATABASE_URL (postgres backend)");
            self.spec.storage.backend = StorageKind::Postgres;
            self.spec.storage.database_url = Some(url);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let cache = &self.spec.cache;
        for (name, value) in [
            ("cache.min_success_rate", cache.min_success_rate),
            ("cache.similarity_threshold", cache.similarity_threshold),
            ("cache.initial_success_rate", cache.initial_success_rate),
            ("cache.title_weight", cache.title_weight),
            ("cache.description_weight", cache.description_weight),
            ("cache.success_bonus_weight", cache.success_bonus_weight),
            ("feedback.positive_step", self.spec.feedback.positive_step),
            ("feedback.negative_step", self.spec.feedback.negative_step),
            ("templates.template_confidence", self.spec.templates.template_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0.0, 1.0], got {}", name, value);
            }
        }

        if (cache.title_weight + cache.description_weight - 1.0).abs() > 1e-6 {
            anyhow::bail!(
                "cache.title_weight + cache.description_weight must equal 1.0, got {}",
                cache.title_weight + cache.description_weight
            );
        }

        if cache.fuzzy_candidate_limit == 0 {
            anyhow::bail!("cache.fuzzy_candidate_limit must be at least 1");
        }

        let generation = &self.spec.generation;
        if generation.max_concurrency == 0 {
            anyhow::bail!("generation.max_concurrency must be at least 1");
        }

        if generation.request_timeout.is_zero() {
            anyhow::bail!("generation.request_timeout must be greater than zero");
        }

        for provider in &generation.providers {
            if provider.name.is_empty() {
                anyhow::bail!("LLM provider name cannot be empty");
            }

            if !SUPPORTED_PROVIDER_TYPES.contains(&provider.provider_type.as_str()) {
                anyhow::bail!(
                    "Unknown provider type '{}' for provider '{}'. Supported: {}",
                    provider.provider_type,
                    provider.name,
                    SUPPORTED_PROVIDER_TYPES.join(", ")
                );
            }

            if provider.provider_type == "openai-compatible" && provider.endpoint.is_none() {
                anyhow::bail!("openai-compatible provider '{}' needs an endpoint", provider.name);
            }

            if provider.models.is_empty() {
                anyhow::bail!("LLM provider must have at least one model: {}", provider.name);
            }

            for model in &provider.models {
                if model.alias.is_empty() {
                    anyhow::bail!("Model alias cannot be empty in provider: {}", provider.name);
                }

                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        let enabled: Vec<_> = generation.providers.iter().filter(|p| p.enabled).collect();
        if !enabled.is_empty()
            && !enabled
                .iter()
                .flat_map(|p| p.models.iter())
                .any(|m| m.alias == generation.default_model)
        {
            anyhow::bail!(
                "generation.default_model '{}' is not an alias of any enabled provider",
                generation.default_model
            );
        }

        if let Some(authoritative) = &self.spec.authoritative {
            if authoritative.endpoint.is_empty() {
                anyhow::bail!("authoritative.endpoint cannot be empty");
            }
        }

        for (category, route) in &self.spec.routing.routes {
            if category.trim().to_lowercase() != *category {
                anyhow::bail!("Route key '{}' must be a normalized (lowercase, trimmed) category", category);
            }
            if route.authoritative && route.document_type.is_none() {
                anyhow::bail!("Route '{}' is authoritative but has no document_type", category);
            }
        }

        if self.spec.storage.backend == StorageKind::Postgres && self.spec.storage.database_url.is_none() {
            anyhow::bail!("storage.database_url is required for the postgres backend");
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(val) => Some(val),
        Err(_) => {
            tracing::warn!("Invalid value for {}: '{}'. Ignoring.", var, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = PipelineConfigManifest::default();
        assert_eq!(manifest.api_version, "remedy/v1");
        assert_eq!(manifest.kind, "PipelineConfig");
        assert_eq!(manifest.spec.cache.min_success_rate, 0.6);
        assert_eq!(manifest.spec.cache.similarity_threshold, 0.85);
        assert_eq!(manifest.spec.cache.fuzzy_candidate_limit, 30);
        assert_eq!(manifest.spec.feedback.negative_step, 0.2);
        assert_eq!(manifest.spec.generation.max_retries, 2);
        assert!(manifest.spec.generation.providers.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_builtin_routes() {
        let routing = RoutingConfig::default();
        let privacy = routing.route_for("datenschutz");
        assert_eq!(privacy.fix_type, FixType::Text);
        assert_eq!(privacy.document_type, Some(DocumentType::PrivacyPolicy));
        assert!(privacy.authoritative);

        assert_eq!(routing.route_for("cookies").fix_type, FixType::Widget);
        assert!(routing.route_for("ssl").prefer_template);
        assert_eq!(routing.route_for("unheard-of").fix_type, FixType::Guide);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: remedy/v1
kind: PipelineConfig
metadata:
  name: test
spec:
  cache:
    similarity_threshold: 0.9
  generation:
    request_timeout: 10s
    providers:
      - name: anthropic
        type: anthropic
        api_key: "env:ANTHROPIC_API_KEY"
        models:
          - alias: default
            model: claude-sonnet-4-5
"#;
        let manifest = PipelineConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.cache.similarity_threshold, 0.9);
        assert_eq!(manifest.spec.cache.min_success_rate, 0.6);
        assert_eq!(manifest.spec.generation.request_timeout, Duration::from_secs(10));
        assert_eq!(manifest.spec.generation.max_concurrency, 4);
        assert!(manifest.spec.routing.routes.contains_key("impressum"));
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remedy-config.yaml");

        let mut manifest = PipelineConfigManifest::default();
        manifest.spec.templates.overrides.insert(
            "cookies".to_string(),
            TemplateOverride {
                content: "<div id=\"cb\">{{title}}</div>".to_string(),
                integration_instructions: "Paste before </body>".to_string(),
            },
        );
        manifest.to_yaml_file(&path).unwrap();

        let parsed = PipelineConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(parsed.spec.templates.overrides.len(), 1);
        assert_eq!(parsed.spec.routing.routes.len(), 12);
    }

    #[test]
    fn test_validation() {
        let mut manifest = PipelineConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.spec.cache.similarity_threshold = 1.5;
        assert!(manifest.validate().is_err());
        manifest.spec.cache.similarity_threshold = 0.85;

        manifest.spec.cache.title_weight = 0.8;
        assert!(manifest.validate().is_err());
        manifest.spec.cache.title_weight = 0.7;

        manifest.spec.generation.max_concurrency = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.generation.max_concurrency = 4;

        manifest.spec.generation.providers.push(LLMProviderConfig {
            name: "local".to_string(),
            provider_type: "ollama".to_string(),
            endpoint: Some("http://localhost:11434".to_string()),
            api_key: None,
            enabled: true,
            models: vec![ModelConfig {
                alias: "default".to_string(),
                model: "llama3".to_string(),
            }],
        });
        assert!(manifest.validate().is_err());
        manifest.spec.generation.providers[0].provider_type = "openai-compatible".to_string();
        assert!(manifest.validate().is_ok());

        manifest.spec.generation.default_model = "smart".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.generation.default_model = "default".to_string();

        manifest.spec.storage.backend = StorageKind::Postgres;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_resolve_secret_passthrough() {
        assert_eq!(resolve_secret("plain-key").unwrap(), "plain-key");
        assert!(resolve_secret("env:REMEDY_TEST_SURELY_UNSET_VARIABLE").is_err());
    }
}
