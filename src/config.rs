//! Application configuration.
//!
//! Values are layered: built-in defaults, then a YAML file (named by
//! `DRAFTER_CONFIG`, or `config.yaml` in the platform config directory when it
//! exists), then `DRAFTER_*` environment variables. Security settings are read
//! separately by [`crate::api::SecurityConfig::from_env`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assistant::{AssistantConfig, LockScope};
use crate::models::Language;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// SQLite file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    pub ollama_url: String,
    pub model: String,
    pub embedding_model: String,
    pub generator_enabled: bool,
    pub embeddings_enabled: bool,
    pub export_dir: PathBuf,
    pub pandoc_path: PathBuf,
    pub docx_template: Option<PathBuf>,
    pub pdf_css: Option<PathBuf>,
    pub default_language: Language,
    pub personalize_questions: bool,
    pub strict_validation: bool,
    pub lock_scope: LockScope,
    pub context_snippets: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: crate::generator::DEFAULT_MODEL.to_string(),
            embedding_model: crate::retrieval::DEFAULT_EMBEDDING_MODEL.to_string(),
            generator_enabled: true,
            embeddings_enabled: true,
            export_dir: PathBuf::from("exports"),
            pandoc_path: PathBuf::from("pandoc"),
            docx_template: None,
            pdf_css: None,
            default_language: Language::English,
            personalize_questions: false,
            strict_validation: false,
            lock_scope: LockScope::PerSession,
            context_snippets: 3,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{}: expected a boolean, got {:?}", key, other),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{}: expected a number, got {:?}", key, value))
}

impl AppConfig {
    /// Defaults, then the config file if any, then the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("DRAFTER_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("", "", "drafter")?;
        let path = dirs.config_dir().join("config.yaml");
        path.exists().then_some(path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from `DRAFTER_*` variables returned by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| {
            let key = format!("DRAFTER_{}", name);
            lookup(&key).map(|v| (key, v))
        };

        if let Some((_, v)) = var("HOST") {
            self.host = v;
        }
        if let Some((k, v)) = var("PORT") {
            self.port = parse_number(&k, &v)?;
        }
        if let Some((_, v)) = var("DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some((_, v)) = var("OLLAMA_URL") {
            self.ollama_url = v;
        }
        if let Some((_, v)) = var("MODEL") {
            self.model = v;
        }
        if let Some((_, v)) = var("EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Some((k, v)) = var("GENERATOR_ENABLED") {
            self.generator_enabled = parse_bool(&k, &v)?;
        }
        if let Some((k, v)) = var("EMBEDDINGS_ENABLED") {
            self.embeddings_enabled = parse_bool(&k, &v)?;
        }
        if let Some((_, v)) = var("EXPORT_DIR") {
            self.export_dir = PathBuf::from(v);
        }
        if let Some((_, v)) = var("PANDOC_PATH") {
            self.pandoc_path = PathBuf::from(v);
        }
        if let Some((_, v)) = var("DOCX_TEMPLATE") {
            self.docx_template = Some(PathBuf::from(v));
        }
        if let Some((_, v)) = var("PDF_CSS") {
            self.pdf_css = Some(PathBuf::from(v));
        }
        if let Some((k, v)) = var("DEFAULT_LANGUAGE") {
            self.default_language = Language::from_code(&v)
                .ok_or_else(|| anyhow::anyhow!("{}: unknown language {:?}", k, v))?;
        }
        if let Some((k, v)) = var("PERSONALIZE_QUESTIONS") {
            self.personalize_questions = parse_bool(&k, &v)?;
        }
        if let Some((k, v)) = var("STRICT_VALIDATION") {
            self.strict_validation = parse_bool(&k, &v)?;
        }
        if let Some((k, v)) = var("LOCK_SCOPE") {
            self.lock_scope = LockScope::from_str(v.trim()).ok_or_else(|| {
                anyhow::anyhow!("{}: expected per_session or global, got {:?}", k, v)
            })?;
        }
        if let Some((k, v)) = var("CONTEXT_SNIPPETS") {
            self.context_snippets = parse_number(&k, &v)?;
        }
        Ok(())
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            default_language: self.default_language,
            personalize_questions: self.personalize_questions,
            strict_validation: self.strict_validation,
            lock_scope: self.lock_scope,
            context_snippets: self.context_snippets,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
