// Shared fakes for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use drafter::assistant::AssistantConfig;
use drafter::db::Database;
use drafter::export::Exporter;
use drafter::generator::{Generator, GeneratorError, GeneratorHandle};
use drafter::retrieval::{Embedder, EmbedderHandle, RetrievalError};
use drafter::state::AppState;

pub const STRUCTURE: &str = "1. Introduction\n2. Findings\n3. Conclusions";
pub const REPORT: &str = "# Findings\n\nSales grew in every region.\n\n## Risks\n\nSupply chain delays.\n\n# Conclusions\n\nKeep investing.";
pub const REPHRASED: &str = "So, what is this report for?";

/// Answers by prompt kind and records every prompt it receives.
#[derive(Clone, Default)]
pub struct FakeGenerator {
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    fn model_name(&self) -> String {
        "fake".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());

        if prompt.starts_with("Write a professional report") {
            Ok(REPORT.to_string())
        } else if prompt.starts_with("Propose the section structure") {
            Ok(format!("{}\n", STRUCTURE))
        } else {
            Ok(REPHRASED.to_string())
        }
    }
}

/// Always fails, like a model server that is down.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_name(&self) -> String {
        "offline".to_string()
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Unavailable("model server offline".to_string()))
    }
}

/// Answers like [`FakeGenerator`] after a short delay, so turns overlap.
#[derive(Clone, Default)]
pub struct SlowGenerator {
    pub inner: FakeGenerator,
}

#[async_trait]
impl Generator for SlowGenerator {
    fn model_name(&self) -> String {
        "slow".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.inner.generate(prompt).await
    }
}

const VOCABULARY: &[&str] = &["sales", "climate", "budget", "risk", "supply"];

/// Bag-of-words vectors over a tiny fixed vocabulary.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> String {
        "keywords".to_string()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let text = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect())
    }
}

pub fn test_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

pub fn test_exporter() -> Exporter {
    Exporter::new("drafter-test-missing-pandoc", std::env::temp_dir())
}

/// State with a working fake model and keyword embeddings.
pub fn test_state(generator: FakeGenerator) -> AppState {
    AppState::new(
        test_db(),
        GeneratorHandle::new(generator),
        EmbedderHandle::new(KeywordEmbedder),
        AssistantConfig::default(),
        test_exporter(),
    )
}

/// State where neither a model nor embeddings are configured.
pub fn offline_state() -> AppState {
    AppState::new(
        test_db(),
        GeneratorHandle::Unavailable,
        EmbedderHandle::Unavailable,
        AssistantConfig::default(),
        test_exporter(),
    )
}
