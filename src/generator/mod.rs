//! Language-model capability.
//!
//! Call sites hold a [`GeneratorHandle`], which is either a live [`Generator`] or
//! explicitly `Unavailable`, so a missing model is an ordinary value rather than
//! a null handle.

mod ollama;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::{OllamaGenerator, DEFAULT_MODEL};

/// Generation errors. Callers never look past "it failed".
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    #[error("Language model request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Turns a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> String;

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

#[derive(Clone)]
pub enum GeneratorHandle {
    Available(Arc<dyn Generator>),
    Unavailable,
}

impl GeneratorHandle {
    pub fn new(generator: impl Generator + 'static) -> Self {
        Self::Available(Arc::new(generator))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        match self {
            Self::Available(generator) => {
                tracing::debug!(
                    model = %generator.model_name(),
                    prompt_chars = prompt.len(),
                    "Calling language model"
                );
                generator.generate(prompt).await
            }
            Self::Unavailable => Err(GeneratorError::Unavailable(
                "no language model configured".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for GeneratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(generator) => f
                .debug_tuple("Available")
                .field(&generator.model_name())
                .finish(),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}
