use std::sync::Arc;

use crate::assistant::{Assistant, AssistantConfig};
use crate::config::AppConfig;
use crate::db::Database;
use crate::export::Exporter;
use crate::generator::{GeneratorHandle, OllamaGenerator};
use crate::models::Language;
use crate::reports::ReportWriter;
use crate::retrieval::{EmbedderHandle, OllamaEmbedder, Retriever};

/// Everything the HTTP and MCP surfaces share.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub assistant: Arc<Assistant>,
    pub retriever: Retriever,
    pub reports: ReportWriter,
    pub exporter: Exporter,
    pub default_language: Language,
}

impl AppState {
    pub fn new(
        db: Database,
        generator: GeneratorHandle,
        embedder: EmbedderHandle,
        config: AssistantConfig,
        exporter: Exporter,
    ) -> Self {
        let retriever = Retriever::new(db.clone(), embedder);
        let reports = ReportWriter::new(
            db.clone(),
            generator.clone(),
            retriever.clone(),
            config.context_snippets,
        );
        let default_language = config.default_language;
        let assistant = Assistant::new(generator, config).with_retriever(retriever.clone());

        Self {
            db,
            assistant: Arc::new(assistant),
            retriever,
            reports,
            exporter,
            default_language,
        }
    }

    pub fn from_config(db: Database, config: &AppConfig) -> Self {
        let generator = if config.generator_enabled {
            GeneratorHandle::new(OllamaGenerator::new(&config.ollama_url, &config.model))
        } else {
            tracing::warn!("Language model disabled; generation endpoints will return 503");
            GeneratorHandle::Unavailable
        };
        let embedder = if config.embeddings_enabled {
            EmbedderHandle::new(OllamaEmbedder::new(
                &config.ollama_url,
                &config.embedding_model,
            ))
        } else {
            tracing::warn!("Embeddings disabled; search returns no results");
            EmbedderHandle::Unavailable
        };
        let exporter = Exporter::new(&config.pandoc_path, &config.export_dir)
            .with_docx_template(config.docx_template.clone())
            .with_pdf_css(config.pdf_css.clone());

        Self::new(db, generator, embedder, config.assistant_config(), exporter)
    }
}
