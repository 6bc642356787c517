//! Report generation: prompt, model call, persistence and indexing.

use thiserror::Error;

use crate::db::Database;
use crate::generator::{prompts, GeneratorError, GeneratorHandle};
use crate::models::{CreateReportInput, GenerateReportInput, Language, Report};
use crate::retrieval::Retriever;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report topic is required")]
    MissingTopic,

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct ReportWriter {
    db: Database,
    generator: GeneratorHandle,
    retriever: Retriever,
    context_snippets: usize,
}

impl ReportWriter {
    pub fn new(
        db: Database,
        generator: GeneratorHandle,
        retriever: Retriever,
        context_snippets: usize,
    ) -> Self {
        Self {
            db,
            generator,
            retriever,
            context_snippets,
        }
    }

    /// Generate and store a report. Indexing the new report is best effort.
    pub async fn generate(
        &self,
        input: GenerateReportInput,
        default_language: Language,
    ) -> Result<Report, ReportError> {
        let language = input.language.unwrap_or(default_language);
        let topic = input.topic.trim();
        if topic.is_empty() {
            return Err(ReportError::MissingTopic);
        }

        let context = self.retriever.context_for(topic, self.context_snippets).await;
        let prompt = prompts::report_prompt(&input, language, &context);
        let content = self.generator.generate(&prompt).await?;

        let report = self.db.create_report(CreateReportInput {
            topic: topic.to_string(),
            kind: input.kind,
            content: content.trim().to_string(),
            purpose: input.purpose,
            style: input.style,
            pages: input.pages,
            extras: input.extras,
        })?;
        tracing::info!(report_id = %report.id, topic = %report.topic, "Report generated");

        if self.retriever.is_available() {
            if let Err(e) = self.retriever.index_report(&report).await {
                tracing::warn!(report_id = %report.id, error = %e, "Failed to index report");
            }
        }
        Ok(report)
    }
}
