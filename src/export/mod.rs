//! Markdown to DOCX/PDF conversion through an external `pandoc` binary.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0} (expected docx or pdf)")]
    UnsupportedFormat(String),

    #[error("Export content is empty")]
    EmptyContent,

    #[error("Document conversion failed: {0}")]
    Converter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self, ExportError> {
        match s.trim().to_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }
}

/// A converted document, ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub fn file_name(&self) -> String {
        format!("report.{}", self.format.extension())
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name())
    }
}

#[derive(Debug, Clone)]
pub struct Exporter {
    pandoc_path: PathBuf,
    export_dir: PathBuf,
    docx_template: Option<PathBuf>,
    pdf_css: Option<PathBuf>,
}

impl Exporter {
    pub fn new(pandoc_path: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            pandoc_path: pandoc_path.into(),
            export_dir: export_dir.into(),
            docx_template: None,
            pdf_css: None,
        }
    }

    pub fn with_docx_template(mut self, template: Option<PathBuf>) -> Self {
        self.docx_template = template;
        self
    }

    pub fn with_pdf_css(mut self, css: Option<PathBuf>) -> Self {
        self.pdf_css = css;
        self
    }

    /// Command line for converting `input` into `output`.
    pub fn pandoc_args(&self, input: &Path, output: &Path, format: ExportFormat) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), "-o".into(), output.into()];
        match (format, &self.docx_template, &self.pdf_css) {
            (ExportFormat::Docx, Some(template), _) => {
                args.push("--reference-doc".into());
                args.push(template.into());
            }
            (ExportFormat::Pdf, _, Some(css)) => {
                args.push("-c".into());
                args.push(css.into());
            }
            _ => {}
        }
        args
    }

    /// Convert Markdown to `format`. Temporary input and output files are
    /// removed whether or not the conversion succeeds.
    pub async fn export(
        &self,
        markdown: &str,
        format: ExportFormat,
    ) -> Result<ExportedFile, ExportError> {
        if markdown.trim().is_empty() {
            return Err(ExportError::EmptyContent);
        }

        tokio::fs::create_dir_all(&self.export_dir).await?;
        let mut input = tempfile::Builder::new()
            .prefix("report-")
            .suffix(".md")
            .tempfile_in(&self.export_dir)?;
        input.write_all(markdown.as_bytes())?;
        input.flush()?;

        let output = tempfile::Builder::new()
            .prefix("report-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&self.export_dir)?;

        let args = self.pandoc_args(input.path(), output.path(), format);
        tracing::debug!(
            pandoc = %self.pandoc_path.display(),
            format = format.extension(),
            "Running converter"
        );

        let result = tokio::process::Command::new(&self.pandoc_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExportError::Converter(format!(
                    "converter not found at {}",
                    self.pandoc_path.display()
                )),
                _ => ExportError::Io(e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ExportError::Converter(stderr.trim().to_string()));
        }

        let bytes = tokio::fs::read(output.path()).await?;
        tracing::info!(format = format.extension(), bytes = bytes.len(), "Report exported");
        Ok(ExportedFile { format, bytes })
    }
}
