use std::{sync::Arc, time::Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::types::{CompileMode, ExportFormat};

use super::{
    docx::build_source_docx,
    markup::{PREVIEW_PLACEHOLDER, error_block, page_stack, standalone_document},
    types::{
        CompileOutcome, InvokeError, NO_OUTPUT_MESSAGE, PageCompiler, Payload, PdfCompiler,
        PipelineError,
    },
    workspace::{ScratchHandle, ScratchLayout, Workspace},
};

/// Entry point for every compile and export request.
#[derive(Clone)]
pub struct RenderPipeline {
    workspace: Workspace,
    pages: Arc<dyn PageCompiler>,
    pdf: Arc<dyn PdfCompiler>,
}

/// Private scratch space for one compile; released when the job is dropped.
struct CompileJob {
    id: Uuid,
    scratch: ScratchHandle,
}

impl CompileJob {
    async fn start(
        workspace: &Workspace,
        mode: CompileMode,
        layout: ScratchLayout,
        markup: &str,
    ) -> Result<Self, PipelineError> {
        let scratch = workspace
            .acquire(layout)
            .map_err(PipelineError::Workspace)?;
        tokio::fs::write(scratch.input_path(), markup)
            .await
            .map_err(PipelineError::Workspace)?;
        debug!(
            target = "application::compile::pipeline",
            op = "pipeline::start_job",
            job_id = %scratch.id(),
            mode = mode.as_str(),
            markup_bytes = markup.len(),
            "Compile job started"
        );
        Ok(Self {
            id: scratch.id(),
            scratch,
        })
    }

    fn finish(mut self) {
        self.scratch.release();
    }
}

impl RenderPipeline {
    pub fn new(
        workspace: Workspace,
        pages: Arc<dyn PageCompiler>,
        pdf: Arc<dyn PdfCompiler>,
    ) -> Self {
        Self {
            workspace,
            pages,
            pdf,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Live preview: a stack of SVG pages, the placeholder for an empty
    /// buffer, or a styled error block.
    pub async fn render_preview(&self, markup: &str) -> Result<CompileOutcome, PipelineError> {
        let mode = CompileMode::Preview;
        if markup.trim().is_empty() {
            return Ok(CompileOutcome::succeeded(
                mode,
                Payload::Html(PREVIEW_PLACEHOLDER.to_string()),
            ));
        }

        let started_at = Instant::now();
        let result = self
            .compile_pages(mode, markup)
            .await
            .map(|pages| match pages {
                Ok(pages) => CompileOutcome::succeeded(mode, Payload::Html(page_stack(&pages))),
                Err(diagnostic) => {
                    let block = error_block(&diagnostic);
                    CompileOutcome::failed(mode, diagnostic, Some(Payload::Html(block)))
                }
            });
        record(mode, started_at, result)
    }

    pub async fn render_pdf_export(&self, markup: &str) -> Result<CompileOutcome, PipelineError> {
        let mode = CompileMode::Pdf;
        let started_at = Instant::now();
        let result = async {
            let job = CompileJob::start(&self.workspace, mode, ScratchLayout::File, markup).await?;
            let compiled = self.pdf.compile_pdf(job.scratch.input_path()).await;
            let job_id = job.id;
            job.finish();
            Ok::<_, PipelineError>(match compiled {
                Ok(pdf) => CompileOutcome::succeeded(mode, Payload::Bytes(pdf)),
                Err(err) => CompileOutcome::failed(mode, diagnostic_or_fault(job_id, err)?, None),
            })
        }
        .await;
        record(mode, started_at, result)
    }

    pub async fn render_html_export(&self, markup: &str) -> Result<CompileOutcome, PipelineError> {
        let mode = CompileMode::HtmlExport;
        let started_at = Instant::now();
        let result = self
            .compile_pages(mode, markup)
            .await
            .map(|pages| match pages {
                Ok(pages) => {
                    CompileOutcome::succeeded(mode, Payload::Html(standalone_document(&pages)))
                }
                Err(diagnostic) => CompileOutcome::failed(mode, diagnostic, None),
            });
        record(mode, started_at, result)
    }

    /// Word export never invokes the compiler; the package carries the raw
    /// markup.
    pub async fn render_docx_export(&self, markup: &str) -> Result<CompileOutcome, PipelineError> {
        let mode = CompileMode::DocxExport;
        let started_at = Instant::now();
        let result = build_source_docx(markup)
            .map(|bytes| CompileOutcome::succeeded(mode, Payload::Bytes(bytes)))
            .map_err(PipelineError::from);
        record(mode, started_at, result)
    }

    /// First page of the document as a standalone SVG.
    pub async fn render_svg_export(&self, markup: &str) -> Result<CompileOutcome, PipelineError> {
        let mode = CompileMode::SvgExport;
        let started_at = Instant::now();
        let result = self
            .compile_pages(mode, markup)
            .await
            .map(|pages| match pages.map(|pages| pages.into_iter().next()) {
                Ok(Some(first)) => CompileOutcome::succeeded(mode, Payload::Html(first)),
                Ok(None) => CompileOutcome::failed(mode, NO_OUTPUT_MESSAGE.to_string(), None),
                Err(diagnostic) => CompileOutcome::failed(mode, diagnostic, None),
            });
        record(mode, started_at, result)
    }

    pub async fn render_export(
        &self,
        format: ExportFormat,
        markup: &str,
    ) -> Result<CompileOutcome, PipelineError> {
        match format {
            ExportFormat::Pdf => self.render_pdf_export(markup).await,
            ExportFormat::Html => self.render_html_export(markup).await,
            ExportFormat::Docx => self.render_docx_export(markup).await,
            ExportFormat::Svg => self.render_svg_export(markup).await,
        }
    }

    /// Runs the page compiler for one job. The inner `Err` is a diagnostic
    /// for the user; the outer one an internal fault.
    async fn compile_pages(
        &self,
        mode: CompileMode,
        markup: &str,
    ) -> Result<Result<Vec<String>, String>, PipelineError> {
        let job =
            CompileJob::start(&self.workspace, mode, ScratchLayout::FileAndPages, markup).await?;
        let Some(pages_dir) = job.scratch.pages_dir() else {
            return Err(PipelineError::Workspace(std::io::Error::other(
                "scratch handle has no pages directory",
            )));
        };
        let compiled = self
            .pages
            .compile_pages(job.scratch.input_path(), pages_dir)
            .await;
        let job_id = job.id;
        job.finish();

        match compiled {
            Ok(pages) => Ok(Ok(pages)),
            Err(err) => diagnostic_or_fault(job_id, err).map(Err),
        }
    }
}

fn diagnostic_or_fault(job_id: Uuid, err: InvokeError) -> Result<String, PipelineError> {
    let code = err.code();
    err.into_diagnostic().map_err(|io| {
        warn!(
            target = "application::compile::pipeline",
            op = "pipeline::invoke",
            job_id = %job_id,
            error_code = code,
            error = %io,
            "Compiler invocation failed with an internal error"
        );
        PipelineError::Io(io)
    })
}

fn record(
    mode: CompileMode,
    started_at: Instant,
    result: Result<CompileOutcome, PipelineError>,
) -> Result<CompileOutcome, PipelineError> {
    let elapsed = started_at.elapsed();
    let label = match &result {
        Ok(outcome) => outcome.result_label(),
        Err(_) => "error",
    };

    metrics::counter!(
        "rapid_typst_compile_total",
        "mode" => mode.as_str(),
        "result" => label
    )
    .increment(1);
    metrics::histogram!("rapid_typst_compile_ms", "mode" => mode.as_str())
        .record(elapsed.as_secs_f64() * 1000.0);

    match &result {
        Ok(outcome) => info!(
            target = "application::compile::pipeline",
            op = "pipeline::render",
            mode = mode.as_str(),
            result = label,
            elapsed_ms = elapsed.as_millis() as u64,
            diagnostic_bytes = outcome.diagnostic.as_ref().map_or(0, String::len),
            "Compile job finished"
        ),
        Err(err) => warn!(
            target = "application::compile::pipeline",
            op = "pipeline::render",
            mode = mode.as_str(),
            result = label,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %err,
            "Compile job aborted"
        ),
    }
    result
}
