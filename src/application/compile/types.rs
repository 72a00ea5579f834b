use std::{io, path::Path, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::types::CompileMode;

use super::docx::DocxError;

pub const NOT_FOUND_MESSAGE: &str = "Typst CLI not found. Install it for live preview.";
pub const TIMEOUT_MESSAGE: &str = "Compilation timed out";
pub const FAILED_MESSAGE: &str = "Compilation failed";
pub const NO_OUTPUT_MESSAGE: &str = "No output generated";

/// Failure of a single compiler invocation.
///
/// Everything except [`InvokeError::Io`] describes a problem with the
/// submitted document or the compiler installation and is reported back to
/// the editor as a diagnostic. `Io` is a fault on our side.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("typst compiler binary not found")]
    NotFound,
    #[error("typst compiler exceeded {0:?}")]
    Timeout(Duration),
    #[error("typst compiler exited with {exit_code:?}: {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("typst compiler produced no output")]
    NoOutput,
    #[error("typst rejected the document: {diagnostic}")]
    Rejected { diagnostic: String },
    #[error("compiler i/o failure: {0}")]
    Io(#[from] io::Error),
}

impl InvokeError {
    /// Stable label used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            InvokeError::NotFound => "not_found",
            InvokeError::Timeout(_) => "timeout",
            InvokeError::ProcessFailed { .. } => "process_failed",
            InvokeError::NoOutput => "no_output",
            InvokeError::Rejected { .. } => "rejected",
            InvokeError::Io(_) => "io",
        }
    }

    /// Splits the error into the user-facing diagnostic, or hands back the
    /// underlying I/O error when there is nothing to show the user.
    pub fn into_diagnostic(self) -> Result<String, io::Error> {
        match self {
            InvokeError::NotFound => Ok(NOT_FOUND_MESSAGE.to_string()),
            InvokeError::Timeout(_) => Ok(TIMEOUT_MESSAGE.to_string()),
            InvokeError::NoOutput => Ok(NO_OUTPUT_MESSAGE.to_string()),
            InvokeError::ProcessFailed { stderr, .. } => Ok(non_blank_or_default(stderr)),
            InvokeError::Rejected { diagnostic } => Ok(non_blank_or_default(diagnostic)),
            InvokeError::Io(err) => Err(err),
        }
    }
}

fn non_blank_or_default(text: String) -> String {
    if text.trim().is_empty() {
        FAILED_MESSAGE.to_string()
    } else {
        text
    }
}

/// Internal faults that abort a compile job instead of producing an outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("scratch workspace failure: {0}")]
    Workspace(#[source] io::Error),
    #[error("compiler i/o failure: {0}")]
    Io(#[source] io::Error),
    #[error(transparent)]
    Docx(#[from] DocxError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Html(String),
    Bytes(Vec<u8>),
}

/// Normalized result of one compile job.
///
/// A failed outcome still carries a payload for preview jobs: the styled
/// error block the editor renders in place of the pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub mode: CompileMode,
    pub success: bool,
    pub payload: Option<Payload>,
    pub diagnostic: Option<String>,
}

impl CompileOutcome {
    pub fn succeeded(mode: CompileMode, payload: Payload) -> Self {
        Self {
            mode,
            success: true,
            payload: Some(payload),
            diagnostic: None,
        }
    }

    pub fn failed(mode: CompileMode, diagnostic: String, payload: Option<Payload>) -> Self {
        Self {
            mode,
            success: false,
            payload,
            diagnostic: Some(diagnostic),
        }
    }

    pub fn html(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Html(html)) => Some(html),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Some(Payload::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub(crate) fn result_label(&self) -> &'static str {
        if self.success { "success" } else { "failure" }
    }
}

/// Compiles a Typst source file into one SVG per page.
#[async_trait]
pub trait PageCompiler: Send + Sync {
    /// Returns the SVG text of every page, ordered by page number.
    /// `output_dir` is empty and exclusively owned by the caller's job.
    async fn compile_pages(&self, input: &Path, output_dir: &Path)
    -> Result<Vec<String>, InvokeError>;
}

/// Compiles a Typst source file into a single PDF document.
#[async_trait]
pub trait PdfCompiler: Send + Sync {
    async fn compile_pdf(&self, input: &Path) -> Result<Vec<u8>, InvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_process_stderr_falls_back_to_generic_message() {
        let err = InvokeError::ProcessFailed {
            exit_code: Some(1),
            stderr: "  \n".to_string(),
        };
        assert_eq!(err.into_diagnostic().unwrap(), FAILED_MESSAGE);
    }

    #[test]
    fn process_stderr_is_passed_through_verbatim() {
        let err = InvokeError::ProcessFailed {
            exit_code: Some(1),
            stderr: "error: unknown variable: foo".to_string(),
        };
        assert_eq!(
            err.into_diagnostic().unwrap(),
            "error: unknown variable: foo"
        );
    }

    #[test]
    fn environment_failures_map_to_fixed_messages() {
        assert_eq!(
            InvokeError::NotFound.into_diagnostic().unwrap(),
            NOT_FOUND_MESSAGE
        );
        assert_eq!(
            InvokeError::Timeout(Duration::from_secs(30))
                .into_diagnostic()
                .unwrap(),
            TIMEOUT_MESSAGE
        );
        assert_eq!(
            InvokeError::NoOutput.into_diagnostic().unwrap(),
            NO_OUTPUT_MESSAGE
        );
    }

    #[test]
    fn io_errors_are_not_diagnostics() {
        let err = InvokeError::Io(io::Error::other("disk full"));
        assert!(err.into_diagnostic().is_err());
    }
}
