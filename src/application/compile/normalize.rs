use rapid_typst_api_types::CompileResponse;

use crate::domain::types::ExportFormat;

use super::types::{CompileOutcome, FAILED_MESSAGE, NO_OUTPUT_MESSAGE, Payload};

impl From<CompileOutcome> for CompileResponse {
    fn from(outcome: CompileOutcome) -> Self {
        let html = match outcome.payload {
            Some(Payload::Html(html)) => Some(html),
            _ => None,
        };
        CompileResponse {
            success: outcome.success,
            html,
            error: outcome.diagnostic,
        }
    }
}

/// A successful export ready to be sent as a file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Converts an export outcome into a downloadable artifact, or returns
    /// the diagnostic explaining why there is none.
    pub fn from_outcome(format: ExportFormat, outcome: CompileOutcome) -> Result<Self, String> {
        if !outcome.success {
            return Err(outcome
                .diagnostic
                .unwrap_or_else(|| FAILED_MESSAGE.to_string()));
        }
        let bytes = match outcome.payload {
            Some(Payload::Bytes(bytes)) => bytes,
            Some(Payload::Html(html)) => html.into_bytes(),
            None => return Err(NO_OUTPUT_MESSAGE.to_string()),
        };
        Ok(Self { format, bytes })
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn filename(&self) -> &'static str {
        self.format.filename()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CompileMode;

    #[test]
    fn successful_preview_maps_to_html_response() {
        let outcome =
            CompileOutcome::succeeded(CompileMode::Preview, Payload::Html("<div/>".to_string()));
        let response = CompileResponse::from(outcome);
        assert!(response.success);
        assert_eq!(response.html.as_deref(), Some("<div/>"));
        assert_eq!(response.error, None);
    }

    #[test]
    fn failed_preview_keeps_error_block_and_diagnostic() {
        let outcome = CompileOutcome::failed(
            CompileMode::Preview,
            "error: boom".to_string(),
            Some(Payload::Html("<div>err</div>".to_string())),
        );
        let response = CompileResponse::from(outcome);
        assert!(!response.success);
        assert_eq!(response.html.as_deref(), Some("<div>err</div>"));
        assert_eq!(response.error.as_deref(), Some("error: boom"));
    }

    #[test]
    fn export_artifact_requires_success() {
        let failed =
            CompileOutcome::failed(CompileMode::Pdf, "error: boom".to_string(), None);
        assert_eq!(
            ExportArtifact::from_outcome(ExportFormat::Pdf, failed),
            Err("error: boom".to_string())
        );

        let ok = CompileOutcome::succeeded(CompileMode::Pdf, Payload::Bytes(b"%PDF".to_vec()));
        let artifact = ExportArtifact::from_outcome(ExportFormat::Pdf, ok).expect("artifact");
        assert_eq!(artifact.content_type(), "application/pdf");
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"document.pdf\""
        );
    }
}
