//! Shared domain enumerations for compile jobs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// What a single compile job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompileMode {
    Preview,
    Pdf,
    HtmlExport,
    DocxExport,
    SvgExport,
}

impl CompileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompileMode::Preview => "preview",
            CompileMode::Pdf => "pdf",
            CompileMode::HtmlExport => "html-export",
            CompileMode::DocxExport => "docx-export",
            CompileMode::SvgExport => "svg-export",
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloadable export formats, one per `/api/export/{format}` route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Html,
    Docx,
    Svg,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Docx => "docx",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "document.pdf",
            ExportFormat::Html => "document.html",
            ExportFormat::Docx => "document.docx",
            ExportFormat::Svg => "document.svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            "docx" => Ok(ExportFormat::Docx),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(DomainError::validation(format!(
                "unsupported export format `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!(" docx ".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("odt".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn export_formats_map_to_attachment_names() {
        assert_eq!(ExportFormat::Pdf.filename(), "document.pdf");
        assert_eq!(ExportFormat::Html.filename(), "document.html");
        assert_eq!(ExportFormat::Docx.filename(), "document.docx");
    }
}
