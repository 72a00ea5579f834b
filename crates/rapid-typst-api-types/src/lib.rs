//! Request and response bodies exchanged with the rapid-typst HTTP API.
//!
//! The server and any Rust client share these types so the wire contract is
//! defined in exactly one place.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /api/compile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub content: String,
}

/// Live-preview result. `html` carries either the rendered pages, the
/// placeholder for an empty buffer, or a styled error block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the `POST /api/export/{format}` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub content: String,
    /// Redundant with the route; rejected when it names another format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreateRequest {
    pub title: String,
    pub content: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Template listing entry; the gallery fetches content lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn compile_response_omits_absent_fields() {
        let response = CompileResponse {
            success: true,
            html: Some("<div></div>".to_string()),
            error: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn document_timestamps_are_rfc3339() {
        let response = DocumentResponse {
            id: Uuid::nil(),
            title: "Notes".to_string(),
            content: "= Notes".to_string(),
            created_at: datetime!(2024-05-01 10:30:00 UTC),
            updated_at: datetime!(2024-05-02 08:00:00 UTC),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["created_at"], "2024-05-01T10:30:00Z");
        assert_eq!(json["updated_at"], "2024-05-02T08:00:00Z");
    }

    #[test]
    fn export_request_format_is_optional() {
        let request: ExportRequest =
            serde_json::from_str(r#"{"content":"= Hi"}"#).expect("deserialize");
        assert_eq!(request.format, None);
    }
}
