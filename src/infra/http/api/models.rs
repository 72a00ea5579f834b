pub use rapid_typst_api_types::*;

use crate::application::templates::Template;
use crate::domain::entities::DocumentRecord;

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            icon: template.icon.to_string(),
            category: template.category.to_string(),
        }
    }
}

impl From<&Template> for TemplateResponse {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            icon: template.icon.to_string(),
            category: template.category.to_string(),
            content: template.content.to_string(),
        }
    }
}
