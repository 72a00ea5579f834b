//! Starter documents offered by the editor's template gallery.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Icon name understood by the editor front-end.
    pub icon: &'static str,
    pub category: &'static str,
    pub content: &'static str,
}

const TEMPLATES: &[Template] = &[
    Template {
        id: "blank",
        name: "Blank Document",
        description: "Start with a clean slate",
        icon: "FileText",
        category: "Basic",
        content: include_str!("../../templates/blank.typ"),
    },
    Template {
        id: "basic",
        name: "Basic Document",
        description: "Simple document with headings, lists, and text formatting",
        icon: "BookOpen",
        category: "Basic",
        content: include_str!("../../templates/basic.typ"),
    },
    Template {
        id: "resume",
        name: "Resume / CV",
        description: "Professional resume template",
        icon: "Briefcase",
        category: "Professional",
        content: include_str!("../../templates/resume.typ"),
    },
    Template {
        id: "academic",
        name: "Academic Paper",
        description: "Research paper format",
        icon: "GraduationCap",
        category: "Academic",
        content: include_str!("../../templates/academic.typ"),
    },
    Template {
        id: "letter",
        name: "Formal Letter",
        description: "Business or formal letter template",
        icon: "Mail",
        category: "Professional",
        content: include_str!("../../templates/letter.typ"),
    },
    Template {
        id: "report",
        name: "Business Report",
        description: "Professional report with executive summary",
        icon: "FileBarChart",
        category: "Professional",
        content: include_str!("../../templates/report.typ"),
    },
    Template {
        id: "math",
        name: "Math Notes",
        description: "Mathematics document with equations",
        icon: "Calculator",
        category: "Academic",
        content: include_str!("../../templates/math.typ"),
    },
    Template {
        id: "code-docs",
        name: "Code Documentation",
        description: "Technical documentation for code projects",
        icon: "Code",
        category: "Technical",
        content: include_str!("../../templates/code-docs.typ"),
    },
];

pub fn all() -> &'static [Template] {
    TEMPLATES
}

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|template| template.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn template_ids_are_unique() {
        let ids: HashSet<_> = all().iter().map(|template| template.id).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn every_template_but_blank_has_content() {
        for template in all().iter().filter(|template| template.id != "blank") {
            assert!(
                !template.content.trim().is_empty(),
                "{} is empty",
                template.id
            );
        }
    }

    #[test]
    fn find_by_id() {
        assert_eq!(find("math").map(|template| template.name), Some("Math Notes"));
        assert!(find("missing").is_none());
    }
}
