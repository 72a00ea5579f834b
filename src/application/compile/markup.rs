//! HTML fragments returned to the editor and the standalone export shell.

use quick_xml::escape::escape;

/// Shown instead of compiling when the buffer is empty or whitespace.
pub const PREVIEW_PLACEHOLDER: &str = r#"<div style="color: #71717A; padding: 40px; text-align: center;">Start typing Typst markup to see preview...</div>"#;

const CONTAINER_OPEN: &str = r#"<div style="display: flex; flex-direction: column; gap: 20px; padding: 20px; background: white;">"#;
const PAGE_OPEN: &str =
    r#"<div class="page" style="box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 10px; background: white;">"#;

const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Typst Document</title>
<style>
body { margin: 0; padding: 20px; background: #f4f4f5; font-family: system-ui, sans-serif; }
.page { max-width: 800px; margin: 0 auto; padding: 20px; background: white; }
.page svg { width: 100%; height: auto; }
</style>
</head>
<body>
"#;
const DOCUMENT_TAIL: &str = "\n</body>\n</html>\n";

/// Vertical stack of page boxes, one per SVG page, in page order.
pub(crate) fn page_stack(pages: &[String]) -> String {
    let capacity = pages.iter().map(String::len).sum::<usize>()
        + pages.len() * (PAGE_OPEN.len() + 6)
        + CONTAINER_OPEN.len()
        + 6;
    let mut html = String::with_capacity(capacity);
    html.push_str(CONTAINER_OPEN);
    for page in pages {
        html.push_str(PAGE_OPEN);
        html.push_str(page);
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

/// Styled error block. The diagnostic is escaped; compiler output echoes
/// user markup and must not be interpreted as HTML.
pub(crate) fn error_block(diagnostic: &str) -> String {
    format!(
        concat!(
            r#"<div style="padding: 20px; background: #FEF2F2; border: 1px solid #FECACA; border-radius: 4px; margin: 20px;">"#,
            r#"<div style="color: #DC2626; font-weight: 600; margin-bottom: 8px;">Compilation Error</div>"#,
            r#"<pre style="color: #991B1B; font-size: 13px; white-space: pre-wrap; margin: 0; font-family: 'JetBrains Mono', monospace;">{}</pre>"#,
            "</div>"
        ),
        escape(diagnostic)
    )
}

/// Complete HTML document wrapping the page stack.
pub(crate) fn standalone_document(pages: &[String]) -> String {
    let body = page_stack(pages);
    let mut html = String::with_capacity(DOCUMENT_HEAD.len() + body.len() + DOCUMENT_TAIL.len());
    html.push_str(DOCUMENT_HEAD);
    html.push_str(&body);
    html.push_str(DOCUMENT_TAIL);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("<svg>p{n}</svg>")).collect()
    }

    #[test]
    fn page_stack_wraps_each_page_in_order() {
        let html = page_stack(&pages(3));
        assert!(html.starts_with(CONTAINER_OPEN));
        assert_eq!(html.matches(r#"class="page""#).count(), 3);
        let first = html.find("p1").expect("p1");
        let second = html.find("p2").expect("p2");
        let third = html.find("p3").expect("p3");
        assert!(first < second && second < third);
    }

    #[test]
    fn error_block_escapes_diagnostic() {
        let html = error_block("error: unexpected <script>alert(1)</script> & more");
        assert!(html.contains("Compilation Error"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn standalone_document_is_complete() {
        let html = standalone_document(&pages(2));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Typst Document</title>"));
        assert!(html.contains(r#"<meta charset="UTF-8">"#));
        assert_eq!(html.matches(r#"class="page""#).count(), 2);
        assert!(html.trim_end().ends_with("</html>"));
    }
}
