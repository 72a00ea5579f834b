use std::{path::Path, sync::Arc, time::Instant};

use async_trait::async_trait;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};
use typst::{
    Library, World,
    diag::{FileError, FileResult, SourceDiagnostic, Warned},
    foundations::{Bytes, Datetime},
    layout::PagedDocument,
    syntax::{FileId, Source},
    text::{Font, FontBook},
    utils::LazyHash,
};
use typst_kit::fonts::{FontSearcher, FontSlot};
use typst_pdf::PdfOptions;

use super::types::{InvokeError, PdfCompiler};

/// Standard library and font set shared by every in-process compile.
struct TypstEngine {
    library: LazyHash<Library>,
    book: LazyHash<FontBook>,
    fonts: Vec<FontSlot>,
}

/// Compiles PDFs through the embedded Typst library.
///
/// Font discovery scans the system font directories and can take a while.
/// [`TypstLibraryCompiler::load`] does it up front and must run in a blocking
/// context; [`TypstLibraryCompiler::lazy`] defers it to the first PDF compile.
/// Compiles are serialized through an async mutex and executed on the
/// blocking pool.
pub struct TypstLibraryCompiler {
    engine: OnceCell<Arc<TypstEngine>>,
    gate: Mutex<()>,
}

impl TypstLibraryCompiler {
    pub fn load() -> Self {
        Self {
            engine: OnceCell::new_with(Some(Arc::new(TypstEngine::load()))),
            gate: Mutex::new(()),
        }
    }

    pub fn lazy() -> Self {
        Self {
            engine: OnceCell::new(),
            gate: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<Arc<TypstEngine>, InvokeError> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                tokio::task::spawn_blocking(|| Arc::new(TypstEngine::load()))
                    .await
                    .map_err(|err| InvokeError::Io(std::io::Error::other(err)))
            })
            .await?;
        Ok(Arc::clone(engine))
    }
}

impl TypstEngine {
    fn load() -> Self {
        let started_at = Instant::now();
        let fonts = FontSearcher::new().search();
        let font_count = fonts.fonts.len();
        let engine = TypstEngine {
            library: LazyHash::new(Library::builder().build()),
            book: LazyHash::new(fonts.book),
            fonts: fonts.fonts,
        };
        info!(
            target = "application::compile::library",
            op = "typst_library::load",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            fonts = font_count,
            "Typst library initialized"
        );
        engine
    }
}

#[async_trait]
impl PdfCompiler for TypstLibraryCompiler {
    async fn compile_pdf(&self, input: &Path) -> Result<Vec<u8>, InvokeError> {
        let markup = tokio::fs::read_to_string(input).await?;
        let _guard = self.gate.lock().await;
        let engine = self.engine().await?;

        let started_at = Instant::now();
        let result = tokio::task::spawn_blocking(move || compile_to_pdf(&engine, markup))
            .await
            .map_err(|err| InvokeError::Io(std::io::Error::other(err)))?;

        match &result {
            Ok(pdf) => info!(
                target = "application::compile::library",
                op = "typst_library::compile_pdf",
                result = "success",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                pdf_bytes = pdf.len(),
                "Typst document compiled to PDF"
            ),
            Err(err) => warn!(
                target = "application::compile::library",
                op = "typst_library::compile_pdf",
                result = "rejected",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %err,
                "Typst rejected the document"
            ),
        }
        result
    }
}

fn compile_to_pdf(engine: &TypstEngine, markup: String) -> Result<Vec<u8>, InvokeError> {
    let world = DetachedWorld {
        engine,
        main: Source::detached(markup),
        now: OffsetDateTime::now_utc(),
    };

    let Warned { output, .. } = typst::compile::<PagedDocument>(&world);
    let document = output.map_err(|errors| InvokeError::Rejected {
        diagnostic: render_diagnostics(&errors),
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| InvokeError::Rejected {
        diagnostic: render_diagnostics(&errors),
    })
}

/// One `error:` line per diagnostic, each followed by its `hint:` lines.
fn render_diagnostics(errors: &[SourceDiagnostic]) -> String {
    let mut lines = Vec::new();
    for diagnostic in errors {
        lines.push(format!("error: {}", diagnostic.message));
        lines.extend(diagnostic.hints.iter().map(|hint| format!("  hint: {hint}")));
    }
    lines.join("\n")
}

/// A world holding a single in-memory source file. Imports of other files
/// and packages are not resolvable.
struct DetachedWorld<'a> {
    engine: &'a TypstEngine,
    main: Source,
    now: OffsetDateTime,
}

impl World for DetachedWorld<'_> {
    fn library(&self) -> &LazyHash<Library> {
        &self.engine.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.engine.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.engine.fonts.get(index)?.get()
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let now = match offset {
            Some(hours) => {
                let offset = UtcOffset::from_hms(i8::try_from(hours).ok()?, 0, 0).ok()?;
                self.now.to_offset(offset)
            }
            None => self.now,
        };
        Datetime::from_ymd(now.year(), u8::from(now.month()), now.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typst::syntax::Span;

    #[test]
    fn diagnostics_keep_hints_under_their_error() {
        let errors = [
            SourceDiagnostic::error(Span::detached(), "unknown variable: ab")
                .with_hint("if you meant to display multiple letters as is, try adding spaces"),
            SourceDiagnostic::error(Span::detached(), "expected expression"),
        ];

        assert_eq!(
            render_diagnostics(&errors),
            "error: unknown variable: ab\n  \
             hint: if you meant to display multiple letters as is, try adding spaces\n\
             error: expected expression"
        );
    }

    #[test]
    fn lazy_compiler_defers_font_discovery() {
        assert!(!TypstLibraryCompiler::lazy().is_loaded());
    }
}
