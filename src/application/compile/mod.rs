//! Compile-and-export orchestration.
//!
//! Untrusted Typst markup goes in; a live-preview fragment or a downloadable
//! file comes out. The compiler itself is an external dependency reached
//! either in-process ([`TypstLibraryCompiler`]) or as a supervised CLI
//! subprocess ([`TypstCli`]). This module owns everything around that call:
//! per-job scratch space, timeouts, output discovery and turning compiler
//! failures into structured [`CompileOutcome`]s.

mod docx;
mod invoker;
mod library;
mod markup;
mod normalize;
mod pipeline;
mod types;
mod workspace;

pub use docx::{DocxError, build_source_docx};
pub use invoker::{DEFAULT_PAGE_PATTERN, DEFAULT_TIMEOUT, TypstCli};
pub use library::TypstLibraryCompiler;
pub use markup::PREVIEW_PLACEHOLDER;
pub use normalize::ExportArtifact;
pub use pipeline::RenderPipeline;
pub use types::{
    CompileOutcome, FAILED_MESSAGE, InvokeError, NO_OUTPUT_MESSAGE, NOT_FOUND_MESSAGE,
    PageCompiler, Payload, PdfCompiler, PipelineError, TIMEOUT_MESSAGE,
};
pub use workspace::{ScratchHandle, ScratchLayout, Workspace};
