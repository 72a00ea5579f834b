//! Exercises the real Typst toolchain. Run with
//! `cargo test --test live_typst -- --ignored` on a machine with `typst` on PATH.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use rapid_typst::application::compile::{
    RenderPipeline, TypstCli, TypstLibraryCompiler, Workspace,
};

fn live_pipeline(dir: &TempDir) -> RenderPipeline {
    let workspace = Workspace::create(dir.path().join("scratch")).expect("workspace");
    RenderPipeline::new(
        workspace,
        Arc::new(TypstCli::new("typst", Duration::from_secs(30))),
        Arc::new(TypstLibraryCompiler::load()),
    )
}

#[tokio::test]
#[ignore = "requires the typst CLI"]
async fn hello_world_preview_renders_svg() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = live_pipeline(&dir);

    let outcome = pipeline
        .render_preview("= Hello\n\nWorld")
        .await
        .expect("outcome");
    assert!(outcome.success, "{:?}", outcome.diagnostic);
    let html = outcome.html().expect("html");
    assert!(html.contains("<svg"));
    assert_eq!(html.matches("class=\"page\"").count(), 1);
}

#[tokio::test]
#[ignore = "loads system fonts"]
async fn library_pdf_export_produces_pdf_bytes() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = live_pipeline(&dir);

    let outcome = pipeline
        .render_pdf_export("= Hello\n\nWorld")
        .await
        .expect("outcome");
    assert!(outcome.success, "{:?}", outcome.diagnostic);
    assert!(outcome.bytes().expect("pdf").starts_with(b"%PDF"));
}

#[tokio::test]
#[ignore = "loads system fonts"]
async fn library_pdf_export_reports_diagnostics() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = live_pipeline(&dir);

    let outcome = pipeline
        .render_pdf_export("#undefined-function()")
        .await
        .expect("outcome");
    assert!(!outcome.success);
    assert!(
        outcome
            .diagnostic
            .as_deref()
            .is_some_and(|diag| diag.starts_with("error:"))
    );
}
