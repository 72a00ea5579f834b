//! Backend for a Typst markup editor: stored documents, live SVG preview and
//! PDF/HTML/DOCX/SVG export.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
