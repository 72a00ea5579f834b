//! Application services: compile orchestration, document CRUD, templates.

pub mod compile;
pub mod documents;
pub mod error;
pub mod repos;
pub mod templates;
