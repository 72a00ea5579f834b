use std::sync::Arc;

use crate::application::compile::RenderPipeline;
use crate::application::documents::DocumentService;
use crate::application::repos::HealthRepo;

/// Everything the API handlers need, built once at startup.
#[derive(Clone)]
pub struct ApiState {
    pub documents: Arc<DocumentService>,
    pub pipeline: Arc<RenderPipeline>,
    pub health: Arc<dyn HealthRepo>,
}
