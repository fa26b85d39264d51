pub mod task;

use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use utoipa::OpenApi;

pub use task::*;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(Task, NewTask, TaskPatch, ExtraInfo, ValidationErrorSchema),
        responses(BasicErrorResponse)
    )
)]
/// Captures OpenAPI schemas and canned responses for the API
pub struct OpenApiSchemas;
