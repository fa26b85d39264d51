use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Planner API",
    description = "Create, list, update and delete dated tasks for the planner frontend"
))]
struct PlannerApi;

/// Path the OpenAPI document is served from
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Merges the OpenAPI definitions spread across the app, such as the [dto] schemas and the
/// [task][super::task] endpoints, into one document
pub fn api_document() -> utoipa::openapi::OpenApi {
    let mut api_docs = PlannerApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::task::TaskApi::openapi());

    api_docs
}

/// Constructs the route on the API that renders the swagger UI and returns the OpenAPI schema
pub fn build_documentation() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, api_document())
}
