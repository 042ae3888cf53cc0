//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the journey-export API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the journey-export API
///
/// Served as JSON at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "journey-export API",
        description = "Resolves, triggers and relays the daily journey export of the fleet platform",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    paths(
        crate::api::routes::journey_export,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::error::ApiError,
            crate::api::routes::HealthResponse,
        )
    ),
    tags(
        (name = "export", description = "Journey export download"),
        (name = "system", description = "Health and API metadata")
    )
)]
pub struct ApiDoc;
