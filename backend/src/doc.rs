//! OpenAPI document assembly.

use utoipa::OpenApi;

/// Aggregated OpenAPI description of the registrar API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::prune_class_refs,
        crate::inbound::http::classes::list_classes,
        crate::inbound::http::classes::create_class,
        crate::inbound::http::classes::update_class,
        crate::inbound::http::classes::delete_class,
        crate::inbound::http::classes::enroll,
        crate::inbound::http::classes::withdraw,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::ClassSpec,
        crate::domain::Role,
        crate::inbound::http::classes::ClassResponse,
        crate::inbound::http::users::LoginRequest,
        crate::inbound::http::users::PrunedRefsResponse,
        crate::inbound::http::users::RegisterRequest,
        crate::inbound::http::users::UserResponse,
        crate::inbound::http::error::ErrorBody,
    )),
    tags(
        (name = "classes", description = "Class lifecycle and enrollment"),
        (name = "users", description = "Accounts and sessions"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;
