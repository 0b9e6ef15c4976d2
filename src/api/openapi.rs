//! OpenAPI specification definition.
//!
//! Aggregates the documented route handlers and schemas.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication
        crate::routes::auth::login,
        crate::routes::auth::register,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        // Forms
        crate::routes::forms::list_forms,
        crate::routes::forms::get_form,
        crate::routes::forms::get_public_form,
        crate::routes::forms::get_form_lineage,
        crate::routes::forms::create_form,
        crate::routes::forms::update_form,
        crate::routes::forms::change_status,
        crate::routes::forms::duplicate_form,
        crate::routes::forms::delete_form,
        // Roles
        crate::routes::roles::list_roles,
        crate::routes::roles::get_role,
        crate::routes::roles::create_role,
        crate::routes::roles::update_role,
        crate::routes::roles::delete_role,
        crate::routes::roles::set_role_permissions,
        crate::routes::roles::add_role_permissions,
        crate::routes::roles::remove_role_permissions,
        crate::routes::roles::permission_catalog,
        crate::routes::roles::assign_roles,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::services::auth_service::RegisterRequest,
        crate::services::auth_service::LoginRequest,
        crate::routes::auth::LoginResponse,
        crate::models::UserProfile,
        crate::services::role_service::CreateRoleRequest,
        crate::services::role_service::UpdateRoleRequest,
        crate::routes::roles::RolePermissionsRequest,
        crate::routes::roles::AssignRolesRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, registration and session cookie"),
        (name = "Forms", description = "Form lifecycle, duplication and lineage"),
        (name = "Roles", description = "Roles and permissions"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Form Platform API",
        description = "REST API for building forms, collecting responses and exporting them"
    ),
    servers(
        (url = "http://localhost:8081/api/v1", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
        );
    }
}
