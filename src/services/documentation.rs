use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Registers the `x-api-key` header scheme guarding `/api` routes.
struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            );
        }
    }
}

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Photo Contest Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::contests::get_mode_config,
        crate::routes::contests::list_contests,
        crate::routes::contests::create_contest,
        crate::routes::contests::get_contest,
        crate::routes::contests::update_contest,
        crate::routes::contests::delete_contest,
        crate::routes::contests::start_contest,
        crate::routes::contests::stop_contest,
        crate::routes::contests::start_voting,
        crate::routes::contests::stop_voting,
        crate::routes::participation::list_entries,
        crate::routes::participation::can_join,
        crate::routes::participation::join_contest,
        crate::routes::participation::can_vote,
        crate::routes::participation::get_vote,
        crate::routes::participation::cast_vote,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::mode::ModeConfigResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::phase::ControlModeDto,
            crate::dto::contest::CreateContestRequest,
            crate::dto::contest::UpdateContestRequest,
            crate::dto::contest::ContestSummary,
            crate::dto::participation::JoinRequest,
            crate::dto::participation::VoteRequest,
            crate::dto::participation::GateResponse,
            crate::dto::participation::EntrySummary,
            crate::dto::participation::VoteSummary,
        )
    ),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "config", description = "Deployment mode flags"),
        (name = "contests", description = "Contest administration and lifecycle commands"),
        (name = "participation", description = "Entries, votes and their eligibility checks"),
    )
)]
/// OpenAPI document for the whole service.
pub struct ApiDoc;
