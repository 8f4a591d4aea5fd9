use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        contest::{ContestListQuery, ContestSummary, CreateContestRequest, UpdateContestRequest},
        mode::ModeConfigResponse,
    },
    error::AppError,
    services::contest_service,
    state::SharedState,
};

/// Contest administration and lifecycle command endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/config/mode", get(get_mode_config))
        .route("/contests", get(list_contests).post(create_contest))
        .route(
            "/contests/{title}",
            get(get_contest).put(update_contest).delete(delete_contest),
        )
        .route("/contests/{title}/start", post(start_contest))
        .route("/contests/{title}/stop", post(stop_contest))
        .route("/contests/{title}/voting/start", post(start_voting))
        .route("/contests/{title}/voting/stop", post(stop_voting))
}

/// Deployment flags clients use to render the right forms.
#[utoipa::path(
    get,
    path = "/api/config/mode",
    tag = "config",
    params(("x-api-key" = Option<String>, Header, description = "API key, when one is configured")),
    responses((status = 200, description = "Mode flags", body = ModeConfigResponse))
)]
pub async fn get_mode_config(State(state): State<SharedState>) -> Json<ModeConfigResponse> {
    Json(contest_service::get_mode_config(&state))
}

/// List contests with their current phase.
#[utoipa::path(
    get,
    path = "/api/contests",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ContestListQuery
    ),
    responses((status = 200, description = "Contests", body = [ContestSummary]))
)]
pub async fn list_contests(
    State(state): State<SharedState>,
    Query(query): Query<ContestListQuery>,
) -> Result<Json<Vec<ContestSummary>>, AppError> {
    Ok(Json(
        contest_service::list_contests(&state, query.phase).await?,
    ))
}

/// Create a scheduled or manually controlled contest.
#[utoipa::path(
    post,
    path = "/api/contests",
    tag = "contests",
    params(("x-api-key" = Option<String>, Header, description = "API key, when one is configured")),
    request_body = CreateContestRequest,
    responses(
        (status = 201, description = "Contest created", body = ContestSummary),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Title already taken")
    )
)]
pub async fn create_contest(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateContestRequest>>,
) -> Result<(StatusCode, Json<ContestSummary>), AppError> {
    let contest = contest_service::create_contest(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(contest)))
}

/// Fetch one contest by title.
#[utoipa::path(
    get,
    path = "/api/contests/{title}",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses(
        (status = 200, description = "Contest", body = ContestSummary),
        (status = 404, description = "Unknown contest")
    )
)]
pub async fn get_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(contest_service::get_contest(&state, &title).await?))
}

/// Edit the description, or the window of a scheduled contest.
#[utoipa::path(
    put,
    path = "/api/contests/{title}",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    request_body = UpdateContestRequest,
    responses(
        (status = 200, description = "Contest updated", body = ContestSummary),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown contest")
    )
)]
pub async fn update_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateContestRequest>>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(
        contest_service::update_contest(&state, &title, payload).await?,
    ))
}

/// Delete a contest together with its entries and votes.
#[utoipa::path(
    delete,
    path = "/api/contests/{title}",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses(
        (status = 204, description = "Contest deleted"),
        (status = 404, description = "Unknown contest")
    )
)]
pub async fn delete_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<StatusCode, AppError> {
    contest_service::delete_contest(&state, &title).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/contests/{title}/start",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses(
        (status = 200, description = "Contest active", body = ContestSummary),
        (status = 422, description = "Contest is scheduled")
    )
)]
pub async fn start_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(contest_service::start_contest(&state, &title).await?))
}

#[utoipa::path(
    post,
    path = "/api/contests/{title}/stop",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses(
        (status = 200, description = "Contest ended", body = ContestSummary),
        (status = 422, description = "Contest is scheduled")
    )
)]
pub async fn stop_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(contest_service::stop_contest(&state, &title).await?))
}

/// Open voting; repeating the call keeps the first opening time.
#[utoipa::path(
    post,
    path = "/api/contests/{title}/voting/start",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses((status = 200, description = "Voting open", body = ContestSummary))
)]
pub async fn start_voting(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(contest_service::start_voting(&state, &title).await?))
}

#[utoipa::path(
    post,
    path = "/api/contests/{title}/voting/stop",
    tag = "contests",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses((status = 200, description = "Voting closed", body = ContestSummary))
)]
pub async fn stop_voting(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<ContestSummary>, AppError> {
    Ok(Json(contest_service::stop_voting(&state, &title).await?))
}
