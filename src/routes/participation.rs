use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::participation::{
        EntrySummary, GateResponse, IdentityQuery, JoinRequest, VoteRequest, VoteSummary,
    },
    error::AppError,
    services::participation_service,
    state::SharedState,
};

/// Entry submission and voting endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/contests/{title}/entries",
            get(list_entries).post(join_contest),
        )
        .route("/contests/{title}/join", get(can_join))
        .route("/contests/{title}/votes", get(get_vote).post(cast_vote))
        .route("/contests/{title}/vote", get(can_vote))
}

/// Entries submitted to a contest, oldest first.
#[utoipa::path(
    get,
    path = "/api/contests/{title}/entries",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    responses(
        (status = 200, description = "Entries", body = [EntrySummary]),
        (status = 404, description = "Unknown contest")
    )
)]
pub async fn list_entries(
    State(state): State<SharedState>,
    Path(title): Path<String>,
) -> Result<Json<Vec<EntrySummary>>, AppError> {
    Ok(Json(
        participation_service::list_entries(&state, &title).await?,
    ))
}

/// Whether an identity may submit an entry right now.
#[utoipa::path(
    get,
    path = "/api/contests/{title}/join",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title"),
        IdentityQuery
    ),
    responses((status = 200, description = "Join eligibility", body = GateResponse))
)]
pub async fn can_join(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Query(query): Query<IdentityQuery>,
) -> Result<Json<GateResponse>, AppError> {
    Ok(Json(
        participation_service::can_join(&state, &title, &query.identity).await?,
    ))
}

/// Submit an entry.
#[utoipa::path(
    post,
    path = "/api/contests/{title}/entries",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    request_body = JoinRequest,
    responses(
        (status = 201, description = "Entry stored", body = EntrySummary),
        (status = 403, description = "Joining is not possible right now"),
        (status = 404, description = "Unknown contest"),
        (status = 409, description = "Identity already joined")
    )
)]
pub async fn join_contest(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<(StatusCode, Json<EntrySummary>), AppError> {
    let entry = participation_service::join(&state, &title, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Whether an identity may vote right now.
#[utoipa::path(
    get,
    path = "/api/contests/{title}/vote",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title"),
        IdentityQuery
    ),
    responses((status = 200, description = "Vote eligibility", body = GateResponse))
)]
pub async fn can_vote(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Query(query): Query<IdentityQuery>,
) -> Result<Json<GateResponse>, AppError> {
    Ok(Json(
        participation_service::can_vote(&state, &title, &query.identity).await?,
    ))
}

/// The vote an identity already cast, if any.
#[utoipa::path(
    get,
    path = "/api/contests/{title}/votes",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title"),
        IdentityQuery
    ),
    responses(
        (status = 200, description = "Vote cast by the identity", body = VoteSummary),
        (status = 400, description = "Malformed identity"),
        (status = 404, description = "Unknown contest or no vote from this identity")
    )
)]
pub async fn get_vote(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Query(query): Query<IdentityQuery>,
) -> Result<Json<VoteSummary>, AppError> {
    Ok(Json(
        participation_service::get_vote(&state, &title, &query.identity).await?,
    ))
}

/// Vote for one entry of the contest.
#[utoipa::path(
    post,
    path = "/api/contests/{title}/votes",
    tag = "participation",
    params(
        ("x-api-key" = Option<String>, Header, description = "API key, when one is configured"),
        ("title" = String, Path, description = "Contest title")
    ),
    request_body = VoteRequest,
    responses(
        (status = 201, description = "Vote stored", body = VoteSummary),
        (status = 403, description = "Voting is closed"),
        (status = 404, description = "Unknown contest or photo"),
        (status = 409, description = "Identity already voted")
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Valid(Json(payload)): Valid<Json<VoteRequest>>,
) -> Result<(StatusCode, Json<VoteSummary>), AppError> {
    let vote = participation_service::vote(&state, &title, payload).await?;
    Ok((StatusCode::CREATED, Json(vote)))
}
