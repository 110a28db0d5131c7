use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::routes::AppState;
use crate::domain::team::team::MAX_NAME_LENGTH;
use crate::domain::team::{Team, TeamType};

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub domain: String,
    pub email: String,
    #[serde(rename = "type")]
    pub team_type: TeamType,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub allowed_domains: String,
}

/// Request body for updating a team
///
/// The domain is not part of the body: it cannot change after creation.
#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub team_type: TeamType,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub allowed_domains: String,
}

/// Request body for renaming a team
#[derive(Debug, Deserialize)]
pub struct UpdateTeamNameRequest {
    pub name: String,
}

/// Response from a rename or delete
#[derive(Debug, Serialize)]
pub struct TeamIdResponse {
    pub id: String,
}

/// Create a new team
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let mut team = Team::new(req.name, req.domain, req.email, req.team_type);
    team.company_name = req.company_name;
    team.allowed_domains = req.allowed_domains;

    let team = state.store.team().save(team).await?;

    tracing::info!(team_id = %team.id, domain = %team.domain, "Team created");

    Ok((StatusCode::CREATED, Json(team)))
}

/// Get all teams
///
/// GET /api/teams
pub async fn get_all_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>, ApiError> {
    let teams = state.store.team().get_all().await?;

    Ok(Json(teams))
}

/// Get a team by ID
///
/// GET /api/teams/:id
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Team>, ApiError> {
    let team = state.store.team().get(id).await?;

    Ok(Json(team))
}

/// Update a team's settings
///
/// PUT /api/teams/:id
pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<Team>, ApiError> {
    let teams = state.store.team();

    let mut team = teams.get(id).await?;
    team.name = req.name;
    team.email = req.email;
    team.team_type = req.team_type;
    team.company_name = req.company_name;
    team.allowed_domains = req.allowed_domains;

    let team = teams.update(team).await?;

    Ok(Json(team))
}

/// Rename a team
///
/// PUT /api/teams/:id/name
pub async fn update_team_name(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTeamNameRequest>,
) -> Result<Json<TeamIdResponse>, ApiError> {
    let length = req.name.chars().count();
    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Team name must be between 1 and {} characters",
            MAX_NAME_LENGTH
        )));
    }

    let id = state.store.team().update_name(req.name, id).await?;

    Ok(Json(TeamIdResponse { id }))
}

/// Get the team registered under a domain
///
/// GET /api/teams/domain/:domain
pub async fn get_team_by_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Team>, ApiError> {
    let team = state.store.team().get_by_domain(domain).await?;

    Ok(Json(team))
}

/// Get every team a user email belongs to
///
/// GET /api/teams/email/:email
pub async fn get_teams_for_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Team>>, ApiError> {
    let teams = state.store.team().get_teams_for_email(email).await?;

    Ok(Json(teams))
}

/// Permanently delete a team
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = state.store.team().permanent_delete(id).await?;

    tracing::info!(team_id = %id, "Team deleted");

    Ok(StatusCode::NO_CONTENT)
}
