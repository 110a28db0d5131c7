use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

use crate::domain::errors::AppError;
use crate::domain::repositories::{SchemaMaintenance, StoreChannel, StoreResult, TeamStore};
use crate::domain::team::Team;
use crate::infrastructure::schema::TEAMS_DOMAIN_CONSTRAINT;
use crate::infrastructure::sql_store::SqlConnections;

const SAVE: &str = "SqlTeamStore.Save";
const UPDATE: &str = "SqlTeamStore.Update";
const UPDATE_NAME: &str = "SqlTeamStore.UpdateName";
const GET: &str = "SqlTeamStore.Get";
const GET_BY_DOMAIN: &str = "SqlTeamStore.GetByDomain";
const GET_TEAMS_FOR_EMAIL: &str = "SqlTeamStore.GetTeamsForEmail";
const GET_ALL: &str = "SqlTeamStore.GetAll";
const PERMANENT_DELETE: &str = "SqlTeamStore.PermanentDelete";

/// Row shape of the `teams` table
#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: String,
    create_at: i64,
    update_at: i64,
    delete_at: i64,
    name: String,
    domain: String,
    email: String,
    #[sqlx(rename = "type")]
    team_type: String,
    company_name: String,
    allowed_domains: String,
}

impl TeamRow {
    fn into_team(self, location: &str) -> StoreResult<Team> {
        let team_type = self.team_type.parse().map_err(|e: String| {
            AppError::internal(location, "We found a team with an unknown type", format!("id={}, {}", self.id, e))
        })?;

        Ok(Team {
            id: self.id,
            create_at: self.create_at,
            update_at: self.update_at,
            delete_at: self.delete_at,
            name: self.name,
            domain: self.domain,
            email: self.email,
            team_type,
            company_name: self.company_name,
            allowed_domains: self.allowed_domains,
        })
    }
}

/// PostgreSQL implementation of [`TeamStore`]
///
/// Each operation runs on its own task. Writes and the read-before-write in
/// `update` use the master; plain reads use a replica.
#[derive(Clone)]
pub struct SqlTeamStore {
    conns: Arc<SqlConnections>,
}

impl SqlTeamStore {
    /// Creates a new SqlTeamStore
    ///
    /// # Arguments
    /// * `conns` - Master and replica pools shared with the other stores
    pub fn new(conns: Arc<SqlConnections>) -> Self {
        Self { conns }
    }
}

impl TeamStore for SqlTeamStore {
    fn save(&self, team: Team) -> StoreChannel<Team> {
        StoreChannel::spawn(SAVE, save_team(Arc::clone(&self.conns), team))
    }

    fn update(&self, team: Team) -> StoreChannel<Team> {
        StoreChannel::spawn(UPDATE, update_team(Arc::clone(&self.conns), team))
    }

    fn update_name(&self, name: String, team_id: String) -> StoreChannel<String> {
        StoreChannel::spawn(UPDATE_NAME, update_team_name(Arc::clone(&self.conns), name, team_id))
    }

    fn get(&self, id: String) -> StoreChannel<Team> {
        StoreChannel::spawn(GET, get_team(Arc::clone(&self.conns), id))
    }

    fn get_by_domain(&self, domain: String) -> StoreChannel<Team> {
        StoreChannel::spawn(GET_BY_DOMAIN, get_team_by_domain(Arc::clone(&self.conns), domain))
    }

    fn get_teams_for_email(&self, email: String) -> StoreChannel<Vec<Team>> {
        StoreChannel::spawn(GET_TEAMS_FOR_EMAIL, get_teams_for_email(Arc::clone(&self.conns), email))
    }

    fn get_all(&self) -> StoreChannel<Vec<Team>> {
        StoreChannel::spawn(GET_ALL, get_all_teams(Arc::clone(&self.conns)))
    }

    fn permanent_delete(&self, id: String) -> StoreChannel<String> {
        StoreChannel::spawn(PERMANENT_DELETE, delete_team(Arc::clone(&self.conns), id))
    }
}

async fn save_team(conns: Arc<SqlConnections>, mut team: Team) -> StoreResult<Team> {
    if !team.id.is_empty() {
        return Err(AppError::invalid(
            SAVE,
            "Must call update for existing team",
            format!("id={}", team.id),
        ));
    }

    team.pre_save();
    team.is_valid()?;

    bind_team(
        sqlx::query(
            r#"
            INSERT INTO teams (
                id, create_at, update_at, delete_at, name, domain,
                email, type, company_name, allowed_domains
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        ),
        &team,
    )
    .execute(conns.get_master())
    .await
    .map_err(|e| save_error(&team.id, &e))?;

    Ok(team)
}

async fn update_team(conns: Arc<SqlConnections>, mut team: Team) -> StoreResult<Team> {
    team.pre_update();
    team.is_valid()?;

    let master = conns.get_master();

    let old = fetch_by_id(master, &team.id)
        .await
        .map_err(|e| {
            driver_error(UPDATE, "We encountered an error finding the team", format!("id={}", team.id), &e)
        })?
        .ok_or_else(|| {
            AppError::not_found(
                UPDATE,
                "We couldn't find the existing team to update",
                format!("id={}", team.id),
            )
        })?;

    // Creation time and domain are fixed once a team exists
    team.create_at = old.create_at;
    team.domain = old.domain;

    let result = bind_team(
        sqlx::query(
            r#"
            UPDATE teams SET
                create_at = $2,
                update_at = $3,
                delete_at = $4,
                name = $5,
                domain = $6,
                email = $7,
                type = $8,
                company_name = $9,
                allowed_domains = $10
            WHERE id = $1
            "#,
        ),
        &team,
    )
    .execute(master)
    .await
    .map_err(|e| {
        driver_error(UPDATE, "We encountered an error updating the team", format!("id={}", team.id), &e)
    })?;

    if result.rows_affected() != 1 {
        return Err(AppError::internal(
            UPDATE,
            "We couldn't update the team",
            format!("id={}", team.id),
        ));
    }

    Ok(team)
}

async fn update_team_name(
    conns: Arc<SqlConnections>,
    name: String,
    team_id: String,
) -> StoreResult<String> {
    sqlx::query("UPDATE teams SET name = $1 WHERE id = $2")
        .bind(&name)
        .bind(&team_id)
        .execute(conns.get_master())
        .await
        .map_err(|e| {
            driver_error(UPDATE_NAME, "We couldn't update the team name", format!("team_id={}", team_id), &e)
        })?;

    Ok(team_id)
}

async fn get_team(conns: Arc<SqlConnections>, id: String) -> StoreResult<Team> {
    fetch_by_id(conns.get_replica(), &id)
        .await
        .map_err(|e| driver_error(GET, "We encountered an error finding the team", format!("id={}", id), &e))?
        .ok_or_else(|| AppError::not_found(GET, "We couldn't find the existing team", format!("id={}", id)))
}

async fn get_team_by_domain(conns: Arc<SqlConnections>, domain: String) -> StoreResult<Team> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, create_at, update_at, delete_at, name, domain,
               email, type, company_name, allowed_domains
        FROM teams
        WHERE domain = $1
        "#,
    )
    .bind(&domain)
    .fetch_optional(conns.get_replica())
    .await
    .map_err(|e| {
        driver_error(GET_BY_DOMAIN, "We couldn't find the existing team", format!("domain={}", domain), &e)
    })?;

    match row {
        Some(row) => row.into_team(GET_BY_DOMAIN),
        None => Err(AppError::not_found(
            GET_BY_DOMAIN,
            "We couldn't find the existing team",
            format!("domain={}", domain),
        )),
    }
}

async fn get_teams_for_email(conns: Arc<SqlConnections>, email: String) -> StoreResult<Vec<Team>> {
    let rows = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT teams.id, teams.create_at, teams.update_at, teams.delete_at,
               teams.name, teams.domain, teams.email, teams.type,
               teams.company_name, teams.allowed_domains
        FROM teams
        JOIN users ON teams.id = users.team_id
        WHERE users.email = $1
        ORDER BY teams.name
        "#,
    )
    .bind(&email)
    .fetch_all(conns.get_replica())
    .await
    .map_err(|e| {
        driver_error(
            GET_TEAMS_FOR_EMAIL,
            "We encountered a problem when looking up teams",
            format!("email={}", email),
            &e,
        )
    })?;

    rows.into_iter()
        .map(|row| row.into_team(GET_TEAMS_FOR_EMAIL))
        .collect()
}

async fn get_all_teams(conns: Arc<SqlConnections>) -> StoreResult<Vec<Team>> {
    let rows = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, create_at, update_at, delete_at, name, domain,
               email, type, company_name, allowed_domains
        FROM teams
        ORDER BY name
        "#,
    )
    .fetch_all(conns.get_replica())
    .await
    .map_err(|e| driver_error(GET_ALL, "We couldn't get all teams", String::new(), &e))?;

    rows.into_iter().map(|row| row.into_team(GET_ALL)).collect()
}

async fn delete_team(conns: Arc<SqlConnections>, id: String) -> StoreResult<String> {
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(&id)
        .execute(conns.get_master())
        .await
        .map_err(|e| {
            driver_error(PERMANENT_DELETE, "We couldn't delete the team", format!("id={}", id), &e)
        })?;

    Ok(id)
}

#[async_trait]
impl SchemaMaintenance for SqlTeamStore {
    async fn upgrade_schema_if_needed(&self) -> StoreResult<()> {
        sqlx::query(
            "ALTER TABLE teams ADD COLUMN IF NOT EXISTS allowed_domains VARCHAR(500) NOT NULL DEFAULT ''",
        )
        .execute(self.conns.get_master())
        .await
        .map_err(|e| {
            driver_error(
                "SqlTeamStore.UpgradeSchemaIfNeeded",
                "We couldn't upgrade the teams table",
                String::new(),
                &e,
            )
        })?;

        Ok(())
    }

    async fn create_indexes_if_not_exists(&self) -> StoreResult<()> {
        for (index, column) in [
            ("idx_teams_update_at", "update_at"),
            ("idx_teams_create_at", "create_at"),
            ("idx_teams_delete_at", "delete_at"),
        ] {
            let statement = format!("CREATE INDEX IF NOT EXISTS {} ON teams ({})", index, column);

            sqlx::query(&statement)
                .execute(self.conns.get_master())
                .await
                .map_err(|e| {
                    driver_error(
                        "SqlTeamStore.CreateIndexesIfNotExists",
                        "We couldn't create the team indexes",
                        format!("index={}", index),
                        &e,
                    )
                })?;
        }

        Ok(())
    }
}

async fn fetch_by_id(pool: &sqlx::PgPool, id: &str) -> Result<Option<Team>, FetchError> {
    let row = sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, create_at, update_at, delete_at, name, domain,
               email, type, company_name, allowed_domains
        FROM teams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(FetchError::Driver)?;

    row.map(|r| r.into_team("SqlTeamStore.fetch_by_id"))
        .transpose()
        .map_err(FetchError::Decode)
}

/// Failure reading a single team row
#[derive(Debug)]
enum FetchError {
    Driver(sqlx::Error),
    Decode(AppError),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Driver(e) => write!(f, "{}", e),
            FetchError::Decode(e) => write!(f, "{}, {}", e.message, e.details),
        }
    }
}

fn bind_team<'q>(
    query: Query<'q, Postgres, PgArguments>,
    team: &'q Team,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(team.id.as_str())
        .bind(team.create_at)
        .bind(team.update_at)
        .bind(team.delete_at)
        .bind(team.name.as_str())
        .bind(team.domain.as_str())
        .bind(team.email.as_str())
        .bind(team.team_type.as_str())
        .bind(team.company_name.as_str())
        .bind(team.allowed_domains.as_str())
}

/// Wraps a driver failure as an internal error, keeping the driver text in
/// the details
fn driver_error(
    location: &str,
    message: &str,
    details: String,
    err: &dyn std::fmt::Display,
) -> AppError {
    let details = if details.is_empty() {
        err.to_string()
    } else {
        format!("{}, {}", details, err)
    };

    AppError::internal(location, message, details)
}

fn is_domain_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(TEAMS_DOMAIN_CONSTRAINT)
        }
        _ => false,
    }
}

fn save_error(id: &str, err: &sqlx::Error) -> AppError {
    if is_domain_conflict(err) {
        return AppError::conflict(
            SAVE,
            "A team with that domain already exists",
            format!("id={}, {}", id, err),
        );
    }

    driver_error(SAVE, "We couldn't save the team", format!("id={}", id), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::ids::{new_id, ID_LENGTH};
    use crate::domain::team::TeamType;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;
    use std::time::Duration;

    const CLOSED_POOL: &str = "closed pool";

    fn offline_store() -> SqlTeamStore {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost:5432/unused")
            .expect("lazy pool");

        SqlTeamStore::new(Arc::new(SqlConnections::new(pool, Vec::new())))
    }

    /// Pool that fails every acquire at once
    async fn closed_pool() -> PgPool {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost:5432/unused")
            .expect("lazy pool");
        pool.close().await;
        pool
    }

    /// Pool that only fails once its acquire timeout runs out
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://postgres@127.0.0.1:1/unused")
            .expect("lazy pool")
    }

    fn row(team_type: &str) -> TeamRow {
        TeamRow {
            id: "y".repeat(ID_LENGTH),
            create_at: 10,
            update_at: 20,
            delete_at: 0,
            name: "Acme".to_string(),
            domain: "acme".to_string(),
            email: "owner@acme.io".to_string(),
            team_type: team_type.to_string(),
            company_name: "Acme Inc".to_string(),
            allowed_domains: "acme.io".to_string(),
        }
    }

    #[tokio::test]
    async fn save_rejects_team_with_id() {
        let store = offline_store();
        let mut team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);
        team.id = new_id();

        let err = store.save(team.clone()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.location, SAVE);
        assert_eq!(err.message, "Must call update for existing team");
        assert_eq!(err.details, format!("id={}", team.id));
    }

    #[tokio::test]
    async fn save_returns_validation_error() {
        let store = offline_store();
        let team = Team::new("Acme", "admin", "owner@acme.io", TeamType::Open);

        let err = store.save(team).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.location, "Team.is_valid");
        assert_eq!(err.message, "This URL is unavailable. Please try another.");
    }

    #[tokio::test]
    async fn update_returns_validation_error() {
        let store = offline_store();
        let team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);

        let err = store.update(team).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.message, "Invalid Id");
    }

    #[tokio::test]
    async fn reads_use_a_replica() {
        let store = SqlTeamStore::new(Arc::new(SqlConnections::new(
            unreachable_pool(),
            vec![closed_pool().await],
        )));

        let errors = [
            store.get(new_id()).await.unwrap_err(),
            store.get_by_domain("acme".to_string()).await.unwrap_err(),
            store.get_teams_for_email("owner@acme.io".to_string()).await.unwrap_err(),
            store.get_all().await.unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.kind, ErrorKind::Internal);
            assert!(err.details.contains(CLOSED_POOL), "{}: {}", err.location, err.details);
        }
    }

    #[tokio::test]
    async fn writes_and_update_lookup_use_the_master() {
        let store = SqlTeamStore::new(Arc::new(SqlConnections::new(
            closed_pool().await,
            vec![unreachable_pool()],
        )));

        let mut existing = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);
        existing.pre_save();

        let update_err = store.update(existing.clone()).await.unwrap_err();
        assert_eq!(update_err.message, "We encountered an error finding the team");

        let errors = [
            store
                .save(Team::new("Acme", "acme", "owner@acme.io", TeamType::Open))
                .await
                .unwrap_err(),
            update_err,
            store
                .update_name("Renamed".to_string(), existing.id.clone())
                .await
                .unwrap_err(),
            store.permanent_delete(existing.id.clone()).await.unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.kind, ErrorKind::Internal);
            assert!(err.details.contains(CLOSED_POOL), "{}: {}", err.location, err.details);
        }
    }

    #[test]
    fn row_converts_to_team() {
        let team = row("I").into_team(GET).unwrap();

        assert_eq!(team.id, "y".repeat(ID_LENGTH));
        assert_eq!(team.team_type, TeamType::Invite);
        assert_eq!(team.create_at, 10);
        assert_eq!(team.allowed_domains, "acme.io");
    }

    #[test]
    fn row_with_unknown_type_is_internal_error() {
        let err = row("Z").into_team(GET).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.location, GET);
        assert!(err.details.contains("Invalid team type: Z"));
    }

    #[test]
    fn non_constraint_failure_is_generic_save_error() {
        let err = save_error("abc", &sqlx::Error::PoolTimedOut);

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "We couldn't save the team");
        assert!(err.details.starts_with("id=abc, "));
        assert!(!is_domain_conflict(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn driver_error_joins_details() {
        let err = driver_error(GET, "failed", "id=1".to_string(), &"boom");
        assert_eq!(err.details, "id=1, boom");

        let err = driver_error(GET_ALL, "failed", String::new(), &"boom");
        assert_eq!(err.details, "boom");
    }
}
