use async_trait::async_trait;

use super::store_channel::{StoreChannel, StoreResult};
use crate::domain::team::Team;

/// Data access contract for teams
///
/// Every method returns immediately with a [`StoreChannel`]; the database
/// work runs concurrently and its single result is read by awaiting the
/// channel. Implementations translate driver errors into
/// [`AppError`](crate::domain::errors::AppError)s located at the operation.
pub trait TeamStore: Send + Sync {
    /// Inserts a new team. The team must not have an id yet.
    fn save(&self, team: Team) -> StoreChannel<Team>;

    /// Replaces a stored team, keeping its original `create_at` and domain
    fn update(&self, team: Team) -> StoreChannel<Team>;

    /// Renames a team, resolving to the team id
    fn update_name(&self, name: String, team_id: String) -> StoreChannel<String>;

    /// Reads a team by id
    fn get(&self, id: String) -> StoreChannel<Team>;

    /// Reads the team registered under a domain
    fn get_by_domain(&self, domain: String) -> StoreChannel<Team>;

    /// Lists every team that has a user with this email
    fn get_teams_for_email(&self, email: String) -> StoreChannel<Vec<Team>>;

    /// Lists all teams ordered by name
    fn get_all(&self) -> StoreChannel<Vec<Team>>;

    /// Removes a team row, resolving to the team id
    fn permanent_delete(&self, id: String) -> StoreChannel<String>;
}

/// Schema upkeep a store runs once at startup
#[async_trait]
pub trait SchemaMaintenance: Send + Sync {
    /// Brings tables created by older versions up to the current layout
    async fn upgrade_schema_if_needed(&self) -> StoreResult<()>;

    /// Creates secondary indexes that are missing
    async fn create_indexes_if_not_exists(&self) -> StoreResult<()>;
}

/// Entry point to every entity store
#[async_trait]
pub trait Store: Send + Sync {
    fn team(&self) -> &dyn TeamStore;

    /// Closes all database connections
    async fn close(&self);
}
