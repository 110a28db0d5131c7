// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod sql_team_store;

pub use sql_team_store::SqlTeamStore;
