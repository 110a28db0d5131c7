// Repository interfaces (ports)
// Infrastructure provides the implementations

pub mod store_channel;
pub mod team_store;

pub use store_channel::{StoreChannel, StoreResult};
pub use team_store::{SchemaMaintenance, Store, TeamStore};
