// Infrastructure layer module
// Contains database adapters
// Follows Hexagonal Architecture

pub mod repositories;
pub mod schema;
pub mod sql_store;

pub use sql_store::{SqlConnections, SqlStore};
