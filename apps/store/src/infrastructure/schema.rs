// Table definitions owned by the store
// Column sizes mirror the limits enforced by Team::is_valid

/// Name of the unique constraint on `teams.domain`
pub const TEAMS_DOMAIN_CONSTRAINT: &str = "teams_domain_key";

pub const CREATE_TEAMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS teams (
        id VARCHAR(26) PRIMARY KEY,
        create_at BIGINT NOT NULL,
        update_at BIGINT NOT NULL,
        delete_at BIGINT NOT NULL DEFAULT 0,
        name VARCHAR(64) NOT NULL,
        domain VARCHAR(64) NOT NULL,
        email VARCHAR(128) NOT NULL,
        type VARCHAR(1) NOT NULL,
        company_name VARCHAR(64) NOT NULL DEFAULT '',
        allowed_domains VARCHAR(500) NOT NULL DEFAULT '',
        CONSTRAINT teams_domain_key UNIQUE (domain)
    )
"#;

/// Columns of `users` that team lookups join against
///
/// A fuller user store may own more columns; this only guarantees the join
/// target exists.
pub const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(26) PRIMARY KEY,
        team_id VARCHAR(26) NOT NULL,
        email VARCHAR(128) NOT NULL
    )
"#;

/// Every statement run by `SqlStore::create_tables_if_not_exists`, in order
pub const CREATE_TABLES: [&str; 2] = [CREATE_TEAMS_TABLE, CREATE_USERS_TABLE];
