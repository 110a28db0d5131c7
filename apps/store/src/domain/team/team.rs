use serde::{Deserialize, Serialize};

use super::value_objects::{
    is_reserved_domain, is_valid_domain, is_valid_email, TeamType, MAX_DOMAIN_LENGTH,
};
use crate::domain::errors::AppError;
use crate::domain::ids::{get_millis, new_id, ID_LENGTH};

pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_EMAIL_LENGTH: usize = 128;
pub const MAX_COMPANY_NAME_LENGTH: usize = 64;
pub const MAX_ALLOWED_DOMAINS_LENGTH: usize = 500;

/// A tenant of the messaging platform
///
/// A team owns its members and channels and is reachable under its
/// `domain`. Timestamps are milliseconds since the Unix epoch.
///
/// # Invariants (checked by [`Team::is_valid`])
/// - Id is exactly 26 characters once saved
/// - Name is 1 to 64 characters
/// - Domain is unique, well formed and not reserved
/// - Email is a lowercase address of at most 128 characters
///
/// # Example
/// ```
/// use platform_store::domain::team::{Team, TeamType};
///
/// let mut team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);
/// team.pre_save();
///
/// assert!(team.is_valid().is_ok());
/// assert_eq!(team.id.len(), 26);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
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

impl Team {
    /// Creates an unsaved team with the required fields set
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        email: impl Into<String>,
        team_type: TeamType,
    ) -> Self {
        Self {
            id: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            name: name.into(),
            domain: domain.into(),
            email: email.into(),
            team_type,
            company_name: String::new(),
            allowed_domains: String::new(),
        }
    }

    /// Prepares a new team for insertion
    ///
    /// Assigns an id when none is set and stamps both `create_at` and
    /// `update_at` with the current time.
    pub fn pre_save(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }

        self.create_at = get_millis();
        self.update_at = self.create_at;
    }

    /// Stamps `update_at` before an update is written
    pub fn pre_update(&mut self) {
        self.update_at = get_millis();
    }

    /// Validates every field, returning the first violation found
    pub fn is_valid(&self) -> Result<(), AppError> {
        let invalid = |message: &str| {
            Err(AppError::invalid(
                "Team.is_valid",
                message,
                format!("id={}", self.id),
            ))
        };

        if self.id.len() != ID_LENGTH {
            return invalid("Invalid Id");
        }

        if self.create_at == 0 {
            return invalid("Create at must be a valid time");
        }

        if self.update_at == 0 {
            return invalid("Update at must be a valid time");
        }

        if self.email.len() > MAX_EMAIL_LENGTH {
            return invalid("Invalid email");
        }

        if !is_valid_email(&self.email) {
            return invalid("Invalid email");
        }

        let name_length = self.name.chars().count();
        if name_length == 0 || name_length > MAX_NAME_LENGTH {
            return invalid("Invalid name");
        }

        if self.domain.len() > MAX_DOMAIN_LENGTH {
            return invalid("Invalid domain");
        }

        if is_reserved_domain(&self.domain) {
            return invalid("This URL is unavailable. Please try another.");
        }

        if !is_valid_domain(&self.domain) {
            return invalid("Domain must be 4 or more lowercase alphanumeric characters");
        }

        if self.company_name.chars().count() > MAX_COMPANY_NAME_LENGTH {
            return invalid("Invalid company name");
        }

        if self.allowed_domains.len() > MAX_ALLOWED_DOMAINS_LENGTH {
            return invalid("Invalid allowed domains");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    fn saved_team() -> Team {
        let mut team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);
        team.pre_save();
        team
    }

    fn message_of(team: &Team) -> String {
        team.is_valid().unwrap_err().message
    }

    #[test]
    fn new_team_is_unsaved() {
        let team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Invite);

        assert!(team.id.is_empty());
        assert_eq!(team.create_at, 0);
        assert_eq!(team.team_type, TeamType::Invite);
        assert_eq!(message_of(&team), "Invalid Id");
    }

    #[test]
    fn pre_save_assigns_id_and_timestamps() {
        let team = saved_team();

        assert_eq!(team.id.len(), ID_LENGTH);
        assert!(team.create_at > 0);
        assert_eq!(team.create_at, team.update_at);
        assert!(team.is_valid().is_ok());
    }

    #[test]
    fn pre_save_keeps_existing_id() {
        let mut team = Team::new("Acme", "acme", "owner@acme.io", TeamType::Open);
        team.id = "y".repeat(ID_LENGTH);
        team.pre_save();

        assert_eq!(team.id, "y".repeat(ID_LENGTH));
    }

    #[test]
    fn pre_update_only_touches_update_at() {
        let mut team = saved_team();
        team.create_at = 1;
        team.update_at = 1;
        team.pre_update();

        assert_eq!(team.create_at, 1);
        assert!(team.update_at > 1);
    }

    #[test]
    fn missing_timestamps_rejected() {
        let mut team = saved_team();
        team.create_at = 0;
        assert_eq!(message_of(&team), "Create at must be a valid time");

        let mut team = saved_team();
        team.update_at = 0;
        assert_eq!(message_of(&team), "Update at must be a valid time");
    }

    #[test]
    fn invalid_email_rejected() {
        let mut team = saved_team();
        team.email = "not-an-email".to_string();
        assert_eq!(message_of(&team), "Invalid email");

        team.email = format!("{}@acme.io", "a".repeat(128));
        assert_eq!(message_of(&team), "Invalid email");
    }

    #[test]
    fn name_length_enforced() {
        let mut team = saved_team();
        team.name = String::new();
        assert_eq!(message_of(&team), "Invalid name");

        team.name = "n".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(message_of(&team), "Invalid name");

        team.name = "ü".repeat(MAX_NAME_LENGTH);
        assert!(team.is_valid().is_ok());
    }

    #[test]
    fn reserved_domain_rejected() {
        let mut team = saved_team();
        team.domain = "admin".to_string();

        assert_eq!(message_of(&team), "This URL is unavailable. Please try another.");
    }

    #[test]
    fn malformed_domain_rejected() {
        let mut team = saved_team();
        team.domain = "Acme Corp".to_string();
        assert_eq!(
            message_of(&team),
            "Domain must be 4 or more lowercase alphanumeric characters"
        );

        team.domain = "acme__corp".to_string();
        assert_eq!(
            message_of(&team),
            "Domain must be 4 or more lowercase alphanumeric characters"
        );

        team.domain = "d".repeat(65);
        assert_eq!(message_of(&team), "Invalid domain");
    }

    #[test]
    fn optional_field_lengths_enforced() {
        let mut team = saved_team();
        team.company_name = "c".repeat(MAX_COMPANY_NAME_LENGTH + 1);
        assert_eq!(message_of(&team), "Invalid company name");

        let mut team = saved_team();
        team.allowed_domains = "d".repeat(MAX_ALLOWED_DOMAINS_LENGTH + 1);
        assert_eq!(message_of(&team), "Invalid allowed domains");
    }

    #[test]
    fn validation_error_carries_location_and_id() {
        let mut team = saved_team();
        team.name = String::new();

        let err = team.is_valid().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(err.location, "Team.is_valid");
        assert_eq!(err.details, format!("id={}", team.id));
    }

    #[test]
    fn json_shape_uses_type_code() {
        let team = saved_team();
        let value = serde_json::to_value(&team).unwrap();

        assert_eq!(value["type"], "O");
        assert_eq!(value["domain"], "acme");

        let parsed: Team = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, team);
    }

    #[test]
    fn json_defaults_unsaved_fields() {
        let parsed: Team = serde_json::from_str(
            r#"{"name":"Acme","domain":"acme","email":"owner@acme.io","type":"I"}"#,
        )
        .unwrap();

        assert!(parsed.id.is_empty());
        assert_eq!(parsed.team_type, TeamType::Invite);
        assert!(parsed.company_name.is_empty());
    }
}
