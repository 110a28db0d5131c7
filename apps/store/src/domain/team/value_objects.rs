use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Teams whose URL would collide with platform routes or well-known hosts
pub const RESERVED_DOMAINS: [&str; 16] = [
    "www", "web", "admin", "support", "notify", "test", "demo", "mail", "team", "channel",
    "internal", "localhost", "stag", "post", "cluster", "api",
];

pub const MIN_DOMAIN_LENGTH: usize = 4;
pub const MAX_DOMAIN_LENGTH: usize = 64;

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").expect("domain pattern is valid")
});

/// Who may join a team
///
/// Persisted as a single character: `O` for open teams and `I` for
/// invite-only teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamType {
    /// Anyone with an allowed email domain may join
    #[serde(rename = "O")]
    Open,
    /// Members must be invited
    #[serde(rename = "I")]
    Invite,
}

impl TeamType {
    /// Returns the persisted single-character code
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::Open => "O",
            TeamType::Invite => "I",
        }
    }
}

impl FromStr for TeamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O" => Ok(TeamType::Open),
            "I" => Ok(TeamType::Invite),
            other => Err(format!("Invalid team type: {}", other)),
        }
    }
}

impl fmt::Display for TeamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that a domain is usable as a team URL
///
/// # Validation Rules
/// - Between 4 and 64 characters
/// - Lowercase letters, digits and `-` only
/// - Starts and ends with a letter or digit
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.len() < MIN_DOMAIN_LENGTH || domain.len() > MAX_DOMAIN_LENGTH {
        return false;
    }

    DOMAIN_PATTERN.is_match(domain)
}

/// Checks the domain against [`RESERVED_DOMAINS`], ignoring case and
/// surrounding whitespace
pub fn is_reserved_domain(domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    RESERVED_DOMAINS.iter().any(|reserved| *reserved == domain)
}

/// Validates a team contact address
///
/// # Validation Rules
/// - Must already be lowercase
/// - Exactly one `@` with a non-empty local part and host
/// - No whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.to_lowercase() != email || email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, host)) => !local.is_empty() && !host.is_empty() && !host.contains('@'),
        None => false,
    }
}
