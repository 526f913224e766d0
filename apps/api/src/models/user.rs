use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account type. Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Employer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applicant" => Some(Role::Applicant),
            "employer" => Some(Role::Employer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Employer => "employer",
        }
    }
}

/// Academic track code partitioning reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Major {
    #[serde(rename = "BUS")]
    Business,
    #[serde(rename = "CMPT")]
    ComputingScience,
}

impl Major {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "BUS" => Some(Major::Business),
            "CMPT" => Some(Major::ComputingScience),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Major::Business => "BUS",
            Major::ComputingScience => "CMPT",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub profile_picture: Option<String>,
    pub description: Option<String>,
    pub university: Option<String>,
    pub year_of_study: Option<i64>,
    pub graduated: bool,
    pub major: Option<String>,
    pub created_at: NaiveDateTime,
}

/// The public slice of a user returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}
