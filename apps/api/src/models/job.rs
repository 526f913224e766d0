use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub employer_id: i64,
    pub company_name: String,
    pub job_name: String,
    pub description: String,
    pub company_photo: Option<String>,
    pub location: String,
    pub created_at: NaiveDateTime,
}

/// A job card in the discovery feed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DiscoverJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobRow,
    pub employer_first_name: String,
    pub employer_last_name: String,
    #[sqlx(skip)]
    pub interests: Vec<String>,
}

/// A job in the employer dashboard with its engagement counters.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployerJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobRow,
    /// Distinct applicants who swiped right.
    pub swipe_count: i64,
    pub match_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "left" => Some(SwipeDirection::Left),
            "right" => Some(SwipeDirection::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        }
    }
}
