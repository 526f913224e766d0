use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// A row of `interest_categories` or `profile_tags`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferenceRow {
    pub id: i64,
    pub name: String,
    pub major: String,
    pub created_at: NaiveDateTime,
}

/// Id/name pair attached to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}
