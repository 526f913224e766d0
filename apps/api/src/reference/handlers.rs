use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::reference::ReferenceRow;
use crate::models::user::Major;
use crate::state::AppState;

/// GET /api/reference/interest-categories/:major
pub async fn handle_interest_categories(
    State(state): State<AppState>,
    Path(major): Path<String>,
) -> Result<Json<Vec<ReferenceRow>>, AppError> {
    let major = parse_major(&major)?;
    Ok(Json(list_by_major(&state.db, "interest_categories", major).await?))
}

/// GET /api/reference/profile-tags/:major
pub async fn handle_profile_tags(
    State(state): State<AppState>,
    Path(major): Path<String>,
) -> Result<Json<Vec<ReferenceRow>>, AppError> {
    let major = parse_major(&major)?;
    Ok(Json(list_by_major(&state.db, "profile_tags", major).await?))
}

fn parse_major(raw: &str) -> Result<Major, AppError> {
    Major::parse(raw).ok_or_else(|| AppError::Validation("Major must be BUS or CMPT".to_string()))
}

async fn list_by_major(
    pool: &SqlitePool,
    table: &'static str,
    major: Major,
) -> Result<Vec<ReferenceRow>, sqlx::Error> {
    let sql = format!("SELECT * FROM {table} WHERE major = ? ORDER BY name");
    sqlx::query_as(&sql).bind(major.as_str()).fetch_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_lists_are_partitioned_and_sorted() {
        let pool = test_pool().await;

        let tags = list_by_major(&pool, "profile_tags", Major::ComputingScience)
            .await
            .unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["AWS", "Python", "React", "Rust", "SQL"]);
        assert!(tags.iter().all(|t| t.major == "CMPT"));

        let categories = list_by_major(&pool, "interest_categories", Major::Business)
            .await
            .unwrap();
        assert_eq!(categories.first().map(|c| c.name.as_str()), Some("Accounting"));
        assert!(categories.iter().all(|c| c.major == "BUS"));
    }

    #[test]
    fn test_major_is_case_sensitive() {
        assert!(parse_major("BUS").is_ok());
        assert!(matches!(parse_major("bus"), Err(AppError::Validation(_))));
    }
}
