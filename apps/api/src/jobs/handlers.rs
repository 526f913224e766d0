use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::matching::roll_match;
use crate::models::job::{DiscoverJob, EmployerJob, SwipeDirection};
use crate::models::user::Role;
use crate::state::AppState;

const DISCOVER_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub direction: String,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub message: String,
    pub matched: bool,
    pub direction: SwipeDirection,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub company_name: String,
    pub job_name: String,
    pub description: String,
    pub company_photo: Option<String>,
    pub location: String,
    /// Interest category ids.
    #[serde(default)]
    pub interests: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub id: i64,
    pub message: String,
}

/// GET /api/jobs/discover
///
/// Open to anonymous callers. With a valid token, jobs the caller already
/// swiped on are left out.
pub async fn handle_discover(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<Json<Vec<DiscoverJob>>, AppError> {
    let viewer = user.map(|u| u.id);

    let mut jobs: Vec<DiscoverJob> = sqlx::query_as(
        r#"
        SELECT j.*,
               u.first_name AS employer_first_name,
               u.last_name AS employer_last_name
        FROM jobs j
        JOIN users u ON j.employer_id = u.id
        WHERE ? IS NULL
           OR j.id NOT IN (SELECT job_id FROM applicant_swipes WHERE applicant_id = ?)
        ORDER BY j.created_at DESC, j.id DESC
        LIMIT ?
        "#,
    )
    .bind(viewer)
    .bind(viewer)
    .bind(DISCOVER_LIMIT)
    .fetch_all(&state.db)
    .await?;

    for job in &mut jobs {
        job.interests = job_interest_names(&state.db, job.job.id).await?;
    }

    Ok(Json(jobs))
}

/// POST /api/jobs/:job_id/swipe
///
/// Anonymous swipes only roll the mock match. An authenticated applicant's
/// swipe is stored (a repeat swipe overwrites the direction) along with any
/// match.
pub async fn handle_swipe(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    user: Option<AuthUser>,
    Json(req): Json<SwipeRequest>,
) -> Result<Json<SwipeResponse>, AppError> {
    let direction = SwipeDirection::parse(&req.direction)
        .ok_or_else(|| AppError::Validation("Direction must be left or right".to_string()))?;
    if let Some(user) = &user {
        user.require_role(Role::Applicant, "Only applicants can swipe on jobs")?;
    }

    let matched = roll_match(
        &mut rand::thread_rng(),
        direction,
        state.config.match_probability,
    );

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    if let Some(user) = &user {
        record_swipe(&state.db, user.id, job_id, direction, matched).await?;
    }

    info!(
        job_id,
        direction = direction.as_str(),
        matched,
        applicant_id = user.as_ref().map(|u| u.id),
        "Swipe recorded"
    );

    Ok(Json(SwipeResponse {
        message: "Swipe recorded successfully".to_string(),
        matched,
        direction,
    }))
}

/// GET /api/jobs/employer
pub async fn handle_employer_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EmployerJob>>, AppError> {
    user.require_role(Role::Employer, "Only employers can access this endpoint")?;

    let jobs: Vec<EmployerJob> = sqlx::query_as(
        r#"
        SELECT j.*,
               COUNT(DISTINCT s.applicant_id) AS swipe_count,
               COUNT(DISTINCT m.applicant_id) AS match_count
        FROM jobs j
        LEFT JOIN applicant_swipes s ON j.id = s.job_id AND s.direction = 'right'
        LEFT JOIN matches m ON j.id = m.job_id
        WHERE j.employer_id = ?
        GROUP BY j.id
        ORDER BY j.created_at DESC, j.id DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// POST /api/jobs/employer
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    user.require_role(Role::Employer, "Only employers can create jobs")?;

    let company_name = required(&req.company_name, "company_name")?;
    let job_name = required(&req.job_name, "job_name")?;
    let description = required(&req.description, "description")?;
    let location = required(&req.location, "location")?;

    let mut interests = req.interests.clone();
    interests.sort_unstable();
    interests.dedup();

    let mut tx = state.db.begin().await?;

    let job_id = sqlx::query(
        r#"
        INSERT INTO jobs (employer_id, company_name, job_name, description, company_photo, location)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(company_name)
    .bind(job_name)
    .bind(description)
    .bind(req.company_photo.as_deref())
    .bind(location)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for category_id in interests {
        sqlx::query("INSERT INTO job_interest_categories (job_id, category_id) VALUES (?, ?)")
            .bind(job_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_foreign_key_violation() => AppError::Validation(format!(
                    "Unknown interest category id {category_id}"
                )),
                _ => AppError::Database(e),
            })?;
    }

    tx.commit().await?;

    info!(job_id, employer_id = user.id, employer = %user.email, "Job created");

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            id: job_id,
            message: "Job created successfully".to_string(),
        }),
    ))
}

async fn job_interest_names(pool: &SqlitePool, job_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT ic.name
        FROM interest_categories ic
        JOIN job_interest_categories jic ON ic.id = jic.category_id
        WHERE jic.job_id = ?
        ORDER BY ic.name
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

async fn record_swipe(
    pool: &SqlitePool,
    applicant_id: i64,
    job_id: i64,
    direction: SwipeDirection,
    matched: bool,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO applicant_swipes (applicant_id, job_id, direction)
        VALUES (?, ?, ?)
        ON CONFLICT (applicant_id, job_id)
        DO UPDATE SET direction = excluded.direction, created_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(applicant_id)
    .bind(job_id)
    .bind(direction.as_str())
    .execute(&mut *tx)
    .await?;

    if matched {
        sqlx::query("INSERT OR IGNORE INTO matches (job_id, applicant_id) VALUES (?, ?)")
            .bind(job_id)
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed)
    }
}
