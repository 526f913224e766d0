//! Axum route handlers for registration and login.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::tokens::{hash_password, issue_token, verify_password};
use crate::errors::AppError;
use crate::models::user::{Major, Role, UserRow, UserSummary};
use crate::resume::normalize::is_valid_email;
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 8;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub university: Option<String>,
    pub year_of_study: Option<i64>,
    #[serde(default)]
    pub graduated: bool,
    pub major: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    let role = Role::parse(&req.role)
        .ok_or_else(|| AppError::Validation("Role must be applicant or employer".to_string()))?;
    let major = parse_optional_major(req.major.as_deref())?;
    validate_year_of_study(req.year_of_study)?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (first_name, last_name, email, password, role,
             university, year_of_study, graduated, major, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(req.university.as_deref().map(str::trim))
    .bind(req.year_of_study)
    .bind(req.graduated)
    .bind(major.map(Major::as_str))
    .bind(req.description.as_deref())
    .execute(&state.db)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Validation("User already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    let id = result.last_insert_rowid();
    let token = issue_token(
        id,
        &email,
        role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )?;

    info!(user_id = id, role = role.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            token,
            user: UserSummary {
                id,
                first_name,
                last_name,
                email,
                role,
            },
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(invalid)?;

    let password = req.password;
    let stored_hash = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if !valid {
        return Err(invalid());
    }

    let role = Role::parse(&user.role).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("user {} has unknown role {}", user.id, user.role))
    })?;
    let token = issue_token(
        user.id,
        &user.email,
        role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserSummary {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role,
        },
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared validation
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn parse_optional_major(raw: Option<&str>) -> Result<Option<Major>, AppError> {
    match raw.map(str::trim).filter(|m| !m.is_empty()) {
        None => Ok(None),
        Some(code) => Major::parse(code)
            .map(Some)
            .ok_or_else(|| AppError::Validation("Major must be BUS or CMPT".to_string())),
    }
}

/// -1 graduated, 0 unknown, 1..=8 current year.
pub(crate) fn validate_year_of_study(year: Option<i64>) -> Result<(), AppError> {
    match year {
        Some(y) if !(-1..=8).contains(&y) => Err(AppError::Validation(
            "year_of_study must be between -1 and 8".to_string(),
        )),
        _ => Ok(()),
    }
}
