use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::handlers::{parse_optional_major, validate_year_of_study};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::reference::NamedRef;
use crate::models::user::{Major, UserRow};
use crate::profile::store::{find_user, linked_refs, replace_links, ProfileLink};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserRow,
    pub interests: Vec<NamedRef>,
    pub tags: Vec<NamedRef>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub year_of_study: Option<i64>,
    pub graduated: Option<bool>,
    pub major: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterestsRequest {
    #[serde(default)]
    pub interests: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    #[serde(default)]
    pub tags: Vec<i64>,
}

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let row = find_user(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let interests = linked_refs(&state.db, user.id, ProfileLink::Interests).await?;
    let tags = linked_refs(&state.db, user.id, ProfileLink::Tags).await?;

    Ok(Json(ProfileResponse {
        user: row,
        interests,
        tags,
    }))
}

/// PUT /api/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let first_name = non_blank(req.first_name, "first_name")?;
    let last_name = non_blank(req.last_name, "last_name")?;
    let major = parse_optional_major(req.major.as_deref())?;
    validate_year_of_study(req.year_of_study)?;

    let result = sqlx::query(
        r#"
        UPDATE users SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            description = COALESCE(?, description),
            profile_picture = COALESCE(?, profile_picture),
            university = COALESCE(?, university),
            year_of_study = COALESCE(?, year_of_study),
            graduated = COALESCE(?, graduated),
            major = COALESCE(?, major)
        WHERE id = ?
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(req.description)
    .bind(req.profile_picture)
    .bind(req.university)
    .bind(req.year_of_study)
    .bind(req.graduated)
    .bind(major.map(Major::as_str))
    .bind(user.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!(user_id = user.id, "Profile updated");
    Ok(Json(json!({ "message": "Profile updated successfully" })))
}

/// PUT /api/profile/interests
pub async fn handle_update_interests(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<InterestsRequest>,
) -> Result<Json<Value>, AppError> {
    replace_links(&state.db, user.id, ProfileLink::Interests, &req.interests).await?;
    info!(user_id = user.id, count = req.interests.len(), "Interests updated");
    Ok(Json(json!({ "message": "Interests updated successfully" })))
}

/// PUT /api/profile/tags
pub async fn handle_update_tags(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TagsRequest>,
) -> Result<Json<Value>, AppError> {
    replace_links(&state.db, user.id, ProfileLink::Tags, &req.tags).await?;
    info!(user_id = user.id, count = req.tags.len(), "Profile tags updated");
    Ok(Json(json!({ "message": "Profile tags updated successfully" })))
}

/// Trims a present name; a present but blank one is rejected.
fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(AppError::Validation(format!("{field} cannot be empty"))),
        other => Ok(other),
    }
}
