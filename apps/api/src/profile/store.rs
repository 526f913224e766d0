use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::reference::NamedRef;
use crate::models::user::UserRow;

/// A many-to-many set hanging off a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLink {
    Interests,
    Tags,
}

impl ProfileLink {
    fn link_table(self) -> &'static str {
        match self {
            ProfileLink::Interests => "user_interest_categories",
            ProfileLink::Tags => "user_profile_tags",
        }
    }

    fn ref_table(self) -> &'static str {
        match self {
            ProfileLink::Interests => "interest_categories",
            ProfileLink::Tags => "profile_tags",
        }
    }

    fn ref_column(self) -> &'static str {
        match self {
            ProfileLink::Interests => "category_id",
            ProfileLink::Tags => "tag_id",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProfileLink::Interests => "interest category",
            ProfileLink::Tags => "profile tag",
        }
    }
}

pub async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// The id/name pairs linked to `user_id`, ordered by name.
pub async fn linked_refs(
    pool: &SqlitePool,
    user_id: i64,
    link: ProfileLink,
) -> Result<Vec<NamedRef>, sqlx::Error> {
    let sql = format!(
        "SELECT r.id, r.name FROM {ref_table} r \
         JOIN {link_table} l ON r.id = l.{ref_column} \
         WHERE l.user_id = ? ORDER BY r.name",
        ref_table = link.ref_table(),
        link_table = link.link_table(),
        ref_column = link.ref_column(),
    );
    sqlx::query_as(&sql).bind(user_id).fetch_all(pool).await
}

/// Replaces the whole link set in one transaction. Duplicate ids collapse;
/// an id with no reference row rolls the transaction back with a 400.
pub async fn replace_links(
    pool: &SqlitePool,
    user_id: i64,
    link: ProfileLink,
    ids: &[i64],
) -> Result<(), AppError> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {} WHERE user_id = ?", link.link_table()))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let insert = format!(
        "INSERT INTO {} (user_id, {}) VALUES (?, ?)",
        link.link_table(),
        link.ref_column()
    );
    for id in &ids {
        sqlx::query(&insert)
            .bind(user_id)
            .bind(*id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_foreign_key_violation() => {
                    AppError::Validation(format!("Unknown {} id {id}", link.label()))
                }
                _ => AppError::Database(e),
            })?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn insert_user(pool: &SqlitePool) -> i64 {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password, role) \
             VALUES ('Ada', 'Lovelace', 'ada@example.com', 'x', 'applicant')",
        )
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn tag_id(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM profile_tags WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replace_links_swaps_the_whole_set() {
        let pool = test_pool().await;
        let user = insert_user(&pool).await;
        let rust = tag_id(&pool, "Rust").await;
        let sql = tag_id(&pool, "SQL").await;
        let python = tag_id(&pool, "Python").await;

        replace_links(&pool, user, ProfileLink::Tags, &[rust, sql, rust])
            .await
            .unwrap();
        let names: Vec<String> = linked_refs(&pool, user, ProfileLink::Tags)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Rust", "SQL"]);

        replace_links(&pool, user, ProfileLink::Tags, &[python])
            .await
            .unwrap();
        let after = linked_refs(&pool, user, ProfileLink::Tags).await.unwrap();
        assert_eq!(after, vec![NamedRef { id: python, name: "Python".into() }]);
    }

    #[tokio::test]
    async fn test_unknown_id_rolls_back() {
        let pool = test_pool().await;
        let user = insert_user(&pool).await;
        let rust = tag_id(&pool, "Rust").await;
        replace_links(&pool, user, ProfileLink::Tags, &[rust]).await.unwrap();

        let err = replace_links(&pool, user, ProfileLink::Tags, &[rust, 9_999])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let kept = linked_refs(&pool, user, ProfileLink::Tags).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, rust);
    }

    #[tokio::test]
    async fn test_empty_set_clears_interests() {
        let pool = test_pool().await;
        let user = insert_user(&pool).await;
        let finance: i64 =
            sqlx::query_scalar("SELECT id FROM interest_categories WHERE name = 'Finance'")
                .fetch_one(&pool)
                .await
                .unwrap();

        replace_links(&pool, user, ProfileLink::Interests, &[finance]).await.unwrap();
        replace_links(&pool, user, ProfileLink::Interests, &[]).await.unwrap();
        assert!(linked_refs(&pool, user, ProfileLink::Interests)
            .await
            .unwrap()
            .is_empty());
    }
}
