use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use sv_core::{User, UserRepo};
use uuid::Uuid;

use crate::{blob_to_uuid, millis_to_datetime, uuid_to_blob};

const USER_COLUMNS: &str =
    "id, username, email, full_name, avatar, password_hash, refresh_token_digest, created_at, updated_at";

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        avatar: row.try_get("avatar")?,
        password_hash: row.try_get("password_hash")?,
        refresh_token_digest: row.try_get("refresh_token_digest")?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query(&format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"))
            .bind(uuid_to_blob(user.id))
            .bind(user.username)
            .bind(user.email)
            .bind(user.full_name)
            .bind(user.avatar)
            .bind(user.password_hash)
            .bind(user.refresh_token_digest)
            .bind(user.created_at.timestamp_millis())
            .bind(user.updated_at.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ?"))
            .bind(login)
            .bind(login.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn is_taken(&self, username: &str, email: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ? OR email = ? LIMIT 1")
            .bind(username)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn set_refresh_digest(&self, id: Uuid, digest: Option<String>) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET refresh_token_digest = ?, updated_at = ? WHERE id = ?")
            .bind(digest)
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn usernames(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, username FROM users WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(uuid_to_blob(*id));
        }
        separated.push_unseparated(")");

        let mut names = HashMap::with_capacity(ids.len());
        for row in qb.build().fetch_all(&self.pool).await? {
            let id = blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?;
            names.insert(id, row.try_get::<String, _>("username")?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(username: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: "Test User".to_string(),
            avatar: "https://example.com/a.png".to_string(),
            password_hash: "hash".to_string(),
            refresh_token_digest: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_username_or_email() {
        let repo = SqliteUserRepo::new(crate::connect("sqlite::memory:", 1).await.unwrap());
        let ada = user("ada");
        repo.create_user(ada.clone()).await.unwrap();

        assert!(repo.find_by_login("ada").await.unwrap().is_some());
        assert!(repo.find_by_login("ADA@example.com").await.unwrap().is_some());
        assert!(repo.is_taken("someone", "Ada@Example.com").await.unwrap());
        assert!(repo.create_user(user("ada")).await.is_err());

        let names = repo.usernames(&[ada.id, Uuid::now_v7()]).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&ada.id], "ada");
    }

    #[tokio::test]
    async fn test_refresh_digest_round_trip() {
        let repo = SqliteUserRepo::new(crate::connect("sqlite::memory:", 1).await.unwrap());
        let ada = user("ada");
        repo.create_user(ada.clone()).await.unwrap();

        assert!(repo.set_refresh_digest(ada.id, Some("abc".into())).await.unwrap());
        let stored = repo.find_user(ada.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_digest.as_deref(), Some("abc"));
        assert!(!repo.set_refresh_digest(Uuid::now_v7(), None).await.unwrap());
    }
}
