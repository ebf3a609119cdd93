//! Shared fixtures: every scenario runs against both repositories.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sv_core::memory::{InMemorySnippetRepo, InMemoryUserRepo};
use sv_core::{SnippetDraft, SnippetService, User, UserRepo};
use sv_db_sqlite::{SqlitePool, SqliteSnippetRepo, SqliteUserRepo};
use tempfile::TempDir;
use uuid::Uuid;

pub struct Backend {
    pub name: &'static str,
    pub service: SnippetService,
    pub users: Arc<dyn UserRepo>,
    /// Holds the database file of file-backed backends
    scratch: Option<TempDir>,
}

pub async fn memory() -> Backend {
    let users: Arc<dyn UserRepo> = Arc::new(InMemoryUserRepo::new());
    Backend {
        name: "memory",
        service: SnippetService::new(Arc::new(InMemorySnippetRepo::new()), users.clone()),
        users,
        scratch: None,
    }
}

fn over_pool(name: &'static str, pool: SqlitePool, scratch: Option<TempDir>) -> Backend {
    let users: Arc<dyn UserRepo> = Arc::new(SqliteUserRepo::new(pool.clone()));
    Backend {
        name,
        service: SnippetService::new(Arc::new(SqliteSnippetRepo::new(pool)), users.clone()),
        users,
        scratch,
    }
}

pub async fn sqlite() -> Backend {
    let pool = sv_db_sqlite::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory SQLite");
    over_pool("sqlite", pool, None)
}

/// A SQLite database on disk behind a pool of `connections`.
pub async fn sqlite_file(connections: u32) -> Backend {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("snipvault.db").display());
    let pool = sv_db_sqlite::connect(&url, connections)
        .await
        .expect("file-backed SQLite");
    over_pool("sqlite-file", pool, Some(dir))
}

pub async fn backends() -> Vec<Backend> {
    vec![memory().await, sqlite().await]
}

/// Inserts an account directly, bypassing password hashing.
pub async fn user(backend: &Backend, username: &str) -> Uuid {
    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: username.to_string(),
        avatar: String::new(),
        password_hash: "unused".to_string(),
        refresh_token_digest: None,
        created_at: now,
        updated_at: now,
    };
    let id = user.id;
    backend.users.create_user(user).await.expect("create user");
    id
}

pub fn draft(title: &str, code: &str, tags: &[&str], is_public: bool) -> SnippetDraft {
    SnippetDraft {
        title: Some(title.to_string()),
        code: Some(code.to_string()),
        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        is_public: Some(is_public),
        ..Default::default()
    }
}
