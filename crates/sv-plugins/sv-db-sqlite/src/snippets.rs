use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use sv_core::{FavoriteToggle, Predicate, Snippet, SnippetChanges, SnippetRepo, Window};
use uuid::Uuid;

use crate::filter::push_predicate;
use crate::{blob_to_uuid, millis_to_datetime, uuid_to_blob};

const SNIPPET_COLUMNS: &str = "s.id, s.title, s.code, s.code_language, s.description, s.tags, \
     s.owner_id, s.is_public, s.forked_from, s.created_at, s.updated_at";

pub struct SqliteSnippetRepo {
    pool: SqlitePool,
}

impl SqliteSnippetRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Loads `favorited_by` for the given rows, preserving favorite order.
    async fn with_favorites(&self, rows: Vec<SqliteRow>) -> anyhow::Result<Vec<Snippet>> {
        let mut snippets = rows.iter().map(row_to_snippet).collect::<anyhow::Result<Vec<_>>>()?;
        if snippets.is_empty() {
            return Ok(snippets);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT snippet_id, user_id FROM favorites WHERE snippet_id IN (");
        let mut ids = qb.separated(", ");
        for snippet in &snippets {
            ids.push_bind(uuid_to_blob(snippet.id));
        }
        ids.push_unseparated(") ORDER BY seq ASC");

        let mut favorites: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in qb.build().fetch_all(&self.pool).await? {
            let snippet_id = blob_to_uuid(&row.try_get::<Vec<u8>, _>("snippet_id")?)?;
            let user_id = blob_to_uuid(&row.try_get::<Vec<u8>, _>("user_id")?)?;
            favorites.entry(snippet_id).or_default().push(user_id);
        }
        for snippet in &mut snippets {
            snippet.favorited_by = favorites.remove(&snippet.id).unwrap_or_default();
        }
        Ok(snippets)
    }
}

/// Search key for a text column. Matches the folding `Predicate::search` applies to terms.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn row_to_snippet(row: &SqliteRow) -> anyhow::Result<Snippet> {
    let forked_from = match row.try_get::<Option<Vec<u8>>, _>("forked_from")? {
        Some(blob) => Some(blob_to_uuid(&blob)?),
        None => None,
    };
    Ok(Snippet {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        title: row.try_get("title")?,
        code: row.try_get("code")?,
        code_language: row.try_get("code_language")?,
        description: row.try_get("description")?,
        tags: serde_json::from_str(&row.try_get::<String, _>("tags")?)?,
        owner: blob_to_uuid(&row.try_get::<Vec<u8>, _>("owner_id")?)?,
        is_public: row.try_get("is_public")?,
        favorited_by: Vec::new(),
        forked_from,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

#[async_trait]
impl SnippetRepo for SqliteSnippetRepo {
    async fn insert(&self, snippet: Snippet) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO snippets (id, title, code, code_language, description, tags, owner_id, is_public, forked_from, \
             created_at, updated_at, title_folded, description_folded, code_folded) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(snippet.id))
        .bind(&snippet.title)
        .bind(&snippet.code)
        .bind(&snippet.code_language)
        .bind(&snippet.description)
        .bind(serde_json::to_string(&snippet.tags)?)
        .bind(uuid_to_blob(snippet.owner))
        .bind(snippet.is_public)
        .bind(snippet.forked_from.map(uuid_to_blob))
        .bind(snippet.created_at.timestamp_millis())
        .bind(snippet.updated_at.timestamp_millis())
        .bind(fold(&snippet.title))
        .bind(fold(&snippet.description))
        .bind(fold(&snippet.code))
        .execute(&mut *tx)
        .await?;

        for user in &snippet.favorited_by {
            sqlx::query("INSERT INTO favorites (snippet_id, user_id) VALUES (?, ?)")
                .bind(uuid_to_blob(snippet.id))
                .bind(uuid_to_blob(*user))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Snippet>> {
        let row = sqlx::query(&format!("SELECT {SNIPPET_COLUMNS} FROM snippets s WHERE s.id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.with_favorites(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find(&self, filter: &Predicate, window: Window) -> anyhow::Result<Vec<Snippet>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {SNIPPET_COLUMNS} FROM snippets s WHERE "));
        push_predicate(&mut qb, filter);
        qb.push(" ORDER BY s.created_at DESC, s.seq ASC LIMIT ");
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        qb.push_bind(window.limit.map_or(-1, |l| l as i64));
        qb.push(" OFFSET ").push_bind(window.offset as i64);

        tracing::debug!(sql = qb.sql(), "snippet query");
        let rows = qb.build().fetch_all(&self.pool).await?;
        self.with_favorites(rows).await
    }

    async fn count(&self, filter: &Predicate) -> anyhow::Result<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS total FROM snippets s WHERE ");
        push_predicate(&mut qb, filter);
        let total: i64 = qb.build().fetch_one(&self.pool).await?.try_get("total")?;
        Ok(total as u64)
    }

    /// Single UPDATE filtered on id and owner; only present fields are set.
    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: &SnippetChanges) -> anyhow::Result<bool> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE snippets SET updated_at = ");
        qb.push_bind(changes.updated_at.timestamp_millis());
        if let Some(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
            qb.push(", title_folded = ").push_bind(fold(title));
        }
        if let Some(code) = &changes.code {
            qb.push(", code = ").push_bind(code.clone());
            qb.push(", code_folded = ").push_bind(fold(code));
        }
        if let Some(language) = &changes.code_language {
            qb.push(", code_language = ").push_bind(language.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
            qb.push(", description_folded = ").push_bind(fold(description));
        }
        if let Some(tags) = &changes.tags {
            qb.push(", tags = ").push_bind(serde_json::to_string(tags)?);
        }
        if let Some(is_public) = changes.is_public {
            qb.push(", is_public = ").push_bind(is_public);
        }
        qb.push(" WHERE id = ").push_bind(uuid_to_blob(id));
        qb.push(" AND owner_id = ").push_bind(uuid_to_blob(owner));

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM snippets WHERE id = ? AND owner_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(owner))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            // The snippet's own favorite rows go with it; forks keep their pointer.
            sqlx::query("DELETE FROM favorites WHERE snippet_id = ?")
                .bind(uuid_to_blob(id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Delete-or-insert inside one transaction, so concurrent toggles never lose updates.
    async fn toggle_favorite(&self, id: Uuid, user: Uuid) -> anyhow::Result<Option<FavoriteToggle>> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE snippet_id = ? AND user_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(user))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let exists = sqlx::query("SELECT 1 FROM snippets WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        if removed == 0 {
            sqlx::query("INSERT INTO favorites (snippet_id, user_id) VALUES (?, ?)")
                .bind(uuid_to_blob(id))
                .bind(uuid_to_blob(user))
                .execute(&mut *tx)
                .await?;
        }

        let favorite_count: i64 = sqlx::query("SELECT COUNT(*) AS total FROM favorites WHERE snippet_id = ?")
            .bind(uuid_to_blob(id))
            .fetch_one(&mut *tx)
            .await?
            .try_get("total")?;

        tx.commit().await?;
        Ok(Some(FavoriteToggle {
            is_favorited: removed == 0,
            favorite_count: favorite_count as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sv_core::{Paging, SnippetChanges};

    async fn repo() -> SqliteSnippetRepo {
        SqliteSnippetRepo::new(crate::connect("sqlite::memory:", 1).await.unwrap())
    }

    fn snippet(owner: Uuid, title: &str, tags: &[&str], minutes_ago: i64) -> Snippet {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Snippet {
            id: Uuid::now_v7(),
            title: title.to_string(),
            code: format!("// {title}"),
            code_language: "rust".to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            owner,
            is_public: true,
            favorited_by: Vec::new(),
            forked_from: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let repo = repo().await;
        let mut s = snippet(Uuid::now_v7(), "Hello", &["intro", "cli"], 0);
        s.forked_from = Some(Uuid::now_v7());
        repo.insert(s.clone()).await.expect("Failed to insert snippet");

        let found = repo.find_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(found.tags, vec!["intro", "cli"]);
        assert_eq!(found.forked_from, s.forked_from);
        assert_eq!(found.created_at.timestamp_millis(), s.created_at.timestamp_millis());
    }

    #[tokio::test]
    async fn test_filters_paginate_newest_first() {
        let repo = repo().await;
        let owner = Uuid::now_v7();
        for (i, tags) in [["rust", "cli"], ["rust", "web"], ["go", "cli"]].iter().enumerate() {
            repo.insert(snippet(owner, &format!("s{i}"), tags, i as i64)).await.unwrap();
        }

        let rust_cli = Predicate::and([Predicate::Owner(owner), Predicate::tag("rust"), Predicate::tag("cli")]);
        assert_eq!(repo.count(&rust_cli).await.unwrap(), 1);

        let all = Predicate::Owner(owner);
        let page = repo.find(&all, Paging::new(Some(1), Some(2)).window()).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["s0", "s1"]);

        let tag_search = repo.find(&Predicate::search("WE"), Window::all()).await.unwrap();
        assert_eq!(tag_search.len(), 1);
        assert_eq!(tag_search[0].title, "s1");
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let repo = repo().await;
        let owner = Uuid::now_v7();
        let mut dotted = snippet(owner, "dotted", &[], 0);
        dotted.code = "a.b".into();
        let mut plain = snippet(owner, "plain", &[], 1);
        plain.code = "axb 100%".into();
        repo.insert(dotted).await.unwrap();
        repo.insert(plain).await.unwrap();

        let hits = repo.find(&Predicate::search("a.b"), Window::all()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "dotted");
        assert_eq!(repo.count(&Predicate::search("_")).await.unwrap(), 0);
        assert_eq!(repo.count(&Predicate::search("0%")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite_is_an_involution() {
        let repo = repo().await;
        let s = snippet(Uuid::now_v7(), "fav", &[], 0);
        repo.insert(s.clone()).await.unwrap();
        let fan = Uuid::now_v7();

        let on = repo.toggle_favorite(s.id, fan).await.unwrap().unwrap();
        assert_eq!(on, FavoriteToggle { is_favorited: true, favorite_count: 1 });
        assert_eq!(repo.count(&Predicate::FavoritedBy(fan)).await.unwrap(), 1);

        let off = repo.toggle_favorite(s.id, fan).await.unwrap().unwrap();
        assert_eq!(off, FavoriteToggle { is_favorited: false, favorite_count: 0 });
        assert!(repo.toggle_favorite(Uuid::now_v7(), fan).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_owned_sets_only_present_fields() {
        let repo = repo().await;
        let owner = Uuid::now_v7();
        let s = snippet(owner, "before", &["a"], 0);
        repo.insert(s.clone()).await.unwrap();

        let changes = SnippetChanges {
            title: Some("after".into()),
            code: None,
            code_language: None,
            description: None,
            tags: Some(vec!["b".into()]),
            is_public: Some(false),
            updated_at: Utc::now(),
        };
        assert!(!repo.update_owned(s.id, Uuid::now_v7(), &changes).await.unwrap());
        assert!(repo.update_owned(s.id, owner, &changes).await.unwrap());

        let found = repo.find_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(found.title, "after");
        assert_eq!(found.code, s.code);
        assert_eq!(found.tags, vec!["b"]);
        assert!(!found.is_public);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let repo = repo().await;
        let owner = Uuid::now_v7();
        let mut s = snippet(owner, "Ärger", &[], 0);
        s.code = "x".into();
        repo.insert(s.clone()).await.unwrap();

        assert_eq!(repo.count(&Predicate::search("ärger")).await.unwrap(), 1);
        assert_eq!(repo.count(&Predicate::search("ÄRGER")).await.unwrap(), 1);

        let changes = SnippetChanges {
            title: Some("Übersicht".into()),
            code: None,
            code_language: None,
            description: Some("Straße ÉTÉ".into()),
            tags: None,
            is_public: None,
            updated_at: Utc::now(),
        };
        assert!(repo.update_owned(s.id, owner, &changes).await.unwrap());
        assert_eq!(repo.count(&Predicate::search("ärger")).await.unwrap(), 0);
        assert_eq!(repo.count(&Predicate::search("übersicht")).await.unwrap(), 1);
        assert_eq!(repo.count(&Predicate::search("été")).await.unwrap(), 1);
    }
}
