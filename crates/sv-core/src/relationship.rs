//! # Relationship Engine
//!
//! Favorites (many-to-many user <-> snippet) and fork lineage
//! (snippet -> source snippet provenance pointer).

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{FavoriteToggle, Page, Snippet, SnippetView};
use crate::predicate::Predicate;
use crate::query::Paging;
use crate::traits::SnippetRepo;

pub struct RelationshipEngine {
    repo: Arc<dyn SnippetRepo>,
}

impl RelationshipEngine {
    pub fn new(repo: Arc<dyn SnippetRepo>) -> Self {
        Self { repo }
    }

    /// Flips the caller's favorite. Two calls return to the original state.
    pub async fn toggle_favorite(&self, id: Uuid, caller: Uuid) -> Result<FavoriteToggle> {
        let snippet = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::snippet_not_found(id))?;
        if !snippet.is_visible_to(caller) {
            tracing::warn!(snippet_id = %id, %caller, "rejected favorite on private snippet");
            return Err(AppError::Forbidden(
                "You can't favorite a private snippet you don't own!".to_string(),
            ));
        }

        let toggled = self
            .repo
            .toggle_favorite(id, caller)
            .await?
            .ok_or_else(|| AppError::snippet_not_found(id))?;
        tracing::info!(
            snippet_id = %id,
            %caller,
            is_favorited = toggled.is_favorited,
            favorite_count = toggled.favorite_count,
            "favorite toggled"
        );
        Ok(toggled)
    }

    /// Copies a public snippet into a new private one owned by the caller.
    pub async fn fork_snippet(&self, id: Uuid, caller: Uuid) -> Result<SnippetView> {
        let source = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|s| s.is_public)
            .ok_or_else(|| AppError::snippet_not_found(id))?;

        let fork = fork_of(&source, caller);
        let fork_id = fork.id;
        self.repo.insert(fork).await?;

        let created = self.repo.find_by_id(fork_id).await?.ok_or_else(|| {
            tracing::error!(snippet_id = %fork_id, "fork written but read-back found nothing");
            AppError::Internal("Something went wrong while forking snippet!".to_string())
        })?;
        tracing::info!(snippet_id = %fork_id, source_id = %id, %caller, "snippet forked");
        Ok(SnippetView::for_caller(created, caller))
    }

    /// Favorites the caller can still see; stale private favorites are skipped.
    pub async fn get_favorites(&self, caller: Uuid, paging: Paging) -> Result<Page<SnippetView>> {
        let filter = Predicate::and([Predicate::FavoritedBy(caller), Predicate::visible_to(caller)]);
        let total = self.repo.count(&filter).await?;
        let items = self
            .repo
            .find(&filter, paging.window())
            .await?
            .into_iter()
            .map(|s| SnippetView::for_caller(s, caller))
            .collect();
        Ok(Page { items, pagination: paging.describe(total) })
    }
}

fn fork_of(source: &Snippet, owner: Uuid) -> Snippet {
    let now = Utc::now();
    Snippet {
        id: Uuid::now_v7(),
        title: source.title.clone(),
        code: source.code.clone(),
        code_language: source.code_language.clone(),
        description: source.description.clone(),
        tags: source.tags.clone(),
        owner,
        is_public: false,
        favorited_by: Vec::new(),
        forked_from: Some(source.id),
        created_at: now,
        updated_at: now,
    }
}
