//! # Snippet Store
//!
//! CRUD over snippets with ownership and visibility checks.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Snippet, SnippetChanges, SnippetDraft, SnippetPatch, SnippetView};
use crate::traits::SnippetRepo;
use crate::validation::{
    check_code, checked_tags, normalize_description, normalize_language, normalize_title,
};

pub struct SnippetStore {
    repo: Arc<dyn SnippetRepo>,
}

impl SnippetStore {
    pub fn new(repo: Arc<dyn SnippetRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, draft: SnippetDraft, owner: Uuid) -> Result<SnippetView> {
        let title = normalize_title(draft.title.as_deref())?;
        let code = check_code(draft.code.as_deref())?;
        let tags = checked_tags(draft.tags.unwrap_or_default())?;
        let description = normalize_description(draft.description.as_deref())?;
        let now = Utc::now();

        let snippet = Snippet {
            id: Uuid::now_v7(),
            title,
            code,
            code_language: normalize_language(draft.code_language.as_deref()),
            description,
            tags,
            owner,
            is_public: draft.is_public.unwrap_or(false),
            favorited_by: Vec::new(),
            forked_from: None,
            created_at: now,
            updated_at: now,
        };
        let id = snippet.id;
        self.repo.insert(snippet).await?;

        let created = self.read_back(id, "creating snippet").await?;
        tracing::info!(snippet_id = %id, %owner, "snippet created");
        Ok(SnippetView::for_caller(created, owner))
    }

    /// Hides private snippets of other users behind `NotFound`.
    pub async fn get_by_id(&self, id: Uuid, caller: Uuid) -> Result<SnippetView> {
        let snippet = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|s| s.is_visible_to(caller))
            .ok_or_else(|| AppError::snippet_not_found(id))?;
        Ok(SnippetView::for_caller(snippet, caller))
    }

    pub async fn update(&self, id: Uuid, caller: Uuid, patch: SnippetPatch) -> Result<SnippetView> {
        let current = self.owned(id, caller, "update").await?;
        let changes = validate_patch(patch)?;
        if changes.is_empty() {
            return Ok(SnippetView::for_caller(current, caller));
        }

        if !self.repo.update_owned(id, caller, &changes).await? {
            return Err(AppError::snippet_not_found(id));
        }
        let updated = self.read_back(id, "updating snippet").await?;
        tracing::info!(snippet_id = %id, "snippet updated");
        Ok(SnippetView::for_caller(updated, caller))
    }

    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<()> {
        self.owned(id, caller, "delete").await?;
        if !self.repo.delete_owned(id, caller).await? {
            return Err(AppError::snippet_not_found(id));
        }
        tracing::info!(snippet_id = %id, "snippet deleted");
        Ok(())
    }

    async fn owned(&self, id: Uuid, caller: Uuid, action: &str) -> Result<Snippet> {
        let snippet = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::snippet_not_found(id))?;
        if snippet.owner != caller {
            tracing::warn!(snippet_id = %id, %caller, action, "rejected non-owner mutation");
            return Err(AppError::Forbidden(format!(
                "You don't have permission to {action} this snippet!"
            )));
        }
        Ok(snippet)
    }

    async fn read_back(&self, id: Uuid, context: &str) -> Result<Snippet> {
        match self.repo.find_by_id(id).await? {
            Some(snippet) => Ok(snippet),
            None => {
                tracing::error!(snippet_id = %id, context, "write succeeded but read-back found nothing");
                Err(AppError::Internal(format!("Something went wrong while {context}!")))
            }
        }
    }
}

/// Validates only the fields present in the patch.
fn validate_patch(patch: SnippetPatch) -> Result<SnippetChanges> {
    let title = match patch.title {
        Some(raw) => Some(normalize_title(Some(&raw))?),
        None => None,
    };
    let code = match patch.code {
        Some(raw) => Some(check_code(Some(&raw))?),
        None => None,
    };
    let tags = match patch.tags {
        Some(raw) => Some(checked_tags(raw)?),
        None => None,
    };
    let description = match patch.description {
        Some(raw) => Some(normalize_description(Some(&raw))?),
        None => None,
    };
    Ok(SnippetChanges {
        title,
        code,
        code_language: patch.code_language.map(|raw| normalize_language(Some(&raw))),
        description,
        tags,
        is_public: patch.is_public,
        updated_at: Utc::now(),
    })
}
