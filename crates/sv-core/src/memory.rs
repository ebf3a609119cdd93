//! In-process repositories.
//!
//! Used by tests and by ephemeral deployments. Every mutation happens
//! under a single write guard, so each one is atomic like the store
//! primitives the traits require.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{FavoriteToggle, Snippet, SnippetChanges, User};
use crate::predicate::{Predicate, Window};
use crate::traits::{SnippetRepo, UserRepo};

/// Snippets kept in insertion order.
#[derive(Default)]
pub struct InMemorySnippetRepo {
    snippets: RwLock<Vec<Snippet>>,
}

impl InMemorySnippetRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnippetRepo for InMemorySnippetRepo {
    async fn insert(&self, snippet: Snippet) -> anyhow::Result<()> {
        let mut snippets = self.snippets.write().await;
        if snippets.iter().any(|s| s.id == snippet.id) {
            anyhow::bail!("duplicate snippet id {}", snippet.id);
        }
        snippets.push(snippet);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Snippet>> {
        let snippets = self.snippets.read().await;
        Ok(snippets.iter().find(|s| s.id == id).cloned())
    }

    async fn find(&self, filter: &Predicate, window: Window) -> anyhow::Result<Vec<Snippet>> {
        let snippets = self.snippets.read().await;
        let mut matched: Vec<&Snippet> = snippets.iter().filter(|s| filter.matches(s)).collect();
        // Stable sort keeps insertion order among equal timestamps.
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let take = window.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched
            .into_iter()
            .skip(window.offset as usize)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &Predicate) -> anyhow::Result<u64> {
        let snippets = self.snippets.read().await;
        Ok(snippets.iter().filter(|s| filter.matches(s)).count() as u64)
    }

    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: &SnippetChanges) -> anyhow::Result<bool> {
        let mut snippets = self.snippets.write().await;
        match snippets.iter_mut().find(|s| s.id == id && s.owner == owner) {
            Some(snippet) => {
                changes.apply_to(snippet);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let mut snippets = self.snippets.write().await;
        let before = snippets.len();
        snippets.retain(|s| !(s.id == id && s.owner == owner));
        Ok(snippets.len() < before)
    }

    async fn toggle_favorite(&self, id: Uuid, user: Uuid) -> anyhow::Result<Option<FavoriteToggle>> {
        let mut snippets = self.snippets.write().await;
        let Some(snippet) = snippets.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        let is_favorited = match snippet.favorited_by.iter().position(|u| *u == user) {
            Some(index) => {
                snippet.favorited_by.remove(index);
                false
            }
            None => {
                snippet.favorited_by.push(user);
                true
            }
        };
        Ok(Some(FavoriteToggle {
            is_favorited,
            favorite_count: snippet.favorite_count(),
        }))
    }
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: DashMap<Uuid, User>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        if self.users.iter().any(|u| u.username == user.username || u.email == user.email) {
            anyhow::bail!("username or email already registered");
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        let email = login.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.username == login || u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn is_taken(&self, username: &str, email: &str) -> anyhow::Result<bool> {
        let email = email.to_lowercase();
        Ok(self.users.iter().any(|u| u.username == username || u.email == email))
    }

    async fn set_refresh_digest(&self, id: Uuid, digest: Option<String>) -> anyhow::Result<bool> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.refresh_token_digest = digest;
                user.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn usernames(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| (*id, u.username.clone())))
            .collect())
    }
}
