//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FavoriteToggle, Snippet, SnippetChanges, User};
use crate::predicate::{Predicate, Window};

/// Data persistence contract for snippets.
///
/// Every mutating method must be a single atomic operation on the store:
/// callers never read-then-write around these.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SnippetRepo: Send + Sync {
    async fn insert(&self, snippet: Snippet) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Snippet>>;

    /// Matching snippets, newest first, ties in insertion order.
    async fn find(&self, filter: &Predicate, window: Window) -> anyhow::Result<Vec<Snippet>>;
    async fn count(&self, filter: &Predicate) -> anyhow::Result<u64>;

    /// Update-by-filter on `(id, owner)`. Returns `false` if nothing matched.
    async fn update_owned(&self, id: Uuid, owner: Uuid, changes: &SnippetChanges) -> anyhow::Result<bool>;
    /// Hard delete on `(id, owner)`. Returns `false` if nothing matched.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool>;

    /// Flips `user`'s membership in `favorited_by`. `None` if the snippet is gone.
    async fn toggle_favorite(&self, id: Uuid, user: Uuid) -> anyhow::Result<Option<FavoriteToggle>>;
}

/// Account persistence contract, owned by the Identity Provider.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Looks a user up by username or (lowercase) email.
    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>>;
    async fn is_taken(&self, username: &str, email: &str) -> anyhow::Result<bool>;
    async fn set_refresh_digest(&self, id: Uuid, digest: Option<String>) -> anyhow::Result<bool>;
    /// Resolves usernames for response shaping; unknown ids are absent.
    async fn usernames(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>>;
}

/// Identity contract consumed by the presentation layer.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies an access token and yields the caller's user id.
    async fn authenticate(&self, access_token: &str) -> Result<Uuid>;
}
