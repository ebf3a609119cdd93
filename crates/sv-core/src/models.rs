//! # Domain Models
//!
//! These structs represent the core entities of snipvault.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored unit of code plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    /// Always lowercase (e.g., "rust", "javascript")
    pub code_language: String,
    pub description: String,
    /// Normalized tags in their original insertion order
    pub tags: Vec<String>,
    /// Set once at creation, never reassigned
    pub owner: Uuid,
    pub is_public: bool,
    /// Never serialized; views expose only the count and the caller's own flag
    #[serde(skip_serializing, default)]
    pub favorited_by: Vec<Uuid>,
    /// Provenance pointer only; the source may no longer exist
    pub forked_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// A snippet is visible to its owner and, when public, to everyone.
    pub fn is_visible_to(&self, caller: Uuid) -> bool {
        self.owner == caller || self.is_public
    }

    pub fn is_favorited_by(&self, user: Uuid) -> bool {
        self.favorited_by.contains(&user)
    }

    pub fn favorite_count(&self) -> u64 {
        self.favorited_by.len() as u64
    }
}

/// User input for creating a snippet. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetDraft {
    pub title: Option<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

/// User input for a partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetPatch {
    pub title: Option<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

/// A validated, normalized partial update ready for the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetChanges {
    pub title: Option<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl SnippetChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.code.is_none()
            && self.code_language.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.is_public.is_none()
    }

    /// Applies the changes in place. Used by stores that hold whole documents.
    pub fn apply_to(&self, snippet: &mut Snippet) {
        if let Some(title) = &self.title {
            snippet.title = title.clone();
        }
        if let Some(code) = &self.code {
            snippet.code = code.clone();
        }
        if let Some(language) = &self.code_language {
            snippet.code_language = language.clone();
        }
        if let Some(description) = &self.description {
            snippet.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            snippet.tags = tags.clone();
        }
        if let Some(is_public) = self.is_public {
            snippet.is_public = is_public;
        }
        snippet.updated_at = self.updated_at;
    }
}

/// An account known to the Identity Provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Stored lowercase
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// SHA-256 digest of the currently valid refresh token
    #[serde(skip_serializing)]
    pub refresh_token_digest: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a user may see about their own account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
        }
    }
}

// ______________________________________ Enriched views ______________________________________

/// A snippet as shown to a caller who can see all of its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetView {
    #[serde(flatten)]
    pub snippet: Snippet,
    pub favorite_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorited: Option<bool>,
}

impl SnippetView {
    pub fn for_caller(snippet: Snippet, caller: Uuid) -> Self {
        let is_favorited = Some(snippet.is_favorited_by(caller));
        Self {
            favorite_count: snippet.favorite_count(),
            is_favorited,
            snippet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSummary {
    /// `None` once the owning account no longer resolves
    pub username: Option<String>,
}

/// A snippet as shown in public listings: no favorite flag, no owner internals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSnippetView {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub code_language: String,
    pub description: String,
    pub tags: Vec<String>,
    pub owner: OwnerSummary,
    pub forked_from: Option<Uuid>,
    pub favorite_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicSnippetView {
    pub fn new(snippet: Snippet, owner_username: Option<String>) -> Self {
        Self {
            favorite_count: snippet.favorite_count(),
            id: snippet.id,
            title: snippet.title,
            code: snippet.code,
            code_language: snippet.code_language,
            description: snippet.description,
            tags: snippet.tags,
            owner: OwnerSummary { username: owner_username },
            forked_from: snippet.forked_from,
            created_at: snippet.created_at,
            updated_at: snippet.updated_at,
        }
    }
}

/// Listing item, shaped by the scope it was listed under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SnippetItem {
    Owned(SnippetView),
    Public(PublicSnippetView),
}

impl SnippetItem {
    pub fn id(&self) -> Uuid {
        match self {
            SnippetItem::Owned(view) => view.snippet.id,
            SnippetItem::Public(view) => view.id,
        }
    }
}

// ______________________________________ Pagination ______________________________________

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    #[serde(rename = "snippets")]
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// ______________________________________ Relationship & stats ______________________________________

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub is_favorited: bool,
    pub favorite_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub title: String,
    pub code_language: String,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetStats {
    pub total_snippets: u64,
    pub most_used_languages: Vec<LanguageCount>,
    pub recent_activity: Vec<RecentActivity>,
    /// Total character count of the `code` field across owned snippets
    pub storage_usage: u64,
}
