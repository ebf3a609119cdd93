//! # Query Engine
//!
//! Filtered, paginated, newest-first views over the snippet store.
//! User-supplied filter values are sanitized, never rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Page, Pagination, PublicSnippetView, Snippet, SnippetItem, SnippetView};
use crate::predicate::{Predicate, Window};
use crate::traits::{SnippetRepo, UserRepo};
use crate::validation::{parse_date_bound, parse_tag_filter};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl Paging {
    /// Clamps `page` to at least 1 and `limit` into `1..=100`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(DEFAULT_PAGE, |p| p.clamp(1, u32::MAX as i64) as u32);
        let limit = limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT as i64) as u32);
        Self { page, limit }
    }

    pub fn window(&self) -> Window {
        let offset = u64::from(self.page - 1) * u64::from(self.limit);
        Window::page(offset, u64::from(self.limit))
    }

    pub fn describe(&self, total: u64) -> Pagination {
        let limit = u64::from(self.limit);
        Pagination {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total.div_ceil(limit).max(1),
        }
    }
}

/// Whose snippets a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// The caller's own snippets, any visibility
    Mine(Uuid),
    /// Public snippets of any owner
    Public,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    pub search: Option<String>,
    /// AND semantics; already lowercase and non-blank
    pub tags: Vec<String>,
    pub language: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Listing parameters as they arrive from a query string.
#[derive(Debug, Clone, Default)]
pub struct RawListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub language: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RawListQuery {
    /// Collects decoded `key=value` pairs. A repeated key keeps its first
    /// value, except `tags`, whose values are all kept. Unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut raw.page,
                "limit" => &mut raw.limit,
                "search" => &mut raw.search,
                "language" => &mut raw.language,
                "from" => &mut raw.from,
                "to" => &mut raw.to,
                "tags" => {
                    match &mut raw.tags {
                        Some(joined) => {
                            joined.push(',');
                            joined.push_str(&value);
                        }
                        None => raw.tags = Some(value),
                    }
                    continue;
                }
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        raw
    }

    pub fn paging(&self) -> Paging {
        let number = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        Paging::new(number(&self.page), number(&self.limit))
    }

    pub fn filters(&self) -> ListFilters {
        let non_blank = |raw: &Option<String>| {
            raw.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        ListFilters {
            search: non_blank(&self.search),
            tags: self.tags.as_deref().map(parse_tag_filter).unwrap_or_default(),
            language: non_blank(&self.language).map(|l| l.to_lowercase()),
            from: self.from.as_deref().and_then(|raw| parse_date_bound(raw, false)),
            to: self.to.as_deref().and_then(|raw| parse_date_bound(raw, true)),
        }
    }
}

/// Builds the store filter for a listing.
pub fn listing_filter(scope: OwnerScope, filters: &ListFilters) -> Predicate {
    let mut clauses = vec![match scope {
        OwnerScope::Mine(owner) => Predicate::Owner(owner),
        OwnerScope::Public => Predicate::IsPublic(true),
    }];
    if let Some(term) = &filters.search {
        clauses.push(Predicate::search(term));
    }
    clauses.extend(
        filters
            .tags
            .iter()
            .filter(|tag| !tag.trim().is_empty())
            .map(|tag| Predicate::tag(tag)),
    );
    if let Some(language) = &filters.language {
        clauses.push(Predicate::language(language));
    }
    if let Some(from) = filters.from {
        clauses.push(Predicate::CreatedFrom(from));
    }
    if let Some(to) = filters.to {
        clauses.push(Predicate::CreatedUntil(to));
    }
    Predicate::and(clauses)
}

pub struct QueryEngine {
    repo: Arc<dyn SnippetRepo>,
    users: Arc<dyn UserRepo>,
}

impl QueryEngine {
    pub fn new(repo: Arc<dyn SnippetRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { repo, users }
    }

    pub async fn list_snippets(
        &self,
        scope: OwnerScope,
        filters: &ListFilters,
        paging: Paging,
    ) -> Result<Page<SnippetItem>> {
        let filter = listing_filter(scope, filters);
        tracing::debug!(?scope, ?filter, page = paging.page, limit = paging.limit, "listing snippets");

        let total = self.repo.count(&filter).await?;
        let found = self.repo.find(&filter, paging.window()).await?;

        let items = match scope {
            OwnerScope::Mine(caller) => found
                .into_iter()
                .map(|s| SnippetItem::Owned(SnippetView::for_caller(s, caller)))
                .collect(),
            OwnerScope::Public => self
                .public_views(found)
                .await?
                .into_iter()
                .map(SnippetItem::Public)
                .collect(),
        };

        Ok(Page { items, pagination: paging.describe(total) })
    }

    /// Anonymous read of a single public snippet.
    pub async fn public_snippet(&self, id: Uuid) -> Result<PublicSnippetView> {
        let snippet = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|s| s.is_public)
            .ok_or_else(|| AppError::snippet_not_found(id))?;
        let mut views = self.public_views(vec![snippet]).await?;
        views.pop().ok_or_else(|| AppError::Internal("public projection lost a snippet".to_string()))
    }

    async fn public_views(&self, snippets: Vec<Snippet>) -> Result<Vec<PublicSnippetView>> {
        let mut owners: Vec<Uuid> = snippets.iter().map(|s| s.owner).collect();
        owners.sort_unstable();
        owners.dedup();
        let names = self.users.usernames(&owners).await?;
        Ok(snippets
            .into_iter()
            .map(|s| {
                let username = names.get(&s.owner).cloned();
                PublicSnippetView::new(s, username)
            })
            .collect())
    }
}
