//! # Query predicates
//!
//! A small, store-independent filter language. Engines compose typed
//! predicates; each repository plugin translates them into its own
//! query form (SQL, in-memory evaluation, ...).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Snippet;

/// Text fields covered by a free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    Code,
    /// Matches if any single tag contains the needle
    Tags,
}

impl TextField {
    pub const SEARCHABLE: [TextField; 4] =
        [TextField::Title, TextField::Description, TextField::Code, TextField::Tags];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every snippet
    Any,
    Owner(Uuid),
    IsPublic(bool),
    /// Exact match against a normalized (lowercase) tag
    HasTag(String),
    /// Exact match against the lowercase language
    Language(String),
    /// Case-insensitive literal substring. The needle is stored lowercase.
    Contains(TextField, String),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
    FavoritedBy(Uuid),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Owner or public.
    pub fn visible_to(caller: Uuid) -> Self {
        Predicate::Or(vec![Predicate::Owner(caller), Predicate::IsPublic(true)])
    }

    /// Literal, case-insensitive search across every searchable field.
    pub fn search(term: &str) -> Self {
        let needle = term.to_lowercase();
        Predicate::Or(
            TextField::SEARCHABLE
                .iter()
                .map(|field| Predicate::Contains(*field, needle.clone()))
                .collect(),
        )
    }

    pub fn tag(tag: &str) -> Self {
        Predicate::HasTag(tag.trim().to_lowercase())
    }

    pub fn language(language: &str) -> Self {
        Predicate::Language(language.trim().to_lowercase())
    }

    /// Conjunction that flattens nested `And`s and drops `Any`.
    pub fn and(clauses: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for clause in clauses {
            match clause {
                Predicate::Any => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::Any,
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    pub fn matches(&self, snippet: &Snippet) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Owner(owner) => snippet.owner == *owner,
            Predicate::IsPublic(flag) => snippet.is_public == *flag,
            Predicate::HasTag(tag) => snippet.tags.iter().any(|t| t == tag),
            Predicate::Language(language) => snippet.code_language == *language,
            Predicate::Contains(field, needle) => field_contains(snippet, *field, needle),
            Predicate::CreatedFrom(from) => snippet.created_at >= *from,
            Predicate::CreatedUntil(to) => snippet.created_at <= *to,
            Predicate::FavoritedBy(user) => snippet.is_favorited_by(*user),
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(snippet)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(snippet)),
        }
    }
}

fn field_contains(snippet: &Snippet, field: TextField, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    match field {
        TextField::Title => hit(&snippet.title),
        TextField::Description => hit(&snippet.description),
        TextField::Code => hit(&snippet.code),
        TextField::Tags => snippet.tags.iter().any(|tag| hit(tag)),
    }
}

/// Which slice of the newest-first ordering to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    /// `None` returns everything after `offset`
    pub limit: Option<u64>,
}

impl Window {
    pub fn all() -> Self {
        Self { offset: 0, limit: None }
    }

    pub fn page(offset: u64, limit: u64) -> Self {
        Self { offset, limit: Some(limit) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(title: &str, code: &str, tags: &[&str]) -> Snippet {
        let now = Utc::now();
        Snippet {
            id: Uuid::now_v7(),
            title: title.to_string(),
            code: code.to_string(),
            code_language: "python".to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            owner: Uuid::now_v7(),
            is_public: true,
            favorited_by: Vec::new(),
            forked_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_is_literal_not_a_pattern() {
        let literal = snippet("x", "let v = a.b;", &[]);
        let lookalike = snippet("x", "let v = axb;", &[]);
        let search = Predicate::search("A.B");
        assert!(search.matches(&literal));
        assert!(!search.matches(&lookalike));
    }

    #[test]
    fn search_covers_tags_case_insensitively() {
        let s = snippet("Hello", "print(1)", &["webdev"]);
        assert!(Predicate::search("WEB").matches(&s));
        assert!(Predicate::search("hell").matches(&s));
        assert!(!Predicate::search("rust").matches(&s));
    }

    #[test]
    fn tag_clauses_require_every_tag() {
        let s = snippet("t", "c", &["rust", "cli"]);
        let both = Predicate::and([Predicate::tag("CLI"), Predicate::tag("rust")]);
        let extra = Predicate::and([Predicate::tag("cli"), Predicate::tag("web")]);
        assert!(both.matches(&s));
        assert!(!extra.matches(&s));
    }

    #[test]
    fn and_flattens_and_drops_any() {
        let owner = Uuid::now_v7();
        let nested = Predicate::and([
            Predicate::Any,
            Predicate::and([Predicate::Owner(owner), Predicate::IsPublic(true)]),
        ]);
        assert_eq!(
            nested,
            Predicate::And(vec![Predicate::Owner(owner), Predicate::IsPublic(true)])
        );
        assert_eq!(Predicate::and([Predicate::Any]), Predicate::Any);
    }

    #[test]
    fn visibility_is_owner_or_public() {
        let mut s = snippet("t", "c", &[]);
        s.is_public = false;
        assert!(Predicate::visible_to(s.owner).matches(&s));
        assert!(!Predicate::visible_to(Uuid::now_v7()).matches(&s));
    }
}
