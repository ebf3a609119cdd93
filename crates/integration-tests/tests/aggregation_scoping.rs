mod common;

use common::{backends, draft, user};
use sv_core::SnippetDraft;

fn in_language(title: &str, code: &str, language: &str, tags: &[&str]) -> SnippetDraft {
    SnippetDraft { code_language: Some(language.to_string()), ..draft(title, code, tags, false) }
}

#[tokio::test]
async fn stats_only_count_the_callers_snippets() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let b = user(&backend, "bob").await;
        let store = &backend.service.store;
        store.create(in_language("one", "abcd", "rust", &["cli"]), a).await.unwrap();
        store.create(in_language("two", "ab", "rust", &["cli", "io"]), a).await.unwrap();
        store.create(in_language("three", "a", "Go", &[]), a).await.unwrap();
        store.create(in_language("theirs", "zzzzzzzz", "python", &["cli", "ml"]), b).await.unwrap();

        let stats = backend.service.stats.snippet_stats(a).await.unwrap();
        assert_eq!(stats.total_snippets, 3, "backend {}", backend.name);
        assert_eq!(stats.storage_usage, 7);
        assert_eq!(stats.most_used_languages[0].language, "rust");
        assert_eq!(stats.most_used_languages[0].count, 2);
        assert!(stats.most_used_languages.iter().all(|l| l.language != "python"));
        assert_eq!(stats.recent_activity.len(), 3);

        let tags = backend.service.stats.tag_stats(a).await.unwrap();
        assert_eq!(tags[0].tag, "cli");
        assert_eq!(tags[0].count, 2);
        assert!(tags.iter().all(|t| t.tag != "ml"));

        let all = backend.service.stats.all_tags(a).await.unwrap();
        assert_eq!(all, vec!["cli", "io"]);
    }
}

#[tokio::test]
async fn recent_activity_is_capped() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        for i in 0..12 {
            backend.service.store.create(draft(&format!("s{i}"), "x", &[], false), a).await.unwrap();
        }
        let stats = backend.service.stats.snippet_stats(a).await.unwrap();
        assert_eq!(stats.total_snippets, 12, "backend {}", backend.name);
        assert_eq!(stats.recent_activity.len(), 10);
    }
}

#[tokio::test]
async fn empty_owner_has_empty_stats() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let stats = backend.service.stats.snippet_stats(a).await.unwrap();
        assert_eq!(stats.total_snippets, 0, "backend {}", backend.name);
        assert!(stats.most_used_languages.is_empty());
        assert!(backend.service.stats.all_tags(a).await.unwrap().is_empty());
    }
}
