mod common;

use chrono::{Duration, Utc};
use common::{backends, draft, user};
use sv_core::{ListFilters, OwnerScope, Paging, SnippetDraft, SnippetItem};

#[tokio::test]
async fn pagination_reports_pages_and_caps_items() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        for i in 0..25 {
            backend.service.store.create(draft(&format!("s{i}"), "x", &[], false), a).await.unwrap();
        }
        let query = &backend.service.query;
        let filters = ListFilters::default();

        let last = query
            .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(Some(3), Some(10)))
            .await
            .unwrap();
        assert_eq!(last.pagination.total, 25, "backend {}", backend.name);
        assert_eq!(last.pagination.total_pages, 3);
        assert_eq!(last.items.len(), 5);

        let beyond = query
            .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(Some(9), Some(10)))
            .await
            .unwrap();
        assert!(beyond.items.is_empty());

        let oversized = query
            .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(Some(1), Some(1_000)))
            .await
            .unwrap();
        assert_eq!(oversized.items.len(), 25);
        assert_eq!(oversized.pagination.total_pages, 1);
    }
}

#[tokio::test]
async fn empty_listing_has_one_page() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let page = backend
            .service
            .query
            .list_snippets(OwnerScope::Mine(a), &ListFilters::default(), Paging::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.total_pages, 1, "backend {}", backend.name);
    }
}

#[tokio::test]
async fn pages_do_not_overlap() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        for i in 0..7 {
            backend.service.store.create(draft(&format!("s{i}"), "x", &[], false), a).await.unwrap();
        }
        let mut seen = Vec::new();
        for page in 1..=3 {
            let listed = backend
                .service
                .query
                .list_snippets(OwnerScope::Mine(a), &ListFilters::default(), Paging::new(Some(page), Some(3)))
                .await
                .unwrap();
            seen.extend(listed.items.iter().map(SnippetItem::id));
        }
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(seen.len(), 7, "backend {}", backend.name);
        assert_eq!(unique.len(), 7);
    }
}

#[tokio::test]
async fn tag_language_and_search_filters_combine() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let store = &backend.service.store;
        let rusty = SnippetDraft { code_language: Some("Rust".to_string()), ..draft("Parser", "fn parse()", &["cli", "io"], false) };
        let target = store.create(rusty, a).await.unwrap();
        store.create(draft("Parser", "function parse()", &["cli"], false), a).await.unwrap();
        store.create(draft("Other", "fn other()", &["io"], false), a).await.unwrap();

        let filters = ListFilters {
            search: Some("PARSE".to_string()),
            tags: vec!["CLI".to_string()],
            language: Some("rust".to_string()),
            ..Default::default()
        };
        let page = backend
            .service
            .query
            .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1, "backend {}", backend.name);
        assert_eq!(page.items[0].id(), target.snippet.id);
    }
}

#[tokio::test]
async fn search_matches_tags_and_description() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let store = &backend.service.store;
        store.create(draft("one", "x", &["networking"], false), a).await.unwrap();
        let described = SnippetDraft { description: Some("Handles Networking retries".to_string()), ..draft("two", "y", &[], false) };
        store.create(described, a).await.unwrap();
        store.create(draft("three", "z", &[], false), a).await.unwrap();

        let filters = ListFilters { search: Some("network".to_string()), ..Default::default() };
        let page = backend
            .service
            .query
            .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2, "backend {}", backend.name);
    }
}

#[tokio::test]
async fn search_folds_accented_letters() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let store = &backend.service.store;
        let accented = store.create(draft("Ärger im Büro", "x", &[], false), a).await.unwrap();
        store.create(draft("Arger", "y", &[], false), a).await.unwrap();

        for term in ["ärger", "ÄRGER", "büro"] {
            let filters = ListFilters { search: Some(term.to_string()), ..Default::default() };
            let page = backend
                .service
                .query
                .list_snippets(OwnerScope::Mine(a), &filters, Paging::new(None, None))
                .await
                .unwrap();
            assert_eq!(page.pagination.total, 1, "backend {} term {term}", backend.name);
            assert_eq!(page.items[0].id(), accented.snippet.id);
        }
    }
}

#[tokio::test]
async fn date_bounds_filter_creation_time() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        backend.service.store.create(draft("today", "x", &[], false), a).await.unwrap();
        let query = &backend.service.query;
        let now = Utc::now();

        let future = ListFilters { from: Some(now + Duration::days(1)), ..Default::default() };
        let none = query.list_snippets(OwnerScope::Mine(a), &future, Paging::new(None, None)).await.unwrap();
        assert_eq!(none.pagination.total, 0, "backend {}", backend.name);

        let window = ListFilters {
            from: Some(now - Duration::days(1)),
            to: Some(now + Duration::days(1)),
            ..Default::default()
        };
        let one = query.list_snippets(OwnerScope::Mine(a), &window, Paging::new(None, None)).await.unwrap();
        assert_eq!(one.pagination.total, 1, "backend {}", backend.name);
    }
}

#[tokio::test]
async fn public_scope_hides_private_and_resolves_owner() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let b = user(&backend, "bob").await;
        let store = &backend.service.store;
        let open = store.create(draft("open", "x", &[], true), a).await.unwrap();
        store.create(draft("closed", "x", &[], false), a).await.unwrap();
        store.create(draft("also closed", "x", &[], false), b).await.unwrap();

        let page = backend
            .service
            .query
            .list_snippets(OwnerScope::Public, &ListFilters::default(), Paging::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1, "backend {}", backend.name);
        match &page.items[0] {
            SnippetItem::Public(view) => {
                assert_eq!(view.id, open.snippet.id);
                assert_eq!(view.owner.username.as_deref(), Some("alice"));
            }
            other => panic!("expected a public item, got {other:?}"),
        }

        let single = backend.service.query.public_snippet(open.snippet.id).await.unwrap();
        assert_eq!(single.title, "open");
    }
}

#[tokio::test]
async fn mine_scope_never_leaks_other_users() {
    for backend in backends().await {
        let a = user(&backend, "alice").await;
        let b = user(&backend, "bob").await;
        backend.service.store.create(draft("a1", "x", &[], true), a).await.unwrap();
        backend.service.store.create(draft("b1", "x", &[], true), b).await.unwrap();

        let page = backend
            .service
            .query
            .list_snippets(OwnerScope::Mine(a), &ListFilters::default(), Paging::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1, "backend {}", backend.name);
        assert!(matches!(&page.items[0], SnippetItem::Owned(view) if view.snippet.owner == a));
    }
}
