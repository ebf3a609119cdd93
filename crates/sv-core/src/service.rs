//! Wires the engines over one shared store handle.

use std::sync::Arc;

use crate::aggregation::AggregationEngine;
use crate::query::QueryEngine;
use crate::relationship::RelationshipEngine;
use crate::store::SnippetStore;
use crate::traits::{SnippetRepo, UserRepo};

/// Every snippet operation, built once at startup and shared by handlers.
pub struct SnippetService {
    pub store: SnippetStore,
    pub query: QueryEngine,
    pub relations: RelationshipEngine,
    pub stats: AggregationEngine,
}

impl SnippetService {
    pub fn new(repo: Arc<dyn SnippetRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self {
            store: SnippetStore::new(repo.clone()),
            query: QueryEngine::new(repo.clone(), users),
            relations: RelationshipEngine::new(repo.clone()),
            stats: AggregationEngine::new(repo),
        }
    }
}
