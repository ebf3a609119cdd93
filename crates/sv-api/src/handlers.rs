//! # sv-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core engines.
//! Handlers only parse input, call one operation, and wrap the result.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sv_auth_jwt::{AccountService, LoginRequest, RegisterRequest};
use sv_core::{AppError, IdentityProvider, OwnerScope, RawListQuery, SnippetDraft, SnippetPatch, SnippetService};
use uuid::Uuid;

use crate::envelope::{fail, respond, ApiError, ResponseOptions};
use crate::extract::Caller;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub snippets: SnippetService,
    pub accounts: Arc<AccountService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub responses: ResponseOptions,
}

impl AppState {
    fn reject(&self, error: AppError) -> ApiError {
        self.responses.reject(error)
    }

    /// Malformed ids resolve like missing ones.
    fn snippet_id(&self, raw: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(raw.trim()).map_err(|_| self.reject(AppError::snippet_not_found(raw)))
    }
}

type Reply = Result<HttpResponse, ApiError>;

/// Query strings are read as raw pairs so repeated keys never fail extraction.
type QueryPairs = web::Query<Vec<(String, String)>>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Server is Alive!" }))
}

/// Fallback for paths no route matches.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    tracing::debug!(method = %req.method(), path = req.path(), "no route matched");
    fail(StatusCode::NOT_FOUND, "Route not found")
}

// _______________________________________ Auth _______________________________________

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> Reply {
    let session = state.accounts.register(body.into_inner()).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::CREATED, "User registered successfully", session))
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Reply {
    let session = state.accounts.login(body.into_inner()).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "User logged in successfully", session))
}

pub async fn refresh(state: web::Data<AppState>, body: web::Json<RefreshRequest>) -> Reply {
    let token = body
        .refresh_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| state.reject(AppError::Unauthorized("Refresh token is required!".to_string())))?;
    let tokens = state.accounts.refresh(token).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Access token refreshed", tokens))
}

pub async fn logout(state: web::Data<AppState>, caller: Caller) -> Reply {
    state.accounts.logout(caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "User logged out successfully", serde_json::json!({})))
}

pub async fn profile(state: web::Data<AppState>, caller: Caller) -> Reply {
    let profile = state.accounts.profile(caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Profile fetched successfully", profile))
}

// _______________________________________ Public snippets _______________________________________

pub async fn list_public(state: web::Data<AppState>, query: QueryPairs) -> Reply {
    let query = RawListQuery::from_pairs(query.into_inner());
    let page = state
        .snippets
        .query
        .list_snippets(OwnerScope::Public, &query.filters(), query.paging())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Public snippets retrieved successfully", page))
}

pub async fn get_public(state: web::Data<AppState>, path: web::Path<String>) -> Reply {
    let id = state.snippet_id(&path)?;
    let snippet = state.snippets.query.public_snippet(id).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippet fetched successfully", snippet))
}

// _______________________________________ Caller's snippets _______________________________________

pub async fn create_snippet(state: web::Data<AppState>, caller: Caller, body: web::Json<SnippetDraft>) -> Reply {
    let snippet = state
        .snippets
        .store
        .create(body.into_inner(), caller.0)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::CREATED, "Snippet created successfully", snippet))
}

pub async fn list_mine(state: web::Data<AppState>, caller: Caller, query: QueryPairs) -> Reply {
    let query = RawListQuery::from_pairs(query.into_inner());
    let page = state
        .snippets
        .query
        .list_snippets(OwnerScope::Mine(caller.0), &query.filters(), query.paging())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippets retrieved successfully", page))
}

pub async fn get_snippet(state: web::Data<AppState>, caller: Caller, path: web::Path<String>) -> Reply {
    let id = state.snippet_id(&path)?;
    let snippet = state.snippets.store.get_by_id(id, caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippet fetched successfully", snippet))
}

pub async fn update_snippet(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<SnippetPatch>,
) -> Reply {
    let id = state.snippet_id(&path)?;
    let snippet = state
        .snippets
        .store
        .update(id, caller.0, body.into_inner())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippet updated successfully", snippet))
}

pub async fn delete_snippet(state: web::Data<AppState>, caller: Caller, path: web::Path<String>) -> Reply {
    let id = state.snippet_id(&path)?;
    state.snippets.store.delete(id, caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippet deleted successfully", serde_json::json!({})))
}

// _______________________________________ Relationships _______________________________________

pub async fn toggle_favorite(state: web::Data<AppState>, caller: Caller, path: web::Path<String>) -> Reply {
    let id = state.snippet_id(&path)?;
    let toggled = state
        .snippets
        .relations
        .toggle_favorite(id, caller.0)
        .await
        .map_err(|e| state.reject(e))?;
    let message = if toggled.is_favorited { "Snippet added to favorites" } else { "Snippet removed from favorites" };
    Ok(respond(StatusCode::OK, message, toggled))
}

pub async fn fork_snippet(state: web::Data<AppState>, caller: Caller, path: web::Path<String>) -> Reply {
    let id = state.snippet_id(&path)?;
    let fork = state.snippets.relations.fork_snippet(id, caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::CREATED, "Snippet forked successfully", fork))
}

pub async fn list_favorites(state: web::Data<AppState>, caller: Caller, query: QueryPairs) -> Reply {
    let query = RawListQuery::from_pairs(query.into_inner());
    let page = state
        .snippets
        .relations
        .get_favorites(caller.0, query.paging())
        .await
        .map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Favorite snippets retrieved successfully", page))
}

// _______________________________________ Aggregations _______________________________________

pub async fn all_tags(state: web::Data<AppState>, caller: Caller) -> Reply {
    let tags = state.snippets.stats.all_tags(caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Tags retrieved successfully", tags))
}

pub async fn tag_stats(state: web::Data<AppState>, caller: Caller) -> Reply {
    let stats = state.snippets.stats.tag_stats(caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Tag stats retrieved successfully", stats))
}

pub async fn snippet_stats(state: web::Data<AppState>, caller: Caller) -> Reply {
    let stats = state.snippets.stats.snippet_stats(caller.0).await.map_err(|e| state.reject(e))?;
    Ok(respond(StatusCode::OK, "Snippet stats retrieved successfully", stats))
}
