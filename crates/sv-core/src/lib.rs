//! snipvault/crates/sv-core/src/lib.rs
//!
//! The central domain logic and interface definitions for snipvault:
//! snippet CRUD, the query, relationship and aggregation engines, and
//! the ports that storage and identity plugins implement.

pub mod aggregation;
pub mod error;
pub mod memory;
pub mod models;
pub mod predicate;
pub mod query;
pub mod relationship;
pub mod service;
pub mod store;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use predicate::{Predicate, TextField, Window};
pub use query::{ListFilters, OwnerScope, Paging, RawListQuery};
pub use service::SnippetService;
pub use traits::*;
