//! Infrastructure layer: the document-store seam and the repository
//! operations built on it.

pub mod repository;
pub mod store;

pub use repository::{
    CaseListQuery, CasePage, Committed, DEFAULT_PAGE_SIZE, DeletedCase, MAX_PAGE_SIZE,
    Repository, UserStats, clamp_limit,
};
pub use store::{
    CasePageRequest, DocumentStore, InMemoryDocumentStore, StoreError, WriteBatch, WriteOp,
};
