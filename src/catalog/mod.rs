//! Read-only catalog layer split across logical submodules.

mod loader;
mod pagination;
mod query;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{load_catalog, parse_catalog, Catalog};
pub use pagination::{Debouncer, Pager, DEFAULT_DEBOUNCE, PAGE_SIZE};
pub use query::{filter_chants, matching_indices, ChantFilter};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog document is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error("chant id {0} appears more than once in the catalog")]
    DuplicateId(i64),
    #[error("chant {0} was not found")]
    NotFound(i64),
}
