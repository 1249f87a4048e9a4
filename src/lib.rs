//! Core library surface for the chant catalog browser.
//!
//! The binary wires these pieces together; the modules stay usable on their
//! own, which is how the `export` and `images` subcommands and the tests
//! drive them.
pub mod batch;
pub mod catalog;
pub mod config;
pub mod export;
pub mod gabc;
pub mod i18n;
pub mod links;
pub mod logging;
pub mod models;
pub mod render;
pub mod ui;

/// Loading and querying the chant collection.
pub use catalog::{filter_chants, load_catalog, Catalog, CatalogError, ChantFilter, Pager};

/// The GABC pipeline entry points.
pub use gabc::{extract_source, gabc_document, gabc_header, transform, TransformOptions};

pub use models::{ChantMode, ChantRecord, OfficePart};

pub use render::{GregorioEngine, NotationEngine, RenderError, ScoreMode};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
