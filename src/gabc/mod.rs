//! GABC handling: pulling the notation source out of a record, the cleanup
//! pipeline applied before display/export, and the document header.

mod extract;
mod header;
mod transform;

pub use extract::extract_source;
pub use header::{export_file_stem, gabc_document, gabc_header, HEADER_SEPARATOR};
pub use transform::{
    fix_initial_capitalization, heavy_clean, insert_line_breaks, remove_accents_and_formatting,
    transform, TransformOptions,
};
