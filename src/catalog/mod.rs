//! Catalog transformer
//!
//! Derives the `songs` and `artists` dimensions from catalog records.

mod transformer;

pub use transformer::CatalogTransformer;
