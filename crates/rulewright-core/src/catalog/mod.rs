//! Field catalog loading and validation.
//!
//! A catalog is the closed set of identifiers a generated rule may put under
//! `var`. Catalogs are structured data validated against JSON Schema, then
//! checked for unique identifiers.

mod parser;
mod schema;

pub use parser::{CatalogError, FieldCatalog, FieldDescriptor};
pub use schema::{validate_catalog_schema, SchemaError};
