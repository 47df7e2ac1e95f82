//! Schema model for formbind.
//!
//! Defines the declarative shapes the mapper walks:
//! - [`TypeDefinition`]: named properties plus comma-delimited and HTML field sets
//!   and an optional constructor for nested instances
//! - [`FieldDef`] / [`FieldKind`]: a property's shape (primitive, array, custom)
//! - [`SchemaRegistry`]: loads and resolves named types from JSON declarations
//! - [`SchemaError`]: schema authoring failures
//!
//! Definitions are immutable once built and are shared behind `Arc` by every
//! mapping call. Recursive types are not supported; the registry rejects
//! reference cycles at load time.

mod error;
mod registry;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use registry::{FieldDecl, SchemaDocument, SchemaRegistry, TypeDecl};
pub use schema::{
    Constructor, FieldDef, FieldKind, PrimitiveKind, TypeDefinition, TypeDefinitionBuilder,
};
