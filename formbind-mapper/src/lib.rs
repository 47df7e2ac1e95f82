//! Schema-driven form mapping.
//!
//! Turns flat form fields (`name=Ann&address_city=Paris&tags_1=a&tags_2=b`)
//! into nested JSON objects shaped by a [`TypeDefinition`]:
//!
//! - nested fields are addressed by joining ancestor names with `_`
//! - arrays arrive either comma-delimited or counter-indexed (`field_1`, `field_2`, …)
//! - custom types are instantiated through their constructor and attached
//!   only when something inside them was set
//! - a whitelist of field paths decides what may be written, so the same
//!   schema serves full forms and partial updates
//!
//! ```no_run
//! # async fn demo() -> formbind_mapper::MapResult<()> {
//! use formbind_mapper::{MapOptions, Mapper, MemoryValueSource};
//! use formbind_model::{FieldDef, TypeDefinition};
//!
//! let def = TypeDefinition::builder("User")
//!     .field("name", FieldDef::string())
//!     .field("age", FieldDef::integer())
//!     .build();
//! let source = MemoryValueSource::from_pairs([("name", "Ann"), ("age", "41")]);
//!
//! let mut user = serde_json::Map::new();
//! let changed = Mapper::new(source)
//!     .map(&mut user, &def, &["name", "age"], MapOptions::default())
//!     .await?;
//! assert!(changed);
//! # Ok(())
//! # }
//! ```

mod array;
mod coerce;
mod custom;
mod error;
mod options;
mod path;
mod sanitize;
mod source;
mod walker;
mod whitelist;

pub use coerce::{coerce, parse_integer, parse_number};
pub use error::{MapError, MapResult, SourceError, SourceResult};
pub use options::{is_truthy, MapOptions};
pub use path::{resolve_path, FieldPath, SEPARATOR};
pub use sanitize::{HtmlSanitizer, Sanitizer, ALLOWED_TAGS};
pub use source::{
    decode_form, FileMap, FileSource, FormBody, LazyFileSource, LazyValueSource,
    MemoryFileSource, MemoryValueSource, RequestInput, UploadedFile, ValueSource,
};
pub use walker::{map, Mapper};
pub use whitelist::{descend, is_allowed, Whitelist};
