//! Nested custom types.

use crate::error::MapResult;
use crate::options::MapOptions;
use crate::path::FieldPath;
use crate::source::ValueSource;
use crate::walker::Mapper;
use crate::whitelist::Whitelist;
use formbind_model::TypeDefinition;
use serde_json::{Map, Value};
use tracing::{debug, trace};

impl<S: ValueSource> Mapper<S> {
    /// Builds and populates an instance of `nested` for the scope `path`.
    ///
    /// `whitelist` has already been narrowed to the entries below `name`; an
    /// entry that ended at `name` permits none of its fields.
    /// Returns the instance only if at least one of its fields was set, so an
    /// empty nested object is never attached. Types without a constructor are
    /// skipped.
    pub(crate) async fn resolve_custom(
        &self,
        name: &str,
        nested: &TypeDefinition,
        whitelist: &Whitelist,
        options: MapOptions,
        path: &FieldPath,
    ) -> MapResult<Option<Map<String, Value>>> {
        if !whitelist.entries().iter().any(|entry| !entry.is_empty()) {
            trace!(field = name, path = %path, "custom type not whitelisted");
            return Ok(None);
        }
        let Some(mut instance) = nested.instantiate() else {
            debug!(
                field = name,
                type_name = nested.name(),
                "custom type has no constructor, skipping"
            );
            return Ok(None);
        };

        let changed = self
            .walk(&mut instance, nested, whitelist, options, path)
            .await?;
        Ok(changed.then_some(instance))
    }
}
