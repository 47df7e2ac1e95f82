//! Array resolution.
//!
//! Two encodings are supported:
//!
//! - **comma-delimited**: fields listed in the type's `mapping` arrive as one
//!   value under the bare field name (`tags=red,green,blue`, even inside a
//!   nested type) that is split and coerced per token;
//! - **counter-indexed** (default): element `n` lives under `field_n`
//!   (`items_1`, `items_2`, … or `items_1_name` for object elements). There is
//!   no length field: the first index that produces nothing ends the array,
//!   so a gap truncates everything after it.

use crate::error::MapResult;
use crate::options::MapOptions;
use crate::path::FieldPath;
use crate::source::ValueSource;
use crate::walker::Mapper;
use crate::whitelist::Whitelist;
use formbind_model::{FieldKind, SchemaError, TypeDefinition};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::trace;

impl<S: ValueSource> Mapper<S> {
    /// Resolves the array field `field` of `def` declared in scope `path`.
    pub(crate) async fn resolve_array(
        &self,
        field: &str,
        items: &FieldKind,
        def: &TypeDefinition,
        whitelist: &Whitelist,
        options: MapOptions,
        path: &FieldPath,
    ) -> MapResult<Option<Vec<Value>>> {
        if def.uses_csv(field) {
            return self.resolve_delimited(field, items, def, whitelist, path).await;
        }
        if !whitelist.is_allowed(field) {
            trace!(field, path = %path, "array not whitelisted");
            return Ok(None);
        }
        let below = whitelist.descend(field);
        self.resolve_indexed(field, items, def, &below, options, &path.child(field))
            .await
    }

    async fn resolve_delimited(
        &self,
        field: &str,
        items: &FieldKind,
        def: &TypeDefinition,
        whitelist: &Whitelist,
        path: &FieldPath,
    ) -> MapResult<Option<Vec<Value>>> {
        if items.is_array() {
            return Err(SchemaError::CsvNestedArray(field.to_string()).into());
        }
        if !whitelist.permits_leaf(field) {
            trace!(field, path = %path, "delimited array not whitelisted");
            return Ok(None);
        }
        // Read from the bare field name, whatever the nesting.
        let Some(raw) = self.source().get(field).await? else {
            return Ok(None);
        };

        let mut elements = Vec::new();
        for token in raw.split(',') {
            if let Some(value) = self.coerce_token(token, field, items, def)? {
                elements.push(value);
            }
        }
        trace!(field, count = elements.len(), "resolved delimited array");
        Ok((!elements.is_empty()).then_some(elements))
    }

    /// Reads elements `scope_1`, `scope_2`, … until one produces nothing.
    ///
    /// `field` is the declaring field, used for per-field string handling.
    pub(crate) fn resolve_indexed<'a>(
        &'a self,
        field: &'a str,
        items: &'a FieldKind,
        def: &'a TypeDefinition,
        whitelist: &'a Whitelist,
        options: MapOptions,
        scope: &'a FieldPath,
    ) -> BoxFuture<'a, MapResult<Option<Vec<Value>>>> {
        async move {
            let mut elements = Vec::new();
            for index in 1usize.. {
                let segment = index.to_string();
                let element = self
                    .resolve_element(field, &segment, items, def, whitelist, options, scope)
                    .await?;
                match element {
                    Some(value) => elements.push(value),
                    None => break,
                }
            }
            trace!(field, scope = %scope, count = elements.len(), "resolved indexed array");
            Ok((!elements.is_empty()).then_some(elements))
        }
        .boxed()
    }

    /// Resolves the element stored at `scope_segment`.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_element(
        &self,
        field: &str,
        segment: &str,
        items: &FieldKind,
        def: &TypeDefinition,
        whitelist: &Whitelist,
        options: MapOptions,
        scope: &FieldPath,
    ) -> MapResult<Option<Value>> {
        match items {
            FieldKind::Primitive(_) => {
                self.read_leaf(&scope.key_for(segment), field, items, def)
                    .await
            }
            FieldKind::ArrayOf(inner) => Ok(self
                .resolve_indexed(field, inner, def, whitelist, options, &scope.child(segment))
                .await?
                .map(Value::Array)),
            FieldKind::Custom(nested) => Ok(self
                .resolve_custom(segment, nested, whitelist, options, &scope.child(segment))
                .await?
                .map(Value::Object)),
        }
    }

    fn coerce_token(
        &self,
        token: &str,
        field: &str,
        items: &FieldKind,
        def: &TypeDefinition,
    ) -> MapResult<Option<Value>> {
        Ok(crate::coerce::coerce(
            Some(token),
            field,
            items,
            def,
            self.sanitizer(),
        )?)
    }
}
