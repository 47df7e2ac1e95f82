//! The schema walker.
//!
//! Walks a [`TypeDefinition`]'s properties in declaration order, reads each
//! field's flat value from the [`ValueSource`], and writes coerced values
//! into the target object. Arrays and nested custom types are handed to the
//! resolvers in `array.rs` and `custom.rs`, which recurse back into
//! [`Mapper::walk`].
//!
//! Every lookup is awaited before the next field is considered, so the walk
//! is strictly sequential even though the source is asynchronous.

use crate::coerce::coerce;
use crate::error::MapResult;
use crate::options::MapOptions;
use crate::path::FieldPath;
use crate::sanitize::{HtmlSanitizer, Sanitizer};
use crate::source::ValueSource;
use crate::whitelist::Whitelist;
use formbind_model::{FieldKind, TypeDefinition};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{Instrument, debug_span, trace};

/// Maps flat values from a source onto typed objects.
pub struct Mapper<S> {
    source: S,
    sanitizer: Arc<dyn Sanitizer>,
}

impl<S: ValueSource> Mapper<S> {
    /// Mapper using the default [`HtmlSanitizer`].
    pub fn new(source: S) -> Self {
        Self::with_sanitizer(source, Arc::new(HtmlSanitizer))
    }

    pub fn with_sanitizer(source: S, sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { source, sanitizer }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sanitizer(&self) -> &dyn Sanitizer {
        self.sanitizer.as_ref()
    }

    /// Populates `target` from the source.
    ///
    /// `whitelist` holds the field paths that may be written (`"name"`,
    /// `"address_city"`, `"address.city"`). Returns whether any field was set.
    /// On error the target is left partially populated.
    pub async fn map<P: AsRef<str> + Sync>(
        &self,
        target: &mut Map<String, Value>,
        def: &TypeDefinition,
        whitelist: &[P],
        options: MapOptions,
    ) -> MapResult<bool> {
        let whitelist = Whitelist::parse(whitelist);
        self.map_with(target, def, &whitelist, options).await
    }

    /// [`Mapper::map`] with an already parsed whitelist.
    pub async fn map_with(
        &self,
        target: &mut Map<String, Value>,
        def: &TypeDefinition,
        whitelist: &Whitelist,
        options: MapOptions,
    ) -> MapResult<bool> {
        let span = debug_span!("map", type_name = def.name(), overwrite = options.overwrite);
        self.walk(target, def, whitelist, options, &FieldPath::root())
            .instrument(span)
            .await
    }

    /// Walks every property of `def` into `target`.
    pub(crate) fn walk<'a>(
        &'a self,
        target: &'a mut Map<String, Value>,
        def: &'a TypeDefinition,
        whitelist: &'a Whitelist,
        options: MapOptions,
        path: &'a FieldPath,
    ) -> BoxFuture<'a, MapResult<bool>> {
        async move {
            let mut changed = false;
            for (field, field_def) in def.properties() {
                let written = self
                    .resolve_field(target, field, &field_def.kind, def, whitelist, options, path)
                    .await?;
                changed |= written;
            }
            Ok(changed)
        }
        .boxed()
    }

    /// Resolves one keyed property and writes it into `target`.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_field(
        &self,
        target: &mut Map<String, Value>,
        field: &str,
        kind: &FieldKind,
        def: &TypeDefinition,
        whitelist: &Whitelist,
        options: MapOptions,
        path: &FieldPath,
    ) -> MapResult<bool> {
        let value = match kind {
            FieldKind::Primitive(_) => {
                if !whitelist.permits_leaf(field) {
                    trace!(field, path = %path, "not whitelisted");
                    return Ok(false);
                }
                self.read_leaf(&path.key_for(field), field, kind, def).await?
            }
            FieldKind::ArrayOf(items) => self
                .resolve_array(field, items, def, whitelist, options, path)
                .await?
                .map(Value::Array),
            FieldKind::Custom(nested) => {
                let below = whitelist.descend(field);
                self.resolve_custom(field, nested, &below, options, &path.child(field))
                    .await?
                    .map(Value::Object)
            }
        };

        let Some(value) = value else {
            return Ok(false);
        };
        Ok(assign(target, field, value, options))
    }

    /// Coerces a single leaf value read from `key`.
    pub(crate) async fn read_leaf(
        &self,
        key: &str,
        field: &str,
        kind: &FieldKind,
        def: &TypeDefinition,
    ) -> MapResult<Option<Value>> {
        let raw = self.source.get(key).await?;
        Ok(coerce(raw.as_deref(), field, kind, def, self.sanitizer.as_ref())?)
    }
}

/// Writes `value` under `field`, honouring `overwrite`. Returns whether it was written.
fn assign(target: &mut Map<String, Value>, field: &str, value: Value, options: MapOptions) -> bool {
    if !options.permits_write(target.get(field)) {
        trace!(field, "kept existing value");
        return false;
    }
    target.insert(field.to_string(), value);
    true
}

/// Maps with a borrowed source and the default sanitizer.
pub async fn map<S, P>(
    source: &S,
    target: &mut Map<String, Value>,
    def: &TypeDefinition,
    whitelist: &[P],
    options: MapOptions,
) -> MapResult<bool>
where
    S: ValueSource + ?Sized,
    P: AsRef<str> + Sync,
{
    Mapper::new(source).map(target, def, whitelist, options).await
}
