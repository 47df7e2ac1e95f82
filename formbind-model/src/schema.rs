use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Produces an empty instance of a custom type.
pub type Constructor = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

/// Scalar kinds a raw form value can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveKind {
    /// Parses a declaration type name. Returns `None` for non-primitive names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// The shape of one property, resolved when the schema is built.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    /// Array whose elements have the boxed shape.
    ArrayOf(Box<FieldKind>),
    /// Nested object described by another type definition.
    Custom(Arc<TypeDefinition>),
}

impl FieldKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(kind) => kind.name(),
            Self::ArrayOf(_) => "array",
            Self::Custom(_) => "custom",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::ArrayOf(_))
    }
}

/// A single property declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind }
    }

    /// Shorthand for a string field.
    pub fn string() -> Self {
        Self::new(FieldKind::Primitive(PrimitiveKind::String))
    }

    /// Shorthand for a floating point field.
    pub fn number() -> Self {
        Self::new(FieldKind::Primitive(PrimitiveKind::Number))
    }

    /// Shorthand for an integer field.
    pub fn integer() -> Self {
        Self::new(FieldKind::Primitive(PrimitiveKind::Integer))
    }

    /// Shorthand for a boolean field.
    pub fn boolean() -> Self {
        Self::new(FieldKind::Primitive(PrimitiveKind::Boolean))
    }

    /// Shorthand for an array whose elements are shaped like `items`.
    pub fn array(items: FieldDef) -> Self {
        Self::new(FieldKind::ArrayOf(Box::new(items.kind)))
    }

    /// Shorthand for a nested custom type.
    pub fn custom(def: Arc<TypeDefinition>) -> Self {
        Self::new(FieldKind::Custom(def))
    }
}

/// Describes one mappable shape.
///
/// Built once and shared read-only across mapping calls. Property order is
/// the declaration order and only affects iteration order.
pub struct TypeDefinition {
    name: String,
    properties: Vec<(String, FieldDef)>,
    mapping: HashSet<String>,
    html_fields: HashSet<String>,
    constructor: Option<Constructor>,
}

impl TypeDefinition {
    pub fn builder(name: impl Into<String>) -> TypeDefinitionBuilder {
        TypeDefinitionBuilder {
            def: TypeDefinition {
                name: name.into(),
                properties: Vec::new(),
                mapping: HashSet::new(),
                html_fields: HashSet::new(),
                constructor: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.properties.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.properties
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, def)| def)
    }

    /// Whether the array field arrives as one comma-delimited value.
    pub fn uses_csv(&self, field: &str) -> bool {
        self.mapping.contains(field)
    }

    /// Whether string values of the field keep a safe subset of HTML.
    pub fn is_html(&self, field: &str) -> bool {
        self.html_fields.contains(field)
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Builds an empty instance, or `None` when no constructor was supplied.
    pub fn instantiate(&self) -> Option<Map<String, Value>> {
        self.constructor.as_ref().map(|construct| construct())
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("mapping", &self.mapping)
            .field("html_fields", &self.html_fields)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Incremental construction of a [`TypeDefinition`].
pub struct TypeDefinitionBuilder {
    def: TypeDefinition,
}

impl TypeDefinitionBuilder {
    /// Adds a property. Redeclaring a name replaces it in place.
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        let name = name.into();
        match self.def.properties.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = def,
            None => self.def.properties.push((name, def)),
        }
        self
    }

    /// Marks an array field as comma-delimited.
    pub fn csv(mut self, name: impl Into<String>) -> Self {
        self.def.mapping.insert(name.into());
        self
    }

    /// Marks a string field as HTML-preserving.
    pub fn html(mut self, name: impl Into<String>) -> Self {
        self.def.html_fields.insert(name.into());
        self
    }

    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> Map<String, Value> + Send + Sync + 'static,
    {
        self.def.constructor = Some(Arc::new(construct));
        self
    }

    /// Constructor that clones a template object.
    pub fn template(self, template: Map<String, Value>) -> Self {
        self.constructor(move || template.clone())
    }

    pub fn build(self) -> TypeDefinition {
        self.def
    }
}
