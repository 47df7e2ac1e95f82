//! Schema registration from JSON declarations.
//!
//! A schema document declares named types. Custom fields refer to other
//! types by name and are resolved into shared [`TypeDefinition`]s when the
//! document is loaded, so the mapper never looks names up at walk time.
//!
//! Because every reference is resolved into an owned, immutable
//! definition, recursive types cannot be declared: a type that refers back to
//! itself, directly (`Comment.replies: array<Comment>`) or through other
//! types, is rejected with [`SchemaError::CyclicReference`]. Bound the depth
//! explicitly instead (`Comment` holding `replies: array<Reply>`).

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{FieldDef, FieldKind, PrimitiveKind, TypeDefinition};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Top-level schema document: `{"types": {"Name": {...}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    pub types: Map<String, Value>,
}

/// Declaration of one type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    /// Field name to [`FieldDecl`], in declaration order.
    pub properties: Map<String, Value>,
    /// Array fields using the comma-delimited encoding.
    #[serde(default)]
    pub mapping: Vec<String>,
    /// String fields that keep a safe subset of HTML.
    #[serde(default)]
    pub html_fields: Vec<String>,
    /// Presence gives the type a constructor cloning this object.
    #[serde(default)]
    pub template: Option<Map<String, Value>>,
}

/// Declaration of one property.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub items: Option<Box<FieldDecl>>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

/// Named, fully resolved type definitions.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<TypeDefinition>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a programmatically built definition under its own name.
    pub fn register(&mut self, def: TypeDefinition) -> Arc<TypeDefinition> {
        let def = Arc::new(def);
        self.types.insert(def.name().to_string(), Arc::clone(&def));
        def
    }

    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading schema document");
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Resolves every declaration in the document.
    pub fn from_document(document: SchemaDocument) -> SchemaResult<Self> {
        let mut decls = HashMap::with_capacity(document.types.len());
        for (name, raw) in document.types {
            let decl: TypeDecl = serde_json::from_value(raw)?;
            decls.insert(name, decl);
        }

        let mut resolver = Resolver {
            decls: &decls,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        };
        let mut names: Vec<&String> = decls.keys().collect();
        names.sort();
        for name in names {
            resolver.resolve(name)?;
        }

        debug!(types = resolver.resolved.len(), "schema registry loaded");
        Ok(Self {
            types: resolver.resolved,
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeDefinition>> {
        self.types.get(name).cloned()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

struct Resolver<'a> {
    decls: &'a HashMap<String, TypeDecl>,
    resolved: HashMap<String, Arc<TypeDefinition>>,
    in_progress: Vec<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> SchemaResult<Arc<TypeDefinition>> {
        if let Some(def) = self.resolved.get(name) {
            return Ok(Arc::clone(def));
        }
        if self.in_progress.iter().any(|pending| pending == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(SchemaError::CyclicReference(chain.join(" -> ")));
        }
        let decls = self.decls;
        let Some(decl) = decls.get(name) else {
            return Err(SchemaError::UnknownReference {
                field: self.in_progress.last().cloned().unwrap_or_default(),
                reference: name.to_string(),
            });
        };

        self.in_progress.push(name.to_string());
        let built = self.build(name, decl);
        self.in_progress.pop();

        let def = Arc::new(built?);
        self.resolved.insert(name.to_string(), Arc::clone(&def));
        Ok(def)
    }

    fn build(&mut self, name: &str, decl: &TypeDecl) -> SchemaResult<TypeDefinition> {
        let mut builder = TypeDefinition::builder(name);
        for (field, raw) in &decl.properties {
            let field_decl: FieldDecl = serde_json::from_value(raw.clone())?;
            let kind = self.kind_of(field, &field_decl)?;
            builder = builder.field(field.as_str(), FieldDef::new(kind));
        }
        for field in &decl.mapping {
            builder = builder.csv(field.as_str());
        }
        for field in &decl.html_fields {
            builder = builder.html(field.as_str());
        }
        if let Some(template) = &decl.template {
            builder = builder.template(template.clone());
        }
        Ok(builder.build())
    }

    fn kind_of(&mut self, field: &str, decl: &FieldDecl) -> SchemaResult<FieldKind> {
        if let Some(primitive) = PrimitiveKind::from_name(&decl.type_name) {
            return Ok(FieldKind::Primitive(primitive));
        }
        match decl.type_name.as_str() {
            "array" => {
                let items = decl
                    .items
                    .as_deref()
                    .ok_or_else(|| SchemaError::MissingItems(field.to_string()))?;
                Ok(FieldKind::ArrayOf(Box::new(self.kind_of(field, items)?)))
            }
            "custom" => {
                let reference = decl
                    .reference
                    .as_deref()
                    .ok_or_else(|| SchemaError::MissingReference(field.to_string()))?;
                if !self.decls.contains_key(reference) {
                    return Err(SchemaError::UnknownReference {
                        field: field.to_string(),
                        reference: reference.to_string(),
                    });
                }
                Ok(FieldKind::Custom(self.resolve(reference)?))
            }
            other => Err(SchemaError::UnknownType {
                field: field.to_string(),
                type_name: other.to_string(),
            }),
        }
    }
}
