pub mod definition;
pub mod error;
mod parse;

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    execution::input::coerce_input_value,
    response::value::Value,
    schema::{
        definition::{
            FieldDefinition, OperationType, TypeDefinition, TypeKind, TypeRef, BUILTIN_SCALARS,
        },
        error::SchemaError,
        parse::{parse_type_definitions, SchemaRoots},
    },
};

/// The immutable set of type definitions the engine executes against.
///
/// Built once at startup through [`SchemaRegistryBuilder`]; every referenced
/// type is known to exist.
#[derive(Debug)]
pub struct SchemaRegistry {
    types: IndexMap<String, TypeDefinition>,
    query_type: String,
    mutation_type: Option<String>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Registers a single SDL document and builds the registry.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        builder.register(sdl)?;
        builder.build()
    }

    pub fn lookup(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.types.get(type_name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        self.lookup(type_name).and_then(|t| t.field(field_name))
    }

    pub fn root_type_name(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
        }
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&TypeDefinition> {
        self.root_type_name(operation)
            .and_then(|name| self.lookup(name))
    }

    /// All types, built-in scalars first, then in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// Checks every argument and input field default against its declared
    /// type and stores the coerced value.
    fn coerce_default_values(&mut self) -> Result<(), SchemaError> {
        let mut coerced = Vec::new();
        for type_definition in self.types.values() {
            for field in type_definition.fields() {
                let location = format!("{}.{}", type_definition.name, field.name);
                if let Some(default_value) = &field.default_value {
                    let value = self.coerce_default(&location, &field.ty, default_value)?;
                    coerced.push((type_definition.name.clone(), field.name.clone(), None, value));
                }
                for (index, argument) in field.arguments.iter().enumerate() {
                    if let Some(default_value) = &argument.default_value {
                        let location = format!("{}({}:)", location, argument.name);
                        let value = self.coerce_default(&location, &argument.ty, default_value)?;
                        coerced.push((
                            type_definition.name.clone(),
                            field.name.clone(),
                            Some(index),
                            value,
                        ));
                    }
                }
            }
        }

        for (type_name, field_name, argument, value) in coerced {
            let Some(field) = self
                .types
                .get_mut(&type_name)
                .and_then(|t| t.fields.get_mut(&field_name))
            else {
                continue;
            };
            let slot = match argument {
                Some(index) => field.arguments.get_mut(index).map(|a| &mut a.default_value),
                None => Some(&mut field.default_value),
            };
            if let Some(slot) = slot {
                *slot = Some(value);
            }
        }
        Ok(())
    }

    fn coerce_default(
        &self,
        location: &str,
        ty: &TypeRef,
        default_value: &Value,
    ) -> Result<Value, SchemaError> {
        coerce_input_value(self, ty, default_value.clone()).map_err(|reason| {
            SchemaError::InvalidDefaultValue {
                location: location.to_string(),
                reason,
            }
        })
    }
}

#[derive(Debug)]
pub struct SchemaRegistryBuilder {
    types: IndexMap<String, TypeDefinition>,
    schema_roots: Option<SchemaRoots>,
}

impl Default for SchemaRegistryBuilder {
    fn default() -> Self {
        let types = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), TypeDefinition::scalar(*name)))
            .collect();

        SchemaRegistryBuilder {
            types,
            schema_roots: None,
        }
    }
}

impl SchemaRegistryBuilder {
    /// Parses `sdl` and adds its definitions. May be called several times;
    /// references between documents are resolved by [`Self::build`].
    pub fn register(&mut self, sdl: &str) -> Result<&mut Self, SchemaError> {
        let parsed = parse_type_definitions(sdl)?;

        // Nothing from a rejected document is kept.
        let mut seen = HashSet::new();
        if let Some(duplicate) = parsed
            .types
            .iter()
            .find(|t| self.types.contains_key(&t.name) || !seen.insert(t.name.as_str()))
        {
            return Err(SchemaError::DuplicateType(duplicate.name.clone()));
        }
        if let (Some(_), Some(_)) = (&parsed.schema_roots, &self.schema_roots) {
            return Err(SchemaError::DuplicateSchemaDefinition);
        }

        if let Some(roots) = parsed.schema_roots {
            self.schema_roots = Some(roots);
        }

        for type_definition in parsed.types {
            debug!(
                "registered {} type '{}'",
                type_definition.kind.as_str(),
                type_definition.name
            );
            self.types
                .insert(type_definition.name.clone(), type_definition);
        }

        Ok(self)
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        for type_definition in self.types.values() {
            for field in type_definition.fields() {
                let location = format!("{}.{}", type_definition.name, field.name);
                match type_definition.kind {
                    TypeKind::Object => {
                        self.check_reference(&location, &field.ty, "an object or scalar", |kind| {
                            kind != TypeKind::Input
                        })?;
                        for argument in &field.arguments {
                            self.check_reference(
                                &format!("{}({}:)", location, argument.name),
                                &argument.ty,
                                "an input or scalar",
                                |kind| kind != TypeKind::Object,
                            )?;
                        }
                    }
                    TypeKind::Input => {
                        self.check_reference(&location, &field.ty, "an input or scalar", |kind| {
                            kind != TypeKind::Object
                        })?;
                    }
                    TypeKind::Scalar => {}
                }
            }
        }

        let roots = self.schema_roots.clone().unwrap_or_default();
        let query_type = roots
            .query
            .unwrap_or_else(|| OperationType::Query.default_type_name().to_string());
        self.check_root("query", &query_type)?;

        let mutation_type = match roots.mutation {
            Some(name) => {
                self.check_root("mutation", &name)?;
                Some(name)
            }
            None => {
                let default_name = OperationType::Mutation.default_type_name();
                match self.types.get(default_name) {
                    Some(t) if t.is_object() => Some(default_name.to_string()),
                    _ => None,
                }
            }
        };

        debug!(
            types = self.types.len(),
            query_type = query_type.as_str(),
            mutation_type = mutation_type.as_deref(),
            "schema registry built"
        );

        let mut registry = SchemaRegistry {
            types: self.types,
            query_type,
            mutation_type,
        };
        registry.coerce_default_values()?;
        Ok(registry)
    }

    fn check_reference(
        &self,
        location: &str,
        ty: &TypeRef,
        expected: &'static str,
        allowed: impl Fn(TypeKind) -> bool,
    ) -> Result<(), SchemaError> {
        match self.types.get(&ty.name) {
            None => Err(SchemaError::UnknownType {
                referenced: ty.name.clone(),
                location: location.to_string(),
            }),
            Some(referenced) if !allowed(referenced.kind) => Err(SchemaError::InvalidTypeReference {
                location: location.to_string(),
                referenced: ty.name.clone(),
                expected,
                found: referenced.kind.as_str(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn check_root(&self, operation: &'static str, type_name: &str) -> Result<(), SchemaError> {
        match self.types.get(type_name) {
            None => Err(SchemaError::MissingRootType {
                operation,
                type_name: type_name.to_string(),
            }),
            Some(t) if !t.is_object() => Err(SchemaError::InvalidRootType {
                operation,
                type_name: type_name.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }
}
