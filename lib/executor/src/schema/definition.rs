use std::fmt;

use indexmap::IndexMap;

use crate::response::value::Value;

pub const STRING_SCALAR: &str = "String";
pub const INT_SCALAR: &str = "Int";
pub const FLOAT_SCALAR: &str = "Float";
pub const BOOLEAN_SCALAR: &str = "Boolean";
pub const ID_SCALAR: &str = "ID";

pub const BUILTIN_SCALARS: [&str; 5] = [
    STRING_SCALAR,
    INT_SCALAR,
    FLOAT_SCALAR,
    BOOLEAN_SCALAR,
    ID_SCALAR,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Input,
    Scalar,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Object => "object",
            TypeKind::Input => "input",
            TypeKind::Scalar => "scalar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
}

impl OperationType {
    pub fn default_type_name(&self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a named type with its nullability and list wrapping.
///
/// Only a single level of list is representable: `T`, `T!`, `[T]`, `[T!]`,
/// `[T]!` and `[T!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub nullable: bool,
    pub list: bool,
    /// Only meaningful when `list` is set.
    pub list_element_nullable: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            nullable: true,
            list: false,
            list_element_nullable: true,
        }
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn list_of(name: impl Into<String>, element_nullable: bool) -> Self {
        TypeRef {
            name: name.into(),
            nullable: true,
            list: true,
            list_element_nullable: element_nullable,
        }
    }

    /// The type of one element of a list type.
    pub fn element(&self) -> TypeRef {
        TypeRef {
            name: self.name.clone(),
            nullable: self.list_element_nullable,
            list: false,
            list_element_nullable: true,
        }
    }

    /// The same type without the outer non-null marker.
    pub fn as_nullable(&self) -> TypeRef {
        TypeRef {
            nullable: true,
            ..self.clone()
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}", self.name)?;
            if !self.list_element_nullable {
                write!(f, "!")?;
            }
            write!(f, "]")?;
        } else {
            write!(f, "{}", self.name)?;
        }
        if !self.nullable {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// An argument of an object field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValueDefinition {
    /// Required arguments are non-null and have no default.
    pub fn is_required(&self) -> bool {
        !self.ty.nullable && self.default_value.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeRef,
    /// Arguments of object fields, in declaration order.
    pub arguments: Vec<InputValueDefinition>,
    /// Default value of an input object field.
    pub default_value: Option<Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldDefinition {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            default_value: None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    pub fn is_nullable(&self) -> bool {
        self.ty.nullable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub(crate) fields: IndexMap<String, FieldDefinition>,
}

impl TypeDefinition {
    pub fn scalar(name: impl Into<String>) -> Self {
        TypeDefinition {
            name: name.into(),
            kind: TypeKind::Scalar,
            fields: IndexMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn is_object(&self) -> bool {
        self.kind == TypeKind::Object
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == TypeKind::Scalar
    }

    pub fn is_builtin_scalar(&self) -> bool {
        self.is_scalar() && BUILTIN_SCALARS.contains(&self.name.as_str())
    }
}
