//! JSON module images.
//!
//! A module image is a serialized description of one module: its types, their members and
//! the decoded method bodies. Images are what external front-ends (or test fixtures) hand to
//! the analysis when no binary reader is available.
//!
//! Type references are written either as a bare string, which names a type defined in the
//! image's own module, or as an object tagged with `kind`:
//!
//! ```json
//! {
//!   "name": "App",
//!   "types": [
//!     {
//!       "name": "App.Controller",
//!       "fields": [ { "name": "service", "type": "App.Service" } ],
//!       "methods": [
//!         {
//!           "name": "Load",
//!           "returns": { "kind": "plain", "name": "System.Object", "scope": "System.Runtime" },
//!           "body": [
//!             { "op": "newobj", "operand": { "kind": "method", "declaring": "App.Service", "name": ".ctor" } },
//!             { "op": "ret" }
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    loader::ModuleReader,
    metadata::{
        method::{
            FieldRef, Instruction, MethodAttributes, MethodBody, MethodRef, MethodSemantics,
            Operand, CONSTRUCTOR_NAME, TYPE_INITIALIZER_NAME,
        },
        module::Module,
        typesystem::{
            split_full_name, MethodBuilder, TypeAttributes, TypeBuilder, TypeRef, TypeRefRc,
        },
    },
    Result,
};

/// Root of a module image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleImage {
    /// Name of the module
    pub name: String,
    /// Top-level types
    #[serde(default)]
    pub types: Vec<TypeImage>,
}

/// Kind of a declared type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKindImage {
    /// A class
    #[default]
    Class,
    /// An interface
    Interface,
    /// A value type
    Struct,
}

/// A declared type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeImage {
    /// Full name for top-level types, simple name for nested types
    pub name: String,
    /// Kind of the type
    #[serde(default)]
    pub kind: TypeKindImage,
    /// The type cannot be instantiated
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// The type cannot be derived from
    #[serde(default)]
    pub sealed: bool,
    /// Base type
    #[serde(default)]
    pub base: Option<TypeRefImage>,
    /// Declared interfaces
    #[serde(default)]
    pub interfaces: Vec<TypeRefImage>,
    /// Declared generic parameters
    #[serde(default)]
    pub generic_params: Vec<GenericParamImage>,
    /// Attached custom attribute types
    #[serde(default)]
    pub attributes: Vec<TypeRefImage>,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldImage>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MethodImage>,
    /// Nested types
    #[serde(default)]
    pub nested: Vec<TypeImage>,
}

/// A type reference, either the full name of a type of this module or a tagged shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRefImage {
    /// Full name of a type defined in the image's own module
    Local(String),
    /// Any other reference
    Spec(TypeSpecImage),
}

/// The tagged form of a type reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSpecImage {
    /// A named type, `scope` defaults to the image's module
    Plain {
        /// Full name
        name: String,
        /// Defining module
        #[serde(default)]
        scope: Option<String>,
    },
    /// A generic parameter
    GenericParameter {
        /// Parameter name
        name: String,
        /// Full name of the declaring type or method
        owner: String,
        /// Constraint types
        #[serde(default)]
        constraints: Vec<TypeRefImage>,
    },
    /// A generic instantiation
    GenericInstance {
        /// The open generic type
        element: Box<TypeRefImage>,
        /// Generic arguments
        arguments: Vec<TypeRefImage>,
    },
    /// An array
    Array {
        /// Element type
        element: Box<TypeRefImage>,
        /// Number of dimensions
        #[serde(default = "default_rank")]
        rank: u32,
    },
    /// A by-reference wrapper
    ByReference {
        /// Referenced type
        element: Box<TypeRefImage>,
    },
    /// An unmanaged pointer
    Pointer {
        /// Pointed-to type
        element: Box<TypeRefImage>,
    },
    /// A function pointer
    FunctionPointer,
}

fn default_rank() -> u32 {
    1
}

/// A generic parameter declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericParamImage {
    /// Parameter name
    pub name: String,
    /// Constraint types
    #[serde(default)]
    pub constraints: Vec<TypeRefImage>,
}

/// A declared field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldImage {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: TypeRefImage,
}

/// Accessor role of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticsImage {
    /// Property getter
    Getter,
    /// Property setter
    Setter,
    /// Event add accessor
    Adder,
    /// Event remove accessor
    Remover,
}

/// A method parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamImage {
    /// Parameter name
    #[serde(default)]
    pub name: String,
    /// Parameter type
    #[serde(rename = "type")]
    pub param_type: TypeRefImage,
}

/// A declared method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodImage {
    /// Method name
    pub name: String,
    /// Return type, `System.Void` if absent
    #[serde(default)]
    pub returns: Option<TypeRefImage>,
    /// Parameters
    #[serde(default)]
    pub params: Vec<ParamImage>,
    /// Method generic parameters
    #[serde(default)]
    pub generic_params: Vec<GenericParamImage>,
    /// Static method
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Abstract method, any body is ignored
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Accessor role
    #[serde(default)]
    pub semantics: Option<SemanticsImage>,
    /// Decoded body
    #[serde(default)]
    pub body: Option<Vec<InstructionImage>>,
}

/// A decoded instruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionImage {
    /// Byte offset, derived from the previous instruction if absent
    #[serde(default)]
    pub offset: Option<u32>,
    /// Mnemonic
    pub op: String,
    /// Operand
    #[serde(default)]
    pub operand: Option<OperandImage>,
}

/// An instruction operand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperandImage {
    /// A type token
    Type {
        /// The referenced type
        #[serde(rename = "type")]
        type_ref: TypeRefImage,
    },
    /// A method token
    Method {
        /// Declaring type
        declaring: TypeRefImage,
        /// Method name
        name: String,
        /// Return type, `System.Void` if absent
        #[serde(default)]
        returns: Option<TypeRefImage>,
        /// Parameter types
        #[serde(default)]
        params: Vec<TypeRefImage>,
    },
    /// A field token
    Field {
        /// Declaring type
        declaring: TypeRefImage,
        /// Field name
        name: String,
        /// Field type
        #[serde(rename = "type")]
        field_type: TypeRefImage,
    },
    /// A local variable index
    Local {
        /// Index
        index: u16,
    },
    /// An argument index
    Argument {
        /// Index
        index: u16,
    },
    /// A branch target
    Target {
        /// Target offset
        offset: u32,
    },
    /// Switch targets
    Switch {
        /// Target offsets
        targets: Vec<u32>,
    },
    /// An integer immediate
    Int {
        /// Value
        value: i64,
    },
    /// A floating point immediate
    Float {
        /// Value
        value: f64,
    },
    /// A string literal
    String {
        /// Value
        value: String,
    },
}

impl ModuleImage {
    /// Parse an image from JSON
    ///
    /// # Errors
    /// Returns [`crate::Error::ImageError`] if the JSON does not describe an image
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Convert the image into a module.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for empty names, duplicate types, generic
    /// instances without arguments, zero-rank arrays and instruction offsets beyond `u32`
    pub fn into_module(self) -> Result<Module> {
        if self.name.trim().is_empty() {
            return Err(malformed_error!("module image without a name"));
        }

        let converter = Converter { scope: &self.name };
        let mut seen = HashSet::new();
        let mut types = Vec::with_capacity(self.types.len());
        for image in &self.types {
            let (namespace, name) = split_full_name(&image.name);
            let definition = converter.type_builder(image, namespace, name)?.build();
            for ty in definition.with_nested() {
                if !seen.insert(ty.full_name().to_string()) {
                    return Err(malformed_error!(
                        "type {} is declared twice in module {}",
                        ty.full_name(),
                        self.name
                    ));
                }
            }
            types.push(definition);
        }

        Ok(Module::new(self.name.clone(), types))
    }
}

struct Converter<'a> {
    scope: &'a str,
}

impl Converter<'_> {
    fn type_ref(&self, image: &TypeRefImage) -> Result<TypeRefRc> {
        match image {
            TypeRefImage::Local(name) => self.plain(name, self.scope),
            TypeRefImage::Spec(spec) => self.type_spec(spec),
        }
    }

    fn type_refs(&self, images: &[TypeRefImage]) -> Result<Vec<TypeRefRc>> {
        images.iter().map(|image| self.type_ref(image)).collect()
    }

    fn plain(&self, name: &str, scope: &str) -> Result<TypeRefRc> {
        if name.trim().is_empty() {
            return Err(malformed_error!("type reference without a name"));
        }
        Ok(TypeRef::parse(name, scope))
    }

    fn type_spec(&self, spec: &TypeSpecImage) -> Result<TypeRefRc> {
        match spec {
            TypeSpecImage::Plain { name, scope } => {
                self.plain(name, scope.as_deref().unwrap_or(self.scope))
            }
            TypeSpecImage::GenericParameter {
                name,
                owner,
                constraints,
            } => Ok(TypeRef::generic_parameter(
                name,
                owner,
                self.type_refs(constraints)?,
            )),
            TypeSpecImage::GenericInstance { element, arguments } => {
                if arguments.is_empty() {
                    return Err(malformed_error!("generic instance without arguments"));
                }
                Ok(TypeRef::generic_instance(
                    self.type_ref(element)?,
                    self.type_refs(arguments)?,
                ))
            }
            TypeSpecImage::Array { element, rank } => {
                if *rank == 0 {
                    return Err(malformed_error!("array with rank 0"));
                }
                Ok(TypeRef::array(self.type_ref(element)?, *rank))
            }
            TypeSpecImage::ByReference { element } => {
                Ok(TypeRef::by_reference(self.type_ref(element)?))
            }
            TypeSpecImage::Pointer { element } => Ok(TypeRef::pointer(self.type_ref(element)?)),
            TypeSpecImage::FunctionPointer => Ok(TypeRef::function_pointer(self.scope)),
        }
    }

    fn generic_params(&self, params: &[GenericParamImage], owner: &str) -> Result<Vec<TypeRefRc>> {
        params
            .iter()
            .map(|param| {
                Ok(TypeRef::generic_parameter(
                    &param.name,
                    owner,
                    self.type_refs(&param.constraints)?,
                ))
            })
            .collect()
    }

    fn type_builder(&self, image: &TypeImage, namespace: &str, name: &str) -> Result<TypeBuilder> {
        if name.trim().is_empty() {
            return Err(malformed_error!("type without a name in module {}", self.scope));
        }

        let mut builder = match image.kind {
            TypeKindImage::Class => TypeBuilder::class(namespace, name, self.scope),
            TypeKindImage::Interface => TypeBuilder::interface(namespace, name, self.scope),
            TypeKindImage::Struct => TypeBuilder::value_type(namespace, name, self.scope),
        };
        if image.is_abstract {
            builder = builder.abstract_type();
        }
        if image.sealed {
            builder = builder.flags(TypeAttributes::SEALED);
        }
        if let Some(base) = &image.base {
            builder = builder.extends(self.type_ref(base)?);
        }
        for interface in &image.interfaces {
            builder = builder.implements(self.type_ref(interface)?);
        }
        for attribute in &image.attributes {
            builder = builder.attribute(self.type_ref(attribute)?);
        }

        let full_name = builder.full_name();
        for param in self.generic_params(&image.generic_params, &full_name)? {
            builder = builder.generic_param(param);
        }
        for field in &image.fields {
            builder = builder.field(&field.name, self.type_ref(&field.field_type)?);
        }
        for method in &image.methods {
            builder = builder.with_method(self.method_builder(method, &full_name)?);
        }
        for nested in &image.nested {
            let nested_name = format!("{}/{}", name, nested.name);
            builder = builder.with_nested(self.type_builder(nested, namespace, &nested_name)?);
        }

        Ok(builder)
    }

    fn method_builder(&self, image: &MethodImage, declaring: &str) -> Result<MethodBuilder> {
        if image.name.trim().is_empty() {
            return Err(malformed_error!("method without a name in {}", declaring));
        }

        let mut builder = MethodBuilder::new(&image.name);
        if image.name == CONSTRUCTOR_NAME || image.name == TYPE_INITIALIZER_NAME {
            builder = builder.flags(MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME);
        }
        if image.is_static {
            builder = builder.flags(MethodAttributes::STATIC);
        }
        if let Some(semantics) = image.semantics {
            builder = builder
                .flags(MethodAttributes::SPECIAL_NAME)
                .semantics(match semantics {
                    SemanticsImage::Getter => MethodSemantics::GETTER,
                    SemanticsImage::Setter => MethodSemantics::SETTER,
                    SemanticsImage::Adder => MethodSemantics::ADDER,
                    SemanticsImage::Remover => MethodSemantics::REMOVER,
                });
        }
        if let Some(returns) = &image.returns {
            builder = builder.returns(self.type_ref(returns)?);
        }
        for param in &image.params {
            builder = builder.param(&param.name, self.type_ref(&param.param_type)?);
        }

        let owner = format!("{}::{}", declaring, image.name);
        for param in self.generic_params(&image.generic_params, &owner)? {
            builder = builder.generic_param(param);
        }

        if image.is_abstract {
            return Ok(builder.abstract_method());
        }

        match &image.body {
            Some(instructions) => Ok(builder.body(self.body(instructions)?)),
            None => Ok(builder.without_body()),
        }
    }

    fn body(&self, instructions: &[InstructionImage]) -> Result<MethodBody> {
        let mut next_offset = 0;
        let mut decoded = Vec::with_capacity(instructions.len());
        for image in instructions {
            let operand = match &image.operand {
                Some(operand) => self.operand(operand)?,
                None => Operand::None,
            };
            let offset = image.offset.unwrap_or(next_offset);
            next_offset = operand
                .next_offset(offset)
                .ok_or_else(|| malformed_error!("instruction offset overflows at {}", image.op))?;
            decoded.push(Instruction::new(offset, image.op.clone(), operand));
        }
        Ok(MethodBody::new(decoded))
    }

    fn operand(&self, image: &OperandImage) -> Result<Operand> {
        Ok(match image {
            OperandImage::Type { type_ref } => Operand::Type(self.type_ref(type_ref)?),
            OperandImage::Method {
                declaring,
                name,
                returns,
                params,
            } => {
                let return_type = match returns {
                    Some(returns) => self.type_ref(returns)?,
                    None => TypeRef::void(),
                };
                Operand::Method(MethodRef::new(
                    self.type_ref(declaring)?,
                    name.clone(),
                    return_type,
                    self.type_refs(params)?,
                ))
            }
            OperandImage::Field {
                declaring,
                name,
                field_type,
            } => Operand::Field(FieldRef {
                declaring_type: self.type_ref(declaring)?,
                name: name.clone(),
                field_type: self.type_ref(field_type)?,
            }),
            OperandImage::Local { index } => Operand::Local(*index),
            OperandImage::Argument { index } => Operand::Argument(*index),
            OperandImage::Target { offset } => Operand::Target(*offset),
            OperandImage::Switch { targets } => Operand::Switch(targets.clone()),
            OperandImage::Int { value } => Operand::Int(*value),
            OperandImage::Float { value } => Operand::Float(*value),
            OperandImage::String { value } => Operand::String(value.clone()),
        })
    }
}

/// A [`ModuleReader`] for JSON module images
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageReader;

impl ImageReader {
    /// Create a new reader
    pub fn new() -> Self {
        ImageReader
    }
}

impl ModuleReader for ImageReader {
    fn read(&self, path: &Path, data: &[u8]) -> Result<Module> {
        Ok(ModuleImage::from_slice(data)?
            .into_module()?
            .with_path(path))
    }
}
