//! Type system of the analyzed modules.
//!
//! This module provides the two halves of the type model: [`TypeRef`], a possibly
//! unresolved mention of a type with a closed set of structural shapes, and [`TypeDef`],
//! a type declared by one of the loaded modules together with its base type, interfaces,
//! nested types, fields and methods.
//!
//! # Key Components
//!
//! - [`TypeRef`] / [`TypeShape`]: References and their structural shape
//! - [`TypeKey`]: Structural identity of a reference (full name + defining scope)
//! - [`TypeDef`]: Type definitions
//! - [`TypeBuilder`] / [`MethodBuilder`]: Fluent construction of definitions
//! - [`SymbolResolver`]: Resolves references to definitions, memoizing the results
//!
//! # Examples
//!
//! ```rust
//! use dotmetrics::metadata::typesystem::{TypeBuilder, TypeRef};
//!
//! let service = TypeRef::plain("App", "Service", "App");
//! let controller = TypeBuilder::class("App", "Controller", "App")
//!     .field("service", service)
//!     .build();
//!
//! assert_eq!(controller.full_name(), "App.Controller");
//! assert_eq!(controller.fields[0].field_type.full_name(), "App.Service");
//! ```

mod base;
mod builder;
mod resolver;

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bitflags::bitflags;

pub use base::{split_full_name, TypeKey, TypeRef, TypeRefList, TypeRefRc, TypeShape};
pub use builder::{MethodBuilder, TypeBuilder};
#[cfg(test)]
pub(crate) use builder::CORE_LIBRARY;
pub use resolver::SymbolResolver;

use crate::metadata::method::MethodDefList;

/// A reference-counted pointer to a [`TypeDef`]
pub type TypeDefRc = Arc<TypeDef>;
/// A vector of type definitions
pub type TypeDefList = Vec<TypeDefRc>;

/// Full name of the attribute compilers attach to synthesized types
pub const COMPILER_GENERATED_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.CompilerGeneratedAttribute";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Type modifiers, values follow the ECMA-335 `TypeAttributes` encoding
    pub struct TypeAttributes: u32 {
        /// Type is visible outside its module
        const PUBLIC = 0x0000_0001;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Type is a value type
        const VALUE_TYPE = 0x0100_0000;
    }
}

/// A field declared by a type definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Name of the field
    pub name: String,
    /// Type of the field
    pub field_type: TypeRefRc,
}

/// A type declared by one of the loaded modules.
///
/// Definitions are immutable once built and shared behind [`TypeDefRc`]. Like references,
/// definitions compare, order and hash by their [`TypeKey`].
#[derive(Debug)]
pub struct TypeDef {
    /// Namespace, nested types carry the namespace of their outermost declaring type
    pub namespace: String,
    /// Name, nested types use `Outer/Inner`
    pub name: String,
    /// Type modifiers
    pub flags: TypeAttributes,
    /// The base type, `None` for `System.Object` and interfaces
    pub base: Option<TypeRefRc>,
    /// Declared interfaces
    pub interfaces: TypeRefList,
    /// Nested type definitions
    pub nested_types: TypeDefList,
    /// Declared fields
    pub fields: Vec<FieldDef>,
    /// Declared methods
    pub methods: MethodDefList,
    /// Declared generic parameters
    pub generic_params: TypeRefList,
    /// Types of the custom attributes attached to this definition
    pub custom_attributes: TypeRefList,
    reference: TypeRefRc,
}

impl TypeDef {
    /// Returns the full name (Namespace.Name) of the type
    pub fn full_name(&self) -> &str {
        self.reference.full_name()
    }

    /// Name of the module defining this type
    pub fn scope(&self) -> &str {
        self.reference.scope()
    }

    /// The identity of this definition
    pub fn key(&self) -> &TypeKey {
        self.reference.key()
    }

    /// A plain reference naming this definition
    pub fn reference(&self) -> &TypeRefRc {
        &self.reference
    }

    /// True for interfaces
    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeAttributes::INTERFACE)
    }

    /// True for abstract classes and interfaces
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeAttributes::ABSTRACT)
    }

    /// True for types that are not interfaces
    pub fn is_class(&self) -> bool {
        !self.is_interface()
    }

    /// True for types that can be instantiated
    pub fn is_concrete(&self) -> bool {
        !self.is_interface() && !self.is_abstract()
    }

    /// True if a custom attribute of the given full name is attached
    ///
    /// ## Arguments
    /// * 'full_name' - Full name of the attribute type
    pub fn has_custom_attribute(&self, full_name: &str) -> bool {
        self.custom_attributes
            .iter()
            .any(|attribute| attribute.full_name() == full_name)
    }

    /// True for types synthesized by the compiler
    pub fn is_compiler_generated(&self) -> bool {
        self.has_custom_attribute(COMPILER_GENERATED_ATTRIBUTE)
    }

    /// This definition followed by all of its nested types, depth first
    pub fn with_nested(self: &Arc<Self>) -> TypeDefList {
        let mut result = vec![self.clone()];
        for nested in &self.nested_types {
            result.extend(nested.with_nested());
        }
        result
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeDef {}

impl Hash for TypeDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for TypeDef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeDef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}
