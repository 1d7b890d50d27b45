//! Method definitions and method references.
//!
//! A [`MethodDef`] is a method declared by one of the loaded types and may carry a decoded
//! [`MethodBody`]. A [`MethodRef`] is what instructions point to: the declaring type
//! reference, the name and the signature, possibly naming a method in a module that was
//! never loaded.

mod body;
mod types;

pub use body::*;
pub use types::*;

use std::{fmt, sync::Arc};

use crate::metadata::typesystem::{TypeKey, TypeRefList, TypeRefRc};

/// A reference-counted pointer to a [`MethodDef`]
pub type MethodDefRc = Arc<MethodDef>;
/// A vector of method definitions
pub type MethodDefList = Vec<MethodDefRc>;
/// A reference-counted pointer to a [`MethodRef`]
pub type MethodRefRc = Arc<MethodRef>;

/// Name of instance constructors
pub const CONSTRUCTOR_NAME: &str = ".ctor";
/// Name of static type initializers
pub const TYPE_INITIALIZER_NAME: &str = ".cctor";

/// A parameter of a method definition
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name, may be empty
    pub name: String,
    /// Type of the parameter
    pub param_type: TypeRefRc,
}

/// A method declared by a type definition
#[derive(Debug)]
pub struct MethodDef {
    /// Name of the method
    pub name: String,
    /// Reference to the declaring type
    pub declaring_type: TypeRefRc,
    /// Method modifiers
    pub flags: MethodAttributes,
    /// Accessor role of this method
    pub semantics: MethodSemantics,
    /// The return type
    pub return_type: TypeRefRc,
    /// Ordered parameters
    pub params: Vec<ParamDef>,
    /// Generic parameters declared by the method
    pub generic_params: TypeRefList,
    /// Decoded body, `None` for abstract and runtime provided methods
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Returns the signature style full name, e.g. `System.Void App.Service::Run(App.Job)`
    pub fn full_name(&self) -> String {
        render_signature(
            &self.return_type,
            &self.declaring_type,
            &self.name,
            self.params.iter().map(|p| &p.param_type),
        )
    }

    /// The identity of the declaring type
    pub fn declaring_key(&self) -> &TypeKey {
        self.declaring_type.key()
    }

    /// True for instance constructors and type initializers
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME || self.name == TYPE_INITIALIZER_NAME
    }

    /// True for property getters
    pub fn is_getter(&self) -> bool {
        self.semantics.contains(MethodSemantics::GETTER)
    }

    /// True for property setters
    pub fn is_setter(&self) -> bool {
        self.semantics.contains(MethodSemantics::SETTER)
    }

    /// True if the method is static
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// True if the method has no implementation
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodAttributes::ABSTRACT)
    }

    /// True if a decoded body is attached
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Full names of the parameter types, in order
    pub fn param_names(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| p.param_type.full_name().to_string())
            .collect()
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// A reference to a method, as found in call and construction instructions
#[derive(Debug, Clone)]
pub struct MethodRef {
    /// The declaring type, may be a generic instance
    pub declaring_type: TypeRefRc,
    /// Name of the method
    pub name: String,
    /// The return type
    pub return_type: TypeRefRc,
    /// Parameter types, in order
    pub params: TypeRefList,
}

impl MethodRef {
    /// Create a new method reference
    ///
    /// ## Arguments
    /// * 'declaring_type' - The declaring type
    /// * 'name'           - Name of the method
    /// * 'return_type'    - The return type
    /// * 'params'         - Parameter types
    pub fn new(
        declaring_type: TypeRefRc,
        name: impl Into<String>,
        return_type: TypeRefRc,
        params: TypeRefList,
    ) -> MethodRefRc {
        Arc::new(MethodRef {
            declaring_type,
            name: name.into(),
            return_type,
            params,
        })
    }

    /// Create a reference pointing to an existing definition
    pub fn to_definition(method: &MethodDef) -> MethodRefRc {
        Self::new(
            method.declaring_type.clone(),
            method.name.clone(),
            method.return_type.clone(),
            method.params.iter().map(|p| p.param_type.clone()).collect(),
        )
    }

    /// Returns the signature style full name
    pub fn full_name(&self) -> String {
        render_signature(&self.return_type, &self.declaring_type, &self.name, self.params.iter())
    }

    /// Full names of the parameter types, in order
    pub fn param_names(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| p.full_name().to_string())
            .collect()
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

fn render_signature<'a>(
    return_type: &TypeRefRc,
    declaring_type: &TypeRefRc,
    name: &str,
    params: impl Iterator<Item = &'a TypeRefRc>,
) -> String {
    let params = params
        .map(|p| p.full_name())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{} {}::{}({})",
        return_type.full_name(),
        declaring_type.full_name(),
        name,
        params
    )
}
