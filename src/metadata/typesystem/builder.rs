//! Fluent builders for type and method definitions.
//!
//! Module readers and test fixtures use these builders to assemble [`TypeDef`] and
//! [`MethodDef`] instances without having to wire up the self references, nested type
//! names and instruction offsets by hand.

use std::sync::Arc;

use crate::metadata::{
    method::{
        MethodAttributes, MethodBody, MethodDef, MethodDefRc, MethodRefRc, MethodSemantics,
        Operand, ParamDef, CONSTRUCTOR_NAME,
    },
    typesystem::{
        FieldDef, TypeAttributes, TypeDef, TypeDefRc, TypeRef, TypeRefList, TypeRefRc,
    },
};

/// Name of the module that defines the core library types
pub const CORE_LIBRARY: &str = "System.Runtime";

/// Builder for [`TypeDef`]
///
/// # Examples
///
/// ```rust
/// use dotmetrics::metadata::{method::MethodRef, typesystem::{TypeBuilder, TypeRef}};
///
/// let repository = TypeRef::plain("App.Data", "Repository", "App");
/// let create = MethodRef::new(repository.clone(), ".ctor", TypeRef::void(), vec![]);
///
/// let service = TypeBuilder::class("App", "Service", "App")
///     .implements(TypeRef::plain("App", "IService", "App"))
///     .constructor(|ctor| ctor.newobj(create.clone()))
///     .build();
///
/// assert_eq!(service.interfaces.len(), 1);
/// assert!(service.methods[0].is_constructor());
/// ```
pub struct TypeBuilder {
    namespace: String,
    name: String,
    scope: String,
    flags: TypeAttributes,
    base: Option<TypeRefRc>,
    interfaces: TypeRefList,
    nested: Vec<TypeBuilder>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodBuilder>,
    generic_params: TypeRefList,
    attributes: TypeRefList,
}

impl TypeBuilder {
    fn new(namespace: &str, name: &str, scope: &str, flags: TypeAttributes) -> Self {
        TypeBuilder {
            namespace: namespace.to_string(),
            name: name.to_string(),
            scope: scope.to_string(),
            flags,
            base: None,
            interfaces: Vec::new(),
            nested: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            generic_params: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Start building a class
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the class
    /// * 'name'      - Name of the class
    /// * 'scope'     - Name of the defining module
    #[must_use]
    pub fn class(namespace: &str, name: &str, scope: &str) -> Self {
        Self::new(namespace, name, scope, TypeAttributes::PUBLIC)
    }

    /// Start building an interface
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the interface
    /// * 'name'      - Name of the interface
    /// * 'scope'     - Name of the defining module
    #[must_use]
    pub fn interface(namespace: &str, name: &str, scope: &str) -> Self {
        Self::new(
            namespace,
            name,
            scope,
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    /// Start building a value type
    #[must_use]
    pub fn value_type(namespace: &str, name: &str, scope: &str) -> Self {
        Self::new(
            namespace,
            name,
            scope,
            TypeAttributes::PUBLIC | TypeAttributes::VALUE_TYPE | TypeAttributes::SEALED,
        )
    }

    /// Full name of the type under construction
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Add type modifiers
    #[must_use]
    pub fn flags(mut self, flags: TypeAttributes) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark the type as abstract
    #[must_use]
    pub fn abstract_type(self) -> Self {
        self.flags(TypeAttributes::ABSTRACT)
    }

    /// Set the base type
    #[must_use]
    pub fn extends(mut self, base: TypeRefRc) -> Self {
        self.base = Some(base);
        self
    }

    /// Add a declared interface
    #[must_use]
    pub fn implements(mut self, interface: TypeRefRc) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Add a field
    ///
    /// ## Arguments
    /// * 'name'       - Name of the field
    /// * 'field_type' - Type of the field
    #[must_use]
    pub fn field(mut self, name: &str, field_type: TypeRefRc) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            field_type,
        });
        self
    }

    /// Attach a custom attribute by its type
    #[must_use]
    pub fn attribute(mut self, attribute: TypeRefRc) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a generic parameter, created with [`TypeRef::generic_parameter`]
    #[must_use]
    pub fn generic_param(mut self, param: TypeRefRc) -> Self {
        self.generic_params.push(param);
        self
    }

    /// Add a nested type
    ///
    /// ## Arguments
    /// * 'name'  - Name of the nested type, without the enclosing type
    /// * 'build' - Configures the nested type builder
    #[must_use]
    pub fn nested<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(TypeBuilder) -> TypeBuilder,
    {
        let nested = TypeBuilder::class(
            &self.namespace,
            &format!("{}/{}", self.name, name),
            &self.scope,
        );
        self.nested.push(build(nested));
        self
    }

    /// Add an already configured nested type builder.
    ///
    /// The caller is responsible for the `Outer/Inner` name, see [`TypeBuilder::nested`].
    #[must_use]
    pub fn with_nested(mut self, nested: TypeBuilder) -> Self {
        self.nested.push(nested);
        self
    }

    /// Add a method
    ///
    /// ## Arguments
    /// * 'name'  - Name of the method
    /// * 'build' - Configures the method builder
    #[must_use]
    pub fn method<F>(self, name: &str, build: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.with_method(build(MethodBuilder::new(name)))
    }

    /// Add an already configured method builder
    #[must_use]
    pub fn with_method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Add an instance constructor
    #[must_use]
    pub fn constructor<F>(self, build: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.method(CONSTRUCTOR_NAME, |ctor| {
            build(ctor.flags(MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME))
        })
    }

    /// Add a property getter `get_<name>` returning the given type
    #[must_use]
    pub fn getter(self, property: &str, property_type: TypeRefRc) -> Self {
        self.method(&format!("get_{property}"), |getter| {
            getter
                .semantics(MethodSemantics::GETTER)
                .flags(MethodAttributes::SPECIAL_NAME)
                .returns(property_type)
        })
    }

    /// Build the definition
    pub fn build(self) -> TypeDefRc {
        let reference = TypeRef::plain(&self.namespace, &self.name, &self.scope);
        let methods = self
            .methods
            .into_iter()
            .map(|method| method.build(&reference))
            .collect();

        Arc::new(TypeDef {
            namespace: self.namespace,
            name: self.name,
            flags: self.flags,
            base: self.base,
            interfaces: self.interfaces,
            nested_types: self.nested.into_iter().map(TypeBuilder::build).collect(),
            fields: self.fields,
            methods,
            generic_params: self.generic_params,
            custom_attributes: self.attributes,
            reference,
        })
    }
}

/// Builder for [`MethodDef`]
///
/// Instructions are appended in order; offsets are assigned from the operand sizes when
/// the method is built.
pub struct MethodBuilder {
    name: String,
    flags: MethodAttributes,
    semantics: MethodSemantics,
    return_type: Option<TypeRefRc>,
    params: Vec<ParamDef>,
    generic_params: TypeRefList,
    operations: Vec<(String, Operand)>,
    decoded: Option<MethodBody>,
    has_body: bool,
}

impl MethodBuilder {
    /// Start building a method with a body
    pub fn new(name: &str) -> Self {
        MethodBuilder {
            name: name.to_string(),
            flags: MethodAttributes::empty(),
            semantics: MethodSemantics::empty(),
            return_type: None,
            params: Vec::new(),
            generic_params: Vec::new(),
            operations: Vec::new(),
            decoded: None,
            has_body: true,
        }
    }

    /// Add method modifiers
    #[must_use]
    pub fn flags(mut self, flags: MethodAttributes) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the accessor role
    #[must_use]
    pub fn semantics(mut self, semantics: MethodSemantics) -> Self {
        self.semantics |= semantics;
        self
    }

    /// Mark the method abstract; abstract methods have no body
    #[must_use]
    pub fn abstract_method(mut self) -> Self {
        self.flags |= MethodAttributes::ABSTRACT | MethodAttributes::VIRTUAL;
        self.has_body = false;
        self
    }

    /// Set the return type, `System.Void` if never called
    #[must_use]
    pub fn returns(mut self, return_type: TypeRefRc) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: &str, param_type: TypeRefRc) -> Self {
        self.params.push(ParamDef {
            name: name.to_string(),
            param_type,
        });
        self
    }

    /// Declare a method generic parameter
    #[must_use]
    pub fn generic_param(mut self, param: TypeRefRc) -> Self {
        self.generic_params.push(param);
        self
    }

    /// Use an already decoded body, replacing any appended instructions
    #[must_use]
    pub fn body(mut self, body: MethodBody) -> Self {
        self.decoded = Some(body);
        self.has_body = true;
        self
    }

    /// Build the method without a body, e.g. for runtime provided methods
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    /// Append an instruction
    #[must_use]
    pub fn op(mut self, mnemonic: &str, operand: Operand) -> Self {
        self.operations.push((mnemonic.to_string(), operand));
        self
    }

    /// Append a `newobj`
    #[must_use]
    pub fn newobj(self, constructor: MethodRefRc) -> Self {
        self.op("newobj", Operand::Method(constructor))
    }

    /// Append a `call`
    #[must_use]
    pub fn call(self, method: MethodRefRc) -> Self {
        self.op("call", Operand::Method(method))
    }

    /// Append a `callvirt`
    #[must_use]
    pub fn callvirt(self, method: MethodRefRc) -> Self {
        self.op("callvirt", Operand::Method(method))
    }

    /// Append an instruction with a type operand, e.g. `castclass` or `ldtoken`
    #[must_use]
    pub fn type_op(self, mnemonic: &str, operand: TypeRefRc) -> Self {
        self.op(mnemonic, Operand::Type(operand))
    }

    /// Build the definition for the given declaring type
    pub fn build(self, declaring_type: &TypeRefRc) -> MethodDefRc {
        let body = match (self.has_body, self.decoded) {
            (false, _) => None,
            (true, Some(decoded)) => Some(decoded),
            (true, None) => Some(MethodBody::from_operations(self.operations)),
        };

        Arc::new(MethodDef {
            name: self.name,
            declaring_type: declaring_type.clone(),
            flags: self.flags,
            semantics: self.semantics,
            return_type: self.return_type.unwrap_or_else(TypeRef::void),
            params: self.params,
            generic_params: self.generic_params,
            body,
        })
    }
}

impl TypeRef {
    /// Reference to `System.Void`
    pub fn void() -> TypeRefRc {
        TypeRef::plain("System", "Void", CORE_LIBRARY)
    }

    /// Reference to `System.Object`
    pub fn object() -> TypeRefRc {
        TypeRef::plain("System", "Object", CORE_LIBRARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::method::MethodRef;

    #[test]
    fn nested_types_inherit_namespace_and_scope() {
        let outer = TypeBuilder::class("App.Data", "Context", "Data")
            .nested("Entry", |entry| entry.field("value", TypeRef::object()))
            .build();

        let inner = &outer.nested_types[0];
        assert_eq!(inner.full_name(), "App.Data.Context/Entry");
        assert_eq!(inner.namespace, "App.Data");
        assert_eq!(inner.scope(), "Data");
        assert_eq!(inner.fields.len(), 1);
    }

    #[test]
    fn methods() {
        let item = TypeRef::plain("App", "Item", "App");
        let ctor = MethodRef::new(item.clone(), ".ctor", TypeRef::void(), vec![]);

        let factory = TypeBuilder::class("App", "Factory", "App")
            .constructor(|ctor| ctor)
            .method("Create", |m| m.returns(item.clone()).newobj(ctor.clone()).op("ret", Operand::None))
            .method("Describe", |m| m.abstract_method())
            .getter("Last", item.clone())
            .build();

        assert_eq!(factory.methods.len(), 4);
        assert!(factory.methods[0].is_constructor());
        assert_eq!(factory.methods[0].declaring_key(), factory.key());

        let create = &factory.methods[1];
        assert_eq!(create.return_type.full_name(), "App.Item");
        assert_eq!(create.body.as_ref().map(|b| b.len()), Some(2));

        assert!(!factory.methods[2].has_body());
        assert!(factory.methods[2].is_abstract());

        let getter = &factory.methods[3];
        assert_eq!(getter.name, "get_Last");
        assert!(getter.is_getter());
        assert_eq!(getter.full_name(), "App.Item App.Factory::get_Last()");
    }

    #[test]
    fn interfaces_are_abstract() {
        let interface = TypeBuilder::interface("App", "IService", "App").build();
        assert!(interface.is_interface());
        assert!(interface.is_abstract());
        assert!(!interface.is_concrete());
    }
}
