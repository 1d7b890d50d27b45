use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A reference-counted pointer to a [`TypeRef`]
pub type TypeRefRc = Arc<TypeRef>;
/// A vector that holds a list of [`TypeRef`] references
pub type TypeRefList = Vec<TypeRefRc>;

/// Identity of a type reference.
///
/// The metadata reader may hand back several distinct reference objects that all name the
/// same nominal type. Two references are considered the same type if, and only if, their
/// full name and defining scope match. The scope is the name of the module that defines the
/// type; for generic parameters it is the full name of the owning type or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    /// Fully qualified name, e.g. `App.Services.OrderService` or `App.Outer/Inner`
    pub full_name: String,
    /// Name of the defining scope
    pub scope: String,
}

impl TypeKey {
    /// Create a new key
    ///
    /// ## Arguments
    /// * 'full_name' - The fully qualified type name
    /// * 'scope'     - The defining scope
    pub fn new(full_name: impl Into<String>, scope: impl Into<String>) -> Self {
        TypeKey {
            full_name: full_name.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.scope, self.full_name)
    }
}

/// The structural shape of a type reference.
///
/// This is a closed set: every shape the usage extraction has to deal with is listed here,
/// and consumers dispatch over it with exhaustive `match` statements.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// A named reference to a class, interface or value type
    Plain,
    /// A generic parameter such as `T`, with its constraint types
    GenericParameter {
        /// Types the argument is constrained to
        constraints: TypeRefList,
    },
    /// An instantiation of a generic type, e.g. `List<Order>`
    GenericInstance {
        /// The open generic type definition
        element: TypeRefRc,
        /// Ordered generic arguments
        arguments: TypeRefList,
    },
    /// A single- or multi-dimensional array
    Array {
        /// The element type
        element: TypeRefRc,
        /// Number of dimensions
        rank: u32,
    },
    /// A managed by-reference (`ref` / `out`) wrapper
    ByReference {
        /// The referenced type
        element: TypeRefRc,
    },
    /// An unmanaged pointer
    Pointer {
        /// The pointed-to type
        element: TypeRefRc,
    },
    /// A function pointer, opaque for analysis purposes
    FunctionPointer,
}

/// A possibly unresolved mention of a type.
///
/// `TypeRef` carries the name and scope of the type it names, plus its [`TypeShape`].
/// Equality, ordering and hashing only consider the [`TypeKey`], so two independently
/// created references to the same type are interchangeable in sets and maps.
///
/// # Examples
///
/// ```rust
/// use dotmetrics::metadata::typesystem::TypeRef;
///
/// let list = TypeRef::plain("System.Collections.Generic", "List`1", "System.Runtime");
/// let order = TypeRef::plain("App", "Order", "App");
/// let orders = TypeRef::generic_instance(list, vec![order]);
///
/// assert_eq!(orders.full_name(), "System.Collections.Generic.List`1<App.Order>");
/// assert_eq!(orders.namespace(), "System.Collections.Generic");
/// assert_eq!(orders.short_name(), "List<Order>");
/// ```
#[derive(Debug, Clone)]
pub struct TypeRef {
    namespace: String,
    name: String,
    key: TypeKey,
    shape: TypeShape,
}

impl TypeRef {
    /// Create a reference to a named type.
    ///
    /// Nested types use `/` to separate the enclosing type from the nested one,
    /// e.g. `Outer/Inner`.
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the type, may be empty
    /// * 'name'      - Name of the type
    /// * 'scope'     - Name of the defining module
    pub fn plain(namespace: &str, name: &str, scope: &str) -> TypeRefRc {
        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };

        Arc::new(TypeRef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: TypeKey::new(full_name, scope),
            shape: TypeShape::Plain,
        })
    }

    /// Create a reference to a named type from its full name.
    ///
    /// The namespace is everything before the last `.` that precedes a nested
    /// type separator.
    ///
    /// ## Arguments
    /// * 'full_name' - Full name such as `App.Outer/Inner`
    /// * 'scope'     - Name of the defining module
    pub fn parse(full_name: &str, scope: &str) -> TypeRefRc {
        let (namespace, name) = split_full_name(full_name);
        Self::plain(namespace, name, scope)
    }

    /// Create a reference to a generic parameter.
    ///
    /// ## Arguments
    /// * 'name'        - Parameter name, e.g. `T`
    /// * 'owner'       - Full name of the declaring type or method
    /// * 'constraints' - Types the parameter is constrained to
    pub fn generic_parameter(name: &str, owner: &str, constraints: TypeRefList) -> TypeRefRc {
        Arc::new(TypeRef {
            namespace: String::new(),
            name: name.to_string(),
            key: TypeKey::new(name, owner),
            shape: TypeShape::GenericParameter { constraints },
        })
    }

    /// Create an instantiation of a generic type
    ///
    /// ## Arguments
    /// * 'element'   - The open generic type
    /// * 'arguments' - The ordered generic arguments
    pub fn generic_instance(element: TypeRefRc, arguments: TypeRefList) -> TypeRefRc {
        let args = arguments
            .iter()
            .map(|arg| arg.full_name())
            .collect::<Vec<_>>()
            .join(",");

        Arc::new(TypeRef {
            namespace: element.namespace.clone(),
            name: format!("{}<{}>", element.name, args),
            key: TypeKey::new(
                format!("{}<{}>", element.full_name(), args),
                element.scope(),
            ),
            shape: TypeShape::GenericInstance { element, arguments },
        })
    }

    /// Create an array of the given element type
    ///
    /// ## Arguments
    /// * 'element' - The element type
    /// * 'rank'    - Number of dimensions (1 for `T[]`)
    pub fn array(element: TypeRefRc, rank: u32) -> TypeRefRc {
        let suffix = if rank <= 1 {
            "[]".to_string()
        } else {
            format!("[{}]", ",".repeat(rank as usize - 1))
        };

        Self::wrap(element.clone(), &suffix, TypeShape::Array { element, rank })
    }

    /// Create a by-reference wrapper around the given type
    pub fn by_reference(element: TypeRefRc) -> TypeRefRc {
        Self::wrap(element.clone(), "&", TypeShape::ByReference { element })
    }

    /// Create an unmanaged pointer to the given type
    pub fn pointer(element: TypeRefRc) -> TypeRefRc {
        Self::wrap(element.clone(), "*", TypeShape::Pointer { element })
    }

    /// Create a function pointer reference
    ///
    /// ## Arguments
    /// * 'scope' - Name of the module the signature appears in
    pub fn function_pointer(scope: &str) -> TypeRefRc {
        Arc::new(TypeRef {
            namespace: String::new(),
            name: "method*".to_string(),
            key: TypeKey::new("method*", scope),
            shape: TypeShape::FunctionPointer,
        })
    }

    fn wrap(element: TypeRefRc, suffix: &str, shape: TypeShape) -> TypeRefRc {
        Arc::new(TypeRef {
            namespace: element.namespace.clone(),
            name: format!("{}{}", element.name, suffix),
            key: TypeKey::new(format!("{}{}", element.full_name(), suffix), element.scope()),
            shape,
        })
    }

    /// Namespace of the type; composite shapes report the namespace of their element
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the type without its namespace
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full name (Namespace.Name) of the type
    pub fn full_name(&self) -> &str {
        &self.key.full_name
    }

    /// Name of the defining scope
    pub fn scope(&self) -> &str {
        &self.key.scope
    }

    /// The identity of this reference
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The structural shape of this reference
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// True for a named reference that may resolve to a definition
    pub fn is_plain(&self) -> bool {
        matches!(self.shape, TypeShape::Plain)
    }

    /// True for a generic parameter
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self.shape, TypeShape::GenericParameter { .. })
    }

    /// The wrapped type of arrays, by-reference wrappers, pointers and generic instances
    pub fn element(&self) -> Option<&TypeRefRc> {
        match &self.shape {
            TypeShape::GenericInstance { element, .. }
            | TypeShape::Array { element, .. }
            | TypeShape::ByReference { element }
            | TypeShape::Pointer { element } => Some(element),
            TypeShape::Plain | TypeShape::GenericParameter { .. } | TypeShape::FunctionPointer => {
                None
            }
        }
    }

    /// Human readable name without namespaces and without generic arity markers.
    ///
    /// `App.Data.Repository`1<App.Model.Order>` becomes `Repository<Order>`.
    pub fn short_name(&self) -> String {
        match &self.shape {
            TypeShape::Plain => strip_arity(&self.name).to_string(),
            TypeShape::GenericParameter { .. } | TypeShape::FunctionPointer => self.name.clone(),
            TypeShape::GenericInstance { element, arguments } => {
                let args = arguments
                    .iter()
                    .map(|arg| arg.short_name())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}<{}>", element.short_name(), args)
            }
            TypeShape::Array { element, rank } => {
                if *rank <= 1 {
                    format!("{}[]", element.short_name())
                } else {
                    format!("{}[{}]", element.short_name(), ",".repeat(*rank as usize - 1))
                }
            }
            TypeShape::ByReference { element } => format!("{}&", element.short_name()),
            TypeShape::Pointer { element } => format!("{}*", element.short_name()),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// Split a full type name into namespace and name.
///
/// `App.Outer/Inner` yields `("App", "Outer/Inner")`, `Global` yields `("", "Global")`.
pub fn split_full_name(full_name: &str) -> (&str, &str) {
    let outer_end = full_name.find('/').unwrap_or(full_name.len());
    match full_name[..outer_end].rfind('.') {
        Some(pos) => (&full_name[..pos], &full_name[pos + 1..]),
        None => ("", full_name),
    }
}

fn strip_arity(name: &str) -> &str {
    let last = name.rsplit('/').next().unwrap_or(name);
    match last.find('`') {
        Some(pos) => &last[..pos],
        None => last,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn structural_equality() {
        let a = TypeRef::plain("App", "Service", "App");
        let b = TypeRef::parse("App.Service", "App");
        let other_scope = TypeRef::plain("App", "Service", "Other");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, other_scope);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&other_scope));
    }

    #[test]
    fn composite_names() {
        let item = TypeRef::plain("App", "Item", "App");

        assert_eq!(TypeRef::array(item.clone(), 1).full_name(), "App.Item[]");
        assert_eq!(TypeRef::array(item.clone(), 3).full_name(), "App.Item[,,]");
        assert_eq!(TypeRef::by_reference(item.clone()).full_name(), "App.Item&");
        assert_eq!(TypeRef::pointer(item.clone()).full_name(), "App.Item*");
        assert_eq!(TypeRef::pointer(item.clone()).namespace(), "App");
        assert_eq!(TypeRef::array(item, 1).scope(), "App");
    }

    #[test]
    fn generic_parameters_are_scoped_by_owner() {
        let t1 = TypeRef::generic_parameter("T", "App.Repository`1", vec![]);
        let t2 = TypeRef::generic_parameter("T", "App.Cache`1", vec![]);

        assert_eq!(t1.full_name(), "T");
        assert_eq!(t1.namespace(), "");
        assert_ne!(t1, t2);
    }

    #[test]
    fn nested_names() {
        assert_eq!(split_full_name("App.Outer/Inner"), ("App", "Outer/Inner"));
        assert_eq!(split_full_name("App.Data.Outer/In.ner"), ("App.Data", "Outer/In.ner"));
        assert_eq!(split_full_name("Global"), ("", "Global"));

        let nested = TypeRef::parse("App.Outer/Inner`1", "App");
        assert_eq!(nested.namespace(), "App");
        assert_eq!(nested.short_name(), "Inner");
    }

    #[test]
    fn element_access() {
        let item = TypeRef::plain("App", "Item", "App");
        let by_ref = TypeRef::by_reference(item.clone());

        assert_eq!(by_ref.element(), Some(&item));
        assert!(item.element().is_none());
        assert!(TypeRef::function_pointer("App").element().is_none());
    }
}
