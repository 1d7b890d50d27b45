use dashmap::DashMap;
use log::trace;

use crate::metadata::{
    method::{MethodDefRc, MethodRef},
    module::ModuleRc,
    typesystem::{TypeDefRc, TypeKey, TypeRef, TypeShape},
};

/// Maximum nesting depth of generic instantiations that is followed during resolution
const MAX_RECURSION_DEPTH: usize = 64;

/// Cache key of a method reference: declaring type, name and parameter type names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    declaring: TypeKey,
    name: String,
    params: Vec<String>,
}

impl MethodKey {
    fn of(method: &MethodRef) -> Self {
        MethodKey {
            declaring: method.declaring_type.key().clone(),
            name: method.name.clone(),
            params: method.param_names(),
        }
    }
}

/// Resolves type and method references to the definitions of the loaded modules.
///
/// The resolver knows the loaded modules by name and answers lookups through two
/// write-once caches: once a key has a result, including "unresolved", every later lookup
/// for that key returns the same result. Resolution failures are expected for references
/// into modules that were never loaded and are reported as `None`, never as an error.
///
/// The owning registry clears the caches whenever the module set changes.
#[derive(Debug, Default)]
pub struct SymbolResolver {
    modules: DashMap<String, ModuleRc>,
    types: DashMap<TypeKey, Option<TypeDefRc>>,
    methods: DashMap<MethodKey, Option<MethodDefRc>>,
}

impl SymbolResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a module available for resolution, keyed by its name
    ///
    /// Any cached results are dropped, as "unresolved" answers may no longer hold.
    pub fn register_module(&self, module: ModuleRc) {
        self.modules.insert(module.name.clone(), module);
        self.clear_cache();
    }

    /// Drop all modules and cached results
    pub fn clear(&self) {
        self.modules.clear();
        self.clear_cache();
    }

    /// Drop the cached results only
    pub fn clear_cache(&self) {
        self.types.clear();
        self.methods.clear();
    }

    /// Number of cached type lookups, resolved or not
    pub fn cached_types(&self) -> usize {
        self.types.len()
    }

    /// Resolve a type reference to its definition.
    ///
    /// Plain references are looked up in the module named by their scope; generic instances
    /// resolve to the definition of their element, provided all of their arguments resolve
    /// as well. Every other shape is unresolved.
    ///
    /// ## Arguments
    /// * 'reference' - The reference to resolve
    pub fn resolve_type(&self, reference: &TypeRef) -> Option<TypeDefRc> {
        self.resolve_with_depth(reference, 0)
    }

    fn resolve_with_depth(&self, reference: &TypeRef, depth: usize) -> Option<TypeDefRc> {
        if let Some(cached) = self.types.get(reference.key()) {
            return cached.value().clone();
        }

        let resolved = if depth >= MAX_RECURSION_DEPTH {
            None
        } else {
            self.lookup(reference, depth)
        };

        if resolved.is_none() {
            trace!("unresolved type reference {}", reference.key());
        }

        // First writer wins, later racers observe the stored result
        self.types
            .entry(reference.key().clone())
            .or_insert(resolved)
            .value()
            .clone()
    }

    fn lookup(&self, reference: &TypeRef, depth: usize) -> Option<TypeDefRc> {
        match reference.shape() {
            TypeShape::Plain => {
                let module = self.modules.get(reference.scope())?.value().clone();
                module.find_type(reference.full_name())
            }
            TypeShape::GenericInstance { element, arguments } => {
                let definition = self.resolve_with_depth(element, depth + 1)?;
                for argument in arguments {
                    if !argument.is_generic_parameter()
                        && self.resolve_with_depth(argument, depth + 1).is_none()
                    {
                        return None;
                    }
                }
                Some(definition)
            }
            TypeShape::GenericParameter { .. }
            | TypeShape::Array { .. }
            | TypeShape::ByReference { .. }
            | TypeShape::Pointer { .. }
            | TypeShape::FunctionPointer => None,
        }
    }

    /// Resolve a method reference to its definition.
    ///
    /// The declaring type is resolved first. A method with the same name and parameter
    /// type names wins; failing that, the method is accepted if it is the only one with the
    /// same name and number of parameters.
    ///
    /// ## Arguments
    /// * 'reference' - The method reference to resolve
    pub fn resolve_method(&self, reference: &MethodRef) -> Option<MethodDefRc> {
        let key = MethodKey::of(reference);
        if let Some(cached) = self.methods.get(&key) {
            return cached.value().clone();
        }

        let resolved = self.lookup_method(reference, &key);
        if resolved.is_none() {
            trace!("unresolved method reference {}", reference.full_name());
        }

        self.methods.entry(key).or_insert(resolved).value().clone()
    }

    fn lookup_method(&self, reference: &MethodRef, key: &MethodKey) -> Option<MethodDefRc> {
        let declaring = self.resolve_type(&reference.declaring_type)?;
        let candidates: Vec<&MethodDefRc> = declaring
            .methods
            .iter()
            .filter(|method| method.name == reference.name)
            .collect();

        if let Some(exact) = candidates
            .iter()
            .find(|method| method.param_names() == key.params)
        {
            return Some((*exact).clone());
        }

        let mut same_arity = candidates
            .into_iter()
            .filter(|method| method.params.len() == reference.params.len());
        match (same_arity.next(), same_arity.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }
}
