//! Module set container and type indexes.
//!
//! This module provides the [`ModuleRegistry`], which owns every loaded module together
//! with the indexes the usage analysis relies on: all known type definitions, the
//! inheritance map (base type → direct subtypes) and the interface map (interface →
//! direct implementers). It also owns the [`SymbolResolver`] and its caches, so two
//! registries never share resolution state.
//!
//! # Architecture
//!
//! - **Loading**: candidate files come from a [`ModuleSource`]; files that fail to parse are
//!   logged, remembered and never retried; modules are unique by name
//! - **Indexing**: the indexes are merged incrementally for newly added modules, or rebuilt
//!   from scratch with [`ModuleRegistry::refresh_all_types`]
//! - **Queries**: inheritance closures and entry point discovery
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotmetrics::{loader::{DirectorySource, ImageReader}, project::ModuleRegistry};
//!
//! let mut registry = ModuleRegistry::new();
//! let source = DirectorySource::new(ImageReader::new());
//! let added = registry.load_modules(&source, Path::new("build/images"), &["*.json".to_string()])?;
//! println!("Loaded {} modules, {} types", added.len(), registry.type_count());
//!
//! for entry in registry.entry_points(&["Controller$"])? {
//!     println!("entry point: {}", entry.full_name());
//! }
//! # Ok::<(), dotmetrics::Error>(())
//! ```

mod query;

pub use query::TypeQuery;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use regex::Regex;

use crate::{
    loader::ModuleSource,
    metadata::{
        module::{Module, ModuleRc},
        typesystem::{SymbolResolver, TypeDefRc, TypeKey, TypeRef, TypeShape},
    },
    Result,
};

/// An ordered set of type definitions
pub type TypeSet = BTreeSet<TypeDefRc>;
/// Maps a type to a set of related definitions
pub type TypeMap = HashMap<TypeKey, TypeSet>;

/// Owner of the loaded module set and of all derived type indexes.
///
/// The indexes only ever contain definitions of loaded modules. Types marked with
/// `CompilerGeneratedAttribute` are left out of all indexes.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRc>,
    loaded_paths: HashSet<PathBuf>,
    failed_paths: HashSet<PathBuf>,
    all_types: BTreeMap<TypeKey, TypeDefRc>,
    by_name: HashMap<String, TypeDefRc>,
    inheritance: TypeMap,
    interfaces: TypeMap,
    resolver: SymbolResolver,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all modules a source finds under `path`.
    ///
    /// Candidates that fail to parse are logged and skipped, and their path is remembered
    /// so later calls do not retry them. A module whose name is already registered is
    /// dropped. The type indexes are merged for the newly added modules only.
    ///
    /// ## Arguments
    /// * 'source'   - Enumerates and parses the candidate files
    /// * 'path'     - Directory to search
    /// * 'patterns' - File name masks
    ///
    /// # Errors
    /// Returns an error if a file mask is malformed
    pub fn load_modules(
        &mut self,
        source: &dyn ModuleSource,
        path: &Path,
        patterns: &[String],
    ) -> Result<Vec<ModuleRc>> {
        let paths: Vec<PathBuf> = source
            .candidates(path, patterns)?
            .into_iter()
            .filter(|candidate| {
                !self.failed_paths.contains(candidate) && !self.loaded_paths.contains(candidate)
            })
            .collect();

        let mut added = Vec::new();
        for candidate in source.load(&paths) {
            match candidate.module {
                Ok(module) => {
                    self.loaded_paths.insert(candidate.path.clone());
                    let name = module.name.clone();
                    match self.register(module) {
                        Some(module) => added.push(module),
                        None => debug!(
                            "module {} from {} is already loaded, skipped",
                            name,
                            candidate.path.display()
                        ),
                    }
                }
                Err(error) => {
                    warn!("skipping {}: {}", candidate.path.display(), error);
                    self.failed_paths.insert(candidate.path);
                }
            }
        }

        self.refresh_types(&added);
        debug!(
            "loaded {} modules from {}, {} types known",
            added.len(),
            path.display(),
            self.all_types.len()
        );
        Ok(added)
    }

    /// Add a single in-memory module.
    ///
    /// Returns `None` if a module with the same name is already registered.
    pub fn add_module(&mut self, module: Module) -> Option<ModuleRc> {
        let added = self.register(module)?;
        self.refresh_types(std::slice::from_ref(&added));
        Some(added)
    }

    fn register(&mut self, module: Module) -> Option<ModuleRc> {
        if self.contains_module(&module.name) {
            return None;
        }

        let module = Arc::new(module);
        self.modules.push(module.clone());
        self.resolver.register_module(module.clone());
        Some(module)
    }

    /// Merge the types of the given modules into the indexes
    pub fn refresh_types(&mut self, modules: &[ModuleRc]) {
        for module in modules {
            for ty in module.all_types() {
                if ty.is_compiler_generated() {
                    continue;
                }
                self.index_type(ty);
            }
        }
    }

    /// Rebuild all indexes and drop the resolver caches
    pub fn refresh_all_types(&mut self) {
        self.all_types.clear();
        self.by_name.clear();
        self.inheritance.clear();
        self.interfaces.clear();
        self.resolver.clear_cache();

        let modules = self.modules.clone();
        self.refresh_types(&modules);
    }

    fn index_type(&mut self, ty: TypeDefRc) {
        if let Some(base) = &ty.base {
            self.inheritance
                .entry(definition_key(base).clone())
                .or_default()
                .insert(ty.clone());
        }
        for interface in &ty.interfaces {
            self.interfaces
                .entry(definition_key(interface).clone())
                .or_default()
                .insert(ty.clone());
        }
        // first module registered wins a full name shared across modules
        self.by_name
            .entry(ty.full_name().to_string())
            .or_insert_with(|| ty.clone());
        self.all_types.insert(ty.key().clone(), ty);
    }

    /// The given definitions and everything deriving from them, directly or indirectly.
    ///
    /// Breadth-first over the inheritance map; every definition is reported once, seeds
    /// first.
    pub fn types_inherited_from<I>(&self, bases: I) -> Vec<TypeDefRc>
    where
        I: IntoIterator<Item = TypeDefRc>,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut result = Vec::new();

        for base in bases {
            if visited.insert(base.key().clone()) {
                queue.push_back(base);
            }
        }

        while let Some(current) = queue.pop_front() {
            for derived in self.derived_from(current.key()) {
                if visited.insert(derived.key().clone()) {
                    queue.push_back(derived.clone());
                }
            }
            result.push(current);
        }

        result
    }

    /// Concrete types whose full name matches one of the patterns.
    ///
    /// Matching interfaces contribute their concrete implementers, walking through
    /// interfaces that extend them. The result is closed over inheritance and contains no
    /// abstract types and no interfaces.
    ///
    /// ## Arguments
    /// * 'patterns' - Regular expressions searched for anywhere in the full name
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if a pattern does not compile
    pub fn entry_points<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<TypeDefRc>> {
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut roots = TypeSet::new();
        for ty in self.all_types.values() {
            if !patterns.iter().any(|p| p.is_match(ty.full_name())) {
                continue;
            }

            if ty.is_interface() {
                roots.extend(self.implementers_transitive(ty));
            } else {
                roots.insert(ty.clone());
            }
        }

        Ok(self
            .types_inherited_from(roots)
            .into_iter()
            .filter(|ty| ty.is_concrete())
            .collect())
    }

    fn implementers_transitive(&self, interface: &TypeDefRc) -> TypeSet {
        let mut visited = HashSet::from([interface.key().clone()]);
        let mut queue = VecDeque::from([interface.clone()]);
        let mut result = TypeSet::new();

        while let Some(current) = queue.pop_front() {
            for implementer in self.implementers_of(current.key()) {
                if !visited.insert(implementer.key().clone()) {
                    continue;
                }
                if implementer.is_interface() {
                    queue.push_back(implementer.clone());
                } else {
                    result.insert(implementer.clone());
                }
            }
        }

        result
    }

    /// The loaded modules, in load order
    pub fn modules(&self) -> &[ModuleRc] {
        &self.modules
    }

    /// True if a module with this name is registered
    pub fn contains_module(&self, name: &str) -> bool {
        self.modules.iter().any(|module| module.name == name)
    }

    /// Paths that failed to parse and will not be retried
    pub fn failed_paths(&self) -> &HashSet<PathBuf> {
        &self.failed_paths
    }

    /// All indexed type definitions, ordered by key
    pub fn types(&self) -> impl Iterator<Item = &TypeDefRc> {
        self.all_types.values()
    }

    /// Number of indexed type definitions
    pub fn type_count(&self) -> usize {
        self.all_types.len()
    }

    /// Look up a definition by full name in any loaded module.
    ///
    /// If several modules define the same full name, the one registered first is returned.
    pub fn find_type(&self, full_name: &str) -> Option<TypeDefRc> {
        self.by_name.get(full_name).cloned()
    }

    /// Base type → direct subtypes
    pub fn inheritance_map(&self) -> &TypeMap {
        &self.inheritance
    }

    /// Interface → direct implementers
    pub fn interface_map(&self) -> &TypeMap {
        &self.interfaces
    }

    /// Direct implementers of an interface
    pub fn implementers_of(&self, interface: &TypeKey) -> impl Iterator<Item = &TypeDefRc> {
        self.interfaces.get(interface).into_iter().flatten()
    }

    /// Direct subtypes of a type
    pub fn derived_from(&self, base: &TypeKey) -> impl Iterator<Item = &TypeDefRc> {
        self.inheritance.get(base).into_iter().flatten()
    }

    /// The resolver owning this registry's caches
    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }
}

/// Key of the definition a base or interface reference names; instantiations count as
/// their generic definition
fn definition_key(reference: &TypeRef) -> &TypeKey {
    match reference.shape() {
        TypeShape::GenericInstance { element, .. } => element.key(),
        _ => reference.key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        loader::LoadCandidate,
        metadata::typesystem::{TypeBuilder, TypeRef, COMPILER_GENERATED_ATTRIBUTE},
        Error,
    };

    fn hierarchy() -> ModuleRegistry {
        let object = TypeRef::object();
        let handler = TypeRef::parse("App.IHandler", "App");
        let special = TypeRef::parse("App.ISpecialHandler", "App");
        let base = TypeRef::parse("App.HandlerBase", "App");
        let generic_base = TypeRef::parse("App.Repository`1", "App");

        let module = Module::new(
            "App",
            vec![
                TypeBuilder::interface("App", "IHandler", "App").build(),
                TypeBuilder::interface("App", "ISpecialHandler", "App")
                    .implements(handler.clone())
                    .build(),
                TypeBuilder::class("App", "HandlerBase", "App")
                    .abstract_type()
                    .extends(object.clone())
                    .implements(handler)
                    .build(),
                TypeBuilder::class("App", "OrderHandler", "App")
                    .extends(base.clone())
                    .build(),
                TypeBuilder::class("App", "AuditHandler", "App")
                    .extends(base)
                    .build(),
                TypeBuilder::class("App", "SpecialHandler", "App")
                    .implements(special)
                    .build(),
                TypeBuilder::class("App", "Repository`1", "App").build(),
                TypeBuilder::class("App", "OrderRepository", "App")
                    .extends(TypeRef::generic_instance(
                        generic_base,
                        vec![TypeRef::parse("App.Order", "App")],
                    ))
                    .build(),
                TypeBuilder::class("App", "<>c", "App")
                    .extends(object)
                    .attribute(TypeRef::parse(COMPILER_GENERATED_ATTRIBUTE, "System.Runtime"))
                    .build(),
            ],
        );

        let mut registry = ModuleRegistry::new();
        registry.add_module(module);
        registry
    }

    fn names(types: &[TypeDefRc]) -> Vec<&str> {
        types.iter().map(|ty| ty.full_name()).collect()
    }

    #[test]
    fn indexes() {
        let registry = hierarchy();

        assert_eq!(registry.type_count(), 8);
        assert!(registry.find_type("App.<>c").is_none());

        let handler = TypeKey::new("App.IHandler", "App");
        let implementers: Vec<&str> = registry
            .implementers_of(&handler)
            .map(|ty| ty.full_name())
            .collect();
        assert_eq!(implementers, vec!["App.HandlerBase", "App.ISpecialHandler"]);

        let repository = TypeKey::new("App.Repository`1", "App");
        assert_eq!(registry.derived_from(&repository).count(), 1);

        let object = TypeKey::new("System.Object", "System.Runtime");
        assert_eq!(registry.derived_from(&object).count(), 1);
    }

    #[test]
    fn inheritance_closure() {
        let registry = hierarchy();
        let base = registry.find_type("App.HandlerBase").unwrap();

        let closure = registry.types_inherited_from(vec![base.clone(), base]);
        assert_eq!(
            names(&closure),
            vec!["App.HandlerBase", "App.AuditHandler", "App.OrderHandler"]
        );
    }

    #[test]
    fn entry_points_expand_interfaces() {
        let registry = hierarchy();

        let entries = registry.entry_points(&["IHandler$"]).unwrap();
        assert_eq!(
            names(&entries),
            vec!["App.SpecialHandler", "App.AuditHandler", "App.OrderHandler"]
        );

        let direct = registry.entry_points(&["^App\\.Order"]).unwrap();
        assert_eq!(names(&direct), vec!["App.OrderHandler", "App.OrderRepository"]);

        assert!(matches!(registry.entry_points(&["("]), Err(Error::Pattern(_))));
    }

    #[test]
    fn refresh_all_is_idempotent() {
        let mut registry = hierarchy();
        let before: Vec<String> = registry.types().map(|t| t.full_name().to_string()).collect();

        registry.refresh_all_types();
        registry.refresh_all_types();

        let after: Vec<String> = registry.types().map(|t| t.full_name().to_string()).collect();
        assert_eq!(before, after);
        assert_eq!(
            registry
                .implementers_of(&TypeKey::new("App.IHandler", "App"))
                .count(),
            2
        );
    }

    #[test]
    fn find_type_by_name() {
        let mut registry = hierarchy();
        registry.add_module(Module::new(
            "Other",
            vec![
                TypeBuilder::class("App", "OrderHandler", "Other").build(),
                TypeBuilder::class("Lib", "Outer", "Other")
                    .nested("Inner", |inner| inner)
                    .build(),
            ],
        ));

        let handler = registry.find_type("App.OrderHandler").unwrap();
        assert_eq!(handler.scope(), "App");
        assert!(registry.find_type("Lib.Outer/Inner").is_some());
        assert!(registry.find_type("App.Missing").is_none());
        assert!(registry.find_type("App.<>c").is_none());

        registry.refresh_all_types();
        assert_eq!(registry.find_type("App.OrderHandler").unwrap().scope(), "App");
        assert_eq!(registry.type_count(), 11);
    }

    #[test]
    fn duplicate_modules_are_dropped() {
        let mut registry = hierarchy();
        assert!(registry.add_module(Module::new("App", vec![])).is_none());
        assert_eq!(registry.modules().len(), 1);
    }

    struct FakeSource;

    impl ModuleSource for FakeSource {
        fn candidates(&self, _path: &Path, _patterns: &[String]) -> Result<Vec<PathBuf>> {
            Ok(vec!["a".into(), "b".into(), "broken".into(), "a-copy".into()])
        }

        fn load(&self, paths: &[PathBuf]) -> Vec<LoadCandidate> {
            paths
                .iter()
                .map(|path| {
                    let module = match path.to_str() {
                        Some("a") | Some("a-copy") => Ok(Module::new("A", vec![
                            TypeBuilder::class("A", "One", "A").build(),
                        ])),
                        Some("b") => Ok(Module::new("B", vec![
                            TypeBuilder::class("B", "Two", "B").build(),
                        ])),
                        _ => Err(Error::Error("broken".into())),
                    };
                    LoadCandidate {
                        path: path.clone(),
                        module,
                    }
                })
                .collect()
        }
    }

    #[test]
    fn load_skips_failures_and_duplicates() {
        let mut registry = ModuleRegistry::new();

        let added = registry
            .load_modules(&FakeSource, Path::new("."), &[])
            .unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(registry.type_count(), 2);
        assert!(registry.failed_paths().contains(Path::new("broken")));

        let again = registry
            .load_modules(&FakeSource, Path::new("."), &[])
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(registry.modules().len(), 2);
    }
}
