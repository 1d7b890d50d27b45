use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::metadata::typesystem::{TypeDefList, TypeDefRc};

/// A reference-counted pointer to a [`Module`]
pub type ModuleRc = Arc<Module>;

/// One loaded compiled unit.
///
/// A module is identified by its name; the registry never holds two modules with the same
/// name. Modules are immutable after construction.
#[derive(Debug)]
pub struct Module {
    /// Name of the module, referenced by the scope of type references
    pub name: String,
    /// File the module was read from, `None` for modules built in memory
    pub path: Option<PathBuf>,
    /// Top-level type definitions
    pub types: TypeDefList,
    index: HashMap<String, TypeDefRc>,
}

impl Module {
    /// Create a module from its top-level types
    ///
    /// ## Arguments
    /// * 'name'  - Name of the module
    /// * 'types' - Top-level type definitions, nested types are reached through them
    pub fn new(name: impl Into<String>, types: TypeDefList) -> Self {
        let index = types
            .iter()
            .flat_map(|ty| ty.with_nested())
            .map(|ty| (ty.full_name().to_string(), ty))
            .collect();

        Module {
            name: name.into(),
            path: None,
            types,
            index,
        }
    }

    /// Record the file this module was read from
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Look up a type definition by full name, nested types included
    ///
    /// ## Arguments
    /// * 'full_name' - Full name such as `App.Outer/Inner`
    pub fn find_type(&self, full_name: &str) -> Option<TypeDefRc> {
        self.index.get(full_name).cloned()
    }

    /// All type definitions, nested types following their declaring type
    pub fn all_types(&self) -> TypeDefList {
        self.types.iter().flat_map(|ty| ty.with_nested()).collect()
    }

    /// Number of type definitions, nested types included
    pub fn type_count(&self) -> usize {
        self.index.len()
    }
}
