//! # dotmetrics Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotmetrics library. Import this module to get quick access to the essential
//! types for loading modules, extracting usages and querying dependency graphs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotmetrics operations
pub use crate::Error;

/// The result type used throughout dotmetrics
pub use crate::Result;

// ================================================================================================
// Metadata Model
// ================================================================================================

/// Loaded modules
pub use crate::metadata::module::{Module, ModuleRc};

/// Type references, definitions and their builders
pub use crate::metadata::typesystem::{
    SymbolResolver, TypeAttributes, TypeBuilder, TypeDef, TypeDefRc, TypeKey, TypeRef, TypeRefRc,
    TypeShape,
};

/// Methods, method references and decoded bodies
pub use crate::metadata::method::{
    Instruction, MethodBody, MethodDef, MethodDefRc, MethodRef, MethodRefRc, Operand,
};

// ================================================================================================
// Loading
// ================================================================================================

/// Module readers and sources
pub use crate::loader::{DirectorySource, ImageReader, LoadCandidate, ModuleReader, ModuleSource};

// ================================================================================================
// Registry
// ================================================================================================

/// The module registry and type queries
pub use crate::project::{ModuleRegistry, TypeQuery};

// ================================================================================================
// Analysis
// ================================================================================================

/// Relations, filters and the usage analyzer
pub use crate::analysis::{
    compact, CompactedRelation, MethodFilter, Relation, RelationKind, RelationList, TypeFilter,
    UsageAnalyzer, UsageOptions,
};

// ================================================================================================
// Graphs
// ================================================================================================

/// The dependency graph and path helpers
pub use crate::graph::{format_path, unit_weight, DependencyGraph, EdgeView};
