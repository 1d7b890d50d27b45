//! Usage analysis of loaded modules.
//!
//! This module turns the type definitions held by a [`crate::project::ModuleRegistry`]
//! into typed [`Relation`]s and, from those, into a [`crate::graph::DependencyGraph`].
//!
//! # Architecture
//!
//! - [`relation`] - The [`Relation`] record and its [`RelationKind`] classification
//! - [`filter`] - Type and method predicates deciding what is reported and traversed
//! - [`options`] - [`UsageOptions`], the configuration of one analysis run
//! - [`usage`] - The level-synchronous traversal in [`UsageAnalyzer`]
//! - [`compact`] - Grouping of relations by (source, target) pair
//!
//! # Usage
//!
//! ```rust
//! use dotmetrics::{
//!     analysis::{RelationKind, UsageAnalyzer},
//!     metadata::{module::Module, typesystem::{TypeBuilder, TypeRef}},
//!     project::ModuleRegistry,
//! };
//!
//! let mut registry = ModuleRegistry::new();
//! registry.add_module(Module::new("App", vec![
//!     TypeBuilder::class("App", "Service", "App").build(),
//!     TypeBuilder::class("App", "Controller", "App")
//!         .field("service", TypeRef::parse("App.Service", "App"))
//!         .build(),
//! ]));
//!
//! let controller = registry.find_type("App.Controller").unwrap();
//! let relations = UsageAnalyzer::with_defaults(&registry).usages([controller.reference().clone()]);
//!
//! assert_eq!(relations.len(), 1);
//! assert_eq!(relations[0].kind(), RelationKind::TYPE_REFERENCE);
//! assert_eq!(relations[0].to_string(), "[Controller] -> [Service] as TYPE_REFERENCE");
//! ```

pub mod compact;
pub mod filter;
pub mod options;
pub mod relation;
pub mod usage;

pub use compact::{compact, CompactedRelation};
pub use filter::{MethodFilter, TypeFilter, STANDARD_NAMESPACES};
pub use options::UsageOptions;
pub use relation::{Relation, RelationKey, RelationKind, RelationList};
pub use usage::UsageAnalyzer;
