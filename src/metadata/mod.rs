//! In-memory model of loaded .NET modules.
//!
//! This module contains the read-only view of compiled modules the analysis works on:
//! modules, type definitions and references, methods and their decoded bodies. Producing
//! this model from a binary is the job of a [`crate::loader::ModuleReader`].
//!
//! # Key Components
//!
//! - [`module`] - A loaded module and its name based identity
//! - [`typesystem`] - Type references, definitions, builders and the symbol resolver
//! - [`method`] - Method definitions, method references and decoded instructions
//!
//! # Examples
//!
//! ```rust
//! use dotmetrics::metadata::{module::Module, typesystem::TypeBuilder};
//!
//! let module = Module::new("App", vec![
//!     TypeBuilder::class("App", "Outer", "App").nested("Inner", |t| t).build(),
//! ]);
//!
//! assert_eq!(module.types.len(), 1);
//! assert!(module.find_type("App.Outer/Inner").is_some());
//! ```

/// Implementation of methods, method references and method bodies
pub mod method;
/// Implementation of a loaded module
pub mod module;
/// Implementation of the type system
pub mod typesystem;
