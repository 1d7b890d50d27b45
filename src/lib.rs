// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'loader/directory.rs' uses mmap to map candidate files into memory

//! # dotmetrics
//!
//! Type usage extraction and dependency graph analysis for .NET modules.
//!
//! `dotmetrics` takes a set of loaded modules, walks the types reachable from a set of entry
//! points and records every reason one type depends on another: inheritance, interfaces,
//! field and signature types, and the constructions, calls and type tokens found in method
//! bodies. The result is compacted into a dependency graph that can be reduced and queried
//! to answer questions such as "what connects this controller to that data context".
//!
//! ## Features
//!
//! - **📦 Module loading** - Directory scanning with file masks, memory-mapped reads and parallel parsing
//! - **🔍 Symbol resolution** - Cached, write-once resolution of type and method references
//! - **🧭 Usage extraction** - Deterministic, cycle-safe, level-synchronous traversal
//! - **📊 Dependency graphs** - Contraction, merging, projection, reachability and shortest paths
//!
//! ## Quick Start
//!
//! ```rust
//! use dotmetrics::prelude::*;
//!
//! let mut registry = ModuleRegistry::new();
//! registry.add_module(Module::new("App", vec![
//!     TypeBuilder::interface("App", "IService", "App").build(),
//!     TypeBuilder::class("App", "Service", "App")
//!         .implements(TypeRef::parse("App.IService", "App"))
//!         .build(),
//!     TypeBuilder::class("App", "Controller", "App")
//!         .field("service", TypeRef::parse("App.Service", "App"))
//!         .build(),
//! ]));
//!
//! let entries = registry.entry_points(&["Controller$"])?;
//! let graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);
//!
//! assert_eq!(graph.vertex_count(), 3);
//! assert!(graph.reachable(["App.Controller"]).contains("App.Service"));
//! # Ok::<(), dotmetrics::Error>(())
//! ```
//!
//! ### Loading modules from disk
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotmetrics::prelude::*;
//!
//! let mut registry = ModuleRegistry::new();
//! let source = DirectorySource::new(ImageReader::new()).recursive(true);
//! registry.load_modules(&source, Path::new("build/images"), &["*.json".to_string()])?;
//!
//! let entries = registry.entry_points(&["Controller$"])?;
//! let graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);
//! for path in graph.paths_between(["App.Web.HomeController"], ["App.Data.DbContext"], unit_weight)? {
//!     println!("{}", format_path(&path));
//! }
//! # Ok::<(), dotmetrics::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Modules, type and method model, symbol resolution
//! - [`loader`] - Module readers and sources
//! - [`project`] - The module registry and its type indexes
//! - [`analysis`] - Relations, filters and the usage analyzer
//! - [`graph`] - The dependency graph and its reductions
//! - [`Error`] and [`Result`] - Error handling
//!
//! No logger is installed; diagnostics go through the `log` facade.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotmetrics::prelude::*;
///
/// let registry = ModuleRegistry::new();
/// let analyzer = UsageAnalyzer::new(&registry, UsageOptions::new());
/// assert!(analyzer.usages(Vec::<TypeRefRc>::new()).is_empty());
/// ```
pub mod prelude;

/// The in-memory model of loaded modules.
///
/// # Key Components
///
/// - [`metadata::module::Module`] - One loaded module
/// - [`metadata::typesystem::TypeRef`] - A possibly unresolved type reference
/// - [`metadata::typesystem::TypeDef`] - A type definition
/// - [`metadata::typesystem::SymbolResolver`] - Cached reference resolution
/// - [`metadata::method::MethodDef`] - A method and its decoded body
pub mod metadata;

/// Producing modules from files.
///
/// A [`loader::ModuleReader`] turns bytes into a module; a [`loader::ModuleSource`] finds
/// candidate files and runs a reader over them.
pub mod loader;

/// The module registry: loaded modules, type indexes and entry point discovery
pub mod project;

/// Relations between types and the usage analysis producing them
pub mod analysis;

/// The dependency graph and its reduction and query toolkit
pub mod graph;

/// `dotmetrics` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotmetrics` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use dotmetrics::{Error, analysis::TypeFilter};
///
/// match TypeFilter::matching("(") {
///     Err(Error::Pattern(e)) => println!("bad pattern: {}", e),
///     _ => unreachable!(),
/// }
/// ```
pub use error::Error;
