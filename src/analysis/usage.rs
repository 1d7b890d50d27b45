//! Transitive usage extraction.
//!
//! The [`UsageAnalyzer`] walks the type graph of the loaded modules level by level,
//! starting from a set of seed references. Every visited type contributes the
//! [`Relation`]s it declares (base type, interfaces, fields, method signatures) and the
//! ones found in its method bodies; the targets of those relations form the next level.
//!
//! # Traversal
//!
//! - Each level is an ordered set, so the result does not depend on member order
//! - A type is expanded at most once per run; the visited set lives in the run itself
//! - Relations are deduplicated by [`crate::analysis::RelationKey`]
//! - A target the type filter rejects is neither reported nor expanded
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotmetrics::{analysis::{UsageAnalyzer, UsageOptions}, project::ModuleRegistry};
//!
//! # fn registry() -> ModuleRegistry { ModuleRegistry::new() }
//! let registry = registry();
//! let entries = registry.entry_points(&["Controller$"])?;
//!
//! let analyzer = UsageAnalyzer::new(&registry, UsageOptions::new());
//! let graph = analyzer.dependency_graph(&entries);
//! for edge in graph.edges() {
//!     println!("{} ({} relations)", edge, edge.weight.len());
//! }
//! # Ok::<(), dotmetrics::Error>(())
//! ```

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::{
    analysis::{compact, Relation, RelationKind, RelationList, UsageOptions},
    graph::DependencyGraph,
    metadata::{
        method::{Instruction, MethodDefRc, Operand},
        typesystem::{TypeDef, TypeDefRc, TypeKey, TypeRef, TypeRefRc, TypeShape},
    },
    project::ModuleRegistry,
};

/// Relations produced by expanding one reference, and the references to visit next
#[derive(Default)]
struct Expansion {
    relations: Vec<Relation>,
    successors: Vec<TypeRefRc>,
}

impl Expansion {
    /// Successors are the targets of the kept relations
    fn from_relations(relations: Vec<Relation>) -> Self {
        let successors = relations.iter().filter_map(|r| r.target().cloned()).collect();
        Expansion {
            relations,
            successors,
        }
    }
}

/// Computes usage closures and dependency graphs over a [`ModuleRegistry`]
pub struct UsageAnalyzer<'r> {
    registry: &'r ModuleRegistry,
    options: UsageOptions,
}

impl<'r> UsageAnalyzer<'r> {
    /// Create an analyzer
    ///
    /// ## Arguments
    /// * 'registry' - The loaded modules and their indexes
    /// * 'options'  - Type and method filters
    pub fn new(registry: &'r ModuleRegistry, options: UsageOptions) -> Self {
        UsageAnalyzer { registry, options }
    }

    /// Create an analyzer with [`UsageOptions::default`]
    pub fn with_defaults(registry: &'r ModuleRegistry) -> Self {
        Self::new(registry, UsageOptions::default())
    }

    /// The options in effect
    pub fn options(&self) -> &UsageOptions {
        &self.options
    }

    /// Compute the usage closure of a set of seed references.
    ///
    /// The seeds form the first level. Every level is expanded in key order; the next level
    /// holds the successors that pass the type filter and were not expanded before. The
    /// result is the union of all levels' relations, in discovery order, without duplicates.
    ///
    /// ## Arguments
    /// * 'seeds' - Where the traversal starts
    pub fn usages<I>(&self, seeds: I) -> Vec<Relation>
    where
        I: IntoIterator<Item = TypeRefRc>,
    {
        let mut frontier: BTreeSet<TypeRefRc> = seeds.into_iter().collect();
        let mut processed: HashSet<TypeKey> = HashSet::new();
        let mut seen = HashSet::new();
        let mut relations = Vec::new();
        let mut level = 0usize;

        while !frontier.is_empty() {
            let known = relations.len();
            let mut successors = BTreeSet::new();

            for reference in &frontier {
                let expansion = self.expand(reference);
                for relation in expansion.relations {
                    if seen.insert(relation.key()) {
                        relations.push(relation);
                    }
                }
                successors.extend(expansion.successors);
            }
            processed.extend(frontier.iter().map(|reference| reference.key().clone()));

            debug!(
                "usage level {}: {} types expanded, {} new relations",
                level,
                frontier.len(),
                relations.len() - known
            );

            frontier = successors
                .into_iter()
                .filter(|successor| {
                    !processed.contains(successor.key()) && self.options.type_filter.matches(successor)
                })
                .collect();
            level += 1;
        }

        relations
    }

    /// The relations one type definition declares and contains, after filtering
    ///
    /// ## Arguments
    /// * 'definition' - The type to inspect
    pub fn usages_for_type(&self, definition: &TypeDef) -> Vec<Relation> {
        let source = definition.reference();
        let mut relations = Vec::new();

        if let Some(base) = &definition.base {
            relations.push(Relation::new(source.clone(), base.clone(), RelationKind::BASE_TYPE));
        }
        for nested in &definition.nested_types {
            relations.push(Relation::new(
                source.clone(),
                nested.reference().clone(),
                RelationKind::NESTED_TYPE,
            ));
        }
        for interface in &definition.interfaces {
            relations.push(Relation::new(source.clone(), interface.clone(), RelationKind::INTERFACE));
        }
        for implementer in self.registry.implementers_of(definition.key()) {
            relations.push(Relation::new(
                source.clone(),
                implementer.reference().clone(),
                RelationKind::INTERFACE_IMPLEMENTATION,
            ));
        }
        for field in &definition.fields {
            relations.push(Relation::new(
                source.clone(),
                field.field_type.clone(),
                RelationKind::TYPE_REFERENCE,
            ));
        }

        for method in definition
            .methods
            .iter()
            .filter(|method| method.has_body() && self.options.method_filter.matches(method))
        {
            self.method_usages(source, method, &mut relations);
        }

        relations.retain(|relation| relation.target().is_some_and(|target| self.is_reportable(target)));
        relations
    }

    /// Build the dependency graph of a set of entry points.
    ///
    /// Relations of kind `INTERFACE` are left out, the rest is compacted into one edge per
    /// (source, target) pair. The entry points are always vertices, even without edges.
    ///
    /// ## Arguments
    /// * 'entry_points' - Seeds of the traversal, usually from [`ModuleRegistry::entry_points`]
    pub fn dependency_graph(&self, entry_points: &[TypeDefRc]) -> DependencyGraph<RelationList> {
        let relations = self
            .usages(entry_points.iter().map(|entry| entry.reference().clone()))
            .into_iter()
            .filter(|relation| relation.kind() != RelationKind::INTERFACE);

        let mut graph = DependencyGraph::new();
        for entry in entry_points {
            graph.add_vertex(entry.full_name());
        }
        for group in compact(relations) {
            graph.add_edge(&group.source, &group.target, group.relations);
        }

        debug!(
            "dependency graph of {} entry points: {} vertices, {} edges",
            entry_points.len(),
            graph.vertex_count(),
            graph.edge_count()
        );
        graph
    }

    fn expand(&self, reference: &TypeRefRc) -> Expansion {
        match reference.shape() {
            TypeShape::GenericParameter { constraints } => self.related(
                reference,
                constraints
                    .iter()
                    .map(|constraint| (constraint, RelationKind::GENERIC_CONSTRAINT)),
            ),
            TypeShape::GenericInstance { element, arguments } => self.related(
                reference,
                std::iter::once((element, RelationKind::GENERIC_DEFINITION)).chain(
                    arguments
                        .iter()
                        .map(|argument| (argument, RelationKind::GENERIC_PARAMETER)),
                ),
            ),
            TypeShape::Array { element, .. } | TypeShape::ByReference { element } => Expansion {
                relations: Vec::new(),
                successors: vec![element.clone()],
            },
            TypeShape::Pointer { .. } | TypeShape::FunctionPointer => Expansion::default(),
            TypeShape::Plain => match self.registry.resolver().resolve_type(reference) {
                Some(definition) => Expansion::from_relations(self.usages_for_type(&definition)),
                None => Expansion::default(),
            },
        }
    }

    fn related<'a, I>(&self, source: &TypeRefRc, targets: I) -> Expansion
    where
        I: Iterator<Item = (&'a TypeRefRc, RelationKind)>,
    {
        let relations = targets
            .filter(|(target, _)| self.is_reportable(target))
            .map(|(target, kind)| Relation::new(source.clone(), target.clone(), kind))
            .collect();
        Expansion::from_relations(relations)
    }

    fn method_usages(&self, source: &TypeRefRc, method: &MethodDefRc, relations: &mut Vec<Relation>) {
        let declared = |target: &TypeRefRc, kind| {
            Relation::new(source.clone(), target.clone(), kind).in_method(method.clone())
        };

        for param in &method.params {
            relations.push(declared(&param.param_type, RelationKind::METHOD_PARAMETER));
        }
        // declared generic parameters are reached through the signature types using them
        relations.push(declared(&method.return_type, RelationKind::METHOD_RETURN_TYPE));

        if let Some(body) = &method.body {
            for instruction in body.explorable() {
                if let Some(relation) = self.classify(source, instruction) {
                    relations.push(relation.in_method(method.clone()));
                }
            }
        }
    }

    /// The relation an instruction operand establishes, `None` for operands that do not
    /// lead to another type
    fn classify(&self, source: &TypeRefRc, instruction: &Instruction) -> Option<Relation> {
        match &instruction.operand {
            Operand::Type(target) => Some(
                Relation::new(source.clone(), target.clone(), RelationKind::TYPE_REFERENCE)
                    .at(instruction.clone()),
            ),
            Operand::Method(target) => {
                let kind = match self.registry.resolver().resolve_method(target) {
                    Some(method) if method.is_constructor() => RelationKind::CONSTRUCTION,
                    Some(method) if method.is_getter() => RelationKind::IMMUTABLE_ACCESS,
                    Some(_) => RelationKind::MUTABLE_ACCESS,
                    None => RelationKind::UNKNOWN,
                };
                Some(
                    Relation::new(source.clone(), target.declaring_type.clone(), kind)
                        .with_target_method(target.clone())
                        .at(instruction.clone()),
                )
            }
            _ => None,
        }
    }

    /// Targets must pass the type filter; plain targets must also resolve
    fn is_reportable(&self, target: &TypeRef) -> bool {
        self.options.type_filter.matches(target)
            && (!target.is_plain() || self.registry.resolver().resolve_type(target).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{MethodFilter, RelationKey, TypeFilter},
        graph::{format_path, unit_weight},
        test::{controller_scenario, layered_scenario, wrapper_scenario},
    };

    fn triples(relations: &[Relation]) -> Vec<(String, String, RelationKind)> {
        relations
            .iter()
            .map(|relation| {
                (
                    relation.source().full_name().to_string(),
                    relation
                        .target()
                        .map(|t| t.full_name().to_string())
                        .unwrap_or_default(),
                    relation.kind(),
                )
            })
            .collect()
    }

    fn has(relations: &[Relation], source: &str, target: &str, kind: RelationKind) -> bool {
        triples(relations)
            .iter()
            .any(|(s, t, k)| s == source && t == target && *k == kind)
    }

    fn seed(registry: &ModuleRegistry, full_name: &str) -> TypeRefRc {
        registry.find_type(full_name).unwrap().reference().clone()
    }

    #[test]
    fn controller_usages() {
        let registry = controller_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);

        let relations = analyzer.usages([seed(&registry, "App.Controller")]);
        assert_eq!(
            triples(&relations),
            vec![
                ("App.Controller".to_string(), "App.Service".to_string(), RelationKind::TYPE_REFERENCE),
                ("App.Service".to_string(), "App.IService".to_string(), RelationKind::INTERFACE),
                (
                    "App.IService".to_string(),
                    "App.Service".to_string(),
                    RelationKind::INTERFACE_IMPLEMENTATION
                ),
            ]
        );
    }

    #[test]
    fn controller_graph() {
        let registry = controller_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let entries = registry.entry_points(&["Controller$"]).unwrap();

        let graph = analyzer.dependency_graph(&entries);
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.vertices().next(), Some("App.Controller"));
        assert!(graph.edges_between("App.Service", "App.IService").is_empty());
        assert_eq!(graph.edges_between("App.IService", "App.Service").len(), 1);
    }

    #[test]
    fn instruction_classification() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);

        assert!(has(
            &relations,
            "Shop.Web.TestApiController",
            "Shop.Services.OrderService",
            RelationKind::CONSTRUCTION
        ));
        assert!(has(
            &relations,
            "Shop.Web.TestApiController",
            "Shop.Services.IOrderService",
            RelationKind::MUTABLE_ACCESS
        ));
        assert!(has(
            &relations,
            "Shop.Services.OrderService",
            "Shop.Data.Repository`1<Shop.Model.Order>",
            RelationKind::CONSTRUCTION
        ));
        assert!(has(
            &relations,
            "Shop.Data.Repository`1",
            "Shop.Data.TestDataContext",
            RelationKind::IMMUTABLE_ACCESS
        ));
        assert!(has(
            &relations,
            "Shop.Services.OrderService",
            "Shop.Data.TestDataContext",
            RelationKind::UNKNOWN
        ));

        let construction = relations
            .iter()
            .find(|r| r.kind() == RelationKind::CONSTRUCTION && r.target().unwrap().full_name() == "Shop.Data.TestDataContext")
            .unwrap();
        assert_eq!(construction.source_method().unwrap().name, ".ctor");
        assert_eq!(construction.target_method().unwrap().name, ".ctor");
        assert_eq!(construction.instruction().unwrap().mnemonic, "newobj");
    }

    #[test]
    fn generic_shapes() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);

        assert!(has(
            &relations,
            "Shop.Data.Repository`1<Shop.Model.Order>",
            "Shop.Data.Repository`1",
            RelationKind::GENERIC_DEFINITION
        ));
        assert!(has(
            &relations,
            "Shop.Data.Repository`1<Shop.Model.Order>",
            "Shop.Model.Order",
            RelationKind::GENERIC_PARAMETER
        ));
        assert!(has(
            &relations,
            "Shop.Data.Repository`1",
            "T",
            RelationKind::METHOD_RETURN_TYPE
        ));
        assert!(has(&relations, "T", "Shop.Model.Entity", RelationKind::GENERIC_CONSTRAINT));
    }

    #[test]
    fn standard_library_is_excluded() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);

        assert!(relations
            .iter()
            .filter_map(|r| r.target())
            .all(|target| !target.full_name().starts_with("System.")));
    }

    #[test]
    fn no_duplicates_and_deterministic() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let seeds = || {
            vec![
                seed(&registry, "Shop.Web.TestApiController"),
                seed(&registry, "Shop.Services.OrderService"),
                seed(&registry, "Shop.Web.TestApiController"),
            ]
        };

        let first = analyzer.usages(seeds());
        let second = analyzer.usages(seeds().into_iter().rev());

        let keys: Vec<RelationKey> = first.iter().map(Relation::key).collect();
        let unique: HashSet<&RelationKey> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(keys, second.iter().map(Relation::key).collect::<Vec<_>>());
    }

    #[test]
    fn closure_is_idempotent() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);

        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);
        let mut reached: Vec<TypeRefRc> = vec![seed(&registry, "Shop.Web.TestApiController")];
        reached.extend(relations.iter().filter_map(|r| r.target().cloned()));

        let again = analyzer.usages(reached);
        let before: HashSet<RelationKey> = relations.iter().map(Relation::key).collect();
        let after: HashSet<RelationKey> = again.iter().map(Relation::key).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn filters_stop_the_traversal() {
        let registry = layered_scenario();
        let options = UsageOptions::new().exclude_namespaces(&["Shop.Data"]);
        let analyzer = UsageAnalyzer::new(&registry, options);
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);

        assert!(relations
            .iter()
            .all(|r| !r.source().namespace().starts_with("Shop.Data")));
        assert!(relations
            .iter()
            .filter_map(|r| r.target())
            .all(|t| t.namespace() != "Shop.Data"));

        let no_bodies = UsageOptions::new().with_method_filter(MethodFilter::new(|_| false));
        let analyzer = UsageAnalyzer::new(&registry, no_bodies);
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);
        assert!(relations.iter().all(|r| r.instruction().is_none() && r.source_method().is_none()));
    }

    #[test]
    fn unresolvable_targets_are_dropped() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::new(&registry, UsageOptions::new().with_type_filter(TypeFilter::accept_all()));
        let relations = analyzer.usages([seed(&registry, "Shop.Web.TestApiController")]);

        // System types are accepted by the filter but never loaded
        assert!(relations
            .iter()
            .filter_map(|r| r.target())
            .all(|target| target.namespace() != "System"));
    }

    #[test]
    fn path_to_data_access() {
        let registry = layered_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let entries = registry.entry_points(&["Controller$"]).unwrap();
        let graph = analyzer.dependency_graph(&entries);

        assert!(graph
            .reachable(["Shop.Web.TestApiController"])
            .contains("Shop.Data.TestDataContext"));

        let paths = graph
            .paths_between(["Shop.Web.TestApiController"], ["Shop.Data.TestDataContext"], unit_weight)
            .unwrap();
        assert_eq!(
            format_path(&paths[0]),
            "Shop.Web.TestApiController -> Shop.Services.OrderService -> Shop.Data.TestDataContext"
        );

        let weight: usize = graph.edges().map(|e| e.weight.len()).sum();
        let relations = analyzer
            .usages(entries.iter().map(|e| e.reference().clone()))
            .into_iter()
            .filter(|r| r.kind() != RelationKind::INTERFACE)
            .count();
        assert_eq!(weight, relations);
    }

    #[test]
    fn wrappers_are_transparent_and_pointers_opaque() {
        let registry = wrapper_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let relations = analyzer.usages([seed(&registry, "App.Controller")]);

        assert!(has(&relations, "App.Controller", "App.Item[]", RelationKind::TYPE_REFERENCE));
        assert!(has(&relations, "App.Controller", "App.Item&", RelationKind::TYPE_REFERENCE));
        assert!(has(&relations, "App.Controller", "App.Raw*", RelationKind::TYPE_REFERENCE));
        assert!(has(&relations, "App.Item", "App.Other", RelationKind::TYPE_REFERENCE));

        let sources: HashSet<&str> = relations.iter().map(|r| r.source().full_name()).collect();
        assert_eq!(sources, HashSet::from(["App.Controller", "App.Item"]));
        assert!(relations
            .iter()
            .filter_map(|r| r.target())
            .all(|target| target.full_name() != "App.Hidden" && target.full_name() != "App.Raw"));

        let from_array = analyzer.usages([TypeRef::array(TypeRef::parse("App.Item", "App"), 1)]);
        assert_eq!(
            triples(&from_array),
            vec![("App.Item".to_string(), "App.Other".to_string(), RelationKind::TYPE_REFERENCE)]
        );

        let from_pointer = analyzer.usages([TypeRef::pointer(TypeRef::parse("App.Raw", "App"))]);
        assert!(from_pointer.is_empty());
        assert!(analyzer.usages([TypeRef::function_pointer("App")]).is_empty());
    }

    #[test]
    fn method_generic_parameters_emit_nothing() {
        let registry = wrapper_scenario();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        let relations = analyzer.usages([seed(&registry, "App.Controller")]);

        assert!(relations
            .iter()
            .all(|r| r.kind() != RelationKind::METHOD_GENERIC_PARAMETER));
        assert!(relations
            .iter()
            .filter_map(|r| r.target())
            .all(|target| target.full_name() != "TOut"));

        let entries = registry.entry_points(&["Controller$"]).unwrap();
        assert!(!analyzer.dependency_graph(&entries).contains_vertex("TOut"));
    }
}
