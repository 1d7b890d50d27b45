//! End-to-end scenarios: from built modules over usage extraction to graph queries.

use std::collections::HashSet;

use dotmetrics::{
    analysis::RelationKey,
    metadata::method::MethodRef,
    prelude::*,
};

/// `App.Controller` holds an `App.Service`, which implements `App.IService`
fn controller_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.add_module(Module::new(
        "App",
        vec![
            TypeBuilder::interface("App", "IService", "App").build(),
            TypeBuilder::class("App", "Service", "App")
                .extends(TypeRef::object())
                .implements(TypeRef::parse("App.IService", "App"))
                .build(),
            TypeBuilder::class("App", "Controller", "App")
                .extends(TypeRef::object())
                .field("service", TypeRef::parse("App.Service", "App"))
                .build(),
        ],
    ));
    registry
}

/// `Web.Controller` constructs `Core.Service`, which holds a `Data.Repository`, which holds
/// a `Data.Context`
fn layered_registry() -> ModuleRegistry {
    let service = TypeRef::parse("Core.Service", "Layers");
    let create_service = MethodRef::new(service, ".ctor", TypeRef::void(), vec![]);

    let mut registry = ModuleRegistry::new();
    registry.add_module(Module::new(
        "Layers",
        vec![
            TypeBuilder::class("Web", "Controller", "Layers")
                .constructor(|ctor| ctor.newobj(create_service))
                .build(),
            TypeBuilder::class("Core", "Service", "Layers")
                .constructor(|ctor| ctor)
                .field("repository", TypeRef::parse("Data.Repository", "Layers"))
                .build(),
            TypeBuilder::class("Data", "Repository", "Layers")
                .field("context", TypeRef::parse("Data.Context", "Layers"))
                .build(),
            TypeBuilder::class("Data", "Context", "Layers").build(),
        ],
    ));
    registry
}

fn seeds(registry: &ModuleRegistry, pattern: &str) -> Vec<TypeRefRc> {
    registry
        .entry_points(&[pattern])
        .unwrap()
        .iter()
        .map(|entry| entry.reference().clone())
        .collect()
}

fn concat(incoming: EdgeView<'_, RelationList>, outgoing: EdgeView<'_, RelationList>) -> RelationList {
    incoming
        .weight
        .iter()
        .chain(outgoing.weight.iter())
        .cloned()
        .collect()
}

#[test]
fn controller_relations() {
    let registry = controller_registry();
    let analyzer = UsageAnalyzer::with_defaults(&registry);
    let relations = analyzer.usages(seeds(&registry, "Controller$"));

    let rendered: Vec<String> = relations.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "[Controller] -> [Service] as TYPE_REFERENCE",
            "[Service] -> [IService] as INTERFACE",
            "[IService] -> [Service] as INTERFACE_IMPLEMENTATION",
        ]
    );
}

#[test]
fn controller_graph() {
    let registry = controller_registry();
    let entries = registry.entry_points(&["Controller$"]).unwrap();
    let graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);

    assert_eq!(graph.vertex_count(), 3);
    assert!(graph.edge_count() >= 2);
    for vertex in ["App.Controller", "App.Service", "App.IService"] {
        assert!(graph.contains_vertex(vertex), "{vertex} missing");
    }
}

#[test]
fn repeated_runs_are_identical() {
    let keys = || -> Vec<RelationKey> {
        let registry = layered_registry();
        let analyzer = UsageAnalyzer::with_defaults(&registry);
        analyzer
            .usages(seeds(&registry, "Controller$"))
            .iter()
            .map(Relation::key)
            .collect()
    };

    let first = keys();
    assert_eq!(first, keys());
    assert_eq!(first.iter().collect::<HashSet<_>>().len(), first.len());
}

#[test]
fn compaction_conserves_relations() {
    let registry = layered_registry();
    let relations = UsageAnalyzer::with_defaults(&registry).usages(seeds(&registry, "Controller$"));
    let total = relations.len();

    let groups = compact(relations);
    assert_eq!(groups.iter().map(CompactedRelation::weight).sum::<usize>(), total);
    assert_eq!(groups[0].kinds(), RelationKind::CONSTRUCTION);
}

#[test]
fn contraction_keeps_paths() {
    let registry = layered_registry();
    let entries = registry.entry_points(&["^Web\\."]).unwrap();
    let mut graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);
    assert_eq!(graph.vertex_count(), 4);
    assert_eq!(graph.edge_count(), 3);

    let reachable_before = graph.reachable(["Web.Controller"]);
    graph.contract_vertex("Core.Service", concat).unwrap();

    assert_eq!(graph.edge_count(), 2);
    let shortcut = graph.edges_between("Web.Controller", "Data.Repository");
    assert_eq!(shortcut.len(), 1);
    assert_eq!(shortcut[0].weight.len(), 2);

    let reachable_after = graph.reachable(["Web.Controller"]);
    assert!(reachable_after.is_subset(&reachable_before));
    assert!(reachable_after.contains("Data.Context"));

    assert!(matches!(
        graph.contract_vertex("Core.Service", concat),
        Err(Error::VertexNotFound(_))
    ));
}

#[test]
fn namespace_view() {
    let registry = layered_registry();
    let entries = registry.entry_points(&["^Web\\."]).unwrap();
    let mut graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);

    graph.merge_vertices_by_key(
        |name| name.split('.').next().unwrap_or(name).to_string(),
        |edge, _| edge.weight.clone(),
        |_, edge| edge.weight.clone(),
    );

    let mut vertices: Vec<&str> = graph.vertices().collect();
    vertices.sort_unstable();
    assert_eq!(vertices, vec!["Core", "Data", "Web"]);
    assert_eq!(graph.edge_count(), 2);

    let path = graph.paths_between(["Web"], ["Data"], unit_weight).unwrap();
    assert_eq!(format_path(&path[0]), "Web -> Core -> Data");
}

#[test]
fn projection_and_shortest_path_union() {
    let registry = layered_registry();
    let entries = registry.entry_points(&["^Web\\."]).unwrap();
    let graph = UsageAnalyzer::with_defaults(&registry).dependency_graph(&entries);

    let projected = graph.project_subgraph(["Web.Controller", "Data.Context"], |_, _| ());
    assert_eq!(projected.vertex_count(), 2);
    assert_eq!(projected.edges_between("Web.Controller", "Data.Context").len(), 1);

    let union = graph
        .union_of_shortest_paths(["Web.Controller"], ["Data.Repository", "Data.Context"], |edge| {
            edge.weight.len() as f64
        })
        .unwrap();
    assert_eq!(union.edge_count(), 3);
    assert!(union.contains_vertex("Core.Service"));
}
