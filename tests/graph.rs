use std::collections::HashSet;

use factory_graph::{
    GraphError, ItemId, MachineGraph, MachineNode, NodeId, NodeKind, RecipeCatalog, convert_graph,
    generate_graph, validate_graph,
};

fn targets(names: &[&str]) -> Vec<ItemId> {
    names.iter().map(|n| ItemId::from(*n)).collect()
}

fn belt_catalog() -> RecipeCatalog {
    let mut catalog = RecipeCatalog::new();
    catalog
        .define("IronOre", &[], &[], 1.0)
        .define("IronPlate", &[("IronOre", 1)], &["StoneFurnace"], 3.2)
        .define("IronGearWheel", &[("IronPlate", 2)], &["AssemblingMachine1"], 0.5)
        .define(
            "TransportBelt",
            &[("IronPlate", 1), ("IronGearWheel", 1)],
            &["AssemblingMachine1"],
            0.5,
        );
    catalog
}

/// Every node reachable from the outputs, by identity
fn reachable(machines: &MachineGraph, outputs: &[NodeId]) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack = outputs.to_vec();
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(machines.node(id).unwrap().parents());
        }
    }
    seen
}

#[test]
fn transport_belt_scenario() {
    let catalog = belt_catalog();
    let mut machines = MachineGraph::new();
    let outputs = generate_graph(&catalog, &mut machines, &targets(&["TransportBelt"])).unwrap();
    validate_graph(&machines, &outputs).unwrap();

    let count = |name: &str, kind: NodeKind| {
        machines
            .iter()
            .filter(|(_, n)| n.output().as_str() == name && n.kind() == kind)
            .count()
    };
    assert_eq!(count("IronPlate", NodeKind::Producer), 1);
    assert_eq!(count("IronOre", NodeKind::Input), 1);
    assert_eq!(count("IronGearWheel", NodeKind::Producer), 1);
    assert_eq!(count("TransportBelt", NodeKind::Producer), 1);
    assert_eq!(count("TransportBelt", NodeKind::Output), 1);

    let graph = convert_graph(&machines, &outputs).unwrap();
    assert_eq!(graph.nodes.len(), 5);
    assert_eq!(graph.edges.len(), 5);

    let levels: Vec<(&str, NodeKind, usize)> = graph
        .nodes
        .iter()
        .map(|n| (n.item.as_str(), n.kind, n.level))
        .collect();
    assert_eq!(
        levels,
        [
            ("IronOre", NodeKind::Input, 0),
            ("IronPlate", NodeKind::Producer, 1),
            ("IronGearWheel", NodeKind::Producer, 2),
            ("TransportBelt", NodeKind::Producer, 3),
            ("TransportBelt", NodeKind::Output, 4),
        ]
    );
}

#[test]
fn conversion_deduplicates_nodes_and_edges() {
    let catalog = RecipeCatalog::sample();
    let mut machines = MachineGraph::new();
    let outputs = generate_graph(
        &catalog,
        &mut machines,
        &targets(&["SciencePack1", "SciencePack2", "AdvancedCircuit", "SciencePack1"]),
    )
    .unwrap();
    let graph = convert_graph(&machines, &outputs).unwrap();

    let nodes = reachable(&machines, &outputs);
    let links: usize = nodes
        .iter()
        .map(|&id| machines.node(id).unwrap().parent_count())
        .sum();
    assert_eq!(graph.nodes.len(), nodes.len());
    assert_eq!(graph.edges.len(), links);

    let distinct: HashSet<_> = graph.nodes.iter().map(|n| n.node).collect();
    assert_eq!(distinct.len(), graph.nodes.len());
}

#[test]
fn levels_increase_along_every_edge() {
    let catalog = RecipeCatalog::sample();
    let mut machines = MachineGraph::new();
    let all: Vec<ItemId> = catalog.items().map(|(id, _)| id.clone()).collect();
    let outputs = generate_graph(&catalog, &mut machines, &all).unwrap();
    validate_graph(&machines, &outputs).unwrap();
    let graph = convert_graph(&machines, &outputs).unwrap();

    for edge in &graph.edges {
        assert!(graph.nodes[edge.to].level > graph.nodes[edge.from].level);
    }
    for (index, node) in graph.nodes.iter().enumerate() {
        if graph.parents_of(index).next().is_none() {
            assert_eq!(node.level, 0, "{}", node.item);
        }
    }
}

#[test]
fn every_producible_item_generates_a_valid_graph() {
    let catalog = RecipeCatalog::sample();
    for item in catalog.producible_items() {
        let mut machines = MachineGraph::new();
        let outputs = generate_graph(&catalog, &mut machines, &[item.clone()]).unwrap();
        validate_graph(&machines, &outputs).unwrap();

        for (_, node) in machines.iter() {
            if let MachineNode::Producer(producer) = node {
                let keys: Vec<_> = node.parent_map().unwrap().keys().collect();
                let recipe: Vec<_> = producer.info().ingredients().collect();
                assert_eq!(keys, recipe);
            }
        }
    }
}

#[test]
fn subset_of_ingredients_fails_validation() {
    let catalog = RecipeCatalog::sample();
    let mut machines = MachineGraph::new();
    let plate = machines.create_producer(&catalog, &"IronPlate".into()).unwrap();
    let cable = machines.create_producer(&catalog, &"CopperCable".into()).unwrap();
    let circuit = machines
        .create_producer(&catalog, &"ElectronicCircuit".into())
        .unwrap();
    let out = machines
        .create_output(&catalog, &"ElectronicCircuit".into())
        .unwrap();
    machines.set_parent(circuit, cable).unwrap();
    machines.set_parent(out, circuit).unwrap();

    let err = validate_graph(&machines, &[out]).unwrap_err();
    assert_eq!(
        err,
        GraphError::MissingIngredient {
            item: "ElectronicCircuit".into(),
            ingredient: "IronPlate".into(),
        }
    );

    // Unlinked producers further up are reported once reached.
    machines.set_parent(circuit, plate).unwrap();
    let err = validate_graph(&machines, &[out]).unwrap_err();
    assert!(matches!(err, GraphError::MissingIngredient { .. }));
}

#[test]
fn input_parent_rejected_and_output_item_checked() {
    let catalog = belt_catalog();
    let mut machines = MachineGraph::new();
    let ore = machines.create_input(&catalog, &"IronOre".into()).unwrap();
    let plate = machines.create_producer(&catalog, &"IronPlate".into()).unwrap();
    let out = machines.create_output(&catalog, &"IronGearWheel".into()).unwrap();

    assert!(matches!(
        machines.set_parent(ore, plate),
        Err(GraphError::InputCannotHaveParent { .. })
    ));
    assert_eq!(machines.node(ore).unwrap().parent_count(), 0);

    assert!(matches!(
        machines.set_parent(out, plate),
        Err(GraphError::IncompatibleIngredient { .. })
    ));
}

#[test]
fn reconversion_after_mutation_is_independent() {
    let catalog = belt_catalog();
    let mut machines = MachineGraph::new();
    let gear = machines.create_producer(&catalog, &"IronGearWheel".into()).unwrap();
    let out = machines.create_output(&catalog, &"IronGearWheel".into()).unwrap();
    machines.set_parent(out, gear).unwrap();

    let mut before = convert_graph(&machines, &[out]).unwrap();
    before.nodes[0].position.x = 42.0;

    let plate = machines.create_producer(&catalog, &"IronPlate".into()).unwrap();
    machines.set_parent(gear, plate).unwrap();
    let after = convert_graph(&machines, &[out]).unwrap();

    assert_eq!(before.nodes.len(), 2);
    assert_eq!(after.nodes.len(), 3);
    assert_eq!(after.nodes[0].position.x, 0.0);
    assert_eq!(after.nodes.last().unwrap().level, 2);
}
