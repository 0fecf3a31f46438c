//! Flattening of machine graphs into leveled node/edge lists
//!
//! The converter walks parent links post-order from each requested output.
//! Every distinct machine node becomes exactly one [`GraphNode`], and parents
//! always precede their children in [`Graph::nodes`]. A node's level is the
//! longest path to it from a node without parents, which renderers use as the
//! layout column.

use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::models::ItemId;
use crate::node::{MachineGraph, MachineNode, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    /// Rendered width of the label
    pub text: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Layout view of one machine node. Geometry is free to change between
/// conversions; topology is not.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub node: NodeId,
    pub item: ItemId,
    pub kind: NodeKind,
    pub level: usize,
    pub position: Vec2,
    pub size: Size,
    pub color: Option<Color>,
}

/// `from` supplies `to`. Both are indices into [`Graph::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Highest level in the graph, `None` when empty
    pub fn max_level(&self) -> Option<usize> {
        self.nodes.iter().map(|n| n.level).max()
    }

    /// Node indices grouped by level, each group in traversal order
    pub fn levels(&self) -> Vec<Vec<usize>> {
        let mut levels = vec![Vec::new(); self.max_level().map_or(0, |m| m + 1)];
        for (index, node) in self.nodes.iter().enumerate() {
            levels[node.level].push(index);
        }
        levels
    }

    /// Index of the view node wrapping `node`
    pub fn node_for(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.node == node)
    }

    /// Indices of the nodes supplying `index`
    pub fn parents_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.to == index)
            .map(|e| e.from)
    }
}

/// Flatten everything reachable from `outputs` into a fresh [`Graph`].
pub fn convert_graph(graph: &MachineGraph, outputs: &[NodeId]) -> Result<Graph> {
    GraphConverter::new(graph).convert(outputs)
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    InProgress,
    Done(usize),
}

pub struct GraphConverter<'a> {
    graph: &'a MachineGraph,
    states: SecondaryMap<NodeId, Visit>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl<'a> GraphConverter<'a> {
    pub fn new(graph: &'a MachineGraph) -> Self {
        Self {
            graph,
            states: SecondaryMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn convert(mut self, outputs: &[NodeId]) -> Result<Graph> {
        for &output in outputs {
            self.visit(output)?;
        }
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "converted machine graph"
        );
        Ok(Graph {
            nodes: self.nodes,
            edges: self.edges,
        })
    }

    fn visit(&mut self, id: NodeId) -> Result<usize> {
        let graph = self.graph;
        let node = graph.node(id)?;
        match self.states.get(id) {
            Some(Visit::Done(index)) => return Ok(*index),
            Some(Visit::InProgress) => return Err(GraphError::CycleDetected(node.output().clone())),
            None => {}
        }
        self.states.insert(id, Visit::InProgress);

        let mut level = 0;
        let mut parents = Vec::with_capacity(node.parent_count());
        match node {
            MachineNode::Input(_) => {}
            MachineNode::Producer(_) | MachineNode::Output(_) => {
                for parent in node.parents() {
                    let parent_index = self.visit(parent)?;
                    level = level.max(self.nodes[parent_index].level + 1);
                    parents.push(parent_index);
                }
            }
        }

        let index = self.nodes.len();
        self.nodes.push(GraphNode {
            node: id,
            item: node.output().clone(),
            kind: node.kind(),
            level,
            position: Vec2::default(),
            size: Size::default(),
            color: None,
        });
        self.edges
            .extend(parents.into_iter().map(|from| GraphEdge { from, to: index }));
        self.states.insert(id, Visit::Done(index));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RecipeCatalog;
    use crate::generator::generate_graph;

    fn item(name: &str) -> ItemId {
        ItemId::from(name)
    }

    fn level_of(graph: &Graph, name: &str, kind: NodeKind) -> usize {
        graph
            .nodes
            .iter()
            .find(|n| n.item.as_str() == name && n.kind == kind)
            .map(|n| n.level)
            .unwrap()
    }

    #[test]
    fn transport_belt_levels() {
        let catalog = RecipeCatalog::sample();
        let mut machines = MachineGraph::new();
        let outputs = generate_graph(&catalog, &mut machines, &[item("TransportBelt")]).unwrap();
        let graph = convert_graph(&machines, &outputs).unwrap();

        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.edges.len(), 5);
        assert_eq!(level_of(&graph, "IronOre", NodeKind::Input), 0);
        assert_eq!(level_of(&graph, "IronPlate", NodeKind::Producer), 1);
        assert_eq!(level_of(&graph, "IronGearWheel", NodeKind::Producer), 2);
        assert_eq!(level_of(&graph, "TransportBelt", NodeKind::Producer), 3);
        assert_eq!(level_of(&graph, "TransportBelt", NodeKind::Output), 4);
        assert_eq!(graph.max_level(), Some(4));
    }

    #[test]
    fn parents_precede_children() {
        let catalog = RecipeCatalog::sample();
        let mut machines = MachineGraph::new();
        let outputs = generate_graph(
            &catalog,
            &mut machines,
            &[item("SciencePack2"), item("AdvancedCircuit")],
        )
        .unwrap();
        let graph = convert_graph(&machines, &outputs).unwrap();

        for edge in &graph.edges {
            assert!(edge.from < edge.to);
            assert!(graph.nodes[edge.to].level > graph.nodes[edge.from].level);
        }
    }

    #[test]
    fn shared_outputs_convert_once() {
        let catalog = RecipeCatalog::sample();
        let mut machines = MachineGraph::new();
        let outputs = generate_graph(&catalog, &mut machines, &[item("IronPlate")]).unwrap();

        let twice = convert_graph(&machines, &[outputs[0], outputs[0]]).unwrap();
        assert_eq!(twice.nodes.len(), 3);
        assert_eq!(twice.edges.len(), 2);
    }

    #[test]
    fn levels_group_nodes_by_rank() {
        let catalog = RecipeCatalog::sample();
        let mut machines = MachineGraph::new();
        let outputs = generate_graph(&catalog, &mut machines, &[item("ElectronicCircuit")]).unwrap();
        let graph = convert_graph(&machines, &outputs).unwrap();

        let levels = graph.levels();
        let names = |level: usize| -> Vec<&str> {
            levels[level]
                .iter()
                .map(|&i| graph.nodes[i].item.as_str())
                .collect()
        };
        assert_eq!(names(0), ["IronOre", "CopperOre"]);
        assert_eq!(names(1), ["IronPlate", "CopperPlate"]);
        assert_eq!(names(2), ["CopperCable"]);
        assert_eq!(names(3), ["ElectronicCircuit"]);

        let circuit = graph.node_for(machines.node(outputs[0]).unwrap().parents().next().unwrap());
        let parents: Vec<_> = graph
            .parents_of(circuit.unwrap())
            .map(|i| graph.nodes[i].item.as_str())
            .collect();
        assert_eq!(parents, ["IronPlate", "CopperCable"]);
    }

    #[test]
    fn producer_without_parents_sits_at_level_zero() {
        let catalog = RecipeCatalog::sample();
        let mut machines = MachineGraph::new();
        let gear = machines.create_producer(&catalog, &item("IronGearWheel")).unwrap();
        let out = machines.create_output(&catalog, &item("IronGearWheel")).unwrap();
        machines.set_parent(out, gear).unwrap();

        let graph = convert_graph(&machines, &[out]).unwrap();
        assert_eq!(graph.nodes[0].level, 0);
        assert_eq!(graph.nodes[1].level, 1);
    }

    #[test]
    fn hand_built_cycle_is_detected() {
        let mut catalog = RecipeCatalog::new();
        catalog
            .define("Barrel", &[("Fluid", 1)], &[], 1.0)
            .define("Fluid", &[("Barrel", 1)], &[], 1.0);
        let mut machines = MachineGraph::new();
        let barrel = machines.create_producer(&catalog, &item("Barrel")).unwrap();
        let fluid = machines.create_producer(&catalog, &item("Fluid")).unwrap();
        let out = machines.create_output(&catalog, &item("Fluid")).unwrap();
        machines.set_parent(barrel, fluid).unwrap();
        machines.set_parent(fluid, barrel).unwrap();
        machines.set_parent(out, fluid).unwrap();

        let err = convert_graph(&machines, &[out]).unwrap_err();
        assert_eq!(err, GraphError::CycleDetected(item("Fluid")));
    }
}
