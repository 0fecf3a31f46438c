//! Text and Graphviz renderings of a converted graph

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::converter::Graph;
use crate::error::Result;
use crate::node::{MachineGraph, MachineNode, NodeKind};

/// Format a converted graph level by level
pub fn format_graph(graph: &Graph) -> String {
    let mut output = String::new();

    for (level, members) in graph.levels().iter().enumerate() {
        let _ = writeln!(output, "Level {}:", level);
        for &index in members {
            let node = &graph.nodes[index];
            let parents: Vec<&str> = graph
                .parents_of(index)
                .map(|p| graph.nodes[p].item.as_str())
                .collect();
            if parents.is_empty() {
                let _ = writeln!(output, "  [{}] {}", node.kind.as_str(), node.item);
            } else {
                let _ = writeln!(
                    output,
                    "  [{}] {} <- {}",
                    node.kind.as_str(),
                    node.item,
                    parents.join(", ")
                );
            }
        }
    }

    output
}

/// Export as a Graphviz digraph, one rank per level
pub fn to_dot(graph: &Graph) -> String {
    let mut output = String::from("digraph production {\n    rankdir=LR;\n");

    for (index, node) in graph.nodes.iter().enumerate() {
        let shape = match node.kind {
            NodeKind::Input => "ellipse",
            NodeKind::Producer => "box",
            NodeKind::Output => "doubleoctagon",
        };
        let _ = write!(output, "    n{} [label=\"{}\", shape={}", index, node.item, shape);
        if let Some(color) = node.color {
            let _ = write!(output, ", style=filled, fillcolor=\"{}\"", color.hex());
        }
        output.push_str("];\n");
    }

    for members in graph.levels() {
        let ids: Vec<String> = members.iter().map(|i| format!("n{}", i)).collect();
        let _ = writeln!(output, "    {{ rank=same; {} }}", ids.join("; "));
    }

    for edge in &graph.edges {
        let _ = writeln!(output, "    n{} -> n{};", edge.from, edge.to);
    }

    output.push_str("}\n");
    output
}

/// Summary of a converted graph
#[derive(Debug)]
pub struct GraphSummary {
    pub targets: Vec<String>,
    pub nodes: usize,
    pub edges: usize,
    pub depth: usize,
    /// Producer item -> first declared facility
    pub producers: BTreeMap<String, Option<String>>,
    pub raw_inputs: Vec<String>,
}

/// Generate a summary of the converted graph
pub fn summarize_graph(machines: &MachineGraph, graph: &Graph) -> Result<GraphSummary> {
    let mut producers = BTreeMap::new();
    let mut raw_inputs = Vec::new();
    let mut targets = Vec::new();

    for node in &graph.nodes {
        match machines.node(node.node)? {
            MachineNode::Input(_) => raw_inputs.push(node.item.to_string()),
            MachineNode::Producer(producer) => {
                let facility = producer.info().first_producer().map(str::to_string);
                producers.insert(node.item.to_string(), facility);
            }
            MachineNode::Output(_) => targets.push(node.item.to_string()),
        }
    }
    raw_inputs.sort();

    Ok(GraphSummary {
        targets,
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        depth: graph.max_level().unwrap_or(0),
        producers,
        raw_inputs,
    })
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Graph ===")?;
        writeln!(f, "Targets: {}", self.targets.join(", "))?;
        writeln!(
            f,
            "Nodes: {}  Edges: {}  Depth: {}",
            self.nodes, self.edges, self.depth
        )?;
        writeln!(f)?;

        writeln!(f, "Production steps:")?;
        for (item, facility) in &self.producers {
            match facility {
                Some(facility) => writeln!(f, "  {:<24} in {}", item, facility)?,
                None => writeln!(f, "  {}", item)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs:")?;
        for item in &self.raw_inputs {
            writeln!(f, "  {}", item)?;
        }

        Ok(())
    }
}
