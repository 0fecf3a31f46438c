//! Structural checks over a built machine graph

use slotmap::SecondaryMap;

use crate::error::{GraphError, Result};
use crate::node::{MachineGraph, MachineNode, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Checked,
}

/// Fail on the first output without a source, producer missing an
/// ingredient, or node that is its own ancestor.
///
/// Outputs are walked depth-first in the order given; shared nodes are
/// checked once.
pub fn validate_graph(graph: &MachineGraph, outputs: &[NodeId]) -> Result<()> {
    let mut states = SecondaryMap::new();
    for &output in outputs {
        visit(graph, output, &mut states)?;
    }
    Ok(())
}

fn visit(
    graph: &MachineGraph,
    id: NodeId,
    states: &mut SecondaryMap<NodeId, Visit>,
) -> Result<()> {
    let node = graph.node(id)?;
    match states.get(id) {
        Some(Visit::Checked) => return Ok(()),
        Some(Visit::OnStack) => return Err(GraphError::CycleDetected(node.output().clone())),
        None => {}
    }

    match node {
        MachineNode::Input(_) => {
            states.insert(id, Visit::Checked);
            return Ok(());
        }
        MachineNode::Output(output) => {
            if output.source().is_none() {
                return Err(GraphError::OutputMissingParent {
                    item: node.output().clone(),
                });
            }
        }
        MachineNode::Producer(producer) => {
            if let Some(missing) = producer.missing_ingredients().next() {
                return Err(GraphError::MissingIngredient {
                    item: node.output().clone(),
                    ingredient: missing.clone(),
                });
            }
        }
    }

    states.insert(id, Visit::OnStack);
    for parent in node.parents() {
        visit(graph, parent, states)?;
    }
    states.insert(id, Visit::Checked);
    Ok(())
}
