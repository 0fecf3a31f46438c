//! Recipe resolution into a shared machine graph
//!
//! Every requested item gets its own output node. Intermediate products and
//! raw inputs are memoized per generation call, so an item needed by several
//! branches is built once and becomes a parent of each consumer.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::RecipeCatalog;
use crate::error::{GraphError, Result};
use crate::models::{ItemId, ItemInfo};
use crate::node::{MachineGraph, NodeId};

/// Build output nodes for `targets`, in order, inside `graph`.
pub fn generate_graph(
    catalog: &RecipeCatalog,
    graph: &mut MachineGraph,
    targets: &[ItemId],
) -> Result<Vec<NodeId>> {
    GraphGenerator::new(catalog, graph).generate(targets)
}

pub struct GraphGenerator<'a> {
    catalog: &'a RecipeCatalog,
    graph: &'a mut MachineGraph,
    producers: HashMap<ItemId, NodeId>,
    inputs: HashMap<ItemId, NodeId>,
    /// Producers whose ingredients are still being resolved, outermost first
    resolving: Vec<ItemId>,
}

impl<'a> GraphGenerator<'a> {
    pub fn new(catalog: &'a RecipeCatalog, graph: &'a mut MachineGraph) -> Self {
        Self {
            catalog,
            graph,
            producers: HashMap::new(),
            inputs: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    pub fn generate(&mut self, targets: &[ItemId]) -> Result<Vec<NodeId>> {
        let mut outputs = Vec::with_capacity(targets.len());
        for target in targets {
            let output = self.graph.create_output(self.catalog, target)?;
            let source = self.resolve(target)?;
            self.graph.set_parent(output, source)?;
            outputs.push(output);
        }

        info!(
            targets = targets.len(),
            producers = self.producers.len(),
            inputs = self.inputs.len(),
            "generated machine graph"
        );
        Ok(outputs)
    }

    /// Return the node supplying `item`, building it and its ingredients on first use.
    pub fn resolve(&mut self, item: &ItemId) -> Result<NodeId> {
        let info = Arc::clone(self.catalog.info(item)?);

        if info.is_raw() {
            if let Some(&id) = self.inputs.get(item) {
                return Ok(id);
            }
            let id = self.graph.create_input(self.catalog, item)?;
            self.inputs.insert(item.clone(), id);
            return Ok(id);
        }

        if let Some(&id) = self.producers.get(item) {
            if let Some(start) = self.resolving.iter().position(|i| i == item) {
                let mut chain = self.resolving[start..].to_vec();
                chain.push(item.clone());
                return Err(GraphError::CyclicRecipe {
                    item: item.clone(),
                    chain,
                });
            }
            debug!(%item, "sharing producer");
            return Ok(id);
        }

        // Memoize before recursing so the node is discoverable while its own
        // ingredients are resolved.
        let id = self.graph.create_producer(self.catalog, item)?;
        self.producers.insert(item.clone(), id);

        self.resolving.push(item.clone());
        let linked = self.link_ingredients(id, &info);
        self.resolving.pop();
        linked?;

        Ok(id)
    }

    fn link_ingredients(&mut self, producer: NodeId, info: &ItemInfo) -> Result<()> {
        for ingredient in info.ingredients() {
            let parent = self.resolve(ingredient)?;
            self.graph.set_parent(producer, parent)?;
        }
        Ok(())
    }
}
