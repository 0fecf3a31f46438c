//! Machine nodes and the arena that owns them
//!
//! A machine graph is a set of nodes linked child -> parent, where a parent
//! supplies one ingredient of its child. Nodes live in a [`MachineGraph`]
//! arena and refer to each other by [`NodeId`], so a shared parent is simply
//! a key that several children hold.

use std::sync::Arc;

use indexmap::IndexMap;
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::catalog::RecipeCatalog;
use crate::error::{GraphError, Result};
use crate::models::{ItemId, ItemInfo};

slotmap::new_key_type! {
    /// Identity of a node inside a [`MachineGraph`].
    pub struct NodeId;
}

/// Ingredient item -> the node supplying it. At most one supplier per item.
pub type Parents = IndexMap<ItemId, NodeId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Raw material leaf
    Input,
    /// Manufacturing step
    Producer,
    /// Requested end product
    Output,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Producer => "producer",
            NodeKind::Output => "output",
        }
    }
}

/// A raw resource. Never has parents.
#[derive(Debug, Clone)]
pub struct InputNode {
    output: ItemId,
}

impl InputNode {
    fn set_parent(&mut self, _offered: &ItemId, _parent: NodeId) -> Result<()> {
        Err(GraphError::InputCannotHaveParent {
            item: self.output.clone(),
        })
    }
}

/// A manufacturing step consuming the ingredients of its recipe.
#[derive(Debug, Clone)]
pub struct ProducerNode {
    output: ItemId,
    info: Arc<ItemInfo>,
    parents: Parents,
}

impl ProducerNode {
    pub fn info(&self) -> &ItemInfo {
        &self.info
    }

    /// Recipe ingredients that have no supplier yet
    pub fn missing_ingredients(&self) -> impl Iterator<Item = &ItemId> {
        self.info
            .ingredients()
            .filter(|ing| !self.parents.contains_key(*ing))
    }

    fn set_parent(&mut self, offered: &ItemId, parent: NodeId) -> Result<()> {
        if !self.info.recipe.contains_key(offered) {
            return Err(GraphError::IncompatibleIngredient {
                item: self.output.clone(),
                offered: offered.clone(),
                expected: self.info.ingredients().cloned().collect(),
            });
        }
        if self.parents.contains_key(offered) {
            return Err(GraphError::DuplicateIngredient {
                item: self.output.clone(),
                ingredient: offered.clone(),
            });
        }
        self.parents.insert(offered.clone(), parent);
        Ok(())
    }
}

/// Terminal sink for a requested item. Accepts one parent making that same item.
#[derive(Debug, Clone)]
pub struct OutputNode {
    output: ItemId,
    parents: Parents,
}

impl OutputNode {
    /// The node currently supplying this output, if any
    pub fn source(&self) -> Option<NodeId> {
        self.parents.get(&self.output).copied()
    }

    fn set_parent(&mut self, offered: &ItemId, parent: NodeId) -> Result<()> {
        if *offered != self.output {
            return Err(GraphError::IncompatibleIngredient {
                item: self.output.clone(),
                offered: offered.clone(),
                expected: vec![self.output.clone()],
            });
        }
        if self.parents.contains_key(offered) {
            warn!(item = %self.output, "output node input is being replaced");
        }
        self.parents.insert(offered.clone(), parent);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum MachineNode {
    Input(InputNode),
    Producer(ProducerNode),
    Output(OutputNode),
}

impl MachineNode {
    /// The item this node produces or represents
    pub fn output(&self) -> &ItemId {
        match self {
            MachineNode::Input(n) => &n.output,
            MachineNode::Producer(n) => &n.output,
            MachineNode::Output(n) => &n.output,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            MachineNode::Input(_) => NodeKind::Input,
            MachineNode::Producer(_) => NodeKind::Producer,
            MachineNode::Output(_) => NodeKind::Output,
        }
    }

    /// Parent links, `None` for input nodes which cannot have any
    pub fn parent_map(&self) -> Option<&Parents> {
        match self {
            MachineNode::Input(_) => None,
            MachineNode::Producer(n) => Some(&n.parents),
            MachineNode::Output(n) => Some(&n.parents),
        }
    }

    /// Parent nodes in insertion order
    pub fn parents(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parent_map()
            .into_iter()
            .flat_map(|parents| parents.values().copied())
    }

    pub fn parent_count(&self) -> usize {
        self.parent_map().map_or(0, IndexMap::len)
    }

    fn set_parent(&mut self, offered: &ItemId, parent: NodeId) -> Result<()> {
        match self {
            MachineNode::Input(n) => n.set_parent(offered, parent),
            MachineNode::Producer(n) => n.set_parent(offered, parent),
            MachineNode::Output(n) => n.set_parent(offered, parent),
        }
    }
}

/// Arena owning every node of one or more machine graphs
#[derive(Debug, Clone, Default)]
pub struct MachineGraph {
    nodes: SlotMap<NodeId, MachineNode>,
}

impl MachineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create_input(&mut self, catalog: &RecipeCatalog, item: &ItemId) -> Result<NodeId> {
        catalog.info(item)?;
        let id = self.nodes.insert(MachineNode::Input(InputNode {
            output: item.clone(),
        }));
        debug!(%item, ?id, "created input node");
        Ok(id)
    }

    pub fn create_producer(&mut self, catalog: &RecipeCatalog, item: &ItemId) -> Result<NodeId> {
        let info = Arc::clone(catalog.info(item)?);
        let id = self.nodes.insert(MachineNode::Producer(ProducerNode {
            output: item.clone(),
            info,
            parents: Parents::new(),
        }));
        debug!(%item, ?id, "created producer node");
        Ok(id)
    }

    pub fn create_output(&mut self, catalog: &RecipeCatalog, item: &ItemId) -> Result<NodeId> {
        catalog.info(item)?;
        let id = self.nodes.insert(MachineNode::Output(OutputNode {
            output: item.clone(),
            parents: Parents::new(),
        }));
        debug!(%item, ?id, "created output node");
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&MachineNode> {
        self.nodes.get(id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn output(&self, id: NodeId) -> Result<&ItemId> {
        self.node(id).map(MachineNode::output)
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        self.node(id).map(MachineNode::kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MachineNode)> {
        self.nodes.iter()
    }

    /// Link `parent` as the supplier of one of `node`'s ingredients.
    ///
    /// A node cannot supply itself. On error the node is left untouched.
    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let offered = self.output(parent)?.clone();
        let child = self
            .nodes
            .get_mut(node)
            .ok_or(GraphError::UnknownNode(node))?;
        if node == parent && !matches!(child, MachineNode::Input(_)) {
            return Err(GraphError::CycleDetected(offered));
        }
        child.set_parent(&offered, parent)
    }

    /// Apply [`set_parent`](Self::set_parent) for each parent in order,
    /// stopping at the first failure. Links made before the failure remain.
    pub fn set_parents(&mut self, node: NodeId, parents: &[NodeId]) -> Result<()> {
        for &parent in parents {
            self.set_parent(node, parent)?;
        }
        Ok(())
    }
}
