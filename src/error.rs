//! Errors raised while building, validating and flattening machine graphs

use crate::models::ItemId;
use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("input node [{item}] cannot have parents")]
    InputCannotHaveParent { item: ItemId },

    #[error("incompatible ingredient [{offered}] for [{item}], expected [{}]", join(.expected))]
    IncompatibleIngredient {
        item: ItemId,
        offered: ItemId,
        expected: Vec<ItemId>,
    },

    #[error("producer [{item}] already accepts [{ingredient}]")]
    DuplicateIngredient { item: ItemId, ingredient: ItemId },

    #[error("output node [{item}] has no parent")]
    OutputMissingParent { item: ItemId },

    #[error("producer [{item}] is missing ingredient [{ingredient}]")]
    MissingIngredient { item: ItemId, ingredient: ItemId },

    #[error("unknown item [{0}]")]
    UnknownItem(ItemId),

    #[error("recipe for [{item}] references unknown ingredient [{ingredient}]")]
    UnknownIngredient { item: ItemId, ingredient: ItemId },

    #[error("node not found: {0:?}")]
    UnknownNode(NodeId),

    #[error("cyclic recipe for [{item}]: {}", chain_path(.chain))]
    CyclicRecipe { item: ItemId, chain: Vec<ItemId> },

    #[error("cycle detected in machine graph at [{0}]")]
    CycleDetected(ItemId),
}

pub type Result<T> = std::result::Result<T, GraphError>;

fn join(items: &[ItemId]) -> String {
    items
        .iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn chain_path(items: &[ItemId]) -> String {
    items
        .iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
