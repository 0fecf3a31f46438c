//! Production dependency graphs for factory crafting chains.
//!
//! Given a target item, the [`generator`] resolves its recipe chain against a
//! [`RecipeCatalog`] into a [`MachineGraph`], sharing every intermediate
//! product between the branches that need it. The [`validator`] checks the
//! result is recipe-complete and the [`converter`] flattens it into leveled
//! nodes and edges for layout.

pub mod catalog;
pub mod converter;
pub mod db;
pub mod error;
pub mod extract;
pub mod generator;
pub mod layout;
pub mod models;
pub mod node;
pub mod report;
pub mod validator;

pub use catalog::RecipeCatalog;
pub use converter::{Graph, GraphEdge, GraphNode, convert_graph};
pub use error::{GraphError, Result};
pub use generator::generate_graph;
pub use models::{ItemId, ItemInfo, Recipe};
pub use node::{MachineGraph, MachineNode, NodeId, NodeKind};
pub use validator::validate_graph;
