use thiserror::Error;

use crate::dom::document::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    /// Handle does not belong to this document
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Node has been removed from the document
    #[error("Node {0:?} is detached from the document")]
    Detached(NodeId),

    /// A property setter threw
    #[error("Setting value on {node:?} was rejected: {reason}")]
    ValueRejected { node: NodeId, reason: String },

    /// Tree operation would create a cycle
    #[error("Cannot append {child:?} to {parent:?}: {reason}")]
    Hierarchy {
        parent: NodeId,
        child: NodeId,
        reason: String,
    },
}
