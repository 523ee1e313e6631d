//! Errors raised by scene graph editing

use thiserror::Error;

use crate::foundation::collections::NodeId;

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not refer to a live node
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Children were added to a node that cannot hold any
    #[error("Node {0:?} cannot have children")]
    NotAGroup(NodeId),

    /// The edit would make a node its own ancestor
    #[error("Adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Intended parent
        parent: NodeId,
        /// Intended child
        child: NodeId,
    },

    /// Node name already taken
    #[error("Duplicate node name: {0}")]
    DuplicateName(String),
}

/// Result alias for scene graph edits
pub type SceneResult<T> = Result<T, SceneError>;
