//! Error types for stagelink-host.

use crate::graph::NodeHandle;
use thiserror::Error;

/// Result type for host graph operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors reported by a host graph.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    /// The handle does not name a node.
    #[error("unknown node {0}")]
    UnknownNode(NodeHandle),

    /// The node has been deleted.
    #[error("node {0} is deleted")]
    DeadNode(NodeHandle),

    /// The node has no plug with this name.
    #[error("node '{node}' has no plug '{plug}'")]
    PlugNotFound {
        /// Node name.
        node: String,
        /// Plug name.
        plug: String,
    },

    /// A plug with this name already exists.
    #[error("node '{node}' already has a plug '{plug}'")]
    PlugExists {
        /// Node name.
        node: String,
        /// Plug name.
        plug: String,
    },

    /// The value does not fit the plug's type.
    #[error("plug '{plug}' of type {expected} cannot hold a {found} value")]
    TypeMismatch {
        /// Plug name.
        plug: String,
        /// The plug's declared type.
        expected: String,
        /// The value's kind.
        found: &'static str,
    },

    /// A parent must be a live DAG node.
    #[error("node {0} cannot be a parent")]
    InvalidParent(NodeHandle),

    /// The node is not an animation curve.
    #[error("node {0} is not an anim curve")]
    NotAnimCurve(NodeHandle),

    /// The node is not a set.
    #[error("node {0} is not a set")]
    NotASet(NodeHandle),

    /// The plug has no such scalar channel.
    #[error("plug '{plug}' has no channel {channel}")]
    ChannelOutOfRange {
        /// Plug name.
        plug: String,
        /// Requested channel.
        channel: usize,
    },

    /// The curve already drives this plug channel.
    #[error("plug '{plug}' channel {channel} is already animated")]
    AlreadyAnimated {
        /// Plug name.
        plug: String,
        /// Channel index.
        channel: usize,
    },
}

impl HostError {
    /// Create a plug-not-found error.
    pub fn plug_not_found(node: impl Into<String>, plug: impl Into<String>) -> Self {
        Self::PlugNotFound {
            node: node.into(),
            plug: plug.into(),
        }
    }
}
