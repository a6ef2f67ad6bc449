use narwhal_graph::VertexId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("vertex {unreachable} is not reachable from start vertex {start}")]
    DisconnectedGraph {
        start: VertexId,
        unreachable: VertexId,
    },

    #[error("cannot place vertex {vertex}: {reason}")]
    DegenerateTriangulation { vertex: VertexId, reason: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("graph has no vertex {vertex}")]
    UnknownVertex { vertex: VertexId },

    #[error("projection was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn degenerate(vertex: VertexId, reason: impl Into<String>) -> Self {
        Self::DegenerateTriangulation {
            vertex,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
