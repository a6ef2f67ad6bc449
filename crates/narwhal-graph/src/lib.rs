#![forbid(unsafe_code)]

//! Edge-weighted, undirected graph storage consumed by `narwhal`.
//!
//! The projection engines never touch a concrete container; they go through [`GraphAccess`].
//! [`WeightedGraph`] is the arena-backed implementation used by the CLI and the tests, and
//! [`GraphDocument`] is its JSON interchange form.

mod access;
pub mod document;
mod error;
mod weighted;

pub use access::{GraphAccess, VertexId};
pub use document::{EdgeDocument, GraphDocument, VertexDocument};
pub use error::{GraphError, Result};
pub use weighted::WeightedGraph;
