//! JSON interchange format for weighted graphs.
//!
//! A document lists vertices (optionally with attribute rows) and either an edge list or a dense
//! distance matrix whose rows follow the vertex order. `null` matrix entries mean "no edge".

use serde::{Deserialize, Serialize};

use crate::access::GraphAccess;
use crate::error::{GraphError, Result};
use crate::weighted::WeightedGraph;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    #[serde(default)]
    pub vertices: Vec<VertexDocument>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl GraphDocument {
    pub fn into_graph(self) -> Result<WeightedGraph> {
        let mut g = WeightedGraph::new();
        for v in self.vertices {
            if g.vertex_id(&v.id).is_some() {
                return Err(GraphError::DuplicateVertex { id: v.id });
            }
            if v.attributes.is_empty() {
                g.add_vertex(v.id);
            } else {
                g.add_vertex_with_attributes(v.id, v.attributes);
            }
        }

        if let Some(matrix) = &self.matrix {
            let n = g.vertex_count();
            if matrix.len() != n {
                return Err(GraphError::MatrixRows {
                    rows: matrix.len(),
                    expected: n,
                });
            }
            for (i, row) in matrix.iter().enumerate() {
                if row.len() != n {
                    return Err(GraphError::MatrixShape {
                        row: i,
                        len: row.len(),
                        expected: n,
                    });
                }
                for (j, w) in row.iter().enumerate().skip(i + 1) {
                    let Some(w) = *w else {
                        continue;
                    };
                    check_weight(&g, i, j, w)?;
                    g.set_weight(i, j, w);
                }
            }
        }

        for e in self.edges {
            let (Some(a), Some(b)) = (g.vertex_id(&e.source), g.vertex_id(&e.target)) else {
                return Err(GraphError::UnknownEndpoint {
                    source_id: e.source,
                    target_id: e.target,
                });
            };
            check_weight(&g, a, b, e.weight)?;
            g.set_weight(a, b, e.weight);
        }

        Ok(g)
    }

    pub fn from_graph(g: &WeightedGraph) -> Self {
        let vertices = g
            .vertices()
            .into_iter()
            .map(|v| VertexDocument {
                id: g.label(v).unwrap_or_default().to_string(),
                attributes: g.attributes(v).map(<[f64]>::to_vec).unwrap_or_default(),
            })
            .collect();
        let edges = g
            .edges()
            .into_iter()
            .map(|(a, b, weight)| EdgeDocument {
                source: g.label(a).unwrap_or_default().to_string(),
                target: g.label(b).unwrap_or_default().to_string(),
                weight,
            })
            .collect();
        Self {
            vertices,
            edges,
            matrix: None,
        }
    }
}

fn check_weight(g: &WeightedGraph, a: usize, b: usize, weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        return Ok(());
    }
    Err(GraphError::InvalidWeight {
        source_id: g.label(a).unwrap_or_default().to_string(),
        target_id: g.label(b).unwrap_or_default().to_string(),
        weight,
    })
}
