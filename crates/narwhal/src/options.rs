use narwhal_graph::{GraphAccess, VertexId};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_ITERATIONS: usize = 10;

/// Output dimensionality of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    /// Triangular projection into the plane.
    #[default]
    Triangular,
    /// Polyhedral projection into `dimensions` axes (3 for a spatial projection).
    Polyhedral { dimensions: usize },
}

impl ProjectionKind {
    pub fn spatial() -> Self {
        Self::Polyhedral { dimensions: 3 }
    }

    pub fn dimensions(self) -> usize {
        match self {
            Self::Triangular => 2,
            Self::Polyhedral { dimensions } => dimensions,
        }
    }
}

/// How lambda shrinks after each refinement pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LambdaDecay {
    /// `lambda *= 1 - iteration / number_of_iterations`.
    Linear,
    /// `lambda *= factor`, clamped on the last pass to `initial / number_of_iterations`.
    Geometric(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOptions {
    pub initial_lambda: f64,
    pub decay: LambdaDecay,
    /// Refinement stops once lambda drops below this value.
    pub negligible_lambda: f64,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            initial_lambda: 0.5,
            decay: LambdaDecay::Linear,
            negligible_lambda: 1e-6,
        }
    }
}

/// Which already-placed vertices a new vertex is triangulated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotPolicy {
    /// Tree ancestors first, then the nearest placed vertices.
    Tree,
    /// Boundary facet minimizing the summed distances to the new vertex.
    MinimumPerimeter,
    /// Boundary facet minimizing the area (hypervolume) of the resulting simplex.
    MinimumArea,
}

/// Parameters of one projection invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOptions {
    pub start: VertexId,
    /// Stops spanning tree growth once this vertex joins the tree.
    pub finish: Option<VertexId>,
    /// Runs the geometric coordinatizer before placement.
    pub reorder: bool,
    pub kind: ProjectionKind,
    /// Attribute columns used to derive weights. Empty means "use stored graph weights".
    pub dimension_columns: Vec<usize>,
    pub minimum_area: bool,
    pub minimum_perimeter: bool,
    /// Resolves flips by comparing candidate distances against known ones.
    pub minimum_distance: bool,
    pub map_nnc: bool,
    pub map_emanating_edges: bool,
    pub number_of_iterations: usize,
    /// A boundary facet stays eligible while it has been used fewer times than this.
    pub boundary_use_limit: u8,
    pub refinement: RefinementOptions,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            start: 0,
            finish: None,
            reorder: false,
            kind: ProjectionKind::Triangular,
            dimension_columns: Vec::new(),
            minimum_area: false,
            minimum_perimeter: false,
            minimum_distance: true,
            map_nnc: false,
            map_emanating_edges: false,
            number_of_iterations: DEFAULT_ITERATIONS,
            boundary_use_limit: 2,
            refinement: RefinementOptions::default(),
        }
    }
}

impl ProjectionOptions {
    pub fn triangular(start: VertexId) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn polyhedral(start: VertexId, dimensions: usize) -> Self {
        Self {
            start,
            kind: ProjectionKind::Polyhedral { dimensions },
            ..Default::default()
        }
    }

    pub fn dimensions(&self) -> usize {
        self.kind.dimensions()
    }

    pub fn pivot_policy(&self) -> PivotPolicy {
        if self.minimum_area {
            PivotPolicy::MinimumArea
        } else if self.minimum_perimeter {
            PivotPolicy::MinimumPerimeter
        } else {
            PivotPolicy::Tree
        }
    }

    /// Checks the options on their own and against `graph`.
    pub fn validate<G: GraphAccess + ?Sized>(&self, graph: &G) -> Result<()> {
        self.validate_standalone()?;
        let limit = graph.vertex_count().max(2);
        if self.dimensions() > limit {
            return Err(Error::invalid(
                "numberOfDimensions",
                format!(
                    "must be at most {limit} for a graph of {} vertices, got {}",
                    graph.vertex_count(),
                    self.dimensions()
                ),
            ));
        }
        if !graph.contains(self.start) {
            return Err(Error::UnknownVertex { vertex: self.start });
        }
        if let Some(finish) = self.finish {
            if !graph.contains(finish) {
                return Err(Error::UnknownVertex { vertex: finish });
            }
        }
        self.validate_columns(graph)
    }

    /// Checks that need no graph.
    pub(crate) fn validate_standalone(&self) -> Result<()> {
        if self.dimensions() < 2 {
            return Err(Error::invalid(
                "numberOfDimensions",
                format!("must be at least 2, got {}", self.dimensions()),
            ));
        }
        if self.boundary_use_limit == 0 {
            return Err(Error::invalid("boundaryUseLimit", "must be at least 1"));
        }
        let mut columns = self.dimension_columns.clone();
        columns.sort_unstable();
        if columns.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::invalid("dimensions", "column indices must be unique"));
        }
        self.validate_refinement()
    }

    fn validate_refinement(&self) -> Result<()> {
        let r = &self.refinement;
        if !(r.initial_lambda > 0.0 && r.initial_lambda <= 1.0) {
            return Err(Error::invalid(
                "lambda",
                format!("must lie in (0, 1], got {}", r.initial_lambda),
            ));
        }
        if !(r.negligible_lambda.is_finite() && r.negligible_lambda >= 0.0) {
            return Err(Error::invalid(
                "negligibleLambda",
                format!("must be finite and non-negative, got {}", r.negligible_lambda),
            ));
        }
        if let LambdaDecay::Geometric(factor) = r.decay {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(Error::invalid(
                    "lambdaDecay",
                    format!("geometric factor must lie in (0, 1], got {factor}"),
                ));
            }
        }
        Ok(())
    }

    fn validate_columns<G: GraphAccess + ?Sized>(&self, graph: &G) -> Result<()> {
        if self.dimension_columns.is_empty() {
            return Ok(());
        }
        let Some(&max_col) = self.dimension_columns.iter().max() else {
            return Ok(());
        };

        let mut any_rows = false;
        for v in graph.vertices() {
            let Some(row) = graph.attributes(v) else {
                continue;
            };
            any_rows = true;
            if max_col >= row.len() {
                return Err(Error::invalid(
                    "dimensions",
                    format!(
                        "column {max_col} is out of range for vertex {v} ({} attributes)",
                        row.len()
                    ),
                ));
            }
        }
        if !any_rows {
            return Err(Error::invalid(
                "dimensions",
                "column selection given but no vertex carries attributes",
            ));
        }
        Ok(())
    }
}
