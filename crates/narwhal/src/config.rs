//! Host-facing, serde-friendly projection configuration.
//!
//! Hosts hand us loosely typed values (JSON files, CLI flags). [`ProjectionConfig`] accepts them
//! as-is and [`ProjectionOptions::try_from`] rejects anything out of range with
//! [`Error::InvalidParameter`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::{
    DEFAULT_ITERATIONS, LambdaDecay, ProjectionKind, ProjectionOptions, RefinementOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    #[default]
    #[serde(rename = "2d")]
    TwoDimensional,
    #[serde(rename = "3d")]
    ThreeDimensional,
    #[serde(rename = "nd")]
    NDimensional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionConfig {
    pub start: i64,
    pub finish: Option<i64>,
    pub reorder: bool,
    pub projection_type: ProjectionType,
    pub number_of_dimensions: Option<i64>,
    /// Attribute column indices.
    pub dimensions: Vec<i64>,
    pub minimum_area: bool,
    pub minimum_perimeter: bool,
    pub minimum_distance: bool,
    #[serde(rename = "mapNNC")]
    pub map_nnc: bool,
    pub map_emanating_edges: bool,
    pub number_of_iterations: i64,
    pub boundary_use_limit: i64,
    pub lambda: f64,
    pub lambda_decay: LambdaDecay,
    pub negligible_lambda: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let refinement = RefinementOptions::default();
        Self {
            start: 0,
            finish: None,
            reorder: false,
            projection_type: ProjectionType::TwoDimensional,
            number_of_dimensions: None,
            dimensions: Vec::new(),
            minimum_area: false,
            minimum_perimeter: false,
            minimum_distance: true,
            map_nnc: false,
            map_emanating_edges: false,
            number_of_iterations: DEFAULT_ITERATIONS as i64,
            boundary_use_limit: 2,
            lambda: refinement.initial_lambda,
            lambda_decay: refinement.decay,
            negligible_lambda: refinement.negligible_lambda,
        }
    }
}

impl ProjectionConfig {
    fn kind(&self) -> Result<ProjectionKind> {
        let requested = self
            .number_of_dimensions
            .map(|n| non_negative("numberOfDimensions", n))
            .transpose()?;
        match (self.projection_type, requested) {
            (ProjectionType::TwoDimensional, None | Some(2)) => Ok(ProjectionKind::Triangular),
            (ProjectionType::ThreeDimensional, None | Some(3)) => Ok(ProjectionKind::spatial()),
            (ProjectionType::NDimensional, Some(n)) if n >= 2 => {
                Ok(ProjectionKind::Polyhedral { dimensions: n })
            }
            (ProjectionType::NDimensional, Some(n)) => Err(Error::invalid(
                "numberOfDimensions",
                format!("must be at least 2, got {n}"),
            )),
            (ProjectionType::NDimensional, None) => Err(Error::invalid(
                "numberOfDimensions",
                "required for an N-dimensional projection",
            )),
            (kind, Some(n)) => Err(Error::invalid(
                "numberOfDimensions",
                format!("{n} does not match projection type {kind:?}"),
            )),
        }
    }
}

impl TryFrom<ProjectionConfig> for ProjectionOptions {
    type Error = Error;

    fn try_from(cfg: ProjectionConfig) -> Result<Self> {
        let kind = cfg.kind()?;
        let start = non_negative("start", cfg.start)?;
        let finish = cfg
            .finish
            .map(|f| non_negative("finish", f))
            .transpose()?;
        let dimension_columns = cfg
            .dimensions
            .iter()
            .map(|&c| non_negative("dimensions", c))
            .collect::<Result<Vec<_>>>()?;
        let number_of_iterations = non_negative("numberOfIterations", cfg.number_of_iterations)?;
        let boundary_use_limit = u8::try_from(cfg.boundary_use_limit)
            .ok()
            .filter(|&n| n >= 1)
            .ok_or_else(|| {
                Error::invalid(
                    "boundaryUseLimit",
                    format!("must lie in 1..=255, got {}", cfg.boundary_use_limit),
                )
            })?;

        let options = ProjectionOptions {
            start,
            finish,
            reorder: cfg.reorder,
            kind,
            dimension_columns,
            minimum_area: cfg.minimum_area,
            minimum_perimeter: cfg.minimum_perimeter,
            minimum_distance: cfg.minimum_distance,
            map_nnc: cfg.map_nnc,
            map_emanating_edges: cfg.map_emanating_edges,
            number_of_iterations,
            boundary_use_limit,
            refinement: RefinementOptions {
                initial_lambda: cfg.lambda,
                decay: cfg.lambda_decay,
                negligible_lambda: cfg.negligible_lambda,
            },
        };
        options.validate_standalone()?;
        Ok(options)
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::invalid(name, format!("must be non-negative, got {value}")))
}
