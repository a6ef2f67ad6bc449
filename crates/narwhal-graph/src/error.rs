#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate vertex id: {id}")]
    DuplicateVertex { id: String },

    #[error("edge {source_id} -> {target_id} references an unknown vertex")]
    UnknownEndpoint { source_id: String, target_id: String },

    #[error("edge {source_id} -> {target_id} has an invalid weight: {weight}")]
    InvalidWeight {
        source_id: String,
        target_id: String,
        weight: f64,
    },

    #[error("distance matrix has {rows} rows, expected {expected}")]
    MatrixRows { rows: usize, expected: usize },

    #[error("distance matrix row {row} has {len} entries, expected {expected}")]
    MatrixShape {
        row: usize,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, GraphError>;
