use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error(
        "Device allocation of {requested} bytes failed: {in_use} of {limit} bytes already in use"
    )]
    Allocation {
        requested: usize,
        limit: usize,
        in_use: usize,
    },

    #[error("Transfer of {len} elements exceeds buffer capacity of {capacity}")]
    OutOfBounds { len: usize, capacity: usize },

    #[error("Kernel launch failed: {0}")]
    Launch(String),

    #[error("Device driver error: {0}")]
    Driver(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Device operation failed: {source}")]
    Device {
        #[from]
        source: DeviceError,
    },

    #[error("Exactly one ligand is supported, found {found}")]
    LigandCount { found: usize },

    #[error("Length mismatch in {operation}: expected {expected}, found {found}")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Matrix dimension {found} does not match vector length {expected}")]
    MatrixDimension { expected: usize, found: usize },
}
