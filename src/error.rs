use thiserror::Error;

/// Result type alias for gasket operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Shape parameters violate the radius ordering, sum or phase constraints
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Descartes relation puts a larger circle than the two given radii
    #[error("Radii given are not the largest circles.")]
    RadiiNotLargest,

    #[error("Mobius matrix is singular.")]
    SingularTransform,

    /// A required builder section was never supplied
    #[error("{0} not initialized")]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Square root of negative value: {0}")]
    NegativeSquareRoot(String),

    #[error("Not a perfect square: {0}")]
    NotPerfectSquare(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// Evaluation at the pole of a transform, where cz + d = 0
    #[error("Transform evaluated at its pole")]
    PoleEvaluation,

    #[error("Scale step {step} outside lookup range [0, {max}]")]
    StepOutOfRange { step: u32, max: u32 },

    /// Logscale before the first or at/after the last key gasket
    #[error("Logscale {0} outside the key gasket span")]
    OutsideKeySpan(f64),

    /// At least one search task failed; the shared map holds the others' results
    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}
