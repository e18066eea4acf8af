use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DopError {
    #[error("at least 4 satellites required, got {found}")]
    InsufficientSatellites { found: usize },
    #[error("satellite {index} coincides with the receiver")]
    CoincidentPosition { index: usize },
    #[error("geometry matrix is singular, DOP undefined")]
    SingularGeometry,
}
