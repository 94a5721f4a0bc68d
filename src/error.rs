use thiserror::Error;

/// Failures raised by the analysis core.
///
/// Data-quality conditions (`MissingInputData`, `InsufficientTrainingData`)
/// are absorbed by the pipeline and logged; `ModelNotTrained` and
/// `MissingFeature` are contract violations surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("missing input data: {0}")]
    MissingInputData(String),

    #[error("insufficient training data: need at least {required} valid rows, got {actual}")]
    InsufficientTrainingData { required: usize, actual: usize },

    #[error("model must be trained before prediction")]
    ModelNotTrained,

    #[error("missing feature '{0}' in prediction input")]
    MissingFeature(String),

    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
