use std::path::PathBuf;

/// Errors produced by the plotting helpers.
///
/// Every variant is terminal for the call that produced it: nothing is
/// retried and no partial plot or file is left behind on input errors.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// The input could not be turned into a numeric array, or its shape does
    /// not suit the requested mode.
    #[error("unsupported input: {found}")]
    InputType { found: String },

    /// The scalar field failed, or returned an array of the wrong shape.
    #[error("scalar field evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The drawing backend reported an error.
    #[error("rendering failed: {0}")]
    Render(String),

    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl PlotError {
    pub(crate) fn input_type(found: impl Into<String>) -> Self {
        PlotError::InputType {
            found: found.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        PlotError::Configuration(message.into())
    }

    /// Plotters errors are generic over the backend, so they are flattened
    /// to their message here.
    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        PlotError::Render(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("{0}")]
    Field(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("field returned shape {returned:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        returned: Vec<usize>,
    },
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PlotError::render(err)
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
