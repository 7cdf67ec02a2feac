use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Library error type
// ---------------------------------------------------------------------------

/// Everything that can go wrong between reading a particle file and writing
/// the figure.
#[derive(Debug, Error)]
pub enum DstError {
    /// Binary `.dst` files are recognised but not supported.
    #[error("reading binary .dst files is not implemented: {}", .0.display())]
    BinaryNotImplemented(PathBuf),

    #[error("extension {ext:?} not understood in {}", .path.display())]
    UnknownExtension { path: PathBuf, ext: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    #[error("invalid bins: {0}")]
    InvalidBins(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// `range = as_plot_limits` was requested on a panel lacking xlim or ylim.
    #[error("panel '{0}' bins over its plot limits but xlim/ylim is not set")]
    MissingPlotLimits(String),

    #[error("invalid plot option '{key}': {message}")]
    InvalidOption { key: String, message: String },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("rendering failed: {0}")]
    Render(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for DstError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        DstError::Render(err.to_string())
    }
}

impl From<image::ImageError> for DstError {
    fn from(err: image::ImageError) -> Self {
        DstError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DstError>;

impl DstError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DstError::Io {
            path: path.into(),
            source,
        }
    }
}
