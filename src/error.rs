use std::path::PathBuf;
use thiserror::Error;

/// Rejections raised while ingesting detector output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 points, got {0}")]
    DegeneratePolygon(usize),

    #[error("polygon point {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("{polygons} polygons but {texts} texts")]
    LengthMismatch { polygons: usize, texts: usize },
}

/// The font resource backing a render plan could not be used.
#[derive(Error, Debug)]
pub enum FontLoadError {
    #[error("failed to read font: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(String),
}
