//! Error types for the fallible (I/O-bound) parts of the engine.
//!
//! Geometry and lifecycle problems are not errors here: they surface as
//! `Option`/`bool` results or logged no-ops. Only bitmap and font I/O report
//! failures, always with the underlying cause attached.

use std::path::PathBuf;

/// Failure while encoding, decoding or persisting a surface bitmap.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface has been destroyed")]
    Destroyed,

    #[error("i/o failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("png encoding failed")]
    Encode(#[source] image::ImageError),

    #[error("png decoding failed")]
    Decode(#[source] image::ImageError),

    #[error("decoded bitmap has unusable dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Failure while loading a font into a [`FontRegistry`](crate::text::FontRegistry).
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font data rejected: {0}")]
    Parse(String),

    #[error("i/o failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
