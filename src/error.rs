//! Error types for the compositor.
//!
//! Painting itself never fails: a missing or mismatched page bitmap degrades to a
//! placeholder or a rescale. The errors below come from the construction-time
//! surfaces of the crate (configuration, assets, destination surfaces).

/// Result type alias for compositor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while setting up a paint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration value outside its accepted range
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed
    #[error("Failed to parse render configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoded asset (icon, stamp) could not be decoded
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// A raster of the requested size could not be allocated
    #[error("Failed to allocate surface {width}x{height}")]
    SurfaceAllocation {
        /// Requested width in device pixels
        width: u32,
        /// Requested height in device pixels
        height: u32,
    },

    /// Asset name was never registered
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),
}
