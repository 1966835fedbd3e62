use crate::coordinate::CoordinateSpace;
use reqwest::StatusCode;
use thiserror::Error;

/// Error returned by render-ws operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Configuration is missing a value or holds an unparseable one.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL assembled from the configuration and path segments is not valid.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("render-ws responded with {status}: {body}")]
    Status {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },

    /// The service answered with a body that is not the expected JSON.
    #[error("render-ws returned a non-JSON response ({source}): {body}")]
    NonJsonResponse {
        /// Raw response body.
        body: String,
        /// Decoder error.
        source: serde_json::Error,
    },

    /// JSON encoding or decoding outside of an HTTP response failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Point arrays must have exactly two columns.
    #[error("Expected an (n, 2) point array, got shape {rows}x{cols}")]
    InvalidShape {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Points sent to the service must have finite coordinates.
    #[error("Point {index} has non-finite coordinates")]
    NonFinitePoint {
        /// Row of the point in the input array.
        index: usize,
    },

    /// The response does not have one record per requested point.
    #[error("Expected {expected} coordinate records, got {actual}")]
    CountMismatch {
        /// Number of points sent.
        expected: usize,
        /// Number of records received.
        actual: usize,
    },

    /// A response record lacks the coordinates for the requested space.
    #[error("Record {index} has no {space} coordinates")]
    MissingCoordinates {
        /// Position of the record in the response.
        index: usize,
        /// Coordinate space that was expected.
        space: CoordinateSpace,
    },

    /// None of the candidate matches for a point belong to the queried tile.
    #[error("No match for tile {tile_id} at point {index}")]
    NoTileMatch {
        /// Position of the point in the batch.
        index: usize,
        /// Tile that was queried.
        tile_id: String,
    },

    /// Local file or process I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Java client exited unsuccessfully.
    #[error("Coordinate client exited with {status}")]
    ClientProcess {
        /// Exit status of the client process.
        status: std::process::ExitStatus,
    },
}

/// Result type for render-ws operations.
pub type RenderResult<T = ()> = Result<T, RenderError>;

impl RenderError {
    /// Create a configuration error with the given message.
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config(message.to_string())
    }
}
